mod common;

use axum::http::StatusCode;
use formcart::catalog::{Endpoint, Tier, FALLBACK_WARNING};
use formcart::{fetch_catalog, CatalogView, FormApiClient, SourceId};
use serde_json::json;

use common::{config, MockFormApi};

fn sources(ids: &[&str]) -> Vec<SourceId> {
    ids.iter().map(|id| SourceId::new(*id).unwrap()).collect()
}

#[tokio::test]
async fn test_catalog_from_payment_info_over_http() {
    let (mock, base) = MockFormApi::new()
        .products("111", json!([
            {"pid": "1", "name": "Apple, Red", "price": "25", "stock": 40, "image": "https://cdn.example.com/apple.jpg"},
            {"pid": "2", "name": "Asparagus", "price": 3.5, "image": "https://cdn.example.com/asparagus.jpg"}
        ]))
        .spawn()
        .await;
    let client = FormApiClient::new(&config(&base, &["111"])).unwrap();

    let outcome = fetch_catalog(&client, &sources(&["111"]), true).await;

    assert!(!outcome.used_backup());
    assert_eq!(outcome.products.len(), 2);
    assert_eq!(outcome.products[0].price.to_string(), "$25.00");
    assert_eq!(outcome.products[0].max_quantity, 40);
    assert_eq!(outcome.products[1].stock, 10);
    assert_eq!(outcome.sources[0].tier, Tier::Remote(Endpoint::PaymentInfo));
    // later tiers are never touched once one succeeds
    assert_eq!(mock.reads_made(), vec!["111/payment-info"]);
}

#[tokio::test]
async fn test_falls_through_to_questions_then_synthetic() {
    let (mock, base) = MockFormApi::new()
        .read("111", "payment-info", StatusCode::OK, json!({"responseCode": 200, "content": {"products": []}}))
        .read("111", "questions", StatusCode::OK, json!({"responseCode": 200, "content": {
            "3": {"type": "control_products", "name": "myProducts", "products": [{"pid": "9", "name": "Banana", "price": "1.25", "image": "https://cdn.example.com/banana.jpg"}]},
            "4": {"type": "control_textbox", "name": "fullName"}
        }}))
        .spawn()
        .await;
    let client = FormApiClient::new(&config(&base, &["111", "222"])).unwrap();

    let outcome = fetch_catalog(&client, &sources(&["111", "222"]), true).await;

    assert_eq!(outcome.sources[0].tier, Tier::Remote(Endpoint::Questions));
    assert_eq!(outcome.sources[1].tier, Tier::Synthetic);
    assert_eq!(outcome.products[0].name, "Banana");
    let synthetic: Vec<_> = outcome.products.iter().skip(1).collect();
    assert!((6..=9).contains(&synthetic.len()));
    assert!(synthetic.iter().all(|p| p.id.as_str().starts_with("form2-222-dummy-")));
    assert!(mock.reads_made().contains(&"222/submissions".to_string()));
    assert!(outcome.warning.is_none());
}

#[tokio::test]
async fn test_colliding_ids_are_namespaced() {
    let (_mock, base) = MockFormApi::new()
        .products("111", json!([{"pid": "7", "name": "Avocado", "price": 2, "image": "https://cdn.example.com/avocado.jpg"}]))
        .products("222", json!([{"pid": "7", "name": "Tomato", "price": 1, "image": "https://cdn.example.com/tomato.jpg"}]))
        .spawn()
        .await;
    let client = FormApiClient::new(&config(&base, &["111", "222"])).unwrap();

    let outcome = fetch_catalog(&client, &sources(&["111", "222"]), false).await;

    let ids: Vec<&str> = outcome.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["7", "form2-7"]);
}

#[tokio::test]
async fn test_seed_catalog_when_every_source_is_empty() {
    let (_mock, base) = MockFormApi::new().spawn().await;
    let client = FormApiClient::new(&config(&base, &["111", "222"])).unwrap();

    let outcome = fetch_catalog(&client, &sources(&["111", "222"]), false).await;

    assert_eq!(outcome.warning.as_deref(), Some(FALLBACK_WARNING));
    assert_eq!(outcome.products.len(), 15);
    assert!(outcome.sources.iter().all(|r| r.tier == Tier::Unavailable));
}

#[tokio::test]
async fn test_dead_sources_with_synthesis_still_show_seed() {
    let (_mock, base) = MockFormApi::new().spawn().await;
    let forms = ["251074098711961", "251074116166956", "251073669442965"];
    let client = FormApiClient::new(&config(&base, &forms)).unwrap();
    let mut view = CatalogView::new();

    assert!(view.refresh(&client, &sources(&forms), true).await);

    assert_eq!(view.products().len(), 15);
    assert_eq!(view.warning(), Some(FALLBACK_WARNING));
}

#[tokio::test]
async fn test_wrong_api_key_counts_as_failed_tier() {
    let (_mock, base) = MockFormApi::new()
        .products("111", json!([{"pid": "1", "name": "Apple, Red", "price": 25, "image": "https://cdn.example.com/apple.jpg"}]))
        .spawn()
        .await;
    let mut config = config(&base, &["111"]);
    config.api_key = "wrong".to_string().into();
    let client = FormApiClient::new(&config).unwrap();

    let outcome = fetch_catalog(&client, &sources(&["111"]), false).await;
    assert!(outcome.used_backup());
}

#[tokio::test]
async fn test_view_refresh_replaces_seed() {
    let (_mock, base) = MockFormApi::new()
        .products("111", json!([{"pid": "1", "name": "Apple, Red", "price": 25, "image": "https://cdn.example.com/apple.jpg"}]))
        .spawn()
        .await;
    let client = FormApiClient::new(&config(&base, &["111"])).unwrap();
    let mut view = CatalogView::new();
    assert_eq!(view.all_products().len(), 15);

    assert!(view.refresh(&client, &sources(&["111"]), true).await);

    assert_eq!(view.all_products().len(), 1);
    assert!(view.find("1").is_some());
    assert!(!view.is_loading());
    assert!(view.warning().is_none());
}
