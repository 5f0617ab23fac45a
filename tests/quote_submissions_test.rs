mod common;

use axum::http::{Method, StatusCode};
use common::{full_payload, response_json, TestApp};
use quote_api::entities::{
    quote_contact, quote_delivery_address, quote_pickup_address, quote_shipment_item,
    quote_submission,
};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

const BASE: &str = "/api/client/quote_submissions";

fn path(id: &Value) -> String {
    format!("{}/{}", BASE, id)
}

/// Row counts for (submissions, contacts, pickups, deliveries, items).
async fn row_counts(app: &TestApp) -> (u64, u64, u64, u64, u64) {
    let db = &*app.state.db;
    (
        quote_submission::Entity::find().count(db).await.unwrap(),
        quote_contact::Entity::find().count(db).await.unwrap(),
        quote_pickup_address::Entity::find().count(db).await.unwrap(),
        quote_delivery_address::Entity::find().count(db).await.unwrap(),
        quote_shipment_item::Entity::find().count(db).await.unwrap(),
    )
}

#[tokio::test]
async fn create_persists_aggregate_and_counts_items() {
    let app = TestApp::new().await;

    let body = app.create_submission(full_payload()).await;

    assert_eq!(body["status"], "open");
    assert_eq!(body["shipment_items_count"], 2);
    assert_eq!(body["shipment_items"].as_array().unwrap().len(), 2);
    assert_eq!(body["contact"]["name"], "Joean");
    assert_eq!(body["contact"]["title"], Value::Null);
    assert_eq!(body["pickup_address"]["lat"], json!(11.5659647));
    assert_eq!(body["shipment_items"][1]["weight"], json!(1.25));
    assert_eq!(body["shipment_items"][1]["weight_unit"], Value::Null);
    assert_eq!(row_counts(&app).await, (1, 1, 1, 1, 2));
}

#[tokio::test]
async fn create_without_children_is_allowed() {
    let app = TestApp::new().await;

    let body = app.create_submission(json!({})).await;

    assert_eq!(body["shipment_items_count"], 0);
    assert_eq!(body["contact"], Value::Null);
    assert_eq!(body["shipment_items"], json!([]));
}

#[tokio::test]
async fn invalid_create_reports_sparse_tree_and_writes_nothing() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            BASE,
            Some(json!({
                "quote_submission": {
                    "contact_attributes": {"name": "  ", "email": "joeann@gmail.com"},
                    "pickup_address_attributes": {"lat": 11.5, "lon": 104.9},
                    "delivery_address_attributes": {"name": "Sen Monorom", "lon": 106.9},
                    "shipment_items_attributes": [
                        {"length": 1, "height": 1, "weight": 1},
                        {"width": 1, "height": 1, "weight": 1},
                        {"width": 1, "length": 1, "height": 1, "weight": 1}
                    ]
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "error": {
                "contact": {"name": ["can't be blank"]},
                "delivery_address": {"lat": ["can't be blank"]},
                "shipment_items": {
                    "0": {"width": ["can't be blank"]},
                    "1": {"length": ["can't be blank"]}
                }
            }
        })
    );
    assert_eq!(row_counts(&app).await, (0, 0, 0, 0, 0));
}

#[tokio::test]
async fn range_and_format_violations_are_reported() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            BASE,
            Some(json!({
                "contact_attributes": {"name": "Joean", "email": "not-an-email"},
                "pickup_address_attributes": {"lat": 91, "lon": -181},
                "shipment_items_attributes": {"0": {"width": -1, "length": 1, "height": 1, "weight": 1, "number_of_item": 0}}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let tree = &body["error"];
    assert_eq!(tree["contact"]["email"], json!(["is invalid"]));
    assert_eq!(tree["pickup_address"]["lat"], json!(["must be between -90 and 90"]));
    assert_eq!(tree["pickup_address"]["lon"], json!(["must be between -180 and 180"]));
    assert_eq!(
        tree["shipment_items"]["0"]["width"],
        json!(["must be greater than or equal to 0"])
    );
    assert_eq!(
        tree["shipment_items"]["0"]["number_of_item"],
        json!(["must be greater than or equal to 1"])
    );
    assert!(tree.get("delivery_address").is_none());
}

#[tokio::test]
async fn create_with_foreign_child_id_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(
            Method::POST,
            BASE,
            Some(json!({"contact_attributes": {"id": 99, "name": "Joean"}})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(row_counts(&app).await, (0, 0, 0, 0, 0));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            BASE,
            Some(json!({"pickup_address_attributes": {"lat": "north", "lon": 1}})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("message").is_some());
    assert_eq!(row_counts(&app).await.0, 0);
}

#[tokio::test]
async fn update_with_existing_id_mutates_in_place() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;
    let contact_id = created["contact"]["id"].clone();
    let item_id = created["shipment_items"][0]["id"].clone();

    let (status, body) = app
        .call(
            Method::PATCH,
            &path(&created["id"]),
            Some(json!({
                "quote_submission": {
                    "contact_attributes": {"id": contact_id, "title": "Manager"},
                    "shipment_items_attributes": [{"id": item_id, "weight": "31"}]
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["contact"]["id"], contact_id);
    assert_eq!(body["contact"]["title"], "Manager");
    assert_eq!(body["contact"]["name"], "Joean");
    assert_eq!(body["shipment_items"][0]["id"], item_id);
    assert_eq!(body["shipment_items"][0]["weight"], json!(31.0));
    assert_eq!(body["shipment_items_count"], 2);
    assert_eq!(row_counts(&app).await, (1, 1, 1, 1, 2));
}

#[tokio::test]
async fn singular_block_without_id_replaces_the_child() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;
    let old_pickup = created["pickup_address"]["id"].clone();

    let (status, body) = app
        .call(
            Method::PUT,
            &path(&created["id"]),
            Some(json!({"pickup_address_attributes": {"name": "Central Market", "lat": 11.5696, "lon": 104.9211}})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["pickup_address"]["id"], old_pickup);
    assert_eq!(body["pickup_address"]["name"], "Central Market");
    assert_eq!(row_counts(&app).await.2, 1);
}

#[tokio::test]
async fn item_without_id_appends_and_destroy_removes() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;
    let first = created["shipment_items"][0]["id"].clone();
    let second = created["shipment_items"][1]["id"].clone();

    let (status, body) = app
        .call(
            Method::PATCH,
            &path(&created["id"]),
            Some(json!({
                "shipment_items_attributes": [
                    {"id": first, "_destroy": "1"},
                    {"width": 5, "length": 5, "height": 5, "weight": 5},
                    {"width": 6, "length": 6, "height": 6, "weight": 6}
                ],
                "contact_attributes": {"id": created["contact"]["id"], "_destroy": true}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["shipment_items_count"], 3);
    let ids: Vec<&Value> = body["shipment_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| &item["id"])
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], &second);
    assert!(!ids.contains(&&first));
    assert_eq!(body["contact"], Value::Null);
    assert_eq!(row_counts(&app).await, (1, 0, 1, 1, 3));
}

#[tokio::test]
async fn invalid_update_writes_nothing() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;
    let item_id = created["shipment_items"][1]["id"].clone();

    let (status, body) = app
        .call(
            Method::PATCH,
            &path(&created["id"]),
            Some(json!({
                "contact_attributes": {"id": created["contact"]["id"], "title": "Dispatcher"},
                "shipment_items_attributes": [
                    {"id": item_id, "length": null},
                    {"width": 1, "length": 1, "height": 1, "weight": 1}
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": {"shipment_items": {"1": {"length": ["can't be blank"]}}}})
    );

    let (_, reloaded) = app.call(Method::GET, &path(&created["id"]), None).await;
    assert_eq!(reloaded, created);
    assert_eq!(row_counts(&app).await, (1, 1, 1, 1, 2));
}

#[tokio::test]
async fn update_with_unknown_child_id_is_not_found() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;

    let (status, _) = app
        .call(
            Method::PATCH,
            &path(&created["id"]),
            Some(json!({"shipment_items_attributes": [{"id": 4242, "width": 1}]})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(row_counts(&app).await.4, 2);
}

#[tokio::test]
async fn destroy_removes_only_that_aggregate() {
    let app = TestApp::new().await;
    let doomed = app.create_submission(full_payload()).await;
    let kept = app.create_submission(full_payload()).await;

    let (status, snapshot) = app.call(Method::DELETE, &path(&doomed["id"]), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot, doomed);
    assert_eq!(row_counts(&app).await, (1, 1, 1, 1, 2));

    let (status, _) = app.call(Method::GET, &path(&doomed["id"]), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.call(Method::GET, &path(&kept["id"]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, kept);
}

#[tokio::test]
async fn listing_pages_by_id() {
    let app = TestApp::new().await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(app.create_submission(json!({})).await["id"].clone());
    }

    let (status, first) = app
        .call(Method::GET, &format!("{}?page=1&per_page=2", BASE), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let first_ids: Vec<Value> = first
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].clone())
        .collect();
    assert_eq!(first_ids, ids[..2].to_vec());

    let (_, second) = app
        .call(Method::GET, &format!("{}?page=2&per_page=2", BASE), None)
        .await;
    assert_eq!(second.as_array().unwrap().len(), 1);
    assert_eq!(second[0]["id"], ids[2]);

    let (status, beyond) = app
        .call(Method::GET, &format!("{}?page=9&per_page=2", BASE), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(beyond, json!([]));

    let (_, everything) = app.call(Method::GET, BASE, None).await;
    assert_eq!(everything.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn new_returns_permitted_fields() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(Method::GET, &format!("{}/new", BASE), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "pickup_address_attributes": ["id", "name", "lat", "lon"],
            "delivery_address_attributes": ["id", "name", "lat", "lon"],
            "contact_attributes": ["id", "name", "email", "phone_number", "title"],
            "shipment_items_attributes": ["id", "width", "length", "height", "weight", "weight_unit", "dimension_unit", "number_of_item"]
        })
    );
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;

    let (_, first) = app.call(Method::GET, &path(&created["id"]), None).await;
    let (_, second) = app.call(Method::GET, &path(&created["id"]), None).await;

    assert_eq!(first, second);
    assert_eq!(first, created);
}

#[tokio::test]
async fn unknown_id_is_not_found_everywhere() {
    let app = TestApp::new().await;
    let missing = "/api/client/quote_submissions/404";

    for method in [Method::GET, Method::PATCH, Method::DELETE] {
        let body = (method == Method::PATCH).then(|| json!({}));
        let (status, payload) = app.call(method.clone(), missing, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, payload);
        assert_eq!(payload["error"], "Not Found");
    }
}

#[tokio::test]
async fn requests_without_valid_bearer_are_rejected() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, BASE, None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_MISSING_TOKEN");

    let response = app
        .request(Method::GET, BASE, None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(response).await["error"]["code"], "AUTH_INVALID_TOKEN");

    let expired = app.token_with_ttl(chrono::Duration::hours(-2));
    let response = app.request(Method::GET, BASE, None, Some(&expired)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(response).await["error"]["code"], "AUTH_TOKEN_EXPIRED");

    let response = app
        .request(Method::POST, BASE, Some(full_payload()), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(row_counts(&app).await.0, 0);
}

#[tokio::test]
async fn pages_beyond_addressable_offsets_are_empty() {
    let app = TestApp::new().await;
    app.create_submission(json!({})).await;

    let (status, body) = app
        .call(
            Method::GET,
            &format!("{}?page=18446744073709551615", BASE),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = app
        .call(
            Method::GET,
            &format!("{}?page=9223372036854775807&per_page=100", BASE),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn repeated_item_id_keeps_destroy_mark() {
    let app = TestApp::new().await;
    let created = app.create_submission(full_payload()).await;
    let first = created["shipment_items"][0]["id"].clone();

    let (status, body) = app
        .call(
            Method::PATCH,
            &path(&created["id"]),
            Some(json!({
                "shipment_items_attributes": [
                    {"id": first, "_destroy": "1"},
                    {"id": first, "width": 3}
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["shipment_items_count"], 1);
    assert_ne!(body["shipment_items"][0]["id"], first);
    assert_eq!(row_counts(&app).await.4, 1);
}

#[tokio::test]
async fn malformed_id_is_a_json_bad_request() {
    let app = TestApp::new().await;

    for method in [Method::GET, Method::PATCH, Method::DELETE] {
        let body = (method == Method::PATCH).then(|| json!({}));
        let (status, payload) = app
            .call(method.clone(), "/api/client/quote_submissions/abc", body)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", method);
        assert_eq!(payload["error"], "Bad Request");
        assert!(payload["message"].is_string());
    }
}
