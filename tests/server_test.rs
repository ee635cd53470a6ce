// ABOUTME: Integration tests for router-wide behavior
// ABOUTME: Health checks, JSON 404 fallback, request IDs, CORS, avatars and static storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;
mod helpers;

use serde_json::{json, Value};

use common::TestContext;
use helpers::axum_test::{AxumTestRequest, MultipartPart};

#[tokio::test]
async fn test_health_and_index() {
    let ctx = TestContext::new().await;

    let response = AxumTestRequest::get("/health").send(ctx.router()).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().is_some());

    let response = AxumTestRequest::get("/").send(ctx.router()).await;
    let body: Value = response.json();
    assert_eq!(body["name"], "pawboard");
    assert_eq!(body["endpoints"]["maps"], "/maps");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let ctx = TestContext::new().await;
    let response = AxumTestRequest::get("/no/such/route")
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/no/such/route"));
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let ctx = TestContext::new().await;

    let response = AxumTestRequest::get("/health")
        .header("x-request-id", "trace-me-123")
        .send(ctx.router())
        .await;
    assert_eq!(response.header("x-request-id").as_deref(), Some("trace-me-123"));

    let response = AxumTestRequest::get("/health").send(ctx.router()).await;
    let generated = response.header("x-request-id").unwrap();
    assert!(uuid::Uuid::parse_str(&generated).is_ok());
}

#[tokio::test]
async fn test_error_body_carries_request_id() {
    let ctx = TestContext::new().await;

    let response = AxumTestRequest::get("/no/such/route")
        .header("x-request-id", "trace-me-404")
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["request_id"], "trace-me-404");

    let response = AxumTestRequest::get("/users/not-a-uuid")
        .send(ctx.router())
        .await;
    let generated = response.header("x-request-id").unwrap();
    let body: Value = response.json();
    assert_eq!(body["error"]["request_id"], generated.as_str());
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let ctx = TestContext::new().await;
    let response = AxumTestRequest::get("/health")
        .header("origin", "http://localhost:5173")
        .send(ctx.router())
        .await;
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("*")
    );
}

#[tokio::test]
async fn test_avatar_upload_serve_and_delete() {
    let ctx = TestContext::new().await;
    let image = b"GIF89a-fake-avatar";

    let response = AxumTestRequest::post("/avatars/upload")
        .multipart(&[
            MultipartPart::Text {
                name: "user_id",
                value: "user-42",
            },
            MultipartPart::File {
                name: "avatar",
                file_name: "me.gif",
                content_type: "image/gif",
                data: image,
            },
        ])
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Avatar uploaded successfully");
    let filename = body["filename"].as_str().unwrap().to_owned();
    assert!(filename.starts_with("user-42-"));
    assert!(filename.ends_with("-me.gif"));
    assert_eq!(
        body["url"],
        format!("http://localhost/storage/userAvatars/{filename}")
    );

    let response = AxumTestRequest::get(&format!("/storage/userAvatars/{filename}"))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().as_bytes(), image);

    let response = AxumTestRequest::delete("/avatars/delete")
        .json(&json!({}))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Filename required");

    let response = AxumTestRequest::delete("/avatars/delete")
        .json(&json!({ "filename": filename }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["removed"], 1);
    assert!(!ctx.storage.path().join("userAvatars").join(&filename).exists());
}

#[tokio::test]
async fn test_oversized_avatar_is_rejected() {
    let ctx = TestContext::new().await;
    let large = vec![0_u8; pawboard::constants::uploads::MAX_AVATAR_BYTES + 1];

    let response = AxumTestRequest::post("/avatars/upload")
        .multipart(&[MultipartPart::File {
            name: "avatar",
            file_name: "huge.png",
            content_type: "image/png",
            data: &large,
        }])
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 413);
}
