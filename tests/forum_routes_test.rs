// ABOUTME: Integration tests for posts, comments, reactions, adoptions, checklists and uploads
// ABOUTME: Verifies community linking from coordinates and toggle semantics over HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;
mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use pawboard::database::User;
use pawboard::errors::{AppError, AppResult};
use pawboard::geo::{AreaDataSource, AreaRegistry, AreaResolver, RetryPolicy};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{create_test_community, create_test_user, TestContext, BEDOK_POINT, SEA_POINT};
use helpers::axum_test::{AxumTestRequest, MultipartPart};

async fn create_post(ctx: &TestContext, user: &User, body: Value) -> Value {
    let mut payload = json!({
        "user_id": user.id,
        "title": "Lost ginger cat",
        "content": "Answers to Mochi, last seen near the MRT",
        "post_type": "lost",
    });
    if let (Some(target), Some(extra)) = (payload.as_object_mut(), body.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }

    let response = AxumTestRequest::post("/api/posts")
        .json(&payload)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 201);
    response.json()
}

#[tokio::test]
async fn test_post_with_coordinates_links_community() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();
    let community = create_test_community(ctx.database(), "Bedok Paws", "bedok")
        .await
        .unwrap();

    let post = create_post(
        &ctx,
        &user,
        json!({ "location_lat": BEDOK_POINT.1, "location_lng": BEDOK_POINT.0 }),
    )
    .await;
    assert_eq!(post["community_id"], community.id.to_string());
    assert_eq!(post["users"]["username"], "finder");
    assert_eq!(post["reaction_counts"]["total"], 0);

    let outside = create_post(
        &ctx,
        &user,
        json!({ "location_lat": SEA_POINT.1, "location_lng": SEA_POINT.0 }),
    )
    .await;
    assert!(outside["community_id"].is_null());

    let no_location = create_post(&ctx, &user, json!({})).await;
    assert!(no_location["community_id"].is_null());
}

#[tokio::test]
async fn test_update_relinks_only_when_coordinates_change() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();
    let bedok = create_test_community(ctx.database(), "Bedok Paws", "BEDOK")
        .await
        .unwrap();
    let downtown = create_test_community(ctx.database(), "CBD Cats", "DOWNTOWN CORE")
        .await
        .unwrap();

    let post = create_post(
        &ctx,
        &user,
        json!({ "location_lat": BEDOK_POINT.1, "location_lng": BEDOK_POINT.0 }),
    )
    .await;
    let uri = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let response = AxumTestRequest::put(&uri)
        .json(&json!({ "title": "Found: ginger cat", "is_resolved": true }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let updated: Value = response.json();
    assert_eq!(updated["title"], "Found: ginger cat");
    assert_eq!(updated["is_resolved"], true);
    assert_eq!(updated["community_id"], bedok.id.to_string());

    let response = AxumTestRequest::put(&uri)
        .json(&json!({ "location_lat": 1.28, "location_lng": 103.85 }))
        .send(ctx.router())
        .await;
    let moved: Value = response.json();
    assert_eq!(moved["community_id"], downtown.id.to_string());
    assert_eq!(moved["content"], post["content"]);

    let response = AxumTestRequest::put(&format!("/api/posts/{}", Uuid::new_v4()))
        .json(&json!({ "title": "ghost" }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);
}

struct UnavailableSource;

#[async_trait]
impl AreaDataSource for UnavailableSource {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn fetch(&self) -> AppResult<AreaRegistry> {
        Err(AppError::external_service("unavailable", "no boundary data"))
    }
}

#[tokio::test]
async fn test_post_saved_without_community_when_areas_unavailable() {
    let resolver =
        AreaResolver::new(Arc::new(UnavailableSource)).with_retry_policy(RetryPolicy::no_retry());
    let ctx = TestContext::with_resolver(resolver).await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();
    create_test_community(ctx.database(), "Bedok Paws", "BEDOK")
        .await
        .unwrap();

    let post = create_post(
        &ctx,
        &user,
        json!({ "location_lat": BEDOK_POINT.1, "location_lng": BEDOK_POINT.0 }),
    )
    .await;
    assert!(post["community_id"].is_null());
}

#[tokio::test]
async fn test_create_post_validation() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();

    let response = AxumTestRequest::post("/api/posts")
        .json(&json!({ "title": "No author" }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);

    let response = AxumTestRequest::post("/api/posts")
        .json(&json!({
            "user_id": user.id,
            "title": "Wrong type",
            "content": "x",
            "post_type": "rehoming",
        }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);

    let response = AxumTestRequest::post("/api/posts")
        .json(&json!({
            "user_id": Uuid::new_v4(),
            "title": "Unknown author",
            "content": "x",
            "post_type": "found",
        }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_list_filters() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();

    create_post(&ctx, &user, json!({ "tags": ["cat", "ginger"] })).await;
    create_post(
        &ctx,
        &user,
        json!({
            "title": "Puppy for adoption",
            "content": "Vaccinated and friendly",
            "post_type": "adoption",
            "tags": ["dog"],
        }),
    )
    .await;

    let response = AxumTestRequest::get("/api/posts").send(ctx.router()).await;
    let all: Vec<Value> = response.json();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["title"], "Puppy for adoption");

    let response = AxumTestRequest::get("/api/posts?type=adoption")
        .send(ctx.router())
        .await;
    let adoption: Vec<Value> = response.json();
    assert_eq!(adoption.len(), 1);

    let response = AxumTestRequest::get("/api/posts?search=MOCHI")
        .send(ctx.router())
        .await;
    let searched: Vec<Value> = response.json();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0]["post_type"], "lost");

    let response = AxumTestRequest::get("/api/posts?tags=cat,ginger")
        .send(ctx.router())
        .await;
    let tagged: Vec<Value> = response.json();
    assert_eq!(tagged.len(), 1);

    let response = AxumTestRequest::get("/api/posts?tags=cat,dog")
        .send(ctx.router())
        .await;
    let none: Vec<Value> = response.json();
    assert!(none.is_empty());

    let response = AxumTestRequest::get("/api/posts?limit=1")
        .send(ctx.router())
        .await;
    let limited: Vec<Value> = response.json();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_reaction_toggle_adds_then_removes() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();
    let post = create_post(&ctx, &user, json!({})).await;
    let post_id = post["id"].as_str().unwrap();
    let uri = format!("/api/posts/{post_id}/reactions");

    let response = AxumTestRequest::post(&uri)
        .json(&json!({ "user_id": user.id }))
        .send(ctx.router())
        .await;
    let first: Value = response.json();
    assert_eq!(first["action"], "added");
    assert_eq!(first["reaction_type"], "like");

    AxumTestRequest::post(&uri)
        .json(&json!({ "user_id": user.id, "reaction_type": "heart" }))
        .send(ctx.router())
        .await;

    let response = AxumTestRequest::get(&format!("{uri}/counts"))
        .send(ctx.router())
        .await;
    let counts: Value = response.json();
    assert_eq!(counts["like"], 1);
    assert_eq!(counts["heart"], 1);
    assert_eq!(counts["helpful"], 0);

    let response = AxumTestRequest::get(&format!("{uri}?user_id={}", user.id))
        .send(ctx.router())
        .await;
    let mine: Vec<Value> = response.json();
    assert_eq!(mine.len(), 2);

    let response = AxumTestRequest::post(&uri)
        .json(&json!({ "user_id": user.id, "reaction_type": "like" }))
        .send(ctx.router())
        .await;
    let second: Value = response.json();
    assert_eq!(second["action"], "removed");

    let response = AxumTestRequest::get(&format!("/api/posts/{post_id}"))
        .send(ctx.router())
        .await;
    let detail: Value = response.json();
    assert_eq!(detail["reaction_count"], 1);
    assert_eq!(detail["reaction_counts"]["heart"], 1);

    let response = AxumTestRequest::get(&uri).send(ctx.router()).await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json();
    assert_eq!(error["error"]["message"], "Missing user_id query parameter");

    let response = AxumTestRequest::post(&uri)
        .json(&json!({ "user_id": user.id, "reaction_type": "angry" }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_comments_views_and_delete() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "finder").await.unwrap();
    let helper = create_test_user(ctx.database(), "helper").await.unwrap();
    let post = create_post(&ctx, &user, json!({})).await;
    let post_id = post["id"].as_str().unwrap();
    let comments_uri = format!("/api/posts/{post_id}/comments");

    let response = AxumTestRequest::post(&comments_uri)
        .json(&json!({ "user_id": helper.id, "content": "Saw a ginger cat at block 12" }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 201);
    let parent: Value = response.json();

    let response = AxumTestRequest::post(&comments_uri)
        .json(&json!({
            "user_id": user.id,
            "content": "Thank you, heading there",
            "parent_comment_id": parent["id"],
        }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 201);

    let response = AxumTestRequest::get(&comments_uri).send(ctx.router()).await;
    let comments: Vec<Value> = response.json();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["users"]["username"], "helper");
    assert_eq!(comments[1]["parent_comment_id"], parent["id"]);

    for _ in 0..3 {
        let response = AxumTestRequest::post(&format!("/api/posts/{post_id}/view"))
            .send(ctx.router())
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = AxumTestRequest::get(&format!("/api/posts/{post_id}"))
        .send(ctx.router())
        .await;
    let detail: Value = response.json();
    assert_eq!(detail["view_count"], 3);
    assert_eq!(detail["comment_count"], 2);

    let response = AxumTestRequest::delete(&format!("/api/posts/{post_id}"))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Post deleted successfully");

    let response = AxumTestRequest::get(&format!("/api/posts/{post_id}"))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);

    let response = AxumTestRequest::post(&format!("/api/posts/{post_id}/view"))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_mark_adopted_requires_token() {
    let ctx = TestContext::new().await;
    let shelter = create_test_user(ctx.database(), "shelter").await.unwrap();
    let adopter = create_test_user(ctx.database(), "adopter").await.unwrap();
    let post = create_post(&ctx, &shelter, json!({ "post_type": "adoption" })).await;
    let uri = format!("/api/posts/{}/mark-adopted", post["id"].as_str().unwrap());

    let response = AxumTestRequest::post(&uri).send(ctx.router()).await;
    assert_eq!(response.status(), 401);

    let token = ctx.resources.auth_manager.generate_token(&adopter).unwrap();

    let response = AxumTestRequest::post(&uri)
        .bearer(&token)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json();
    assert_eq!(body["message"], "Adoption completed");
    assert_eq!(body["data"]["user_id"], adopter.id.to_string());

    let response = AxumTestRequest::post(&uri)
        .bearer(&token)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Already adopted");

    let response = AxumTestRequest::post(&format!("/api/posts/{}/mark-adopted", Uuid::new_v4()))
        .bearer(&token)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_checklist_toggle() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "adopter").await.unwrap();
    let post = create_post(&ctx, &user, json!({ "post_type": "adoption" })).await;
    let uri = format!("/api/posts/{}/checklist", post["id"].as_str().unwrap());

    for index in [0, 5] {
        let response = AxumTestRequest::post(&uri)
            .json(&json!({ "user_id": user.id, "item_index": index }))
            .send(ctx.router())
            .await;
        let body: Value = response.json();
        assert_eq!(body["action"], "added");
    }

    let response = AxumTestRequest::post(&uri)
        .json(&json!({ "user_id": user.id, "item_index": 0 }))
        .send(ctx.router())
        .await;
    let body: Value = response.json();
    assert_eq!(body["action"], "removed");

    let response = AxumTestRequest::get(&format!("{uri}?user_id={}", user.id))
        .send(ctx.router())
        .await;
    let body: Value = response.json();
    assert_eq!(body["checked"], json!([5]));

    let response = AxumTestRequest::post(&uri)
        .json(&json!({ "user_id": user.id, "item_index": 6 }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_upload_images() {
    let ctx = TestContext::new().await;
    let png = [0x89_u8, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    let response = AxumTestRequest::post("/api/upload-images")
        .multipart(&[
            MultipartPart::File {
                name: "images",
                file_name: "mochi front.png",
                content_type: "image/png",
                data: &png,
            },
            MultipartPart::File {
                name: "images",
                file_name: "mochi side.png",
                content_type: "image/png",
                data: &png,
            },
        ])
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    let urls = body["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    let first = urls[0].as_str().unwrap();
    assert!(first.starts_with("http://localhost/storage/postImages/post-images/"));
    assert!(first.ends_with("-mochi_front.png"));

    let stored = first.trim_start_matches("http://localhost/storage/");
    assert!(ctx.storage.path().join(stored).exists());

    let response = AxumTestRequest::post("/api/upload-images")
        .multipart(&[MultipartPart::File {
            name: "images",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"hello",
        }])
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);

    let response = AxumTestRequest::post("/api/upload-images")
        .multipart(&[MultipartPart::Text {
            name: "caption",
            value: "nothing attached",
        }])
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "No files uploaded");
}
