// ABOUTME: Integration tests for communities and memberships
// ABOUTME: Covers creation, filtering, join conflicts, leaving and membership lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pawboard Contributors

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

mod common;
mod helpers;

use serde_json::{json, Value};
use uuid::Uuid;

use common::{create_test_community, create_test_user, TestContext};
use helpers::axum_test::AxumTestRequest;

#[tokio::test]
async fn test_create_and_list_communities() {
    let ctx = TestContext::new().await;
    let owner = create_test_user(ctx.database(), "owner").await.unwrap();

    let response = AxumTestRequest::post("/communities")
        .json(&json!({
            "name": "Bedok Paws",
            "description": "Cats and dogs of Bedok",
            "location_name": "BEDOK",
            "created_by": owner.id,
        }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 201);
    let created: Value = response.json();
    assert_eq!(created["member_count"], 0);
    assert_eq!(created["created_by"], owner.id.to_string());

    create_test_community(ctx.database(), "Downtown Strays", "DOWNTOWN CORE")
        .await
        .unwrap();

    let response = AxumTestRequest::get("/communities").send(ctx.router()).await;
    let all: Vec<Value> = response.json();
    assert_eq!(all.len(), 2);

    let response = AxumTestRequest::get("/communities?location=bedok")
        .send(ctx.router())
        .await;
    let filtered: Vec<Value> = response.json();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["name"], "Bedok Paws");

    let id = created["id"].as_str().unwrap();
    let response = AxumTestRequest::get(&format!("/communities/{id}"))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);

    let response = AxumTestRequest::get(&format!("/communities/{}", Uuid::new_v4()))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_create_requires_name_and_location() {
    let ctx = TestContext::new().await;
    let response = AxumTestRequest::post("/communities")
        .json(&json!({ "description": "nameless" }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["details"]["issues"].as_array().unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_join_twice_is_conflict_and_leave() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "walker").await.unwrap();
    let community = create_test_community(ctx.database(), "Bedok Paws", "BEDOK")
        .await
        .unwrap();
    let join_uri = format!("/communities/{}/join", community.id);
    let body = json!({ "user_id": user.id });

    let response = AxumTestRequest::post(&join_uri)
        .json(&body)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 201);

    let response = AxumTestRequest::post(&join_uri)
        .json(&body)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 409);
    let error: Value = response.json();
    assert_eq!(
        error["error"]["message"],
        "User is already a member of this community"
    );

    let membership_uri = format!("/communities/{}/membership/{}", community.id, user.id);
    let response = AxumTestRequest::get(&membership_uri)
        .send(ctx.router())
        .await;
    let status: Value = response.json();
    assert_eq!(status["isMember"], true);

    let response = AxumTestRequest::get(&format!("/communities/users/{}", user.id))
        .send(ctx.router())
        .await;
    let memberships: Vec<Value> = response.json();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0]["community"]["name"], "Bedok Paws");
    assert_eq!(memberships[0]["community"]["member_count"], 1);

    let leave_uri = format!("/communities/{}/leave", community.id);
    let response = AxumTestRequest::delete(&leave_uri)
        .json(&body)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);

    let response = AxumTestRequest::delete(&leave_uri)
        .json(&body)
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);

    let response = AxumTestRequest::get(&membership_uri)
        .send(ctx.router())
        .await;
    let status: Value = response.json();
    assert_eq!(status["isMember"], false);
}

#[tokio::test]
async fn test_join_unknown_user_or_community() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "walker").await.unwrap();
    let community = create_test_community(ctx.database(), "Bedok Paws", "BEDOK")
        .await
        .unwrap();

    let response = AxumTestRequest::post(&format!("/communities/{}/join", Uuid::new_v4()))
        .json(&json!({ "user_id": user.id }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);

    let response = AxumTestRequest::post(&format!("/communities/{}/join", community.id))
        .json(&json!({ "user_id": Uuid::new_v4() }))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 404);

    let response = AxumTestRequest::post(&format!("/communities/{}/join", community.id))
        .json(&json!({}))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_concurrent_joins_leave_one_membership() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "walker").await.unwrap();
    let community = create_test_community(ctx.database(), "Bedok Paws", "BEDOK")
        .await
        .unwrap();

    let attempts = (0..4).map(|_| ctx.database().join_community(community.id, user.id));
    let results = futures_util::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for error in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(error.http_status(), 409);
    }
    let community = ctx
        .database()
        .get_community(community.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(community.member_count, 1);
}

#[tokio::test]
async fn test_community_posts_feed() {
    let ctx = TestContext::new().await;
    let user = create_test_user(ctx.database(), "walker").await.unwrap();
    let community = create_test_community(ctx.database(), "Bedok Paws", "BEDOK")
        .await
        .unwrap();

    for title in ["Ginger cat seen", "Brown puppy found"] {
        let response = AxumTestRequest::post("/api/posts")
            .json(&json!({
                "user_id": user.id,
                "title": title,
                "content": "Near the hawker centre",
                "post_type": "sighting",
                "location_lat": common::BEDOK_POINT.1,
                "location_lng": common::BEDOK_POINT.0,
            }))
            .send(ctx.router())
            .await;
        assert_eq!(response.status(), 201);
    }

    let response = AxumTestRequest::get(&format!("/communities/{}/posts", community.id))
        .send(ctx.router())
        .await;
    assert_eq!(response.status(), 200);
    let posts: Vec<Value> = response.json();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["title"], "Brown puppy found");

    let response = AxumTestRequest::get(&format!("/communities/{}", community.id))
        .send(ctx.router())
        .await;
    let detail: Value = response.json();
    assert_eq!(detail["post_count"], 2);
}
