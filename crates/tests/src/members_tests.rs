use std::sync::Arc;

use memberdir_services::MemoryMemberStore;
use serde_json::Value;

use crate::fixtures::{seed::JOHN_ID, test_app::TestApp};

const NEWEST_FIRST: [&str; 5] = [JOHN_ID, "m-jane", "m-johanna", "m-zed", "m-sparse"];

#[tokio::test]
async fn default_listing_returns_envelope() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/members").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["total"], 5);
    assert_eq!(pagination["limit"], 10);
    assert_eq!(pagination["offset"], 0);
    assert_eq!(pagination["hasMore"], false);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn default_order_is_newest_join_date_first() {
    let app = TestApp::spawn().await;
    assert_eq!(app.member_ids("/api/members").await, NEWEST_FIRST);
}

#[tokio::test]
async fn limit_and_offset_are_echoed() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/members?limit=2&offset=1").await;

    assert_eq!(status, 200);
    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["limit"], 2);
    assert_eq!(pagination["offset"], 1);
    assert_eq!(pagination["total"], 5);
    assert_eq!(pagination["hasMore"], true);

    let ids: Vec<&str> = body["data"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["m-jane", "m-johanna"]);
}

#[tokio::test]
async fn has_more_is_false_on_last_page() {
    let app = TestApp::spawn().await;
    let (_, body) = app.get_json("/api/members?limit=2&offset=4").await;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["hasMore"], false);

    let (_, body) = app.get_json("/api/members?offset=50").await;
    assert_eq!(body["data"]["members"], serde_json::json!([]));
    assert_eq!(body["data"]["pagination"]["total"], 5);
    assert_eq!(body["data"]["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn page_translates_to_offset() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/members?page=2&limit=2").await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["pagination"]["offset"], 2);
    assert_eq!(body["data"]["members"][0]["id"], "m-johanna");
}

#[tokio::test]
async fn every_public_field_has_a_default() {
    let app = TestApp::spawn().await;
    let (_, body) = app.get_json("/api/members?limit=1&offset=4").await;
    let sparse = &body["data"]["members"][0];

    assert_eq!(sparse["id"], "m-sparse");
    for key in [
        "firstName",
        "lastName",
        "email",
        "bio",
        "headline",
        "location",
        "profileUrl",
        "websiteUrl",
        "twitterUrl",
        "facebookUrl",
        "linkedinUrl",
        "instagramUrl",
        "avatarUrl",
    ] {
        assert_eq!(sparse[key], "", "{key}");
    }
    for key in ["joinDate", "lastActive", "invitationDate"] {
        assert!(sparse[key].is_null(), "{key}");
    }
    for key in ["active", "emailMarketing", "member"] {
        assert_eq!(sparse[key], false, "{key}");
    }
    for key in ["posts", "comments", "likesReceived"] {
        assert_eq!(sparse[key], 0, "{key}");
    }
    assert_eq!(sparse["tags"], serde_json::json!([]));
}

#[tokio::test]
async fn stored_shapes_are_normalized() {
    let app = TestApp::spawn().await;
    let (_, body) = app.get_json("/api/members").await;
    let members = body["data"]["members"].as_array().unwrap();
    let by_id = |id: &str| members.iter().find(|m| m["id"] == id).unwrap().clone();

    let john = by_id(JOHN_ID);
    assert_eq!(john["joinDate"], "2024-03-01T00:00:00.000Z");
    assert_eq!(john["tags"], serde_json::json!(["founder", "mentor"]));
    assert_eq!(john["posts"], 12);
    assert_eq!(john["active"], true);

    let jane = by_id("m-jane");
    assert_eq!(jane["lastActive"], "2024-06-01T00:00:00.000Z");

    let johanna = by_id("m-johanna");
    assert_eq!(johanna["tags"], serde_json::json!(["design", "ux"]));
    assert!(johanna["invitationDate"].is_null());

    let zed = by_id("m-zed");
    assert_eq!(zed["invitationDate"], "2023-11-20T08:30:00.000Z");
    assert_eq!(zed["comments"], 0);
}

#[tokio::test]
async fn search_matches_name_prefix() {
    let app = TestApp::spawn().await;

    assert_eq!(app.member_ids("/api/members?search=john").await, vec![JOHN_ID]);
    assert_eq!(app.member_ids("/api/members?search=JOHN").await, vec![JOHN_ID]);
    assert_eq!(
        app.member_ids("/api/members?search=joh").await,
        vec![JOHN_ID, "m-johanna"]
    );
}

#[tokio::test]
async fn search_without_match_is_empty() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/members?search=xyz").await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["members"], serde_json::json!([]));
    assert_eq!(body["data"]["pagination"]["total"], 0);
    assert_eq!(body["data"]["pagination"]["hasMore"], false);
}

#[tokio::test]
async fn active_filter_narrows_total() {
    let app = TestApp::spawn().await;

    let (_, body) = app.get_json("/api/members?active=true").await;
    assert_eq!(body["data"]["pagination"]["total"], 3);
    assert!(
        body["data"]["members"]
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["active"] == true)
    );

    assert_eq!(app.member_ids("/api/members?active=false").await, vec!["m-jane"]);
    assert_eq!(app.member_ids("/api/members?active=0").await, vec!["m-jane"]);
}

#[tokio::test]
async fn sort_by_first_name_ascending() {
    let app = TestApp::spawn().await;
    assert_eq!(
        app.member_ids("/api/members?sortBy=firstName&sortOrder=asc").await,
        vec!["m-sparse", "m-jane", "m-johanna", JOHN_ID, "m-zed"]
    );
}

#[tokio::test]
async fn unknown_sort_by_falls_back_to_join_date() {
    let app = TestApp::spawn().await;
    assert_eq!(app.member_ids("/api/members?sortBy=shoeSize").await, NEWEST_FIRST);
    assert_eq!(
        app.member_ids("/api/members?sortBy=shoeSize&sortOrder=asc").await,
        app.member_ids("/api/members?sortBy=joinDate&sortOrder=asc").await
    );
}

#[tokio::test]
async fn unknown_sort_order_falls_back_to_descending() {
    let app = TestApp::spawn().await;
    assert_eq!(
        app.member_ids("/api/members?sortBy=firstName&sortOrder=sideways").await,
        app.member_ids("/api/members?sortBy=firstName&sortOrder=desc").await
    );
}

#[tokio::test]
async fn empty_collection_lists_nothing() {
    let app = TestApp::spawn_with_store(Arc::new(MemoryMemberStore::new())).await;
    let (status, body) = app.get_json("/api/members").await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["members"], serde_json::json!([]));
    assert_eq!(
        body["data"]["pagination"],
        serde_json::json!({ "total": 0, "limit": 10, "offset": 0, "hasMore": false })
    );
}

#[tokio::test]
async fn store_failure_returns_503() {
    let app = TestApp::spawn_with_store(Arc::new(MemoryMemberStore::unavailable())).await;
    let (status, body) = app.get_json("/api/members").await;

    assert_eq!(status, 503);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        serde_json::json!({
            "message": "Service temporarily unavailable",
            "status": 503,
            "details": "Database operation failed",
        })
    );
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn invalid_page_is_rejected() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/members?page=invalid").await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["message"], "Invalid request parameters");
    assert_eq!(body["error"]["status"], 400);
    let details = body["error"]["details"].as_array().unwrap();
    assert!(!details.is_empty());
    assert_eq!(details[0]["field"], "page");
}

#[tokio::test]
async fn out_of_range_parameters_are_rejected() {
    let app = TestApp::spawn().await;
    for query in ["limit=0", "limit=101", "limit=ten", "offset=-1", "page=0", "active=maybe"] {
        let (status, body) = app.get_json(&format!("/api/members?{query}")).await;
        assert_eq!(status, 400, "{query}");
        assert!(!body["error"]["details"].as_array().unwrap().is_empty(), "{query}");
    }
}

#[tokio::test]
async fn every_invalid_parameter_is_reported() {
    let app = TestApp::spawn().await;
    let (status, body) = app.get_json("/api/members?limit=0&offset=-5&active=yes").await;

    assert_eq!(status, 400);
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["active", "limit", "offset"]);
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let app = TestApp::spawn().await;
    let path = "/api/members?limit=3&sortBy=lastName&sortOrder=asc&active=true";

    let strip = |mut body: Value| {
        body.as_object_mut().unwrap().remove("timestamp");
        body
    };
    let (_, first) = app.get_json(path).await;
    let (_, second) = app.get_json(path).await;
    assert_eq!(strip(first), strip(second));
}

#[tokio::test]
async fn page_overflowing_the_skip_range_is_a_client_error() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .get_json("/api/members?page=9223372036854775807&limit=100")
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"]["details"][0]["field"], "page");
}

#[tokio::test]
async fn validation_short_circuits_before_store() {
    let app = TestApp::spawn_with_store(Arc::new(MemoryMemberStore::unavailable())).await;

    for query in ["limit=0", "search=%20%20", "page=invalid", "active=maybe"] {
        let (status, body) = app.get_json(&format!("/api/members?{query}")).await;
        assert_eq!(status, 400, "{query}");
        assert_eq!(body["error"]["message"], "Invalid request parameters", "{query}");
    }
}
