use booru_comments::authorization::UserRank;
use serde_json::Value;

use crate::helpers::spawn_app;

// ============================================================================
// Create Comment
// ============================================================================

#[tokio::test]
async fn create_comment_returns_201_for_valid_input() {
    let app = spawn_app().await;
    let post_id = app.create_post().await;

    let payload = serde_json::json!({ "text": "  First!  ", "postId": post_id });
    let response = app.post_comment(&payload, Some(&app.regular_user)).await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    let comment = &body["comment"];
    assert_eq!(comment["postId"], post_id);
    assert_eq!(comment["text"], "First!");
    assert_eq!(comment["version"], 1);
    assert_eq!(comment["score"], 0);
    assert_eq!(comment["ownScore"], 0);
    assert_eq!(comment["lastEditTime"], Value::Null);
    assert_eq!(comment["user"]["name"], app.regular_user.user_name.as_str());
    assert_eq!(comment["user"]["rank"], "regular");
}

#[tokio::test]
async fn create_comment_persists_the_comment() {
    let app = spawn_app().await;
    let comment = app.create_comment("stored", &app.regular_user).await;

    let (text, user_id) = sqlx::query_as::<_, (String, Option<i64>)>(
        "SELECT text, user_id FROM comments WHERE id = $1",
    )
    .bind(comment["id"].as_i64().unwrap())
    .fetch_one(&app.db_pool)
    .await
    .expect("Failed to fetch saved comment.");

    assert_eq!(text, "stored");
    assert_eq!(user_id, Some(app.regular_user.user_id));
}

#[tokio::test]
async fn create_comment_returns_400_for_invalid_input() {
    let app = spawn_app().await;
    let post_id = app.create_post().await;

    let test_cases = vec![
        (serde_json::json!({ "text": "", "postId": post_id }), "empty text"),
        (serde_json::json!({ "text": "   ", "postId": post_id }), "whitespace text"),
        (
            serde_json::json!({ "text": "a".repeat(5001), "postId": post_id }),
            "text too long",
        ),
        (serde_json::json!({ "postId": post_id }), "missing text"),
        (serde_json::json!({ "text": "hello" }), "missing post id"),
        (serde_json::json!({ "text": "hello", "postId": "abc" }), "non-numeric post id"),
    ];

    for (payload, description) in test_cases {
        let response = app.post_comment(&payload, Some(&app.regular_user)).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 when the payload had {description}."
        );

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], 400);
        assert!(body["message"].is_string());
    }

    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn create_comment_returns_404_for_missing_post() {
    let app = spawn_app().await;

    for post_id in [999_999, 0, -1] {
        let payload = serde_json::json!({ "text": "hello", "postId": post_id });
        let response = app.post_comment(&payload, Some(&app.regular_user)).await;

        assert_eq!(
            response.status().as_u16(),
            404,
            "The API did not fail with 404 for post id {post_id}."
        );
    }

    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn create_comment_returns_403_for_anonymous_clients() {
    let app = spawn_app().await;
    let post_id = app.create_post().await;

    let payload = serde_json::json!({ "text": "hello", "postId": post_id });
    let response = app.post_comment(&payload, None).await;

    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(app.comment_count().await, 0);
}

#[tokio::test]
async fn create_comment_is_denied_before_the_payload_is_validated() {
    let app = spawn_app().await;
    let restricted = app.create_user(UserRank::Restricted).await;

    let response = app
        .post_comment(&serde_json::json!({ "text": "" }), Some(&restricted))
        .await;

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn wrong_credentials_are_rejected_with_401() {
    let app = spawn_app().await;
    let post_id = app.create_post().await;

    let response = app
        .api_client
        .post(format!("{}/api/comments", app.address))
        .basic_auth(&app.regular_user.user_name, Some("not-the-password"))
        .json(&serde_json::json!({ "text": "hello", "postId": post_id }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(app.comment_count().await, 0);
}

// ============================================================================
// List Comments
// ============================================================================

#[tokio::test]
async fn list_comments_returns_newest_first_with_metadata() {
    let app = spawn_app().await;
    let first = app.create_comment("first", &app.regular_user).await;
    let second = app.create_comment("second", &app.regular_user).await;

    let response = app.list_comments(&[], Some(&app.regular_user)).await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["query"], "");
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["id"], second["id"]);
    assert_eq!(comments[1]["id"], first["id"]);

    let metadata = &body["metadata"];
    assert_eq!(metadata["currentPage"], 1);
    assert_eq!(metadata["pageSize"], 20);
    assert_eq!(metadata["lastPage"], 1);
    assert_eq!(metadata["totalRecords"], 2);
}

#[tokio::test]
async fn list_comments_pages_through_results() {
    let app = spawn_app().await;
    for i in 0..5 {
        app.create_comment(&format!("comment {i}"), &app.regular_user)
            .await;
    }

    let response = app
        .list_comments(&[("page", "2"), ("limit", "2")], Some(&app.regular_user))
        .await;
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["comments"].as_array().unwrap().len(), 2);
    assert_eq!(body["metadata"]["currentPage"], 2);
    assert_eq!(body["metadata"]["lastPage"], 3);
    assert_eq!(body["metadata"]["totalRecords"], 5);
}

#[tokio::test]
async fn list_comments_filters_by_search_query() {
    let app = spawn_app().await;
    let other = app.create_user(UserRank::Regular).await;
    let kept = app.create_comment("I like cats", &app.regular_user).await;
    app.create_comment("I like dogs", &app.regular_user).await;
    app.create_comment("cats are fine", &other).await;

    let query = format!("*cats* user:{}", app.regular_user.user_name);
    let response = app
        .list_comments(&[("query", query.as_str())], Some(&app.regular_user))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["query"], query.as_str());
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], kept["id"]);
}

#[tokio::test]
async fn list_comments_sorts_by_requested_field() {
    let app = spawn_app().await;
    let first = app.create_comment("first", &app.regular_user).await;
    let second = app.create_comment("second", &app.regular_user).await;

    let response = app
        .list_comments(&[("query", "sort:id,asc")], Some(&app.regular_user))
        .await;
    let body: Value = response.json().await.unwrap();
    let comments = body["comments"].as_array().unwrap();

    assert_eq!(comments[0]["id"], first["id"]);
    assert_eq!(comments[1]["id"], second["id"]);
}

#[tokio::test]
async fn list_comments_returns_400_for_malformed_queries() {
    let app = spawn_app().await;

    let test_cases = vec![
        vec![("query", "colour:red")],
        vec![("query", "id:abc")],
        vec![("query", "sort:colour")],
        vec![("page", "0")],
        vec![("limit", "101")],
        vec![("limit", "many")],
    ];

    for query in test_cases {
        let response = app.list_comments(&query, Some(&app.regular_user)).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 for {query:?}."
        );
    }
}

#[tokio::test]
async fn list_comments_returns_403_for_anonymous_clients() {
    let app = spawn_app().await;

    let response = app.list_comments(&[], None).await;
    assert_eq!(response.status().as_u16(), 403);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], 403);
}

#[tokio::test]
async fn list_comments_filters_by_time() {
    let app = spawn_app().await;
    let edited = app.create_comment("edited", &app.regular_user).await;
    let untouched = app.create_comment("untouched", &app.regular_user).await;
    app.put_comment(
        edited["id"].as_i64().unwrap(),
        &serde_json::json!({ "text": "edited again" }),
        Some(&app.regular_user),
    )
    .await;

    let ids = |body: Value| -> Vec<Value> {
        body["comments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].clone())
            .collect()
    };

    let response = app
        .list_comments(&[("query", "edit-date:today")], Some(&app.regular_user))
        .await;
    assert_eq!(ids(response.json().await.unwrap()), vec![edited["id"].clone()]);

    // never edited comments count as not edited today
    let response = app
        .list_comments(&[("query", "-edit-date:today")], Some(&app.regular_user))
        .await;
    assert_eq!(ids(response.json().await.unwrap()), vec![untouched["id"].clone()]);

    let response = app
        .list_comments(&[("query", "creation-date:..2000")], Some(&app.regular_user))
        .await;
    assert!(ids(response.json().await.unwrap()).is_empty());

    let response = app
        .list_comments(&[("query", "creation-date:2000..")], Some(&app.regular_user))
        .await;
    assert_eq!(ids(response.json().await.unwrap()).len(), 2);
}

#[tokio::test]
async fn list_comments_supports_random_order() {
    let app = spawn_app().await;
    for i in 0..3 {
        app.create_comment(&format!("comment {i}"), &app.regular_user)
            .await;
    }

    let response = app
        .list_comments(&[("query", "sort:random sort:id")], Some(&app.regular_user))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["comments"].as_array().unwrap().len(), 3);
    assert_eq!(body["metadata"]["totalRecords"], 3);
}

#[tokio::test]
async fn list_comments_matches_escaped_colons_literally() {
    let app = spawn_app().await;
    let kept = app
        .create_comment("see http://example.org", &app.regular_user)
        .await;
    app.create_comment("see example.org", &app.regular_user).await;

    let response = app
        .list_comments(&[("query", r"*http\://example.org*")], Some(&app.regular_user))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = response.json().await.unwrap();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], kept["id"]);
}
