mod common;

use community_hub::services::counters;
use serde_json::{json, Value};

async fn add_comment(
    app: &common::TestApp,
    post_id: i32,
    body: Value,
) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/posts/{}/comments", post_id)))
        .json(&body)
        .send()
        .await
        .unwrap()
}

async fn delete_comment(app: &common::TestApp, id: i64) -> reqwest::Response {
    app.client
        .delete(app.url(&format!("/comments/{}", id)))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn add_comment_returns_row_and_bumps_counter() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    let resp = add_comment(
        &app,
        post.post_id,
        json!({ "authorId": post.author, "content": "hi" }),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let data = common::data(resp).await;
    assert!(data["id"].as_i64().is_some());
    assert_eq!(data["postId"], post.post_id);
    assert_eq!(data["authorId"], post.author.as_str());
    assert_eq!(data["content"], "hi");
    assert!(data["createdAt"].is_string());
    assert!(data["parentCommentId"].is_null());

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap();
    let post_body = common::data(resp).await;
    assert_eq!(post_body["commentsCount"], 1);
}

#[tokio::test]
async fn add_and_delete_keep_count_equal_to_rows() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let resp = add_comment(
            &app,
            post.post_id,
            json!({ "authorId": post.author, "content": format!("comment {}", i) }),
        )
        .await;
        ids.push(common::data(resp).await["id"].as_i64().unwrap());
    }

    let deleted = common::data(delete_comment(&app, ids[1]).await).await;
    assert_eq!(deleted["postId"], post.post_id);
    assert_eq!(deleted["deletedCount"], 1);
    assert_eq!(deleted["commentsCount"], 2);

    let audit = counters::audit_post(app.db(), post.post_id).await.unwrap();
    assert!(audit.is_consistent());
    assert_eq!(audit.actual_comments, 2);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}/comments", post.post_id)))
        .send()
        .await
        .unwrap();
    let comments = common::data(resp).await;
    let comments = comments.as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["author"]["uid"], post.author.as_str());
}

#[tokio::test]
async fn deleting_missing_comment_changes_nothing() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    let resp = add_comment(
        &app,
        post.post_id,
        json!({ "authorId": post.author, "content": "keep me" }),
    )
    .await;
    common::data(resp).await;
    let before = common::post_counters(&app, post.post_id).await;

    let resp = delete_comment(&app, 987_654).await;
    assert_eq!(resp.status(), 404);

    assert_eq!(common::post_counters(&app, post.post_id).await, before);
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "commenter").await;

    let resp = add_comment(&app, 888_888, json!({ "authorId": user, "content": "hello" })).await;
    assert_eq!(resp.status(), 404);

    let rows = common::scalar(
        &app,
        "SELECT COUNT(*) FROM comments WHERE post_id = $1",
        888_888,
    )
    .await;
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn empty_author_or_content_is_rejected() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    let resp = add_comment(&app, post.post_id, json!({ "authorId": "", "content": "x" })).await;
    assert_eq!(resp.status(), 400);

    let resp = add_comment(
        &app,
        post.post_id,
        json!({ "authorId": post.author, "content": "   " }),
    )
    .await;
    assert_eq!(resp.status(), 400);

    assert_eq!(common::post_counters(&app, post.post_id).await.1, 0);
}

#[tokio::test]
async fn deleting_a_thread_removes_replies_and_decrements_by_all() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    let root = common::data(
        add_comment(
            &app,
            post.post_id,
            json!({ "authorId": post.author, "content": "root" }),
        )
        .await,
    )
    .await["id"]
        .as_i64()
        .unwrap();

    let reply = common::data(
        add_comment(
            &app,
            post.post_id,
            json!({ "authorId": post.author, "content": "reply", "parentCommentId": root }),
        )
        .await,
    )
    .await;
    assert_eq!(reply["parentCommentId"], root);

    common::data(
        add_comment(
            &app,
            post.post_id,
            json!({
                "authorId": post.author,
                "content": "nested",
                "parentCommentId": reply["id"],
            }),
        )
        .await,
    )
    .await;
    common::data(
        add_comment(
            &app,
            post.post_id,
            json!({ "authorId": post.author, "content": "unrelated" }),
        )
        .await,
    )
    .await;

    let deleted = common::data(delete_comment(&app, root).await).await;
    assert_eq!(deleted["deletedCount"], 3);
    assert_eq!(deleted["commentsCount"], 1);

    let audit = counters::audit_post(app.db(), post.post_id).await.unwrap();
    assert!(audit.is_consistent());
}

#[tokio::test]
async fn reply_to_comment_on_other_post_is_rejected() {
    let app = common::spawn_app().await;
    let first = common::create_test_post(&app).await;
    let second = common::create_test_post(&app).await;

    let parent = common::data(
        add_comment(
            &app,
            first.post_id,
            json!({ "authorId": first.author, "content": "on first" }),
        )
        .await,
    )
    .await["id"]
        .as_i64()
        .unwrap();

    let resp = add_comment(
        &app,
        second.post_id,
        json!({ "authorId": second.author, "content": "cross", "parentCommentId": parent }),
    )
    .await;
    assert_eq!(resp.status(), 400);

    assert_eq!(common::post_counters(&app, second.post_id).await.1, 0);
}

#[tokio::test]
async fn deleting_post_takes_its_comments_and_likes() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    common::data(
        add_comment(
            &app,
            post.post_id,
            json!({ "authorId": post.author, "content": "bye" }),
        )
        .await,
    )
    .await;
    common::data(
        app.client
            .post(app.url(&format!("/posts/{}/like", post.post_id)))
            .json(&json!({ "userId": post.author }))
            .send()
            .await
            .unwrap(),
    )
    .await;

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let comments = common::scalar(
        &app,
        "SELECT COUNT(*) FROM comments WHERE post_id = $1",
        post.post_id,
    )
    .await;
    let likes = common::scalar(
        &app,
        "SELECT COUNT(*) FROM likes WHERE post_id = $1",
        post.post_id,
    )
    .await;
    assert_eq!((comments, likes), (0, 0));

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}/comments", post.post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
