mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn user_upsert_updates_profile_but_keeps_role() {
    let app = common::spawn_app().await;
    let uid = common::create_test_user(&app, "profile").await;

    sea_orm::ConnectionTrait::execute(
        app.db(),
        sea_orm::Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE users SET role = 'admin' WHERE uid = $1",
            vec![uid.clone().into()],
        ),
    )
    .await
    .unwrap();

    let resp = app
        .client
        .post(app.url("/users"))
        .json(&json!({
            "uid": uid,
            "email": "new@test.com",
            "displayName": "Renamed",
            "photoURL": "https://img.test/me.png",
        }))
        .send()
        .await
        .unwrap();
    let user = common::data(resp).await;
    assert_eq!(user["displayName"], "Renamed");
    assert_eq!(user["photoURL"], "https://img.test/me.png");
    assert_eq!(user["role"], "admin");

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", uid)))
        .send()
        .await
        .unwrap();
    assert_eq!(common::data(resp).await["email"], "new@test.com");
}

#[tokio::test]
async fn new_users_default_to_member() {
    let app = common::spawn_app().await;
    let uid = common::create_test_user(&app, "newbie").await;

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", uid)))
        .send()
        .await
        .unwrap();
    assert_eq!(common::data(resp).await["role"], "member");

    let resp = app
        .client
        .get(app.url("/users/nobody_at_all"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn duplicate_category_is_conflict() {
    let app = common::spawn_app().await;
    let name = common::unique("dup");

    let resp = app
        .client
        .post(app.url("/categories"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = app
        .client
        .post(app.url("/categories"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = app.client.get(app.url("/categories")).send().await.unwrap();
    let categories = common::data(resp).await;
    let matching = categories
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["name"] == name.as_str())
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn post_crud_round() {
    let app = common::spawn_app().await;
    let post = common::create_test_post(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}", post.post_id)))
        .json(&json!({ "content": "Edited", "isPinned": true }))
        .send()
        .await
        .unwrap();
    let updated = common::data(resp).await;
    assert_eq!(updated["content"], "Edited");
    assert_eq!(updated["isPinned"], true);
    assert_eq!(updated["likes"], 0);

    let resp = app
        .client
        .put(app.url(&format!("/posts/{}", post.post_id)))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .get(app.url(&format!("/posts/{}", post.post_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn post_with_unknown_community_is_bad_request() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "lost").await;
    let category_id = common::create_test_category(&app).await;

    let resp = app
        .client
        .post(app.url("/posts"))
        .json(&json!({
            "authorId": author,
            "communityId": 313131,
            "categoryId": category_id,
            "title": "Nowhere",
            "content": "x",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .post(app.url("/posts"))
        .json(&json!({ "authorId": author, "title": "No community", "content": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn community_feed_is_pinned_first_with_authors() {
    let app = common::spawn_app().await;
    let author = common::create_test_user(&app, "poster").await;
    let community_id = common::create_test_community(&app).await;
    let category_id = common::create_test_category(&app).await;

    let mut ids = Vec::new();
    for (title, pinned) in [("old pinned", true), ("middle", false), ("newest", false)] {
        let resp = app
            .client
            .post(app.url("/posts"))
            .json(&json!({
                "authorId": author,
                "communityId": community_id,
                "categoryId": category_id,
                "title": title,
                "content": "body",
                "isPinned": pinned,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        ids.push(common::data(resp).await["id"].as_i64().unwrap());
    }

    let resp = app
        .client
        .get(app.url(&format!(
            "/communities/{}/posts?page=1&per_page=2",
            community_id
        )))
        .send()
        .await
        .unwrap();
    let page = common::data(resp).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);

    let items = page["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], ids[0]);
    assert_eq!(items[1]["id"], ids[2]);
    assert_eq!(items[0]["author"]["uid"], author.as_str());
    assert_eq!(items[0]["author"]["role"], "member");
    assert!(items[0]["category"].is_string());

    let resp = app
        .client
        .get(app.url("/communities/919191/posts"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn community_feed_rejects_unaddressable_page() {
    let app = common::spawn_app().await;
    let community_id = common::create_test_community(&app).await;

    let resp = app
        .client
        .get(app.url(&format!(
            "/communities/{}/posts?page=9223372036854775807&per_page=100",
            community_id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("out of range"));
}

#[tokio::test]
async fn membership_toggle_tracks_member_count() {
    let app = common::spawn_app().await;
    let community_id = common::create_test_community(&app).await;
    let first = common::create_test_user(&app, "member").await;
    let second = common::create_test_user(&app, "member").await;

    let toggle = |user: String| {
        let client = app.client.clone();
        let url = app.url(&format!("/communities/{}/membership", community_id));
        async move {
            client
                .post(url)
                .json(&json!({ "userId": user }))
                .send()
                .await
                .unwrap()
        }
    };

    let joined = common::data(toggle(first.clone()).await).await;
    assert_eq!(joined["action"], "joined");
    assert_eq!(joined["memberCount"], 1);

    let joined = common::data(toggle(second.clone()).await).await;
    assert_eq!(joined["memberCount"], 2);

    let left = common::data(toggle(first).await).await;
    assert_eq!(left["action"], "left");
    assert_eq!(left["memberCount"], 1);

    let resp = app
        .client
        .get(app.url(&format!("/communities/{}", community_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(common::data(resp).await["memberCount"], 1);

    let resp = app
        .client
        .post(app.url("/communities/828282/membership"))
        .json(&json!({ "userId": second }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn errors_use_error_body_and_hide_internals() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/posts/123456789"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(!message.to_lowercase().contains("select"));
}

#[tokio::test]
async fn security_headers_are_set() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/categories")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.headers()["cache-control"], "no-store");
}
