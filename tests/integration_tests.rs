use axum::http::{header, StatusCode};
use patient_shop::{build_router, utils::config::AppConfig, AppState};
use serde_json::json;

mod common;
use common::*;

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app().await;

    for uri in ["/health", "/api/health"] {
        let response = send(&app.router, empty_request("GET", uri, None)).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "ok");
        assert!(response.body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_api_path_returns_json_404() {
    let app = setup_test_app().await;

    let response = send(&app.router, empty_request("GET", "/api/does-not-exist", None)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Not found");
}

#[tokio::test]
async fn test_register_login_session_logout() {
    let app = setup_test_app().await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "Reader@Example.com", "name": "Reader", "password": "long-enough" }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["email"], "reader@example.com");
    assert_eq!(response.body["user"]["role"], "member");
    assert!(response.body["user"].get("passwordHash").is_none());

    let cookie = login(&app.router, "reader@example.com", "long-enough").await;

    let session = send(&app.router, empty_request("GET", "/api/auth/session", Some(&cookie))).await;
    assert_eq!(session.status, StatusCode::OK);
    assert_eq!(session.body["user"]["name"], "Reader");

    let logout = send(&app.router, empty_request("POST", "/api/auth/logout", Some(&cookie))).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.cookie("session_id").as_deref(), Some("session_id="));

    let session = send(&app.router, empty_request("GET", "/api/auth/session", Some(&cookie))).await;
    assert_eq!(session.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_invalid_input() {
    let app = setup_test_app().await;

    let short_password = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": "a@example.com", "name": "A", "password": "short" }),
        ),
    )
    .await;
    assert_eq!(short_password.status, StatusCode::BAD_REQUEST);

    let duplicate = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "email": ADMIN_EMAIL, "name": "Copy", "password": "long-enough" }),
        ),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = setup_test_app().await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": ADMIN_EMAIL, "password": "not-the-password" }),
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.cookie("session_id").is_none());
}

#[tokio::test]
async fn test_admin_api_requires_admin_session() {
    let app = setup_test_app().await;

    let anonymous = send(&app.router, empty_request("GET", "/api/admin/hero-images", None)).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let member = register_member(&app.router, "member@example.com").await;
    let forbidden = send(
        &app.router,
        empty_request("GET", "/api/admin/hero-images", Some(&member)),
    )
    .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let admin = login_admin(&app.router).await;
    let allowed = send(
        &app.router,
        empty_request("GET", "/api/admin/hero-images", Some(&admin)),
    )
    .await;
    assert_eq!(allowed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = setup_test_app().await;

    let response = send(&app.router, empty_request("GET", "/mypage/orders", None)).await;
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers.get(header::LOCATION).unwrap(),
        "/login?callbackUrl=/mypage/orders"
    );

    let member = register_member(&app.router, "member@example.com").await;
    let page = send(&app.router, empty_request("GET", "/mypage/orders", Some(&member))).await;
    assert_eq!(page.status, StatusCode::OK);

    let admin_page = send(&app.router, empty_request("GET", "/admin", Some(&member))).await;
    assert_eq!(admin_page.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(admin_page.headers.get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn test_prefix_match_respects_segment_boundary() {
    let app = setup_test_app().await;

    // "/administration" is not under "/admin"
    let response = send(&app.router, empty_request("GET", "/administration", None)).await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_my_profile() {
    let app = setup_test_app().await;

    let anonymous = send(&app.router, empty_request("GET", "/api/mypage/profile", None)).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let member = register_member(&app.router, "member@example.com").await;
    let response = send(
        &app.router,
        empty_request("GET", "/api/mypage/profile", Some(&member)),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["profile"]["email"], "member@example.com");
    assert_eq!(response.body["profile"]["capabilities"]["canComment"], true);
    assert_eq!(response.body["profile"]["capabilities"]["canUpload"], false);
}

#[tokio::test]
async fn test_hero_image_lifecycle() {
    let app = setup_test_app().await;
    let admin = login_admin(&app.router).await;

    let created = send(
        &app.router,
        json_request(
            "POST",
            "/api/admin/hero-images",
            Some(&admin),
            json!({ "title": "Spring", "imageUrl": "/uploads/2026/04/a.png", "sortOrder": 2 }),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["heroImage"]["id"].as_str().unwrap().to_string();

    let hidden = send(
        &app.router,
        json_request(
            "POST",
            "/api/admin/hero-images",
            Some(&admin),
            json!({ "title": "Draft", "imageUrl": "/b.png", "isActive": false }),
        ),
    )
    .await;
    assert_eq!(hidden.status, StatusCode::CREATED);

    let public = send(&app.router, empty_request("GET", "/api/hero-images", None)).await;
    assert_eq!(public.body["total"], 1);
    assert_eq!(public.body["heroImages"][0]["title"], "Spring");

    let patched = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/api/admin/hero-images/{}", id),
            Some(&admin),
            json!({ "title": "Summer" }),
        ),
    )
    .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["heroImage"]["title"], "Summer");
    assert_eq!(patched.body["heroImage"]["sortOrder"], 2);

    let replaced = send(
        &app.router,
        json_request(
            "PUT",
            &format!("/api/admin/hero-images/{}", id),
            Some(&admin),
            json!({ "title": "Autumn", "imageUrl": "https://cdn.example.com/c.png" }),
        ),
    )
    .await;
    assert_eq!(replaced.status, StatusCode::OK);
    assert_eq!(replaced.body["heroImage"]["sortOrder"], 0);

    let deleted = send(
        &app.router,
        empty_request("DELETE", &format!("/api/admin/hero-images/{}", id), Some(&admin)),
    )
    .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let missing = send(
        &app.router,
        empty_request("GET", &format!("/api/hero-images/{}", id), None),
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_hero_image_validation() {
    let app = setup_test_app().await;
    let admin = login_admin(&app.router).await;

    let blank_title = send(
        &app.router,
        json_request(
            "POST",
            "/api/admin/hero-images",
            Some(&admin),
            json!({ "title": "  ", "imageUrl": "/a.png" }),
        ),
    )
    .await;
    assert_eq!(blank_title.status, StatusCode::BAD_REQUEST);
    assert_eq!(blank_title.body["message"], "title is required");

    let bad_url = send(
        &app.router,
        json_request(
            "POST",
            "/api/admin/hero-images",
            Some(&admin),
            json!({ "title": "T", "imageUrl": "javascript:alert(1)" }),
        ),
    )
    .await;
    assert_eq!(bad_url.status, StatusCode::BAD_REQUEST);

    let bad_id = send(&app.router, empty_request("GET", "/api/hero-images/not-a-uuid", None)).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_ownership() {
    let app = setup_test_app().await;
    let author = register_member(&app.router, "author@example.com").await;
    let other = register_member(&app.router, "other@example.com").await;
    let admin = login_admin(&app.router).await;

    let anonymous = send(
        &app.router,
        json_request(
            "POST",
            "/api/comments",
            None,
            json!({ "postSlug": "living-with-diabetes", "body": "Helpful" }),
        ),
    )
    .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let created = send(
        &app.router,
        json_request(
            "POST",
            "/api/comments",
            Some(&author),
            json!({ "postSlug": "living-with-diabetes", "body": "Helpful" }),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["comment"]["id"].as_str().unwrap().to_string();

    let stolen = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/api/comments/{}", id),
            Some(&other),
            json!({ "body": "Edited by someone else" }),
        ),
    )
    .await;
    assert_eq!(stolen.status, StatusCode::FORBIDDEN);

    let edited = send(
        &app.router,
        json_request(
            "PATCH",
            &format!("/api/comments/{}", id),
            Some(&author),
            json!({ "body": "Very helpful" }),
        ),
    )
    .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["comment"]["body"], "Very helpful");

    let listed = send(
        &app.router,
        empty_request("GET", "/api/comments?post=living-with-diabetes", None),
    )
    .await;
    assert_eq!(listed.body["total"], 1);

    let removed = send(
        &app.router,
        empty_request("DELETE", &format!("/api/comments/{}", id), Some(&admin)),
    )
    .await;
    assert_eq!(removed.status, StatusCode::OK);

    let gone = send(
        &app.router,
        empty_request("DELETE", &format!("/api/comments/{}", id), Some(&admin)),
    )
    .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_listing_requires_post() {
    let app = setup_test_app().await;

    let response = send(&app.router, empty_request("GET", "/api/comments", None)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_password_change_revokes_other_sessions() {
    let app = setup_test_app().await;
    let current = login_admin(&app.router).await;
    let other = login_admin(&app.router).await;

    let wrong_current = send(
        &app.router,
        json_request(
            "PUT",
            "/api/admin/password",
            Some(&current),
            json!({ "currentPassword": "wrong-password", "newPassword": "brand-new-password" }),
        ),
    )
    .await;
    assert_eq!(wrong_current.status, StatusCode::BAD_REQUEST);

    let changed = send(
        &app.router,
        json_request(
            "PUT",
            "/api/admin/password",
            Some(&current),
            json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "brand-new-password" }),
        ),
    )
    .await;
    assert_eq!(changed.status, StatusCode::OK);

    let still_signed_in =
        send(&app.router, empty_request("GET", "/api/auth/session", Some(&current))).await;
    assert_eq!(still_signed_in.status, StatusCode::OK);

    let revoked = send(&app.router, empty_request("GET", "/api/auth/session", Some(&other))).await;
    assert_eq!(revoked.status, StatusCode::UNAUTHORIZED);

    login(&app.router, ADMIN_EMAIL, "brand-new-password").await;
}

#[tokio::test]
async fn test_admin_account_update_refreshes_session() {
    let app = setup_test_app().await;
    let admin = login_admin(&app.router).await;

    let updated = send(
        &app.router,
        json_request(
            "PUT",
            "/api/admin/account",
            Some(&admin),
            json!({ "name": "Head Pharmacist" }),
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["account"]["email"], ADMIN_EMAIL);

    let session = send(&app.router, empty_request("GET", "/api/auth/session", Some(&admin))).await;
    assert_eq!(session.body["user"]["name"], "Head Pharmacist");
}

#[tokio::test]
async fn test_payment_config() {
    let app = setup_test_app().await;
    let missing = send(&app.router, empty_request("GET", "/api/payment/config", None)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let app = setup_test_app_with(|config| {
        config.payment_client_key = Some("test_ck_123".to_string());
        config.base_url = "https://shop.example.com".to_string();
    })
    .await;
    let response = send(&app.router, empty_request("GET", "/api/payment/config", None)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["clientKey"], "test_ck_123");
    assert_eq!(
        response.body["successUrl"],
        "https://shop.example.com/checkout/success"
    );
}

#[tokio::test]
async fn test_data_survives_restart_with_data_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = AppConfig {
        upload_dir: temp_dir.path().join("uploads").to_str().unwrap().to_string(),
        cart_dir: temp_dir.path().join("carts").to_str().unwrap().to_string(),
        data_file: Some(temp_dir.path().join("data.json").to_str().unwrap().to_string()),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        ..AppConfig::default()
    };

    let first = build_router(AppState::new(config.clone()).await.unwrap());
    let admin = login_admin(&first).await;
    let created = send(
        &first,
        json_request(
            "POST",
            "/api/admin/hero-images",
            Some(&admin),
            json!({ "title": "Persisted", "imageUrl": "/a.png" }),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let second = build_router(AppState::new(config).await.unwrap());
    let listed = send(&second, empty_request("GET", "/api/hero-images", None)).await;
    assert_eq!(listed.body["heroImages"][0]["title"], "Persisted");

    // Sessions are not persisted
    let session = send(&second, empty_request("GET", "/api/auth/session", Some(&admin))).await;
    assert_eq!(session.status, StatusCode::UNAUTHORIZED);
}
