//! User listing and role management for admins.

#![allow(clippy::unwrap_used)]

use paratha_client::api::Pagination;
use paratha_client::{AdminApi, AdminError, App, AppError, SessionError};
use paratha_core::{Role, UserId};
use paratha_integration_tests::{TEST_TOKEN, TestContext, admin_user_json};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn signed_in(ctx: &TestContext, role: &str) -> App {
    ctx.mock_login(role).await;
    let app = ctx.app().await;
    app.start().await.unwrap();
    app.session()
        .login("asha@example.com", SecretString::from("hunter22"))
        .await
        .unwrap();
    app
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_paginated_listing() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .and(header("x-auth-token", TEST_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                admin_user_json("u1", "customer"),
                admin_user_json("u2", "business")
            ],
            "totalUsers": 22,
            "currentPage": 1,
            "totalPages": 11,
            "hasNextPage": true,
            "hasPrevPage": false
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut app = signed_in(&ctx, "admin").await;
    let users = app.load_users().await.unwrap();
    let roles: Vec<_> = users.iter().map(|u| u.role).collect();
    assert_eq!(roles, vec![Some(Role::Customer), Some(Role::Business)]);

    assert_eq!(
        app.admin().pagination(),
        &Pagination {
            total_users: 22,
            current_page: 1,
            total_pages: 11,
            has_next_page: true,
            has_prev_page: false,
        }
    );
}

#[tokio::test]
async fn test_bare_listing_is_one_page() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            admin_user_json("u1", "customer"),
            admin_user_json("u2", "delivery"),
            admin_user_json("u3", "superuser")
        ])))
        .mount(&ctx.server)
        .await;

    let api = paratha_client::ApiClient::new(&ctx.config()).unwrap();
    let page = api.list_users(&SecretString::from(TEST_TOKEN)).await.unwrap();

    assert_eq!(page.users.len(), 3);
    assert_eq!(page.users.last().unwrap().role, None);
    assert_eq!(page.pagination.total_users, 3);
    assert_eq!(page.pagination.total_pages, 1);
    assert!(!page.pagination.has_next_page);
}

#[tokio::test]
async fn test_non_admin_never_reaches_server() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let mut app = signed_in(&ctx, "customer").await;
    let err = app.load_users().await.unwrap_err();
    assert!(matches!(err, AppError::Admin(AdminError::NotAdmin)));

    let mut signed_out = ctx.app().await;
    let err = signed_out.load_users().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Session(SessionError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_server_refusal_is_reported() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "msg": "Admin access only" })),
        )
        .mount(&ctx.server)
        .await;

    let mut app = signed_in(&ctx, "admin").await;
    let err = app.load_users().await.unwrap_err();

    assert!(matches!(err, AppError::Admin(AdminError::Api(_))));
    assert_eq!(app.admin().error(), Some("Admin access only"));
    assert!(app.admin().users().is_empty());
}

// =============================================================================
// Changes
// =============================================================================

#[tokio::test]
async fn test_role_change_and_delete() {
    let ctx = TestContext::new().await;
    ctx.mock_logout(200).await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            admin_user_json("u1", "customer"),
            admin_user_json("u2", "customer")
        ])))
        .mount(&ctx.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/users/u1/role"))
        .and(body_json(json!({ "role": "business" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "msg": "User role updated",
            "user": admin_user_json("u1", "business")
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/admin/users/u2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "msg": "User removed" })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut app = signed_in(&ctx, "admin").await;
    app.load_users().await.unwrap();

    let updated = app
        .update_user_role(&UserId::new("u1"), Role::Business)
        .await
        .unwrap();
    assert_eq!(updated.role, Some(Role::Business));
    assert_eq!(
        app.admin().users().first().unwrap().role,
        Some(Role::Business)
    );

    app.delete_user(&UserId::new("u2")).await.unwrap();
    let ids: Vec<_> = app.admin().users().iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["u1"]);
    assert_eq!(app.admin().pagination().total_users, 1);

    app.logout().await.unwrap();
    assert!(app.admin().users().is_empty());
}
