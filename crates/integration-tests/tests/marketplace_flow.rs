//! End-to-end flows through the router over the in-memory gateway.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use sparepart_nexus_core::{Email, PartDraft, ProfileDraft};
use sparepart_nexus_integration_tests::{PASSWORD, TestApp};
use sparepart_nexus_web::gateway::{
    Gateway, GatewayOperation, InMemoryGateway, NewPartRow, ProfileRow,
};

// ============================================================================
// Root routing
// ============================================================================

#[tokio::test]
async fn test_anonymous_visitor_sees_auth_form() {
    let mut app = TestApp::new();

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("SparePart Nexus"));
    assert!(page.body.contains("action=\"/auth/login\""));
    assert!(page.body.contains("action=\"/auth/register\""));
    assert!(!page.body.contains("Sign Out"));
}

#[tokio::test]
async fn test_new_account_is_sent_to_profile_setup() {
    let mut app = TestApp::new();

    let page = app.sign_up("new@example.com").await;
    assert!(page.body.contains("Complete Your Profile"));
    assert!(page.body.contains("Retailer / Service Shop"));
    assert!(page.body.contains("new@example.com"));
    assert!(page.body.contains("Sign Out"));
}

#[tokio::test]
async fn test_setup_form_starts_with_no_role_chosen() {
    let mut app = TestApp::new();

    let page = app.sign_up("new@example.com").await;
    assert!(page.body.contains("Complete Your Profile"));
    assert!(!page.body.contains(" checked"));
    assert!(page.body.contains("Shop or Company Name"));
}

#[tokio::test]
async fn test_profile_without_role_is_rejected_inline() {
    let mut app = TestApp::new();
    app.sign_up("new@example.com").await;

    let page = app
        .post_form("/profile", &[("display_name", "Metro Auto Parts")])
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please fill out all fields."));
    assert!(page.body.contains("value=\"Metro Auto Parts\""));
    assert!(!page.body.contains(" checked"));
    assert_eq!(app.gateway.profile_count().await, 0);
}

#[tokio::test]
async fn test_incomplete_profile_is_rejected_inline() {
    let mut app = TestApp::new();
    app.sign_up("new@example.com").await;

    let page = app
        .post_form(
            "/profile",
            &[("role", "manufacturer"), ("display_name", "   ")],
        )
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Please fill out all fields."));
    assert!(page.body.contains("Company Name"));
    assert_eq!(app.gateway.profile_count().await, 0);
}

#[tokio::test]
async fn test_profile_setup_routes_to_dashboard() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    let page = app.get("/").await;
    assert!(page.body.contains("Welcome, Metro Auto Parts"));
    assert!(page.body.contains("Add New Part"));
    assert!(page.body.contains("You haven't listed any parts yet."));

    let mut buyer = app.new_browser();
    buyer
        .sign_up_manufacturer("buyer@example.com", "Acme Motors")
        .await;
    let page = buyer.get("/").await;
    assert!(page.body.contains("Welcome, Acme Motors"));
    assert!(page.body.contains("No parts found matching your criteria."));

    assert_eq!(app.gateway.profile_count().await, 2);
}

#[tokio::test]
async fn test_profile_row_sets_only_matching_name() {
    let mut app = TestApp::new();
    app.sign_up_manufacturer("buyer@example.com", "Acme Motors")
        .await;

    let session = app.gateway_session("buyer@example.com").await;
    let row = app.gateway.profile_row(session.user.id).await.unwrap();
    assert_eq!(row.role, "manufacturer");
    assert_eq!(row.company_name.as_deref(), Some("Acme Motors"));
    assert_eq!(row.shop_name, None);
}

#[tokio::test]
async fn test_unknown_role_shows_support_message() {
    let mut app = TestApp::new();
    app.sign_up("odd@example.com").await;

    let session = app.gateway_session("odd@example.com").await;
    app.gateway
        .upsert_profile(
            &session.access_token,
            &ProfileRow {
                id: session.user.id,
                role: "distributor".to_string(),
                shop_name: None,
                company_name: Some("Wholesale Co".to_string()),
            },
        )
        .await
        .unwrap();

    let page = app.get("/").await;
    assert!(page.body.contains("Unknown user role. Please contact support."));
}

#[tokio::test]
async fn test_profile_fetch_failure_falls_back_to_setup() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;
    app.gateway
        .fail_on(GatewayOperation::FetchProfile, "connection reset")
        .await;

    let page = app.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Complete Your Profile"));
    assert!(!page.body.contains("connection reset"));

    app.gateway.recover(GatewayOperation::FetchProfile).await;
    let page = app.get("/").await;
    assert!(page.body.contains("Welcome, Metro Auto Parts"));
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_wrong_password_shows_gateway_message() {
    let mut app = TestApp::new();
    app.sign_up("seller@example.com").await;
    let mut other = app.new_browser();

    other
        .post_form(
            "/auth/login",
            &[("email", "seller@example.com"), ("password", "nope-nope")],
        )
        .await
        .assert_redirect("/");
    let page = other.get("/").await;
    assert!(page.body.contains("Invalid login credentials"));
    assert!(page.body.contains("action=\"/auth/login\""));
}

#[tokio::test]
async fn test_sign_in_resumes_dashboard() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    let mut laptop = app.new_browser();
    laptop
        .post_form(
            "/auth/login",
            &[("email", "Seller@Example.com"), ("password", PASSWORD)],
        )
        .await
        .assert_redirect("/");
    let page = laptop.get("/").await;
    assert!(page.body.contains("Welcome, Metro Auto Parts"));
}

#[tokio::test]
async fn test_sign_up_with_confirmation() {
    let mut app = TestApp::with_gateway(InMemoryGateway::requiring_confirmation());

    app.post_form(
        "/auth/register",
        &[("email", "buyer@example.com"), ("password", PASSWORD)],
    )
    .await
    .assert_redirect("/");
    let page = app.get("/").await;
    assert!(page.body.contains("Check buyer@example.com for a confirmation link"));
    assert!(page.body.contains("action=\"/auth/login\""));

    app.post_form(
        "/auth/login",
        &[("email", "buyer@example.com"), ("password", PASSWORD)],
    )
    .await;
    let page = app.get("/").await;
    assert!(page.body.contains("Email not confirmed"));

    app.gateway
        .confirm(&Email::parse("buyer@example.com").unwrap())
        .await;
    app.post_form(
        "/auth/login",
        &[("email", "buyer@example.com"), ("password", PASSWORD)],
    )
    .await;
    let page = app.get("/").await;
    assert!(page.body.contains("Complete Your Profile"));
}

#[tokio::test]
async fn test_invalid_email_is_rejected_before_gateway() {
    let mut app = TestApp::new();

    app.post_form(
        "/auth/register",
        &[("email", "not-an-email"), ("password", PASSWORD)],
    )
    .await
    .assert_redirect("/");
    let page = app.get("/").await;
    assert!(page.body.contains("Please enter a valid email address."));
}

#[tokio::test]
async fn test_sign_out_returns_to_auth_form() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    app.post_form("/auth/logout", &[]).await.assert_redirect("/");
    let page = app.get("/").await;
    assert!(page.body.contains("action=\"/auth/login\""));
    assert!(!page.body.contains("seller@example.com"));
}

#[tokio::test]
async fn test_sign_out_failure_still_signs_out_locally() {
    let mut app = TestApp::new();
    app.sign_up("seller@example.com").await;
    app.gateway
        .fail_on(GatewayOperation::SignOut, "service unavailable")
        .await;

    app.post_form("/auth/logout", &[]).await.assert_redirect("/");
    let page = app.get("/").await;
    assert!(page.body.contains("Error signing out"));
    assert!(page.body.contains("action=\"/auth/login\""));
}

#[tokio::test]
async fn test_sign_out_is_not_rate_limited() {
    let mut app = TestApp::rate_limited();
    app.sign_up("seller@example.com").await;

    let mut limited = false;
    for _ in 0..10 {
        let attempt = app
            .post_form(
                "/auth/login",
                &[("email", "seller@example.com"), ("password", "wrong")],
            )
            .await;
        if attempt.status == StatusCode::TOO_MANY_REQUESTS {
            limited = true;
            break;
        }
    }
    assert!(limited, "sign-in attempts were never limited");

    app.post_form("/auth/logout", &[]).await.assert_redirect("/");
    let page = app.get("/").await;
    assert!(page.body.contains("action=\"/auth/login\""));
    assert!(!page.body.contains("seller@example.com"));
}

#[tokio::test]
async fn test_revoked_token_signs_out() {
    let mut app = TestApp::new();
    app.sign_up("seller@example.com").await;

    // Sign-out elsewhere revokes every token for the account.
    let session = app.gateway_session("seller@example.com").await;
    app.gateway.sign_out(&session.access_token).await.unwrap();

    let page = app.get("/").await;
    assert!(page.body.contains("action=\"/auth/login\""));
}

#[tokio::test]
async fn test_view_posts_require_a_session() {
    let mut app = TestApp::new();

    app.post_form("/parts", &[("part_name", "Brake Pad")])
        .await
        .assert_redirect("/");
    app.post_form("/profile", &[("role", "retailer"), ("display_name", "x")])
        .await
        .assert_redirect("/");
    app.post_form("/orders", &[("part_name", "Brake Pad")])
        .await
        .assert_redirect("/");
}

// ============================================================================
// Retailer
// ============================================================================

#[tokio::test]
async fn test_added_part_is_listed_with_success_notice() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    app.add_part("Brake Pad", "BP-100", "Civic 2020", "5", "29.99")
        .await
        .assert_redirect("/");

    let page = app.get("/").await;
    assert!(page.body.contains("Part added successfully!"));
    assert!(page.body.contains("Brake Pad"));
    assert!(page.body.contains("Model: Civic 2020 | Part #: BP-100"));
    assert!(page.body.contains("$29.99"));
    assert!(page.body.contains("Stock: 5"));
    assert!(!page.body.contains("You haven't listed any parts yet."));

    // Notice shows once; the form is back to its defaults.
    let page = app.get("/").await;
    assert!(!page.body.contains("Part added successfully!"));
    assert!(page.body.contains("value=\"1\""));
}

#[tokio::test]
async fn test_failed_relist_shows_success_and_error_notices() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    app.add_part("Brake Pad", "BP-100", "Civic 2020", "5", "29.99")
        .await
        .assert_redirect("/");
    app.gateway
        .fail_on(GatewayOperation::ListParts, "connection refused")
        .await;

    let page = app.get("/").await;
    assert!(page.body.contains("Part added successfully!"));
    assert!(page.body.contains("Error fetching parts: connection refused"));
    assert!(page.body.contains("You haven't listed any parts yet."));
}

#[tokio::test]
async fn test_part_without_number_shows_na() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    app.add_part("Wiper Blade", "", "Golf 2015", "2", "12")
        .await
        .assert_redirect("/");

    let page = app.get("/").await;
    assert!(page.body.contains("Part #: N/A"));
    assert!(page.body.contains("$12.00"));
}

#[tokio::test]
async fn test_invalid_part_keeps_form_values() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;

    let page = app
        .add_part("Brake Pad", "BP-100", "Civic 2020", "0", "29.99")
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Quantity must be a whole number of at least 1."));
    assert!(page.body.contains("value=\"Brake Pad\""));
    assert!(page.body.contains("value=\"Civic 2020\""));
    assert!(page.body.contains("You haven't listed any parts yet."));
}

#[tokio::test]
async fn test_insert_failure_shows_prefixed_message() {
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;
    app.gateway
        .fail_on(GatewayOperation::InsertPart, "permission denied")
        .await;

    let page = app
        .add_part("Brake Pad", "BP-100", "Civic 2020", "5", "29.99")
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Error adding part: permission denied"));
    assert!(page.body.contains("value=\"BP-100\""));
}

#[tokio::test]
async fn test_sellers_only_see_their_own_parts() {
    let mut first = TestApp::new();
    first
        .sign_up_retailer("first@example.com", "First Garage")
        .await;
    let mut second = first.new_browser();
    second
        .sign_up_retailer("second@example.com", "Second Garage")
        .await;

    first
        .add_part("Brake Pad", "BP-100", "Civic 2020", "5", "29.99")
        .await;
    second
        .add_part("Spark Plug", "SP-9", "Corolla 2018", "40", "4.50")
        .await;

    let page = first.get("/").await;
    assert!(page.body.contains("Brake Pad"));
    assert!(!page.body.contains("Spark Plug"));

    let page = second.get("/").await;
    assert!(page.body.contains("Spark Plug"));
    assert!(!page.body.contains("Brake Pad"));
}

#[tokio::test]
async fn test_manufacturer_cannot_add_parts() {
    let mut app = TestApp::new();
    app.sign_up_manufacturer("buyer@example.com", "Acme Motors")
        .await;

    app.add_part("Brake Pad", "BP-100", "Civic 2020", "5", "29.99")
        .await
        .assert_redirect("/");

    let mut seller = app.new_browser();
    seller
        .sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;
    let page = app.get("/").await;
    assert!(page.body.contains("No parts found matching your criteria."));
}

// ============================================================================
// Manufacturer
// ============================================================================

async fn stocked_catalog() -> (TestApp, TestApp) {
    let mut seller = TestApp::new();
    seller
        .sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;
    seller
        .add_part("Brake Pad", "BP-100", "Civic 2020", "5", "29.99")
        .await;
    seller
        .add_part("Oil Filter", "OF-7", "Corolla 2018", "3", "8.75")
        .await;

    let mut buyer = seller.new_browser();
    buyer
        .sign_up_manufacturer("buyer@example.com", "Acme Motors")
        .await;
    (seller, buyer)
}

#[tokio::test]
async fn test_catalog_lists_all_in_stock_parts_with_seller() {
    let (_seller, mut buyer) = stocked_catalog().await;

    let page = buyer.get("/").await;
    assert!(page.body.contains("Brake Pad"));
    assert!(page.body.contains("Oil Filter"));
    assert!(page.body.contains("Seller: Metro Auto Parts"));
    assert!(page.body.contains("$8.75"));
    assert!(page.body.contains("Stock: 3"));

    // Newest first.
    let oil = page.body.find("Oil Filter").unwrap();
    let brake = page.body.find("Brake Pad").unwrap();
    assert!(oil < brake);
}

#[tokio::test]
async fn test_search_matches_vehicle_model() {
    let (_seller, mut buyer) = stocked_catalog().await;

    let page = buyer.get("/?q=Civic").await;
    assert!(page.body.contains("Brake Pad"));
    assert!(page.body.contains("Seller: Metro Auto Parts"));
    assert!(!page.body.contains("Oil Filter"));
    assert!(page.body.contains("value=\"Civic\""));

    let page = buyer.get("/?q=brake").await;
    assert!(page.body.contains("Brake Pad"));
    assert!(!page.body.contains("Oil Filter"));

    let page = buyer.get("/?q=of-7").await;
    assert!(page.body.contains("Oil Filter"));
    assert!(!page.body.contains("Brake Pad"));

    let page = buyer.get("/?q=tesla").await;
    assert!(page.body.contains("No parts found matching your criteria."));
}

#[tokio::test]
async fn test_out_of_stock_parts_are_hidden() {
    let (seller, mut buyer) = stocked_catalog().await;

    let session = seller.gateway_session("seller@example.com").await;
    let part = PartDraft {
        part_name: "Timing Belt".to_string(),
        vehicle_model: "Civic 2020".to_string(),
        ..PartDraft::default()
    }
    .validate()
    .unwrap();
    let mut row = NewPartRow::new(session.user.id, part);
    row.quantity = 0;
    seller
        .gateway
        .insert_part(&session.access_token, &row)
        .await
        .unwrap();

    let page = buyer.get("/?q=Civic").await;
    assert!(page.body.contains("Brake Pad"));
    assert!(!page.body.contains("Timing Belt"));
}

#[tokio::test]
async fn test_seller_without_shop_name_is_unknown() {
    let mut seller = TestApp::new();
    seller.sign_up("seller@example.com").await;

    // Arrange a listing from an account that never set up a retailer profile.
    let session = seller.gateway_session("seller@example.com").await;
    let part = PartDraft {
        part_name: "Head Gasket".to_string(),
        vehicle_model: "Golf 2015".to_string(),
        ..PartDraft::default()
    }
    .validate()
    .unwrap();
    seller
        .gateway
        .insert_part(
            &session.access_token,
            &NewPartRow::new(session.user.id, part),
        )
        .await
        .unwrap();

    let mut buyer = seller.new_browser();
    buyer
        .sign_up_manufacturer("buyer@example.com", "Acme Motors")
        .await;
    let page = buyer.get("/").await;
    assert!(page.body.contains("Head Gasket"));
    assert!(page.body.contains("Seller: Unknown"));
}

#[tokio::test]
async fn test_search_failure_shows_notice_and_empty_list() {
    let (seller, mut buyer) = stocked_catalog().await;
    seller
        .gateway
        .fail_on(GatewayOperation::SearchParts, "statement timeout")
        .await;

    let page = buyer.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Error fetching parts: statement timeout"));
    assert!(page.body.contains("No parts found matching your criteria."));
}

#[tokio::test]
async fn test_order_notice_and_search_failure_both_show() {
    let (seller, mut buyer) = stocked_catalog().await;

    buyer
        .post_form("/orders", &[("part_name", "Brake Pad")])
        .await
        .assert_redirect("/");
    seller
        .gateway
        .fail_on(GatewayOperation::SearchParts, "statement timeout")
        .await;

    let page = buyer.get("/").await;
    assert!(page.body.contains("Order feature coming soon for"));
    assert!(page.body.contains("Error fetching parts: statement timeout"));
    assert!(page.body.contains("No parts found matching your criteria."));
}

#[tokio::test]
async fn test_place_order_is_a_notice_only() {
    let (seller, mut buyer) = stocked_catalog().await;

    buyer
        .post_form("/orders", &[("part_name", "Brake Pad"), ("q", "Civic")])
        .await
        .assert_redirect("/?q=Civic");

    let page = buyer.get("/?q=Civic").await;
    assert!(page.body.contains("Order feature coming soon for"));
    assert!(page.body.contains("notice-info"));

    // Stock is unchanged.
    let session = seller.gateway_session("seller@example.com").await;
    let parts = seller
        .gateway
        .list_parts_by_seller(&session.access_token, session.user.id)
        .await
        .unwrap();
    assert!(parts.iter().any(|p| p.part_name == "Brake Pad" && p.quantity == 5));
}

// ============================================================================
// Example listing
// ============================================================================

#[tokio::test]
async fn test_brake_pad_example() {
    let (seller, mut buyer) = stocked_catalog().await;

    let session = seller.gateway_session("seller@example.com").await;
    let own = seller
        .gateway
        .list_parts_by_seller(&session.access_token, session.user.id)
        .await
        .unwrap();
    assert_eq!(
        own.iter().filter(|p| p.part_name == "Brake Pad").count(),
        1
    );

    let page = buyer.get("/?q=Civic").await;
    assert_eq!(page.body.matches("<h3>Brake Pad</h3>").count(), 1);
    assert!(page.body.contains("Seller: Metro Auto Parts"));
}

// ============================================================================
// Surface
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::new();

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);

    app.gateway
        .fail_on(GatewayOperation::Ping, "connection refused")
        .await;
    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!ready.body.contains("connection refused"));
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let mut app = TestApp::new();

    let page = app.get("/").await;
    assert_eq!(page.headers.get("x-frame-options").unwrap(), "DENY");
    assert!(
        page.headers
            .get("content-security-policy")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("script-src 'none'")
    );
    assert!(page.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_stylesheet_is_served() {
    let mut app = TestApp::new();

    let css = app.get("/static/css/main.css").await;
    assert_eq!(css.status, StatusCode::OK);
    assert!(css.body.contains(".notice-success"));
}

#[tokio::test]
async fn test_profile_draft_matches_router_row() {
    // The setup form and a direct upsert write the same row.
    let mut app = TestApp::new();
    app.sign_up_retailer("seller@example.com", "Metro Auto Parts")
        .await;
    let session = app.gateway_session("seller@example.com").await;

    let expected = ProfileRow::from_draft(
        session.user.id,
        &ProfileDraft::parse("retailer", "Metro Auto Parts").unwrap(),
    );
    assert_eq!(app.gateway.profile_row(session.user.id).await, Some(expected));
}
