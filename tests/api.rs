use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use budgetpro::{app::build_app, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_router() -> Router {
    build_app(AppState::fake())
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Ann Example", "email": email, "password": "Passw0rdX" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["tokens"]["accessToken"].as_str().unwrap().to_string(),
        body["tokens"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let app = test_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = test_router();
    for uri in [
        "/api/v1/categories",
        "/api/v1/transactions",
        "/api/v1/budgets",
        "/api/v1/reports/monthly",
        "/api/v1/users/profile",
    ] {
        let (status, body) = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["kind"], "missing_token");
    }

    let (status, body) = call(&app, Method::GET, "/api/v1/categories", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid");
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = test_router();
    let (access, refresh) = register(&app, "ann@example.com").await;

    let (status, _) = call(&app, Method::GET, "/api/v1/auth/profile", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refreshToken": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tokens"]["accessToken"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/auth/refresh",
        None,
        Some(json!({ "refreshToken": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid");
}

#[tokio::test]
async fn login_failures_look_identical() {
    let app = test_router();
    register(&app, "ann@example.com").await;

    let (s1, b1) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "ann@example.com", "password": "Wrong0ne" })),
    )
    .await;
    let (s2, b2) = call(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "Wrong0ne" })),
    )
    .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s1, s2);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn register_category_transactions_budget_flow() {
    let app = test_router();
    let (token, _) = register(&app, "ann@example.com").await;
    let token = Some(token.as_str());

    // Defaults are seeded at registration, so the name is taken.
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/categories",
        token,
        Some(json!({ "name": "Travel", "color": "#10B981", "type": "expense" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let (status, category) = call(
        &app,
        Method::POST,
        "/api/v1/categories",
        token,
        Some(json!({ "name": "Groceries", "color": "#22C55E", "type": "expense" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap().to_string();
    assert_eq!(category["type"], "expense");

    for (amount, date) in [(500.0, "2024-01-05"), (300.0, "2024-01-20"), (999.0, "2024-02-02")] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/transactions",
            token,
            Some(json!({
                "categoryId": category_id,
                "amount": amount,
                "type": "expense",
                "description": "Weekly shop",
                "date": date,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, budget) = call(
        &app,
        Method::POST,
        "/api/v1/budgets",
        token,
        Some(json!({
            "name": "Food",
            "categoryId": category_id,
            "amount": 1000,
            "period": "monthly",
            "startDate": "2024-01-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{budget}");
    assert_eq!(budget["endDate"], "2024-01-31");
    assert_eq!(budget["spent"].as_f64(), Some(800.0));
    assert_eq!(budget["remaining"].as_f64(), Some(200.0));
    assert_eq!(budget["percentageUsed"].as_f64(), Some(80.0));
    assert_eq!(budget["status"], "close-to-limit");

    let (status, list) = call(
        &app,
        Method::GET,
        "/api/v1/transactions?limit=2&startDate=2024-01-01&endDate=2024-01-31",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 2);
    assert_eq!(list["items"][0]["date"], "2024-01-20");

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/v1/categories/{category_id}"),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let (status, report) = call(
        &app,
        Method::GET,
        "/api/v1/reports/monthly?month=1&year=2024",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["summary"]["totalExpenses"].as_f64(), Some(800.0));
    assert_eq!(report["categories"][0]["categoryName"], "Groceries");
    assert_eq!(report["budgetPerformance"][0]["status"], "close-to-limit");
}

#[tokio::test]
async fn budget_window_and_validation_errors_are_422() {
    let app = test_router();
    let (token, _) = register(&app, "ann@example.com").await;
    let token = Some(token.as_str());

    let (_, categories) = call(&app, Method::GET, "/api/v1/categories?type=expense", token, None).await;
    let category_id = categories[0]["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/budgets",
        token,
        Some(json!({
            "name": "Backwards",
            "categoryId": category_id,
            "amount": 100,
            "period": "monthly",
            "startDate": "2024-03-01",
            "endDate": "2024-03-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["fields"][0]["field"], "endDate");
}

#[tokio::test]
async fn other_users_records_are_not_found() {
    let app = test_router();
    let (ann, _) = register(&app, "ann@example.com").await;
    let (bob, _) = register(&app, "bob@example.com").await;

    let (_, categories) = call(&app, Method::GET, "/api/v1/categories", Some(&ann), None).await;
    let id = categories[0]["id"].as_str().unwrap();

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/v1/categories/{id}"),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Category not found");
}

#[tokio::test]
async fn malformed_requests_use_the_error_body() {
    let app = test_router();
    let (token, _) = register(&app, "ann@example.com").await;
    let token = Some(token.as_str());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/budgets",
        token,
        Some(json!({
            "name": "No category",
            "period": "monthly",
            "startDate": "2024-03-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["fields"][0]["field"], "categoryId");

    let (status, body) = call(&app, Method::GET, "/api/v1/reports/monthly?month=may", token, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");

    let (status, body) = call(&app, Method::GET, "/api/v1/categories/not-a-uuid", token, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "id");
}

#[tokio::test]
async fn huge_page_number_is_rejected_not_overflowed() {
    let app = test_router();
    let (token, _) = register(&app, "ann@example.com").await;

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/v1/transactions?page=9223372036854775807&limit=100",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "page");
}
