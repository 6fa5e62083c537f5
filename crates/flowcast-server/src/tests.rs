//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use flowcast_core::test_utils::{date, household_database};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn engine() -> AnalyticsEngine<Database> {
    AnalyticsEngine::new(household_database()).with_today(date("2024-04-30"))
}

fn setup_test_app() -> Router {
    let config = ServerConfig {
        require_auth: false,
        allowed_origins: vec![],
        ..Default::default()
    };
    create_router(engine(), config)
}

fn setup_auth_app() -> Router {
    let config = ServerConfig {
        require_auth: true,
        api_keys: vec!["test-key-123".to_string()],
        ..Default::default()
    };
    create_router(engine(), config)
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ========== Auth Tests ==========

#[tokio::test]
async fn test_auth_required_without_key() {
    let response = get(setup_auth_app(), "/api/overview").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn test_auth_with_valid_api_key() {
    let response = setup_auth_app()
        .oneshot(
            Request::builder()
                .uri("/api/overview")
                .header("Authorization", "Bearer test-key-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_rejects_wrong_api_key() {
    let response = setup_auth_app()
        .oneshot(
            Request::builder()
                .uri("/api/overview")
                .header("Authorization", "Bearer test-key-124")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_is_public() {
    let response = get(setup_auth_app(), "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["today"], "2024-04-30");
}

#[test]
fn test_validate_api_key() {
    let keys = vec!["alpha".to_string(), "bravo-long".to_string()];
    assert!(validate_api_key("alpha", &keys));
    assert!(validate_api_key("bravo-long", &keys));
    assert!(!validate_api_key("alph", &keys));
    assert!(!validate_api_key("", &keys));
    assert!(!validate_api_key("alpha", &[]));
}

#[test]
fn test_parse_list() {
    assert_eq!(
        ServerConfig::parse_list(" a, b ,,c "),
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
    assert!(ServerConfig::parse_list("").is_empty());
}

// ========== Stream Tests ==========

#[tokio::test]
async fn test_list_streams_with_direction_filter() {
    let response = get(setup_test_app(), "/api/streams?direction=income").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let streams = json.as_array().unwrap();
    assert_eq!(streams.len(), 2);
    assert!(streams.iter().all(|s| s["direction"] == "income"));

    let salary = streams.iter().find(|s| s["name"] == "Salary").unwrap();
    assert_eq!(salary["provider"], "Acme Corp");
    assert_eq!(salary["snapshot_count"], 4);
}

#[tokio::test]
async fn test_invalid_direction_is_bad_request() {
    let response = get(setup_test_app(), "/api/streams?direction=sideways").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Report Tests ==========

#[tokio::test]
async fn test_daily_rate_report() {
    let response = get(
        setup_test_app(),
        "/api/reports/daily-rate?days=30&direction=income",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["days_analyzed"], 30);
    // April: salary 3000 + freelance 1100
    assert_eq!(json["total_usd"], 4100.0);
}

#[tokio::test]
async fn test_daily_rate_rejects_zero_days() {
    let response = get(setup_test_app(), "/api/reports/daily-rate?days=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comparison_with_reference_uses_complete_periods() {
    let response = get(
        setup_test_app(),
        "/api/reports/comparison?comparison=mom&reference=2024-03-15&direction=income",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "complete");
    assert_eq!(json["current_period"]["start"], "2024-03-01");
    assert_eq!(json["current_period"]["end"], "2024-03-31");
    assert_eq!(json["previous_period"]["start"], "2024-02-01");
}

#[tokio::test]
async fn test_comparison_rejects_malformed_reference() {
    let response = get(setup_test_app(), "/api/reports/comparison?reference=15/03/2024").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_distribution_unknown_group_by_falls_back_to_category() {
    let response = get(setup_test_app(), "/api/reports/distribution?group_by=colour").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["group_by"], "category");
    let items = json["items"].as_array().unwrap();
    assert!(items.iter().any(|i| i["key"] == "Employment"));
}

#[tokio::test]
async fn test_distribution_rejects_lone_to_bound() {
    let response = get(setup_test_app(), "/api/reports/distribution?to=2024-03-01").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_top_performers_limit() {
    let response = get(setup_test_app(), "/api/reports/top-performers?limit=2").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["rank"], 1);
    assert_eq!(items[0]["name"], "Salary");
}

#[tokio::test]
async fn test_trend_with_breakdown() {
    let response = get(
        setup_test_app(),
        "/api/reports/trend?granularity=monthly&periods=4&breakdown=stream&direction=outcome",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["granularity"], "monthly");
    assert_eq!(json["points"].as_array().unwrap().len(), 4);
    assert_eq!(json["series"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_stream_health_counts() {
    let response = get(setup_test_app(), "/api/reports/stream-health?comparison=mom").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let per_stream = json["per_stream"].as_array().unwrap().len() as u64;
    let counted = json["growing_count"].as_u64().unwrap()
        + json["declining_count"].as_u64().unwrap()
        + json["stable_count"].as_u64().unwrap();
    assert_eq!(per_stream, counted);
}

#[tokio::test]
async fn test_seasonality_reports_every_weekday() {
    let response = get(setup_test_app(), "/api/reports/seasonality?months=6").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["day_of_week_stats"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_projection_defaults_to_income() {
    let response = get(setup_test_app(), "/api/reports/projection?months=3").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["direction"], "income");
    assert_eq!(json["monthly_projections"].as_array().unwrap().len(), 3);
    assert_eq!(json["fixed_monthly"], 3000.0);
}

#[tokio::test]
async fn test_monte_carlo_is_reproducible_with_seed() {
    let uri = "/api/reports/monte-carlo?simulations=500&months=6&seed=42&goal=20000";

    let first = get_body_json(get(setup_test_app(), uri).await).await;
    let second = get_body_json(get(setup_test_app(), uri).await).await;

    assert_eq!(first, second);
    assert_eq!(first["simulations"], 500);
    assert_eq!(first["distribution_buckets"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_monte_carlo_rejects_zero_simulations() {
    let response = get(setup_test_app(), "/api/reports/monte-carlo?simulations=0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overview() {
    let response = get(setup_test_app(), "/api/overview").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["as_of"], "2024-04-30");
    assert!(json["top_performers"]["items"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = get(setup_test_app(), "/api/reports/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_parameters_are_bad_requests() {
    for uri in [
        "/api/reports/daily-rate?days=200000000",
        "/api/reports/trend?granularity=monthly&periods=4000000",
        "/api/reports/seasonality?months=4000000",
        "/api/reports/projection?months=4000000",
        "/api/reports/monte-carlo?months=4000000000&simulations=10",
    ] {
        let response = get(setup_test_app(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_store_failure_is_bad_gateway() {
    let db = household_database();
    db.conn()
        .unwrap()
        .execute_batch("DROP TABLE snapshots;")
        .unwrap();
    let config = ServerConfig {
        require_auth: false,
        ..Default::default()
    };
    let app = create_router(
        AnalyticsEngine::new(db).with_today(date("2024-04-30")),
        config,
    );

    let response = get(app, "/api/reports/daily-rate").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = get_body_json(response).await;
    assert_eq!(json["error"], "Stream source unavailable");
}

#[test]
fn test_core_errors_map_to_status() {
    let err: AppError = flowcast_core::Error::InvalidParameter("bad".into()).into();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err: AppError = flowcast_core::Error::NotFound("stream 9".into()).into();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let err: AppError = flowcast_core::Error::Upstream("down".into()).into();
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

    let err: AppError = flowcast_core::Error::Config("boom".into()).into();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
