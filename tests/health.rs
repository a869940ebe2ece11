use axum_backoffice_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert!(!response.0.error);
    assert_eq!(response.0.message, None);

    let data = response.0.result.data.expect("health data");
    assert_eq!(data.status, "ok");
}
