use super::checks::check_store;
use super::*;

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store = check_store(state.postgres_pool.clone()).await;

    let (status, http_status) = if store.healthy {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            store: store.store,
            detail: store.detail,
        }),
    )
}
