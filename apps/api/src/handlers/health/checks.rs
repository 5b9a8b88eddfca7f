pub(super) struct StoreStatus {
    pub store: &'static str,
    pub healthy: bool,
    pub detail: Option<String>,
}

pub(super) async fn check_store(pool: Option<sqlx::PgPool>) -> StoreStatus {
    let Some(pool) = pool else {
        return StoreStatus {
            store: "memory",
            healthy: true,
            detail: None,
        };
    };

    let check = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await;

    match check {
        Ok(_) => StoreStatus {
            store: "postgres",
            healthy: true,
            detail: None,
        },
        Err(error) => StoreStatus {
            store: "postgres",
            healthy: false,
            detail: Some(format!("postgres check failed: {error}")),
        },
    }
}
