use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics query failed: {0}")]
    Query(#[from] saddlery_db::DbError),
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}
