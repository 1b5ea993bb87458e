use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A subject the user studies, e.g. "Linear Algebra".
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Module {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudySession {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub module_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub duration_secs: i64,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub module_id: Uuid,
    pub started_at: OffsetDateTime,
    pub duration_secs: i64,
}
