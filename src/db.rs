use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Failure of a store write that callers need to tell apart.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// Map a sqlx error, keeping unique violations typed.
    pub fn from_sqlx(err: sqlx::Error, what: &'static str) -> Self {
        match err {
            sqlx::Error::Database(e) if e.is_unique_violation() => StoreError::Duplicate,
            e => StoreError::Other(anyhow::Error::new(e).context(what)),
        }
    }
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}
