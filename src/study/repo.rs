use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Module, NewSession, StudySession};
use crate::db::StoreError;

#[async_trait]
pub trait StudyStore: Send + Sync {
    async fn list_modules(&self, user_id: Uuid) -> anyhow::Result<Vec<Module>>;
    async fn create_module(
        &self,
        user_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Module, StoreError>;
    async fn find_module(&self, user_id: Uuid, module_id: Uuid) -> anyhow::Result<Option<Module>>;
    async fn insert_session(&self, user_id: Uuid, new: NewSession) -> anyhow::Result<StudySession>;
    /// Sessions with `from <= started_at < until`, oldest first.
    async fn sessions_between(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<StudySession>>;
}

#[derive(Clone)]
pub struct PgStudyStore {
    db: PgPool,
}

impl PgStudyStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StudyStore for PgStudyStore {
    async fn list_modules(&self, user_id: Uuid) -> anyhow::Result<Vec<Module>> {
        let rows = sqlx::query_as::<_, Module>(
            r#"
            SELECT id, user_id, name, color, created_at
              FROM modules
             WHERE user_id = $1
             ORDER BY created_at ASC, name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list modules")?;
        Ok(rows)
    }

    async fn create_module(
        &self,
        user_id: Uuid,
        name: &str,
        color: Option<&str>,
    ) -> Result<Module, StoreError> {
        sqlx::query_as::<_, Module>(
            r#"
            INSERT INTO modules (id, user_id, name, color)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, name, color, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(color)
        .fetch_one(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx(e, "insert module"))
    }

    async fn find_module(&self, user_id: Uuid, module_id: Uuid) -> anyhow::Result<Option<Module>> {
        let row = sqlx::query_as::<_, Module>(
            r#"
            SELECT id, user_id, name, color, created_at
              FROM modules
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(module_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find module")?;
        Ok(row)
    }

    async fn insert_session(&self, user_id: Uuid, new: NewSession) -> anyhow::Result<StudySession> {
        let row = sqlx::query_as::<_, StudySession>(
            r#"
            INSERT INTO study_sessions (id, user_id, module_id, started_at, duration_secs)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, module_id, started_at, duration_secs
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.module_id)
        .bind(new.started_at)
        .bind(new.duration_secs)
        .fetch_one(&self.db)
        .await
        .context("insert study session")?;
        Ok(row)
    }

    async fn sessions_between(
        &self,
        user_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> anyhow::Result<Vec<StudySession>> {
        let rows = sqlx::query_as::<_, StudySession>(
            r#"
            SELECT id, user_id, module_id, started_at, duration_secs
              FROM study_sessions
             WHERE user_id = $1
               AND started_at >= $2
               AND started_at < $3
             ORDER BY started_at ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.db)
        .await
        .context("list study sessions")?;
        Ok(rows)
    }
}
