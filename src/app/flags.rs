use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::moderation::{FlagAction, FlagHistoryEntry, FlagStatus};
use crate::domain::question::{Difficulty, FlaggedQuestion};
use crate::infra::db::Db;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("question {0} not found")]
    NotFound(String),

    #[error("not authorized: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("flag store failure: {0}")]
    Service(String),
}

impl From<sqlx::Error> for FlagError {
    fn from(err: sqlx::Error) -> Self {
        FlagError::Service(err.to_string())
    }
}

/// Query/command interface over the flag store.
#[async_trait]
pub trait FlagService: Send + Sync {
    /// Every question currently flagged. Not paginated.
    async fn list_flagged(&self) -> Result<Vec<FlaggedQuestion>, FlagError>;

    /// Moderation history for one question, in store order (newest first).
    async fn get_history(&self, question_id: &str) -> Result<Vec<FlagHistoryEntry>, FlagError>;

    /// Persists `status` and appends the matching history entry.
    async fn update_status(
        &self,
        question_id: &str,
        status: FlagStatus,
        admin_id: Uuid,
    ) -> Result<(), FlagError>;

    /// Removes the question for good; its history goes with it.
    async fn delete_question(&self, question_id: &str, admin_id: Uuid) -> Result<(), FlagError>;
}

const QUESTION_COLUMNS: &str = "id, domain, difficulty, question, options, correct_answer, \
     explanation, tags, flag_count, flagged_by, flag_reasons, is_flagged, flagged_at, flag_status";

#[derive(Clone)]
pub struct PgFlagStore {
    db: Db,
}

impl PgFlagStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Records a user report against a question.
    ///
    /// A new report puts the question back into the pending queue. Empty
    /// reasons are not stored; a reporter may only flag a question once.
    pub async fn flag_question(
        &self,
        question_id: &str,
        reporter_id: Uuid,
        reason: Option<String>,
    ) -> Result<(), FlagError> {
        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());

        let mut tx = self.db.pool().begin().await?;
        let row = sqlx::query("SELECT flagged_by FROM questions WHERE id = $1 FOR UPDATE")
            .bind(question_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(FlagError::NotFound(question_id.to_string()));
        };
        let flagged_by: Vec<Uuid> = row.get("flagged_by");
        if flagged_by.contains(&reporter_id) {
            tx.rollback().await?;
            return Err(FlagError::Conflict(format!(
                "question {} already flagged by this user",
                question_id
            )));
        }

        sqlx::query(
            "UPDATE questions \
             SET flag_count = flag_count + 1, \
                 flagged_by = array_append(flagged_by, $2), \
                 flag_reasons = CASE WHEN $3::text IS NULL THEN flag_reasons \
                                     ELSE array_append(flag_reasons, $3::text) END, \
                 is_flagged = true, \
                 flagged_at = now(), \
                 flag_status = 'pending' \
             WHERE id = $1",
        )
        .bind(question_id)
        .bind(reporter_id)
        .bind(&reason)
        .execute(&mut *tx)
        .await?;

        insert_history(&mut tx, question_id, FlagAction::Flag, reason.as_deref(), reporter_id)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn ensure_admin(&self, admin_id: Uuid) -> Result<(), FlagError> {
        let is_admin: Option<bool> =
            sqlx::query_scalar("SELECT is_admin FROM profiles WHERE id = $1")
                .bind(admin_id)
                .fetch_optional(self.db.pool())
                .await?;

        match is_admin {
            Some(true) => Ok(()),
            _ => Err(FlagError::Forbidden(format!("{} is not an admin", admin_id))),
        }
    }
}

#[async_trait]
impl FlagService for PgFlagStore {
    async fn list_flagged(&self) -> Result<Vec<FlaggedQuestion>, FlagError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM questions \
             WHERE is_flagged = true \
             ORDER BY flagged_at DESC NULLS LAST, id",
            QUESTION_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(parse_question(&row)?);
        }

        Ok(questions)
    }

    async fn get_history(&self, question_id: &str) -> Result<Vec<FlagHistoryEntry>, FlagError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1)")
            .bind(question_id)
            .fetch_one(self.db.pool())
            .await?;
        if !exists {
            return Err(FlagError::NotFound(question_id.to_string()));
        }

        let rows = sqlx::query(
            "SELECT id, question_id, action, reason, actor_id, created_at \
             FROM question_flag_history \
             WHERE question_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(question_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let action: String = row.get("action");
            let action = FlagAction::parse(&action)
                .ok_or_else(|| FlagError::Service(format!("unknown history action: {}", action)))?;
            entries.push(FlagHistoryEntry {
                id: row.get("id"),
                question_id: row.get("question_id"),
                action,
                reason: row.get("reason"),
                created_at: row.get("created_at"),
                actor_id: row.get("actor_id"),
            });
        }

        Ok(entries)
    }

    async fn update_status(
        &self,
        question_id: &str,
        status: FlagStatus,
        admin_id: Uuid,
    ) -> Result<(), FlagError> {
        self.ensure_admin(admin_id).await?;

        let mut tx = self.db.pool().begin().await?;
        let result = sqlx::query("UPDATE questions SET flag_status = $2 WHERE id = $1")
            .bind(question_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FlagError::NotFound(question_id.to_string()));
        }

        insert_history(
            &mut tx,
            question_id,
            FlagAction::for_status(status),
            None,
            admin_id,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_question(&self, question_id: &str, admin_id: Uuid) -> Result<(), FlagError> {
        self.ensure_admin(admin_id).await?;

        let mut tx = self.db.pool().begin().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1)")
                .bind(question_id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            tx.rollback().await?;
            return Err(FlagError::NotFound(question_id.to_string()));
        }

        // Removed again by the cascade below.
        insert_history(
            &mut tx,
            question_id,
            FlagAction::Actioned,
            Some("deleted"),
            admin_id,
        )
        .await?;

        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(question_id = %question_id, admin_id = %admin_id, "question deleted");
        Ok(())
    }
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    question_id: &str,
    action: FlagAction,
    reason: Option<&str>,
    actor_id: Uuid,
) -> Result<(), FlagError> {
    sqlx::query(
        "INSERT INTO question_flag_history (question_id, action, reason, actor_id) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(question_id)
    .bind(action.as_str())
    .bind(reason)
    .bind(actor_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn parse_question(row: &PgRow) -> Result<FlaggedQuestion, FlagError> {
    let difficulty: String = row.get("difficulty");
    let difficulty = Difficulty::parse(&difficulty)
        .ok_or_else(|| FlagError::Service(format!("unknown difficulty: {}", difficulty)))?;
    let correct_answer: i32 = row.get("correct_answer");
    let flag_count: i32 = row.get("flag_count");
    let flag_status: Option<String> = row.get("flag_status");

    Ok(FlaggedQuestion {
        id: row.get("id"),
        domain: row.get("domain"),
        difficulty,
        question: row.get("question"),
        options: row.get("options"),
        correct_answer: correct_answer.max(0) as usize,
        explanation: row.get("explanation"),
        tags: row.get("tags"),
        flag_count: flag_count.max(0) as u32,
        flagged_by: row.get("flagged_by"),
        flag_reasons: row.get("flag_reasons"),
        is_flagged: row.get("is_flagged"),
        flagged_at: row.get("flagged_at"),
        flag_status: FlagStatus::from_stored(flag_status.as_deref()),
    })
}
