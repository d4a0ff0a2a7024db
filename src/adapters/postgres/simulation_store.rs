//! PostgreSQL implementation of SimulationStore.
//!
//! One row per simulation. A partial unique index on `trainee_id` over
//! non-terminal rows enforces the one-active-simulation invariant; the
//! `version` column carries the optimistic concurrency check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{SimulationId, Timestamp, TraineeId};
use crate::domain::simulation::{FinishReason, Lifecycle, Simulation, SimulationMode};
use crate::ports::{SimulationStore, StoreError};

/// PostgreSQL-backed simulation store.
#[derive(Clone)]
pub struct PostgresSimulationStore {
    pool: PgPool,
}

impl PostgresSimulationStore {
    /// Creates a new store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, trainee_id, product_slug, mode, current_stage, total_stages, \
     lifecycle, finish_reason, started_at, segment_started_at, last_interaction_at, finished_at, \
     accumulated_secs, version, profile, history, notes";

#[async_trait]
impl SimulationStore for PostgresSimulationStore {
    async fn create(&self, simulation: &Simulation) -> Result<(), StoreError> {
        let profile = to_json(&simulation.profile)?;
        let history = to_json(&simulation.history)?;
        let notes = to_json(&simulation.notes)?;

        let result = sqlx::query(
            r#"
            INSERT INTO simulations (
                id, trainee_id, product_slug, mode, current_stage, total_stages,
                lifecycle, finish_reason, started_at, segment_started_at,
                last_interaction_at, finished_at, accumulated_secs, version,
                profile, history, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(simulation.id.as_uuid())
        .bind(simulation.trainee_id.as_str())
        .bind(&simulation.product_slug)
        .bind(simulation.mode.as_str())
        .bind(simulation.current_stage as i32)
        .bind(simulation.total_stages as i32)
        .bind(simulation.lifecycle.as_str())
        .bind(simulation.finish_reason.map(|r| r.as_str()))
        .bind(simulation.started_at.as_datetime())
        .bind(simulation.segment_started_at.as_datetime())
        .bind(simulation.last_interaction_at.as_datetime())
        .bind(simulation.finished_at.as_ref().map(|t| *t.as_datetime()))
        .bind(simulation.accumulated_secs)
        .bind(simulation.version)
        .bind(profile)
        .bind(history)
        .bind(notes)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateActive(simulation.trainee_id.clone()))
            }
            Err(e) => Err(StoreError::Database(format!(
                "failed to insert simulation: {}",
                e
            ))),
        }
    }

    async fn find_active(&self, trainee_id: &TraineeId) -> Result<Option<Simulation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM simulations \
             WHERE trainee_id = $1 AND lifecycle IN ('in_progress', 'paused')",
            SELECT_COLUMNS
        ))
        .bind(trainee_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("failed to load simulation: {}", e)))?;

        row.map(|r| row_to_simulation(&r)).transpose()
    }

    async fn update(&self, simulation: &Simulation) -> Result<(), StoreError> {
        let profile = to_json(&simulation.profile)?;
        let history = to_json(&simulation.history)?;
        let notes = to_json(&simulation.notes)?;

        let result = sqlx::query(
            r#"
            UPDATE simulations SET
                current_stage = $3,
                lifecycle = $4,
                finish_reason = $5,
                segment_started_at = $6,
                last_interaction_at = $7,
                finished_at = $8,
                accumulated_secs = $9,
                version = version + 1,
                profile = $10,
                history = $11,
                notes = $12
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(simulation.id.as_uuid())
        .bind(simulation.version)
        .bind(simulation.current_stage as i32)
        .bind(simulation.lifecycle.as_str())
        .bind(simulation.finish_reason.map(|r| r.as_str()))
        .bind(simulation.segment_started_at.as_datetime())
        .bind(simulation.last_interaction_at.as_datetime())
        .bind(simulation.finished_at.as_ref().map(|t| *t.as_datetime()))
        .bind(simulation.accumulated_secs)
        .bind(profile)
        .bind(history)
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("failed to update simulation: {}", e)))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Zero rows: either the row is gone or another writer bumped the version.
        let exists = sqlx::query("SELECT 1 FROM simulations WHERE id = $1")
            .bind(simulation.id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("failed to check simulation: {}", e)))?;

        if exists.is_some() {
            Err(StoreError::VersionConflict {
                trainee_id: simulation.trainee_id.clone(),
                expected: simulation.version,
            })
        } else {
            Err(StoreError::NotFound(simulation.trainee_id.clone()))
        }
    }

    async fn find_latest_finished(
        &self,
        trainee_id: &TraineeId,
    ) -> Result<Option<Simulation>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM simulations \
             WHERE trainee_id = $1 AND lifecycle = 'finished' \
             ORDER BY finished_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(trainee_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("failed to load simulation: {}", e)))?;

        row.map(|r| row_to_simulation(&r)).transpose()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn row_to_simulation(row: &PgRow) -> Result<Simulation, StoreError> {
    let db_err = |e: sqlx::Error| StoreError::Database(format!("failed to read column: {}", e));
    let bad = |what: &str, value: &str| {
        StoreError::Serialization(format!("unexpected {} value '{}'", what, value))
    };

    let trainee_raw: String = row.try_get("trainee_id").map_err(db_err)?;
    let trainee_id =
        TraineeId::new(trainee_raw).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mode_raw: String = row.try_get("mode").map_err(db_err)?;
    let mode = SimulationMode::parse(&mode_raw).ok_or_else(|| bad("mode", &mode_raw))?;

    let lifecycle_raw: String = row.try_get("lifecycle").map_err(db_err)?;
    let lifecycle =
        Lifecycle::parse(&lifecycle_raw).ok_or_else(|| bad("lifecycle", &lifecycle_raw))?;

    let finish_raw: Option<String> = row.try_get("finish_reason").map_err(db_err)?;
    let finish_reason = match finish_raw {
        Some(raw) => Some(FinishReason::parse(&raw).ok_or_else(|| bad("finish_reason", &raw))?),
        None => None,
    };

    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(db_err)?;
    let segment_started_at: DateTime<Utc> = row.try_get("segment_started_at").map_err(db_err)?;
    let last_interaction_at: DateTime<Utc> = row.try_get("last_interaction_at").map_err(db_err)?;
    let finished_at: Option<DateTime<Utc>> = row.try_get("finished_at").map_err(db_err)?;

    fn from_json<T: serde::de::DeserializeOwned>(
        value: serde_json::Value,
        what: &str,
    ) -> Result<T, StoreError> {
        serde_json::from_value(value)
            .map_err(|e| StoreError::Serialization(format!("bad {} payload: {}", what, e)))
    }

    Ok(Simulation {
        id: SimulationId::from_uuid(row.try_get("id").map_err(db_err)?),
        trainee_id,
        product_slug: row.try_get("product_slug").map_err(db_err)?,
        mode,
        current_stage: row.try_get::<i32, _>("current_stage").map_err(db_err)? as u32,
        total_stages: row.try_get::<i32, _>("total_stages").map_err(db_err)? as u32,
        lifecycle,
        finish_reason,
        started_at: Timestamp::from_datetime(started_at),
        segment_started_at: Timestamp::from_datetime(segment_started_at),
        last_interaction_at: Timestamp::from_datetime(last_interaction_at),
        finished_at: finished_at.map(Timestamp::from_datetime),
        accumulated_secs: row.try_get("accumulated_secs").map_err(db_err)?,
        version: row.try_get("version").map_err(db_err)?,
        profile: from_json(row.try_get("profile").map_err(db_err)?, "profile")?,
        history: from_json(row.try_get("history").map_err(db_err)?, "history")?,
        notes: from_json(row.try_get("notes").map_err(db_err)?, "notes")?,
    })
}
