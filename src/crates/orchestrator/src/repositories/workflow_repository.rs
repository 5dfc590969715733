//! Workflow repository for database operations

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use engine::graph::GraphData;

use crate::db::Database;
use crate::error::{OrchestratorError, Result};
use crate::models::Workflow;

/// Repository for workflow database operations
#[derive(Clone, Debug)]
pub struct WorkflowRepository {
    db: Arc<Database>,
}

fn row_to_workflow(row: &sqlx::sqlite::SqliteRow) -> Result<Workflow> {
    let id: String = row.get("id");
    let graph_json: String = row.get("graph_data");

    Ok(Workflow {
        id: Uuid::parse_str(&id)
            .map_err(|e| OrchestratorError::Database(format!("invalid workflow id: {}", e)))?,
        name: row.get("name"),
        description: row.get("description"),
        graph_data: serde_json::from_str(&graph_json)?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

impl WorkflowRepository {
    /// Create a new workflow repository
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Save a workflow to the database
    pub async fn save(&self, workflow: &Workflow) -> Result<()> {
        sqlx::query(
            "INSERT INTO workflows (id, name, description, graph_data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(workflow.id.to_string())
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(serde_json::to_string(&workflow.graph_data)?)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to save workflow: {}", e)))?;

        Ok(())
    }

    /// Load a workflow by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Workflow>> {
        let row = sqlx::query(
            "SELECT id, name, description, graph_data, created_at, updated_at
             FROM workflows WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to load workflow: {}", e)))?;

        row.as_ref().map(row_to_workflow).transpose()
    }

    /// List workflows newest-first with offset pagination
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Workflow>> {
        let rows = sqlx::query(
            "SELECT id, name, description, graph_data, created_at, updated_at
             FROM workflows
             ORDER BY created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to list workflows: {}", e)))?;

        rows.iter().map(row_to_workflow).collect()
    }

    /// Total workflow count
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM workflows")
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to count workflows: {}", e))
            })?;

        Ok(row.get("count"))
    }

    /// Update name, description and graph
    pub async fn update(&self, workflow: &Workflow) -> Result<()> {
        sqlx::query(
            "UPDATE workflows
             SET name = ?, description = ?, graph_data = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&workflow.name)
        .bind(&workflow.description)
        .bind(serde_json::to_string(&workflow.graph_data)?)
        .bind(Utc::now())
        .bind(workflow.id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(|e| OrchestratorError::Database(format!("Failed to update workflow: {}", e)))?;

        Ok(())
    }

    /// Delete a workflow; executions cascade. Returns whether a row existed.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                OrchestratorError::Database(format!("Failed to delete workflow: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
