#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::OperationLog;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository trait for OperationLog entity operations
///
/// This trait defines the contract for audit trail data access. The
/// orchestrator only ever calls [`create`](Self::create); the finder methods
/// exist for hosts that expose the audit trail (dashboards, log endpoints,
/// security monitoring).
///
/// # Implementation Note
///
/// Uses native async trait methods (Edition 2024), so no async-trait crate
/// is involved.
pub trait OperationLogRepository: Send + Sync {
    /// Create a new operation log entry, returning its row id
    async fn create(&self, log: &OperationLog) -> StorageResult<i64>;

    /// Find operation logs for a device, newest first
    async fn find_by_device(
        &self,
        device_id: &str,
        limit: i64,
    ) -> StorageResult<Vec<OperationLog>>;

    /// Find operation logs for a license plate, newest first
    async fn find_by_license_plate(
        &self,
        license_plate: &str,
        limit: i64,
    ) -> StorageResult<Vec<OperationLog>>;

    /// Find recent failed operations (security monitoring)
    async fn find_recent_failed(&self, limit: i64) -> StorageResult<Vec<OperationLog>>;

    /// Find recent successful operations
    async fn find_recent_succeeded(&self, limit: i64) -> StorageResult<Vec<OperationLog>>;

    /// Find all operation logs within a time range
    async fn find_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<OperationLog>>;

    /// Count operation attempts in a time range
    async fn count_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<i64>;

    /// Count failed operations for a device since a point in time
    async fn count_failed_by_device(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> StorageResult<i64>;
}

/// SQLite implementation of OperationLogRepository
pub struct SqliteOperationLogRepository {
    pool: SqlitePool,
}

impl SqliteOperationLogRepository {
    /// Create a new SQLite operation log repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl OperationLogRepository for SqliteOperationLogRepository {
    async fn create(&self, log: &OperationLog) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO operation_logs (
                device_id, operation, success, license_plate,
                recognition_confidence, task_id, error_message, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.device_id)
        .bind(&log.operation)
        .bind(log.success)
        .bind(&log.license_plate)
        .bind(log.recognition_confidence)
        .bind(&log.task_id)
        .bind(&log.error_message)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_device(
        &self,
        device_id: &str,
        limit: i64,
    ) -> StorageResult<Vec<OperationLog>> {
        let logs = sqlx::query_as::<_, OperationLog>(
            r#"
            SELECT id, device_id, operation, success, license_plate,
                   recognition_confidence, task_id, error_message, created_at
            FROM operation_logs
            WHERE device_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_license_plate(
        &self,
        license_plate: &str,
        limit: i64,
    ) -> StorageResult<Vec<OperationLog>> {
        let logs = sqlx::query_as::<_, OperationLog>(
            r#"
            SELECT id, device_id, operation, success, license_plate,
                   recognition_confidence, task_id, error_message, created_at
            FROM operation_logs
            WHERE license_plate = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(license_plate)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_recent_failed(&self, limit: i64) -> StorageResult<Vec<OperationLog>> {
        let logs = sqlx::query_as::<_, OperationLog>(
            r#"
            SELECT id, device_id, operation, success, license_plate,
                   recognition_confidence, task_id, error_message, created_at
            FROM operation_logs
            WHERE success = 0
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_recent_succeeded(&self, limit: i64) -> StorageResult<Vec<OperationLog>> {
        let logs = sqlx::query_as::<_, OperationLog>(
            r#"
            SELECT id, device_id, operation, success, license_plate,
                   recognition_confidence, task_id, error_message, created_at
            FROM operation_logs
            WHERE success = 1
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<OperationLog>> {
        let logs = sqlx::query_as::<_, OperationLog>(
            r#"
            SELECT id, device_id, operation, success, license_plate,
                   recognition_confidence, task_id, error_message, created_at
            FROM operation_logs
            WHERE created_at >= ? AND created_at <= ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count_by_time_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM operation_logs WHERE created_at >= ? AND created_at <= ?",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    async fn count_failed_by_device(
        &self,
        device_id: &str,
        since: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM operation_logs WHERE device_id = ? AND success = 0 AND created_at >= ?",
        )
        .bind(device_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
