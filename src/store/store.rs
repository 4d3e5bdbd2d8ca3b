//! SQLite-backed roster store.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use uuid::Uuid;

use crate::store::types::{LocationRow, StatsSummary, Status, Target};

/// Errors surfaced by roster store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("store error: {0}")]
    Db(#[from] sqlx::Error),

    /// Insert rejected because the hostname is already registered.
    #[error("server with this hostname already exists")]
    DuplicateHostname,
}

/// Fields accepted when creating or updating a server entry.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ServerEntry {
    pub hostname: String,
    pub ip: String,
    pub country: String,
    pub city: String,
    pub username: String,
    pub password: String,
}

/// Durable table of targets and their polled status.
#[derive(Clone)]
pub struct RosterStore {
    pool: SqlitePool,
}

impl RosterStore {
    /// Open (creating if missing) the database at the given path.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Open an in-memory database. Pool is pinned to one connection so
    /// every query sees the same memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(StoreError::Db)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS vpn_servers (
                id TEXT PRIMARY KEY,
                hostname TEXT NOT NULL UNIQUE,
                ip TEXT NOT NULL,
                country TEXT NOT NULL,
                city TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                clients INTEGER NOT NULL DEFAULT 0,
                last_updated DATETIME,
                username TEXT NOT NULL,
                password TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        tracing::debug!("roster table ready");
        Ok(())
    }

    const COLUMNS: &'static str =
        "id, hostname, ip, country, city, status, clients, last_updated, username, password";

    /// All registered targets, credentials included (internal use only).
    pub async fn list(&self) -> Result<Vec<Target>, StoreError> {
        let rows = sqlx::query_as::<_, Target>(&format!(
            "SELECT {} FROM vpn_servers",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Look up one target by hostname.
    pub async fn get(&self, hostname: &str) -> Result<Option<Target>, StoreError> {
        let row = sqlx::query_as::<_, Target>(&format!(
            "SELECT {} FROM vpn_servers WHERE hostname = ?",
            Self::COLUMNS
        ))
        .bind(hostname)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Targets currently marked operational.
    pub async fn operational(&self) -> Result<Vec<Target>, StoreError> {
        let rows = sqlx::query_as::<_, Target>(&format!(
            "SELECT {} FROM vpn_servers WHERE status = 'operational'",
            Self::COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Register a new target in `pending` state. Returns the generated id.
    pub async fn insert(&self, entry: &ServerEntry) -> Result<String, StoreError> {
        if self.get(&entry.hostname).await?.is_some() {
            return Err(StoreError::DuplicateHostname);
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO vpn_servers (
                id, hostname, ip, country, city, status,
                username, password, last_updated, clients
            ) VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(&entry.hostname)
        .bind(&entry.ip)
        .bind(&entry.country)
        .bind(&entry.city)
        .bind(&entry.username)
        .bind(&entry.password)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Update a target's record fields. Returns false if the hostname is unknown.
    pub async fn update(&self, hostname: &str, entry: &ServerEntry) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE vpn_servers
            SET ip = ?, country = ?, city = ?,
                username = ?, password = ?,
                last_updated = ?
            WHERE hostname = ?
            "#,
        )
        .bind(&entry.ip)
        .bind(&entry.country)
        .bind(&entry.city)
        .bind(&entry.username)
        .bind(&entry.password)
        .bind(Utc::now())
        .bind(hostname)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a target. Returns false if the hostname is unknown.
    pub async fn delete(&self, hostname: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM vpn_servers WHERE hostname = ?")
            .bind(hostname)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful poll: operational status and fresh client count.
    pub async fn mark_operational(&self, hostname: &str, clients: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE vpn_servers
            SET clients = ?, status = 'operational', last_updated = ?
            WHERE hostname = ?
            "#,
        )
        .bind(clients)
        .bind(Utc::now())
        .bind(hostname)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record an exhausted poll: error status, last known client count kept.
    pub async fn mark_error(&self, hostname: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE vpn_servers
            SET status = 'error', last_updated = ?
            WHERE hostname = ?
            "#,
        )
        .bind(Utc::now())
        .bind(hostname)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Distinct operational locations with server counts.
    pub async fn locations(&self) -> Result<Vec<LocationRow>, StoreError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT country, city, COUNT(*) AS server_count
            FROM vpn_servers
            WHERE status = 'operational'
            GROUP BY country, city
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Fleet-wide statistics summary.
    pub async fn stats(&self) -> Result<StatsSummary, StoreError> {
        let row = sqlx::query_as::<_, StatsSummary>(
            r#"
            SELECT
                COUNT(*) AS total_servers,
                COALESCE(SUM(CASE WHEN status = 'operational' THEN 1 ELSE 0 END), 0)
                    AS operational_servers,
                COALESCE(SUM(clients), 0) AS total_clients,
                COALESCE(AVG(clients), 0.0) AS average_clients_per_server
            FROM vpn_servers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Connectivity probe used at startup.
    pub async fn check_connection(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

impl std::fmt::Debug for RosterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hostname: &str) -> ServerEntry {
        ServerEntry {
            hostname: hostname.to_string(),
            ip: "203.0.113.10".to_string(),
            country: "NL".to_string(),
            city: "Amsterdam".to_string(),
            username: "monitor".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_starts_pending_with_zero_clients() {
        let store = RosterStore::in_memory().await.unwrap();
        store.insert(&entry("vpn1")).await.unwrap();

        let target = store.get("vpn1").await.unwrap().unwrap();
        assert_eq!(target.status, Status::Pending);
        assert_eq!(target.clients, 0);
    }

    #[tokio::test]
    async fn duplicate_hostname_rejected() {
        let store = RosterStore::in_memory().await.unwrap();
        store.insert(&entry("vpn1")).await.unwrap();

        let err = store.insert(&entry("vpn1")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateHostname));
    }

    #[tokio::test]
    async fn mark_error_preserves_client_gauge() {
        let store = RosterStore::in_memory().await.unwrap();
        store.insert(&entry("vpn1")).await.unwrap();
        store.mark_operational("vpn1", 42).await.unwrap();
        store.mark_error("vpn1").await.unwrap();

        let target = store.get("vpn1").await.unwrap().unwrap();
        assert_eq!(target.status, Status::Error);
        assert_eq!(target.clients, 42);
    }

    #[tokio::test]
    async fn stats_empty_roster_is_zeroed() {
        let store = RosterStore::in_memory().await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_servers, 0);
        assert_eq!(stats.total_clients, 0);
    }

    #[tokio::test]
    async fn locations_only_count_operational() {
        let store = RosterStore::in_memory().await.unwrap();
        store.insert(&entry("vpn1")).await.unwrap();
        store.insert(&entry("vpn2")).await.unwrap();
        store.mark_operational("vpn1", 3).await.unwrap();

        let locations = store.locations().await.unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].server_count, 1);
    }
}
