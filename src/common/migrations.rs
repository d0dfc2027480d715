// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if they don't exist. With `reset` set, every table is
/// dropped first.
pub async fn run_migrations(pool: &SqlitePool, reset: bool) -> Result<(), sqlx::Error> {
    if reset {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    }

    create_account_tables(pool).await?;
    create_student_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database migration completed successfully!");
    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for table in ["leave_applications", "student_profiles", "accounts"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// One row per email. OTP columns are set together or not at all, and a
/// verified account always carries a password hash.
async fn create_account_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            otp TEXT,
            otp_expires_at TEXT,
            verified INTEGER NOT NULL DEFAULT 0,
            password_hash TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            CHECK ((otp IS NULL) = (otp_expires_at IS NULL)),
            CHECK (verified = 0 OR password_hash IS NOT NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_student_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS student_profiles (
            account_id TEXT PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
            data TEXT NOT NULL,
            current_step INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'submitted')),
            submitted_at TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leave_applications (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
            leave_type TEXT NOT NULL CHECK (leave_type IN ('CL', 'DL', 'LWP')),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            days INTEGER NOT NULL CHECK (days > 0),
            reason TEXT NOT NULL,
            documents TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'Pending Review',
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_leave_applications_account ON leave_applications(account_id, start_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.unwrap();
        run_migrations(&pool, false).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<_> = tables.into_iter().map(|(n,)| n).collect();
        assert_eq!(names, vec!["accounts", "leave_applications", "student_profiles"]);
    }

    #[tokio::test]
    async fn test_reset_drops_rows() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.unwrap();
        sqlx::query("INSERT INTO accounts (id, email) VALUES ('U_AAAAAA', 'a@x.edu')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool, true).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_verified_requires_password_hash() {
        let pool = memory_pool().await;
        run_migrations(&pool, false).await.unwrap();

        let result = sqlx::query(
            "INSERT INTO accounts (id, email, verified) VALUES ('U_BBBBBB', 'b@x.edu', 1)",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
