//! SQLite persistence for the release collection
//!
//! The database is the durable store of record; the JSON snapshot cache
//! (`snapshot` module) mirrors it for compatibility with file-based
//! collection exchange.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;

use relcal_common::checklist::Checklist;
use relcal_common::release::Release;
use relcal_common::{Error, Result};

/// Connect to the release database, creating file and schema on first run.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
        .map_err(Error::Database)?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the releases table if it does not exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS releases (
            id TEXT PRIMARY KEY,
            team_name TEXT NOT NULL,
            app_name TEXT NOT NULL,
            release_date TEXT NOT NULL,
            dry_run_date TEXT NOT NULL,
            contact_person TEXT NOT NULL,
            contact_email TEXT NOT NULL,
            additional_notes TEXT NOT NULL DEFAULT '',
            checklist TEXT NOT NULL DEFAULT '{}',
            is_planned INTEGER NOT NULL DEFAULT 0,
            completion_percentage INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn row_to_release(row: &sqlx::sqlite::SqliteRow) -> Result<Release> {
    let parse_date = |field: &str, value: String| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|_| Error::Internal(format!("bad {field} in database: {value}")))
    };
    let checklist_json: String = row.get("checklist");
    let checklist: Checklist = serde_json::from_str(&checklist_json)
        .map_err(|e| Error::Internal(format!("bad checklist JSON in database: {e}")))?;
    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("bad created_at in database: {e}")))?
        .with_timezone(&Utc);
    let updated_at: Option<String> = row.get("updated_at");
    let updated_at = updated_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(Release {
        id: row.get("id"),
        team_name: row.get("team_name"),
        app_name: row.get("app_name"),
        release_date: parse_date("release_date", row.get("release_date"))?,
        dry_run_date: parse_date("dry_run_date", row.get("dry_run_date"))?,
        contact_person: row.get("contact_person"),
        contact_email: row.get("contact_email"),
        additional_notes: row.get("additional_notes"),
        checklist,
        is_planned: row.get::<i64, _>("is_planned") != 0,
        completion_percentage: row.get::<i64, _>("completion_percentage") as u8,
        created_at,
        updated_at,
    })
}

/// Full collection, ordered by release date then id.
pub async fn list_releases(pool: &SqlitePool) -> Result<Vec<Release>> {
    let rows = sqlx::query("SELECT * FROM releases ORDER BY release_date, id")
        .fetch_all(pool)
        .await?;
    rows.iter().map(row_to_release).collect()
}

pub async fn get_release(pool: &SqlitePool, id: &str) -> Result<Option<Release>> {
    let row = sqlx::query("SELECT * FROM releases WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(row_to_release).transpose()
}

/// Insert or overwrite one release.
pub async fn upsert_release(pool: &SqlitePool, release: &Release) -> Result<()> {
    upsert_with(pool, release).await
}

async fn upsert_with<'e, E>(executor: E, release: &Release) -> Result<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let checklist_json = serde_json::to_string(&release.checklist)
        .map_err(|e| Error::Internal(format!("serialize checklist: {e}")))?;

    sqlx::query(
        "INSERT INTO releases (
            id, team_name, app_name, release_date, dry_run_date,
            contact_person, contact_email, additional_notes, checklist,
            is_planned, completion_percentage, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            team_name = excluded.team_name,
            app_name = excluded.app_name,
            release_date = excluded.release_date,
            dry_run_date = excluded.dry_run_date,
            contact_person = excluded.contact_person,
            contact_email = excluded.contact_email,
            additional_notes = excluded.additional_notes,
            checklist = excluded.checklist,
            is_planned = excluded.is_planned,
            completion_percentage = excluded.completion_percentage,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at",
    )
    .bind(&release.id)
    .bind(&release.team_name)
    .bind(&release.app_name)
    .bind(release.release_date.format("%Y-%m-%d").to_string())
    .bind(release.dry_run_date.format("%Y-%m-%d").to_string())
    .bind(&release.contact_person)
    .bind(&release.contact_email)
    .bind(&release.additional_notes)
    .bind(checklist_json)
    .bind(release.is_planned as i64)
    .bind(release.completion_percentage as i64)
    .bind(release.created_at.to_rfc3339())
    .bind(release.updated_at.map(|t| t.to_rfc3339()))
    .execute(executor)
    .await?;
    Ok(())
}

/// Delete one release. Returns false when no row matched.
pub async fn delete_release(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM releases WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Replace the whole collection in one transaction. A failed insert
/// rolls back the delete, leaving the stored collection untouched.
pub async fn replace_all(pool: &SqlitePool, releases: &[Release]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM releases").execute(&mut *tx).await?;
    for release in releases {
        upsert_with(&mut *tx, release).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM releases")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// In-memory pool for tests. Pinned to one connection: each pooled
/// connection to `:memory:` would otherwise see its own empty database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relcal_common::release::ReleaseDraft;

    fn sample(id: &str, date: &str) -> Release {
        let draft = ReleaseDraft {
            team_name: "Provisioning".to_string(),
            app_name: "iadp-core".to_string(),
            release_date: date.to_string(),
            dry_run_date: "2025-06-01".to_string(),
            contact_person: "R. Manager".to_string(),
            contact_email: "rm@example.com".to_string(),
            ..Default::default()
        };
        let mut r = draft.validate().unwrap().into_release(Utc::now());
        r.id = id.to_string();
        r
    }

    #[tokio::test]
    async fn upsert_roundtrips_a_release() {
        let pool = connect_in_memory().await.unwrap();
        let release = sample("1700000000000", "2025-06-10");

        upsert_release(&pool, &release).await.unwrap();
        let loaded = get_release(&pool, "1700000000000").await.unwrap().unwrap();
        assert_eq!(loaded.app_name, "iadp-core");
        assert_eq!(loaded.release_date, release.release_date);
        assert_eq!(
            loaded.created_at.timestamp_millis(),
            release.created_at.timestamp_millis()
        );
        assert!(loaded.updated_at.is_none());
    }

    #[tokio::test]
    async fn upsert_overwrites_on_id_collision() {
        let pool = connect_in_memory().await.unwrap();
        let mut release = sample("1", "2025-06-10");
        upsert_release(&pool, &release).await.unwrap();

        release.app_name = "iadp-edge".to_string();
        upsert_release(&pool, &release).await.unwrap();

        assert_eq!(count(&pool).await.unwrap(), 1);
        let loaded = get_release(&pool, "1").await.unwrap().unwrap();
        assert_eq!(loaded.app_name, "iadp-edge");
    }

    #[tokio::test]
    async fn replace_all_swaps_the_collection() {
        let pool = connect_in_memory().await.unwrap();
        upsert_release(&pool, &sample("1", "2025-06-10")).await.unwrap();

        let fresh = vec![sample("2", "2025-06-11"), sample("3", "2025-06-12")];
        replace_all(&pool, &fresh).await.unwrap();

        let ids: Vec<String> = list_releases(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["2", "3"]);
    }

    #[tokio::test]
    async fn replace_all_keeps_old_collection_when_an_insert_fails() {
        let pool = connect_in_memory().await.unwrap();
        upsert_release(&pool, &sample("1", "2025-06-10")).await.unwrap();

        // Force the second insert to fail: both fresh records carry the
        // same app_name, which this index forbids.
        sqlx::query("CREATE UNIQUE INDEX one_release_per_app ON releases (app_name)")
            .execute(&pool)
            .await
            .unwrap();

        let fresh = vec![sample("2", "2025-06-11"), sample("3", "2025-06-12")];
        assert!(replace_all(&pool, &fresh).await.is_err());

        let ids: Vec<String> = list_releases(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, ["1"]);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_matched() {
        let pool = connect_in_memory().await.unwrap();
        upsert_release(&pool, &sample("1", "2025-06-10")).await.unwrap();

        assert!(delete_release(&pool, "1").await.unwrap());
        assert!(!delete_release(&pool, "1").await.unwrap());
    }
}
