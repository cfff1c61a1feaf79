use chrono::Utc;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};

use super::migrations::run_migrations;
use crate::error::AppResult;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Telegram user as seen in an incoming update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl UserInfo {
    pub fn new(telegram_id: i64, username: Option<String>, first_name: &str, last_name: Option<&str>) -> Self {
        let full_name = [Some(first_name), last_name]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            telegram_id,
            username: username.filter(|u| !u.is_empty()),
            full_name: Some(full_name).filter(|n| !n.is_empty()),
        }
    }

    /// Username, or the numeric id when the user has none
    pub fn user_ref(&self) -> String {
        self.username.clone().unwrap_or_else(|| self.telegram_id.to_string())
    }
}

/// Row counts shown in the admin panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageStats {
    pub users: i64,
    pub videos: i64,
    pub broadcasts: i64,
}

/// Create a new database connection pool
///
/// Initializes a pool with up to 10 connections (WAL journal, foreign keys
/// on) and brings the schema up to date.
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "foreign_keys", "ON")
    });
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;
    log::info!("[DB] Initialized at {}", database_path);

    Ok(pool)
}

/// Get a connection from the pool
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// Inserts the user or refreshes their name and `last_seen`.
/// Returns the internal row id.
pub fn upsert_user(conn: &Connection, user: &UserInfo) -> AppResult<i64> {
    let now = now();
    conn.execute(
        "INSERT INTO users (telegram_id, username, full_name, first_seen, last_seen)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(telegram_id) DO UPDATE SET
            username = excluded.username,
            full_name = excluded.full_name,
            last_seen = excluded.last_seen",
        params![user.telegram_id, user.username, user.full_name, now],
    )?;
    let id = conn.query_row(
        "SELECT id FROM users WHERE telegram_id = ?1",
        params![user.telegram_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Records a delivered video together with its requester.
/// Returns the video row id.
pub fn save_user_and_video(
    conn: &mut Connection,
    user: &UserInfo,
    video_url: &str,
    original_url: Option<&str>,
    platform: &str,
) -> AppResult<i64> {
    let tx = conn.transaction()?;
    let user_id = upsert_user(&tx, user)?;
    tx.execute(
        "INSERT INTO videos (user_id, user_ref, url, original_url, platform, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![user_id, user.user_ref(), video_url, original_url, platform, now()],
    )?;
    let video_id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(video_id)
}

/// Telegram ids of every known user, oldest first
pub fn all_user_ids(conn: &Connection) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT telegram_id FROM users ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Stores the outcome of an admin broadcast
pub fn record_broadcast(conn: &Connection, admin_id: i64, message: &str, sent: u32, failed: u32) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO broadcasts (admin_id, message, sent_count, failed_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![admin_id, message, sent, failed, now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn stats(conn: &Connection) -> AppResult<UsageStats> {
    let count = |table: &str| -> rusqlite::Result<i64> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
    };
    Ok(UsageStats {
        users: count("users")?,
        videos: count("videos")?,
        broadcasts: count("broadcasts")?,
    })
}

/// Delivered videos per platform, most popular first
pub fn platform_breakdown(conn: &Connection, limit: usize) -> AppResult<Vec<(String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT platform, COUNT(*) AS c FROM videos
         GROUP BY platform ORDER BY c DESC, platform ASC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
