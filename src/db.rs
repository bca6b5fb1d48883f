use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: i64,
    pub tweet_id: i64,
    pub local_filename: String,
    pub is_downloaded: bool,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Creates the columns this tool touches when they are missing. An
    /// existing archive keeps its own, wider schema.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tweets (
                id INTEGER PRIMARY KEY,
                is_content_downloaded BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS videos (
                id INTEGER PRIMARY KEY,
                tweet_id INTEGER NOT NULL REFERENCES tweets(id),
                local_filename TEXT NOT NULL,
                is_downloaded BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS index_videos_tweet_id ON videos (tweet_id);
            "#,
        )?;
        Ok(())
    }

    pub fn transaction(&mut self) -> rusqlite::Result<Transaction<'_>> {
        self.conn.transaction()
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn tweet_exists(conn: &Connection, tweet_id: i64) -> rusqlite::Result<bool> {
    conn.query_row("SELECT 1 FROM tweets WHERE id = ?1", params![tweet_id], |_| Ok(()))
        .optional()
        .map(|row| row.is_some())
}

pub fn videos_for_tweet(conn: &Connection, tweet_id: i64) -> rusqlite::Result<Vec<VideoRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, tweet_id, local_filename, is_downloaded FROM videos WHERE tweet_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![tweet_id], |row| {
        Ok(VideoRecord {
            id: row.get(0)?,
            tweet_id: row.get(1)?,
            local_filename: row.get(2)?,
            is_downloaded: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn mark_video_not_downloaded(conn: &Connection, video_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE videos SET is_downloaded = 0 WHERE id = ?1",
        params![video_id],
    )?;
    Ok(())
}

pub fn mark_tweet_content_not_downloaded(conn: &Connection, tweet_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE tweets SET is_content_downloaded = 0 WHERE id = ?1",
        params![tweet_id],
    )?;
    Ok(())
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn insert_tweet(conn: &Connection, id: i64, is_content_downloaded: bool) {
        conn.execute(
            "INSERT INTO tweets (id, is_content_downloaded) VALUES (?1, ?2)",
            params![id, is_content_downloaded],
        )
        .expect("insert tweet");
    }

    pub fn insert_video(conn: &Connection, id: i64, tweet_id: i64, local_filename: &str, is_downloaded: bool) {
        conn.execute(
            "INSERT INTO videos (id, tweet_id, local_filename, is_downloaded) VALUES (?1, ?2, ?3, ?4)",
            params![id, tweet_id, local_filename, is_downloaded],
        )
        .expect("insert video");
    }

    pub fn tweet_is_content_downloaded(conn: &Connection, id: i64) -> bool {
        conn.query_row(
            "SELECT is_content_downloaded FROM tweets WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .expect("tweet row")
    }

    pub fn video_is_downloaded(conn: &Connection, id: i64) -> bool {
        conn.query_row(
            "SELECT is_downloaded FROM videos WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .expect("video row")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn migrate_is_repeatable() {
        let db = Database::open_in_memory().expect("open");
        db.migrate().expect("first migrate");
        db.migrate().expect("second migrate");
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("archive").join("twitter.db");

        let db = Database::open(&path).expect("open");
        db.migrate().expect("migrate");

        assert!(path.exists());
    }

    #[test]
    fn videos_for_tweet_only_returns_that_tweets_rows() {
        let db = Database::open_in_memory().expect("open");
        db.migrate().expect("migrate");
        let conn = db.connection();
        insert_tweet(conn, 42, true);
        insert_tweet(conn, 43, true);
        insert_video(conn, 8, 42, "42_1.mp4", false);
        insert_video(conn, 7, 42, "42_0.mp4", true);
        insert_video(conn, 9, 43, "43_0.mp4", true);

        let videos = videos_for_tweet(conn, 42).expect("query");

        assert_eq!(
            videos,
            vec![
                VideoRecord {
                    id: 7,
                    tweet_id: 42,
                    local_filename: "42_0.mp4".to_string(),
                    is_downloaded: true,
                },
                VideoRecord {
                    id: 8,
                    tweet_id: 42,
                    local_filename: "42_1.mp4".to_string(),
                    is_downloaded: false,
                },
            ]
        );
    }

    #[test]
    fn tweet_exists_distinguishes_known_ids() {
        let db = Database::open_in_memory().expect("open");
        db.migrate().expect("migrate");
        insert_tweet(db.connection(), 42, false);

        assert!(tweet_exists(db.connection(), 42).expect("query"));
        assert!(!tweet_exists(db.connection(), 41).expect("query"));
    }
}
