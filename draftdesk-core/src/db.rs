use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::HistoryError;
use crate::types::{
    ContentType, GenerationMeta, GenerationResult, HistoryEntry, HistorySummary, OriginalTweet,
    Proposals,
};

/// Oldest entries beyond this count are pruned on every insert.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok(())
    })
    .await?;

    // Leftover WAL from a previous run.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

fn parse_content_type(raw: &str) -> ContentType {
    raw.parse().unwrap_or_default()
}

/// Appends a generation run to the journal and prunes the oldest entries past
/// [`MAX_HISTORY_ENTRIES`]. Returns the new entry's id.
///
/// # Errors
///
/// Returns [`HistoryError`] if serialising the payload or the write fails.
pub async fn record_generation(
    conn: &Connection,
    meta: &GenerationMeta,
    result: &GenerationResult,
) -> Result<String, HistoryError> {
    let id = uuid::Uuid::new_v4().to_string();
    let original_tweet = result
        .original_tweet
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let proposals = serde_json::to_string(&result.proposals)?;
    let preview = result.proposals.preview();

    let row_id = id.clone();
    let meta = meta.clone();
    let research_id = result.research_id.clone();
    let prompt = meta.prompt.clone().or_else(|| result.prompt.clone());

    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO generations
                 (id, username, tweet_url, prompt, research_id, content_type,
                  original_tweet, proposals, preview, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &row_id,
                &meta.username,
                &meta.tweet_url,
                &prompt,
                &research_id,
                meta.content_type.as_str(),
                &original_tweet,
                &proposals,
                &preview,
                now,
            ],
        )?;
        tx.execute(
            "DELETE FROM generations WHERE id NOT IN (
                 SELECT id FROM generations
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1
             )",
            rusqlite::params![MAX_HISTORY_ENTRIES as i64],
        )?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    tracing::debug!(%id, "recorded generation");
    Ok(id)
}

/// Most recent entries first, at most `limit`.
///
/// # Errors
///
/// Returns [`HistoryError`] if the query fails.
pub async fn list_history(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<HistorySummary>, HistoryError> {
    let rows = conn
        .call(move |db| {
            let mut stmt = db.prepare(
                "SELECT id, username, tweet_url, content_type, preview, created_at
                 FROM generations
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![limit as i64], |r| {
                    let content_type: String = r.get(3)?;
                    Ok(HistorySummary {
                        id: r.get(0)?,
                        username: r.get(1)?,
                        tweet_url: r.get(2)?,
                        content_type: parse_content_type(&content_type),
                        preview: r.get(4)?,
                        created_at: r.get(5)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok::<_, rusqlite::Error>(rows)
        })
        .await?;
    Ok(rows)
}

struct RawEntry {
    id: String,
    username: String,
    tweet_url: Option<String>,
    prompt: Option<String>,
    research_id: Option<String>,
    content_type: String,
    original_tweet: Option<String>,
    proposals: String,
    preview: String,
    created_at: i64,
}

/// Loads one entry with its full payload. `None` if `id` is unknown.
///
/// # Errors
///
/// Returns [`HistoryError`] if the query fails or the stored JSON no longer
/// decodes.
pub async fn load_generation(
    conn: &Connection,
    id: &str,
) -> Result<Option<HistoryEntry>, HistoryError> {
    let id = id.to_owned();
    let raw = conn
        .call(move |db| {
            let raw = db
                .query_row(
                    "SELECT id, username, tweet_url, prompt, research_id, content_type,
                            original_tweet, proposals, preview, created_at
                     FROM generations WHERE id = ?1",
                    rusqlite::params![&id],
                    |r| {
                        Ok(RawEntry {
                            id: r.get(0)?,
                            username: r.get(1)?,
                            tweet_url: r.get(2)?,
                            prompt: r.get(3)?,
                            research_id: r.get(4)?,
                            content_type: r.get(5)?,
                            original_tweet: r.get(6)?,
                            proposals: r.get(7)?,
                            preview: r.get(8)?,
                            created_at: r.get(9)?,
                        })
                    },
                )
                .optional()?;
            Ok::<_, rusqlite::Error>(raw)
        })
        .await?;

    let Some(raw) = raw else {
        return Ok(None);
    };
    let original_tweet: Option<OriginalTweet> = raw
        .original_tweet
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    let proposals: Proposals = serde_json::from_str(&raw.proposals)?;

    Ok(Some(HistoryEntry {
        id: raw.id,
        meta: GenerationMeta {
            username: raw.username,
            tweet_url: raw.tweet_url,
            prompt: raw.prompt.clone(),
            content_type: parse_content_type(&raw.content_type),
        },
        result: GenerationResult {
            original_tweet,
            prompt: raw.prompt,
            proposals,
            research_id: raw.research_id,
        },
        preview: raw.preview,
        created_at: raw.created_at,
    }))
}

/// Deletes every entry. Returns how many were removed.
///
/// # Errors
///
/// Returns [`HistoryError`] if the delete fails.
pub async fn clear_history(conn: &Connection) -> Result<usize, HistoryError> {
    let removed = conn
        .call(|db| {
            let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
            let removed = tx.execute("DELETE FROM generations", [])?;
            tx.commit()?;
            Ok::<_, rusqlite::Error>(removed)
        })
        .await?;
    Ok(removed)
}
