/// DDL to create the schema_version tracking table.
///
/// Applied on every open before the version is read; `IF NOT EXISTS` keeps it
/// idempotent.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 schema: the generation journal.
///
/// `original_tweet` and `proposals` hold the service's JSON verbatim so an
/// entry can be reopened exactly as it was first shown. `preview` is the
/// one-line summary shown in the history list.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS generations (
        id             TEXT    PRIMARY KEY,
        username       TEXT    NOT NULL,
        tweet_url      TEXT,
        prompt         TEXT,
        research_id    TEXT,
        content_type   TEXT    NOT NULL
                               CHECK(content_type IN ('tweet','thread','quote','reply')),
        original_tweet TEXT,
        proposals      TEXT    NOT NULL,
        preview        TEXT    NOT NULL,
        created_at     INTEGER NOT NULL
    ) STRICT;

    CREATE INDEX IF NOT EXISTS generations_created_at
        ON generations (created_at DESC);
";

/// Brings the database to the latest schema version. Forward-only and safe
/// to call on every startup.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
