//! Database schema for the hand store.

use rusqlite::Connection;

use crate::stats::StatCounters;

/// Current schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;

/// Tables for files, players and hand records.
///
/// The `player_stats` table is generated from [`StatCounters::COLUMNS`] by
/// [`player_stats_table`].
pub const SCHEMA: &str = r"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Files: read progress per hand-history file
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE,
    last_offset INTEGER NOT NULL DEFAULT 0,
    last_mtime INTEGER NOT NULL DEFAULT 0,
    last_size INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS hands (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hand_no TEXT NOT NULL UNIQUE,
    file_id INTEGER NOT NULL,
    game_kind TEXT NOT NULL,
    stakes TEXT,
    tournament_id TEXT,
    buy_in TEXT,
    currency TEXT,
    small_blind REAL,
    big_blind REAL,
    local_time TEXT NOT NULL,
    timezone TEXT NOT NULL,
    table_name TEXT NOT NULL,
    max_seats INTEGER NOT NULL,
    button_seat INTEGER NOT NULL,
    hero_cards TEXT,
    board TEXT NOT NULL DEFAULT '',
    inserted_at TEXT NOT NULL,
    FOREIGN KEY (file_id) REFERENCES files(id)
);

CREATE TABLE IF NOT EXISTS seats (
    hand_id INTEGER NOT NULL,
    seat INTEGER NOT NULL,
    player_id INTEGER NOT NULL,
    chips REAL NOT NULL,
    bounty REAL,
    sitting_out INTEGER NOT NULL DEFAULT 0,
    position TEXT,
    shown_cards TEXT,
    collected REAL,
    PRIMARY KEY (hand_id, seat),
    FOREIGN KEY (hand_id) REFERENCES hands(id) ON DELETE CASCADE,
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hand_id INTEGER NOT NULL,
    player_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    amount REAL NOT NULL,
    FOREIGN KEY (hand_id) REFERENCES hands(id) ON DELETE CASCADE,
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE TABLE IF NOT EXISTS actions (
    hand_id INTEGER NOT NULL,
    seq INTEGER NOT NULL,
    street TEXT NOT NULL,
    player_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    amount REAL,
    raise_from REAL,
    raise_to REAL,
    all_in INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (hand_id, seq),
    FOREIGN KEY (hand_id) REFERENCES hands(id) ON DELETE CASCADE,
    FOREIGN KEY (player_id) REFERENCES players(id)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_hands_file_id ON hands(file_id);
CREATE INDEX IF NOT EXISTS idx_seats_player_id ON seats(player_id);
CREATE INDEX IF NOT EXISTS idx_actions_player_id ON actions(player_id);
";

/// DDL for the accumulator table, one integer column per counter.
///
/// Unknown position is stored as `''` and unknown stack bucket as `-1` so
/// that rows without them still collide on the unique key.
#[must_use]
pub fn player_stats_table() -> String {
    let counters: String = StatCounters::COLUMNS
        .iter()
        .map(|c| format!("    {c} INTEGER NOT NULL DEFAULT 0,\n"))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS player_stats (
    player_id INTEGER NOT NULL,
    position TEXT NOT NULL DEFAULT '',
    max_seats INTEGER NOT NULL,
    seats_occupied INTEGER NOT NULL,
    stack_bucket INTEGER NOT NULL DEFAULT -1,
{counters}    UNIQUE (player_id, position, max_seats, seats_occupied, stack_bucket),
    FOREIGN KEY (player_id) REFERENCES players(id)
);"
    )
}

/// Apply the full schema and record its version.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;
    conn.execute_batch(&player_stats_table())?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    Ok(())
}
