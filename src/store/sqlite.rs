//! `SQLite` hand store with async operations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use tokio::sync::Mutex;

use super::error::StoreError;
use super::gateway::{BatchOutcome, FileState, HandStore, OffsetCommit};
use super::schema;
use crate::hand::{GameKind, Position};
use crate::stats::{AnalyzedHand, PlayerStats, StatCounters, StatsKey};

/// Returns the default path for the tracker database.
///
/// This is `~/.local/share/hand-tracker/tracker.db` on Unix systems.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hand-tracker")
        .join("tracker.db")
}

static UPSERT_STATS: LazyLock<String> = LazyLock::new(|| {
    let columns = StatCounters::COLUMNS;
    let names = columns.join(", ");
    let placeholders = (6..6 + columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .map(|c| format!("{c} = {c} + excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO player_stats (player_id, position, max_seats, seats_occupied, stack_bucket, {names})
         VALUES (?1, ?2, ?3, ?4, ?5, {placeholders})
         ON CONFLICT (player_id, position, max_seats, seats_occupied, stack_bucket)
         DO UPDATE SET {updates}"
    )
});

static SELECT_STATS: LazyLock<String> = LazyLock::new(|| {
    let names = StatCounters::COLUMNS
        .iter()
        .map(|c| format!("s.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT s.position, s.max_seats, s.seats_occupied, s.stack_bucket, {names}
         FROM player_stats s JOIN players p ON p.id = s.player_id
         WHERE p.name = ?1
         ORDER BY s.max_seats, s.seats_occupied, s.position, s.stack_bucket"
    )
});

/// Hand store backed by a single `SQLite` connection.
///
/// Every call runs on the blocking pool via `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open a store at the specified path.
    ///
    /// Creates parent directories if they don't exist and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the schema cannot be applied.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    StoreError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        let path_clone = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn =
                Connection::open(&path_clone).map_err(|source| StoreError::DatabaseOpen {
                    path: path_clone,
                    source,
                })?;
            schema::apply(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        tracing::debug!(path = %path.display(), "Opened hand store");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path),
        })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or the schema cannot be applied.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = tokio::task::spawn_blocking(|| -> Result<Connection, StoreError> {
            let conn = Connection::open_in_memory()?;
            schema::apply(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Returns the path to the database, if opened from a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn player_id(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.execute("INSERT OR IGNORE INTO players (name) VALUES (?1)", [name])?;
    conn.query_row("SELECT id FROM players WHERE name = ?1", [name], |row| {
        row.get(0)
    })
}

/// Resolves player ids once per hand.
struct PlayerIds<'t, 'c> {
    tx: &'t Transaction<'c>,
    cache: HashMap<String, i64>,
}

impl PlayerIds<'_, '_> {
    fn get(&mut self, name: &str) -> rusqlite::Result<i64> {
        if let Some(&id) = self.cache.get(name) {
            return Ok(id);
        }
        let id = player_id(self.tx, name)?;
        self.cache.insert(name.to_string(), id);
        Ok(id)
    }
}

fn insert_hand(tx: &Transaction<'_>, file_id: i64, hand: &AnalyzedHand) -> rusqlite::Result<bool> {
    let record = &hand.record;
    let (stakes, tournament_id, buy_in) = match &record.game {
        GameKind::Cash { stakes } => (Some(stakes.as_str()), None, None),
        GameKind::Tournament {
            tournament_id,
            buy_in,
        } => (None, Some(tournament_id.as_str()), Some(buy_in.as_str())),
    };

    let inserted = tx.execute(
        "INSERT OR IGNORE INTO hands (hand_no, file_id, game_kind, stakes, tournament_id, buy_in,
             currency, small_blind, big_blind, local_time, timezone, table_name, max_seats,
             button_seat, hero_cards, board, inserted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            record.hand_id,
            file_id,
            record.game.as_str(),
            stakes,
            tournament_id,
            buy_in,
            record.currency,
            record.header_blinds.map(|(sb, _)| sb),
            record.big_blind(),
            record.local_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            record.timezone,
            record.table_name,
            record.max_seats,
            record.button_seat,
            record.hero_cards,
            record.board.join(" "),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    if inserted == 0 {
        return Ok(false);
    }
    let hand_row = tx.last_insert_rowid();

    let mut ids = PlayerIds {
        tx,
        cache: HashMap::new(),
    };

    for seat in &record.seats {
        let result = record.result_of(&seat.player);
        tx.execute(
            "INSERT INTO seats (hand_id, seat, player_id, chips, bounty, sitting_out, position,
                 shown_cards, collected)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                hand_row,
                seat.seat,
                ids.get(&seat.player)?,
                seat.chips,
                seat.bounty,
                seat.sitting_out,
                seat.position.as_ref().map(Position::as_str),
                result.and_then(|r| r.cards.as_deref()),
                result.and_then(|r| r.collected),
            ],
        )?;
    }

    for post in &record.posts {
        tx.execute(
            "INSERT INTO posts (hand_id, player_id, kind, amount) VALUES (?1, ?2, ?3, ?4)",
            params![hand_row, ids.get(&post.player)?, post.kind.as_str(), post.amount],
        )?;
    }

    for (seq, action) in record.actions.iter().enumerate() {
        tx.execute(
            "INSERT INTO actions (hand_id, seq, street, player_id, kind, amount, raise_from,
                 raise_to, all_in)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                hand_row,
                seq,
                action.street.as_str(),
                ids.get(&action.player)?,
                action.kind.as_str(),
                action.amount,
                action.raise_from,
                action.raise_to,
                action.all_in,
            ],
        )?;
    }

    for stats in &hand.stats.players {
        let key = &stats.key;
        let mut values = vec![
            Value::Integer(ids.get(&key.player)?),
            Value::Text(key.position.as_ref().map_or("", Position::as_str).to_string()),
            Value::Integer(i64::from(key.max_seats)),
            Value::Integer(i64::from(key.seats_occupied)),
            Value::Integer(key.stack_bucket.map_or(-1, i64::from)),
        ];
        values.extend(
            stats
                .counters
                .values()
                .into_iter()
                .map(|v| Value::Integer(i64::from(v))),
        );
        tx.execute(&UPSERT_STATS, params_from_iter(values))?;
    }

    Ok(true)
}

fn update_offset(conn: &Connection, file_id: i64, commit: OffsetCommit) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE files SET last_offset = ?1, last_mtime = ?2, last_size = ?3,
             updated_at = datetime('now')
         WHERE id = ?4",
        params![commit.offset, commit.mtime, commit.size, file_id],
    )?;
    if updated == 0 {
        return Err(StoreError::NotRegistered(file_id));
    }
    Ok(())
}

fn read_stats_row(player: &str, row: &rusqlite::Row<'_>) -> rusqlite::Result<PlayerStats> {
    let position: String = row.get(0)?;
    let stack_bucket: i64 = row.get(3)?;
    let values = (0..StatCounters::COLUMNS.len())
        .map(|i| row.get::<_, u32>(4 + i))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(PlayerStats {
        key: StatsKey {
            player: player.to_string(),
            position: Position::from_label(&position),
            max_seats: row.get(1)?,
            seats_occupied: row.get(2)?,
            stack_bucket: u8::try_from(stack_bucket).ok(),
        },
        counters: StatCounters::from_values(&values),
    })
}

#[async_trait]
impl HandStore for SqliteStore {
    async fn register_file(&self, path: &Path, mtime: i64, size: u64) -> Result<i64, StoreError> {
        let path = path.to_string_lossy().into_owned();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<i64, StoreError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO files (path, last_mtime, last_size) VALUES (?1, ?2, ?3)
                 ON CONFLICT (path) DO UPDATE SET last_mtime = excluded.last_mtime,
                     last_size = excluded.last_size, updated_at = datetime('now')",
                params![path, mtime, size],
            )?;
            let id = conn.query_row("SELECT id FROM files WHERE path = ?1", [&path], |row| {
                row.get(0)
            })?;
            Ok(id)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn get_file_offset(&self, path: &Path) -> Result<Option<FileState>, StoreError> {
        let path = path.to_string_lossy().into_owned();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<FileState>, StoreError> {
            let conn = conn.blocking_lock();
            let state = conn
                .query_row(
                    "SELECT id, last_offset, last_mtime, last_size FROM files WHERE path = ?1",
                    [&path],
                    |row| {
                        Ok(FileState {
                            file_id: row.get(0)?,
                            offset: row.get(1)?,
                            mtime: row.get(2)?,
                            size: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(state)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn commit_file_offset(
        &self,
        file_id: i64,
        commit: OffsetCommit,
    ) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = conn.blocking_lock();
            update_offset(&conn, file_id, commit)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn persist_hand(&self, file_id: i64, hand: &AnalyzedHand) -> Result<bool, StoreError> {
        let hand = hand.clone();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<bool, StoreError> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction()?;
            let inserted = insert_hand(&tx, file_id, &hand)?;
            tx.commit()?;
            if !inserted {
                tracing::debug!(hand_id = %hand.record.hand_id, "Skipping duplicate hand");
            }
            Ok(inserted)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn resolve_player_id(&self, name: &str) -> Result<i64, StoreError> {
        let name = name.to_string();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<i64, StoreError> {
            let conn = conn.blocking_lock();
            Ok(player_id(&conn, &name)?)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn count_hands(&self) -> Result<u64, StoreError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
            let conn = conn.blocking_lock();
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM hands", [], |row| row.get(0))?;
            Ok(count.unsigned_abs())
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    async fn player_stats(&self, name: &str) -> Result<Vec<PlayerStats>, StoreError> {
        let name = name.to_string();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<PlayerStats>, StoreError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(&SELECT_STATS)?;
            let rows = stmt
                .query_map([&name], |row| read_stats_row(&name, row))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }

    /// Persists every hand and commits the offset in one transaction.
    async fn apply_batch(
        &self,
        file_id: i64,
        hands: &[AnalyzedHand],
        commit: OffsetCommit,
    ) -> Result<BatchOutcome, StoreError> {
        let hands = hands.to_vec();

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<BatchOutcome, StoreError> {
            let mut conn = conn.blocking_lock();
            let tx = conn.transaction()?;
            let mut outcome = BatchOutcome::default();
            for hand in &hands {
                if insert_hand(&tx, file_id, hand)? {
                    outcome.persisted += 1;
                } else {
                    tracing::debug!(hand_id = %hand.record.hand_id, "Skipping duplicate hand");
                    outcome.duplicates += 1;
                }
            }
            update_offset(&tx, file_id, commit)?;
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(|_| StoreError::TaskCancelled)?
    }
}
