//! Integration tests for the file-to-accumulator pipeline.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hand_tracker::hand::Position;
use hand_tracker::stats::PlayerStats;
use hand_tracker::store::{HandStore, SqliteStore};
use hand_tracker::watcher::{FileTailer, IngestBatch, ReadContext, TailerOptions};
use tempfile::TempDir;

/// Six-handed cash hand: CO opens, BB defends, CO bets every street and wins at showdown.
const BARREL_HAND: &str = "PokerStars Hand #254433950499:  Hold'em No Limit ($0.50/$1.00 USD) - 2024/11/20 19:33:05 CET [2024/11/20 13:33:05 ET]
Table 'Aludra II' 6-max Seat #4 is the button
Seat 1: utg_player ($100 in chips)
Seat 2: hj_player ($100 in chips)
Seat 3: co_player ($100 in chips)
Seat 4: btn_player ($100 in chips)
Seat 5: sb_player ($100 in chips)
Seat 6: bb_player ($100 in chips)
sb_player: posts small blind $0.50
bb_player: posts big blind $1
*** HOLE CARDS ***
Dealt to co_player [Ah Kh]
utg_player: folds
hj_player: folds
co_player: raises $2 to $3
btn_player: folds
sb_player: folds
bb_player: calls $2
*** FLOP *** [2c 7d Ks]
bb_player: checks
co_player: bets $4
bb_player: calls $4
*** TURN *** [2c 7d Ks] [9h]
bb_player: checks
co_player: bets $9
bb_player: calls $9
*** RIVER *** [2c 7d Ks 9h] [4s]
bb_player: checks
co_player: bets $20
bb_player: calls $20
*** SHOW DOWN ***
co_player: shows [Ah Kh] (a pair of Kings)
bb_player: mucks hand
co_player collected $72.50 from pot
*** SUMMARY ***
Total pot $72.50 | Rake $0
Board [2c 7d Ks 9h 4s]
Seat 1: utg_player folded before Flop (didn't bet)
Seat 2: hj_player folded before Flop (didn't bet)
Seat 3: co_player showed [Ah Kh] and won ($72.50) with a pair of Kings
Seat 4: btn_player (button) folded before Flop (didn't bet)
Seat 5: sb_player (small blind) folded before Flop
Seat 6: bb_player (big blind) mucked [Qd Qc]


";

/// Same table, next hand: UTG raises first in and everyone folds.
const RFI_HAND: &str = "PokerStars Hand #254433950500:  Hold'em No Limit ($0.50/$1.00 USD) - 2024/11/20 19:34:41 CET [2024/11/20 13:34:41 ET]
Table 'Aludra II' 6-max Seat #5 is the button
Seat 1: utg_player ($100 in chips)
Seat 2: hj_player ($100 in chips)
Seat 3: co_player ($136.50 in chips)
Seat 4: btn_player ($100 in chips)
Seat 5: sb_player ($99.50 in chips)
Seat 6: bb_player ($64 in chips)
bb_player: posts small blind $0.50
utg_player: posts big blind $1
*** HOLE CARDS ***
hj_player: raises $1.50 to $2.50
co_player: folds
btn_player: folds
sb_player: folds
bb_player: folds
utg_player: folds
Uncalled bet ($1.50) returned to hj_player
hj_player collected $2.50 from pot
hj_player: doesn't show hand
*** SUMMARY ***
Total pot $2.50 | Rake $0
Seat 1: utg_player (big blind) folded before Flop
Seat 2: hj_player collected ($2.50)
Seat 3: co_player folded before Flop (didn't bet)
Seat 4: btn_player folded before Flop (didn't bet)
Seat 5: sb_player (button) folded before Flop (didn't bet)
Seat 6: bb_player (small blind) folded before Flop


";

fn options() -> TailerOptions {
    TailerOptions {
        idle_flush: Duration::ZERO,
        hero: Some("co_player".to_string()),
        ..TailerOptions::default()
    }
}

fn append(path: &Path, text: &str) {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .expect("Failed to open hand-history file");
    f.write_all(text.as_bytes()).expect("Failed to append");
}

async fn memory_store() -> Arc<SqliteStore> {
    Arc::new(
        SqliteStore::open_in_memory()
            .await
            .expect("Failed to open store"),
    )
}

fn total(rows: &[PlayerStats]) -> hand_tracker::stats::StatCounters {
    let mut sum = hand_tracker::stats::StatCounters::default();
    for row in rows {
        sum.merge(&row.counters);
    }
    sum
}

#[tokio::test]
async fn test_pipeline_accumulates_barrels_and_showdown() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = memory_store().await;
    append(&dir.path().join("Aludra II.txt"), BARREL_HAND);

    let mut tailer = FileTailer::new(dir.path(), store.clone(), options());
    let report = tailer.tick().await;
    assert_eq!(report.hands_persisted, 1);
    assert_eq!(report.malformed_hands, 0);
    assert_eq!(report.malformed_lines, 0);

    let co = store.player_stats("co_player").await.unwrap();
    assert_eq!(co.len(), 1);
    assert_eq!(co[0].key.position, Some(Position::Cutoff));
    assert_eq!(co[0].key.max_seats, 6);
    assert_eq!(co[0].key.seats_occupied, 6);
    assert_eq!(co[0].key.stack_bucket, Some(3));

    let c = co[0].counters;
    assert_eq!((c.cbet_flop, c.cbet_flop_opp), (1, 1));
    assert_eq!((c.barrel_turn, c.barrel_turn_opp), (1, 1));
    assert_eq!((c.barrel_river, c.barrel_river_opp), (1, 1));
    assert_eq!((c.steal, c.steal_opp), (1, 1));
    assert_eq!((c.went_showdown, c.won_showdown, c.won_hand), (1, 1, 1));

    let bb = total(&store.player_stats("bb_player").await.unwrap());
    assert_eq!(bb.went_showdown, 1);
    assert_eq!(bb.won_hand, 0);
    assert_eq!(bb.fold_bb_vs_steal_opp, 1);
    assert_eq!(bb.fold_to_cbet_flop_opp, 1);
}

#[tokio::test]
async fn test_pipeline_splits_hands_into_position_buckets() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = memory_store().await;
    append(
        &dir.path().join("Aludra II.txt"),
        &format!("{BARREL_HAND}{RFI_HAND}"),
    );

    let mut tailer = FileTailer::new(dir.path(), store.clone(), options());
    assert_eq!(tailer.tick().await.hands_persisted, 2);
    assert_eq!(store.count_hands().await.unwrap(), 2);

    let hj = store.player_stats("hj_player").await.unwrap();
    assert_eq!(hj.len(), 2);
    let hj = total(&hj);
    assert_eq!(hj.hands, 2);
    assert_eq!((hj.rfi, hj.rfi_opp), (1, 2));
    assert_eq!(hj.won_without_showdown, 1);

    let co = store.player_stats("co_player").await.unwrap();
    assert_eq!(co.len(), 2);
    assert!(co.iter().any(|r| r.key.position == Some(Position::Hijack)));
}

#[tokio::test]
async fn test_rerun_on_unchanged_file_persists_nothing() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = memory_store().await;
    append(
        &dir.path().join("table.txt"),
        &format!("{BARREL_HAND}{RFI_HAND}"),
    );

    let mut tailer = FileTailer::new(dir.path(), store.clone(), options());
    assert_eq!(tailer.tick().await.hands_persisted, 2);

    let before = store.player_stats("co_player").await.unwrap();
    let report = tailer.tick().await;
    assert_eq!(report.hands_persisted, 0);
    assert_eq!(report.duplicates, 0);
    assert_eq!(store.player_stats("co_player").await.unwrap(), before);
}

#[tokio::test]
async fn test_crash_before_commit_does_not_double_count() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path: PathBuf = dir.path().join("table.txt");
    let content = format!("{BARREL_HAND}{RFI_HAND}");
    append(&path, &content);

    // Uninterrupted run.
    let clean = memory_store().await;
    FileTailer::new(dir.path(), clean.clone(), options())
        .tick()
        .await;

    // Hands persisted but the process dies before the offset commit.
    let crashed = memory_store().await;
    let size = std::fs::metadata(&path).unwrap().len();
    let file_id = crashed.register_file(&path, 0, size).await.unwrap();
    let ctx = ReadContext {
        path: &path,
        file_id,
        base: 0,
        mtime: 0,
        size,
        hero: Some("co_player"),
    };
    let batch = IngestBatch::prepare(&ctx, content.as_bytes());
    for hand in &batch.hands {
        assert!(crashed.persist_hand(file_id, hand).await.unwrap());
    }
    assert_eq!(
        crashed.get_file_offset(&path).await.unwrap().unwrap().offset,
        0
    );

    // Restart re-reads the same bytes.
    let report = FileTailer::new(dir.path(), crashed.clone(), options())
        .tick()
        .await;
    assert_eq!(report.hands_persisted, 0);
    assert_eq!(report.duplicates, 2);

    for player in ["utg_player", "hj_player", "co_player", "btn_player", "sb_player", "bb_player"] {
        assert_eq!(
            crashed.player_stats(player).await.unwrap(),
            clean.player_stats(player).await.unwrap(),
            "{player}"
        );
    }
    assert_eq!(
        crashed.get_file_offset(&path).await.unwrap().unwrap().offset,
        size
    );
}

#[tokio::test]
async fn test_hand_written_in_two_pieces() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = memory_store().await;
    let path = dir.path().join("table.txt");
    let (head, tail) = RFI_HAND.split_at(RFI_HAND.len() / 3);

    append(&path, &format!("{BARREL_HAND}{head}"));
    let mut tailer = FileTailer::new(dir.path(), store.clone(), options());
    assert_eq!(tailer.tick().await.hands_persisted, 1);
    assert_eq!(
        store.get_file_offset(&path).await.unwrap().unwrap().offset,
        BARREL_HAND.len() as u64
    );

    append(&path, tail);
    assert_eq!(tailer.tick().await.hands_persisted, 1);
    assert_eq!(store.count_hands().await.unwrap(), 2);
}

#[tokio::test]
async fn test_offsets_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = db_dir.path().join("tracker.db");
    append(&dir.path().join("table.txt"), BARREL_HAND);

    {
        let store = Arc::new(SqliteStore::open(&db_path).await.unwrap());
        let report = FileTailer::new(dir.path(), store, options()).tick().await;
        assert_eq!(report.hands_persisted, 1);
    }

    let store = Arc::new(SqliteStore::open(&db_path).await.unwrap());
    append(&dir.path().join("table.txt"), RFI_HAND);
    let report = FileTailer::new(dir.path(), store.clone(), options())
        .tick()
        .await;
    assert_eq!(report.hands_persisted, 1);
    assert_eq!(report.duplicates, 0);
    assert_eq!(store.count_hands().await.unwrap(), 2);
}

#[tokio::test]
async fn test_malformed_hand_skipped_with_bom() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = memory_store().await;
    let broken = RFI_HAND.replace("Table 'Aludra II' 6-max", "Tabel");
    append(
        &dir.path().join("table.txt"),
        &format!("\u{feff}{broken}{BARREL_HAND}"),
    );

    let report = FileTailer::new(dir.path(), store.clone(), options())
        .tick()
        .await;
    assert_eq!(report.malformed_hands, 1);
    assert_eq!(report.hands_persisted, 1);
    assert_eq!(store.count_hands().await.unwrap(), 1);
}

#[tokio::test]
async fn test_other_extensions_ignored() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = memory_store().await;
    append(&dir.path().join("notes.log"), BARREL_HAND);

    let report = FileTailer::new(dir.path(), store.clone(), options())
        .tick()
        .await;
    assert_eq!(report.files_scanned, 0);
    assert_eq!(store.count_hands().await.unwrap(), 0);
}
