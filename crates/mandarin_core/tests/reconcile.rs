mod common;

use common::{count, member, score_sum, small_snapshot, tasks, team};
use mandarin_core::db::open_db_in_memory;
use mandarin_core::model::snapshot::Snapshot;
use mandarin_core::service::ledger_service::LedgerService;
use mandarin_core::service::reconcile_service::{ReconcileService, ReconcileStats};

#[test]
fn first_import_creates_every_row() {
    let conn = open_db_in_memory().unwrap();

    let stats = ReconcileService::new(&conn)
        .reconcile(&small_snapshot())
        .unwrap();

    assert_eq!(
        stats,
        ReconcileStats {
            teams_created: 2,
            members_created: 3,
            team_tasks_created: 14,
            personal_tasks_created: 30,
            ..ReconcileStats::default()
        }
    );
    assert_eq!(count(&conn, "teams"), 2);
    assert_eq!(count(&conn, "members"), 3);
    assert_eq!(count(&conn, "team_tasks"), 14);
    assert_eq!(count(&conn, "personal_tasks"), 30);
}

#[test]
fn reimporting_identical_snapshot_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let service = ReconcileService::new(&conn);
    let snapshot = small_snapshot();

    service.reconcile(&snapshot).unwrap();
    let ledger = LedgerService::new(&conn);
    ledger
        .toggle_team_task(common::team_task_id(&conn, 1, 1))
        .unwrap();
    ledger
        .toggle_personal_task(common::personal_task_id(&conn, "Petrov", 4))
        .unwrap();
    let scores_before = score_sum(&conn);
    let rows_before = count(&conn, "personal_tasks") + count(&conn, "team_tasks");

    let again = service.reconcile(&snapshot).unwrap();

    assert_eq!(again.created_total(), 0);
    assert_eq!(score_sum(&conn), scores_before);
    assert_eq!(
        count(&conn, "personal_tasks") + count(&conn, "team_tasks"),
        rows_before
    );
}

#[test]
fn grid_flag_changes_overwrite_flags_without_touching_scores() {
    let conn = open_db_in_memory().unwrap();
    let service = ReconcileService::new(&conn);
    service.reconcile(&small_snapshot()).unwrap();

    let mut edited = small_snapshot();
    edited.teams[0].tasks = tasks(7, &[2, 5]);
    edited.teams[0].members[1].tasks = tasks(10, &[1]);

    let stats = service.reconcile(&edited).unwrap();

    assert_eq!(stats.team_tasks_updated, 2);
    assert_eq!(stats.personal_tasks_updated, 1);
    let completed: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM team_tasks WHERE is_completed = 1;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(completed, 2);
    assert_eq!(score_sum(&conn), (0, 0));
}

#[test]
fn moved_member_updates_sheet_index_only() {
    let conn = open_db_in_memory().unwrap();
    let service = ReconcileService::new(&conn);
    service.reconcile(&small_snapshot()).unwrap();

    let moved = Snapshot::new(vec![team(2, "Foxes", vec![member("Sidorov", "Ivan", 7)])]);
    let stats = service.reconcile(&moved).unwrap();

    assert_eq!(stats.members_updated, 1);
    assert_eq!(stats.members_created, 0);
    let sheet_index: i64 = conn
        .query_row(
            "SELECT sheet_index FROM members WHERE last_name = 'Sidorov';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(sheet_index, 7);
}

#[test]
fn new_seat_creates_member_with_tasks() {
    let conn = open_db_in_memory().unwrap();
    let service = ReconcileService::new(&conn);
    service.reconcile(&small_snapshot()).unwrap();

    let grown = Snapshot::new(vec![team(
        2,
        "Foxes",
        vec![member("Sidorov", "Ivan", 0), member("Sidorova", "Maria", 1)],
    )]);
    let stats = service.reconcile(&grown).unwrap();

    assert_eq!(stats.members_created, 1);
    assert_eq!(stats.personal_tasks_created, 10);
    assert_eq!(count(&conn, "members"), 4);
}
