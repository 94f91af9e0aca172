mod common;

use common::small_snapshot;
use mandarin_core::db::open_db_in_memory;
use mandarin_core::model::entities::{Member, Team};
use mandarin_core::repo::member_repo::SqliteMemberRepository;
use mandarin_core::repo::team_repo::SqliteTeamRepository;
use mandarin_core::service::ranking_service::{
    rank_members, rank_teams, RankingError, RankingService,
};
use mandarin_core::service::reconcile_service::ReconcileService;

const MAX: i64 = 10;

fn team(id: i64, score: i64) -> Team {
    Team {
        id,
        number: id as u32,
        name: Some(format!("Team {id}")),
        score,
    }
}

fn member(id: i64, team_id: i64, name: &str, score: i64, reached_max_at: Option<i64>) -> Member {
    Member {
        id,
        team_id,
        first_name: String::new(),
        last_name: name.to_string(),
        score,
        sheet_index: 0,
        reached_max_at,
    }
}

#[test]
fn higher_total_wins_the_leaderboard() {
    let teams = vec![team(1, 6), team(2, 3)];
    let members = vec![
        member(1, 1, "a", 4, None),
        member(2, 2, "b", 5, None),
        member(3, 2, "c", 4, None),
    ];

    let rows = rank_teams(&teams, &members);

    assert_eq!(rows[0].number, 2);
    assert_eq!(rows[0].total, 12);
    assert_eq!(rows[0].members_score, 9);
    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[1].number, 1);
    assert_eq!(rows[1].total, 10);
    assert_eq!(rows[1].rank, 2);
}

#[test]
fn maximum_scorers_break_ties_by_team_total_then_time() {
    let teams = vec![team(1, 5), team(2, 5), team(3, 10), team(4, 5), team(5, 20)];
    let members = vec![
        member(1, 1, "A", 10, Some(1_000)),
        member(2, 2, "B", 10, Some(2_000)),
        member(3, 3, "C", 10, Some(9_000)),
        member(4, 4, "E", 10, None),
        member(5, 5, "D", 9, Some(1)),
    ];

    let standings = rank_teams(&teams, &members);
    let ranked = rank_members(&members, &standings, MAX, None);

    let order = ranked
        .iter()
        .map(|row| row.full_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["C", "A", "B", "E", "D"]);
    assert_eq!(ranked[0].team_total, 20);
    assert_eq!(ranked[4].rank, 5);
}

#[test]
fn below_maximum_ties_keep_input_order_and_limit_applies() {
    let teams = vec![team(1, 0), team(2, 30)];
    let members = vec![
        member(1, 1, "low-team", 7, None),
        member(2, 2, "high-team", 7, None),
        member(3, 2, "leader", 8, None),
    ];

    let standings = rank_teams(&teams, &members);
    let ranked = rank_members(&members, &standings, MAX, Some(2));

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].member_id, 3);
    assert_eq!(ranked[1].member_id, 1);
    assert_eq!(ranked[1].rank, 2);
}

#[test]
fn service_reads_scores_from_the_store() {
    let conn = open_db_in_memory().unwrap();
    ReconcileService::new(&conn)
        .reconcile(&small_snapshot())
        .unwrap();
    conn.execute_batch(
        "UPDATE teams SET score = 6 WHERE number = 1;
         UPDATE teams SET score = 3 WHERE number = 2;
         UPDATE members SET score = 2 WHERE last_name IN ('Ivanova', 'Petrov');
         UPDATE members SET score = 9 WHERE last_name = 'Sidorov';",
    )
    .unwrap();
    let service = RankingService::new(
        SqliteTeamRepository::try_new(&conn).unwrap(),
        SqliteMemberRepository::try_new(&conn).unwrap(),
        MAX,
    );

    let board = service.leaderboard().unwrap();
    assert_eq!(
        board
            .iter()
            .map(|row| (row.number, row.total, row.member_count))
            .collect::<Vec<_>>(),
        vec![(2, 12, 1), (1, 10, 2)]
    );

    let top = service.member_ranking(Some(1)).unwrap();
    assert_eq!(top[0].full_name, "Sidorov Ivan");
    assert_eq!(top[0].team_number, 2);

    let details = service.team_details(1).unwrap();
    assert_eq!(details.standing.rank, 2);
    assert_eq!(details.standing.name, "Owls");
    assert_eq!(details.tasks.len(), 7);
    assert_eq!(details.members.len(), 2);

    let missing = service.team_details(9).unwrap_err();
    assert!(matches!(missing, RankingError::TeamNotFound(9)));
}

#[test]
fn member_details_list_personal_tasks_in_order() {
    let conn = open_db_in_memory().unwrap();
    ReconcileService::new(&conn)
        .reconcile(&small_snapshot())
        .unwrap();
    let service = RankingService::new(
        SqliteTeamRepository::try_new(&conn).unwrap(),
        SqliteMemberRepository::try_new(&conn).unwrap(),
        MAX,
    );
    let sidorov = service.team_details(2).unwrap().members[0].id;

    let details = service.member_details(sidorov).unwrap();

    assert_eq!(details.member.full_name(), "Sidorov Ivan");
    assert_eq!(details.team_number, 2);
    assert_eq!(details.team_name, "Foxes");
    assert_eq!(
        details
            .tasks
            .iter()
            .map(|task| task.task_number)
            .collect::<Vec<_>>(),
        (1..=10).collect::<Vec<_>>()
    );
    assert!(details.tasks.iter().all(|task| task.member_id == sidorov));

    let missing = service.member_details(9_999).unwrap_err();
    assert!(matches!(missing, RankingError::MemberNotFound(9_999)));
}
