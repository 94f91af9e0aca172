#![allow(dead_code)]

use mandarin_core::model::snapshot::{MemberRecord, Snapshot, TaskRecord, TeamRecord};
use rusqlite::Connection;

pub fn tasks(count: u32, completed: &[u32]) -> Vec<TaskRecord> {
    (1..=count)
        .map(|number| TaskRecord {
            number,
            description: format!("Task {number}"),
            is_completed: completed.contains(&number),
        })
        .collect()
}

pub fn member(last_name: &str, first_name: &str, sheet_index: u32) -> MemberRecord {
    MemberRecord {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        sheet_index,
        tasks: tasks(10, &[]),
    }
}

pub fn team(number: u32, name: &str, members: Vec<MemberRecord>) -> TeamRecord {
    TeamRecord {
        number,
        name: name.to_string(),
        tasks: tasks(7, &[]),
        members,
    }
}

/// Two teams: team 1 with two members, team 2 with one.
pub fn small_snapshot() -> Snapshot {
    Snapshot::new(vec![
        team(
            1,
            "Owls",
            vec![member("Ivanova", "Anna", 0), member("Petrov", "Boris", 1)],
        ),
        team(2, "Foxes", vec![member("Sidorov", "Ivan", 0)]),
    ])
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

pub fn score_sum(conn: &Connection) -> (i64, i64) {
    let teams = conn
        .query_row("SELECT COALESCE(SUM(score), 0) FROM teams;", [], |row| row.get(0))
        .unwrap();
    let members = conn
        .query_row("SELECT COALESCE(SUM(score), 0) FROM members;", [], |row| {
            row.get(0)
        })
        .unwrap();
    (teams, members)
}

pub fn team_task_id(conn: &Connection, team_number: u32, task_number: u32) -> i64 {
    conn.query_row(
        "SELECT t.id FROM team_tasks t JOIN teams ON teams.id = t.team_id
         WHERE teams.number = ?1 AND t.task_number = ?2;",
        [team_number, task_number],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn personal_task_id(conn: &Connection, last_name: &str, task_number: u32) -> i64 {
    conn.query_row(
        "SELECT p.id FROM personal_tasks p JOIN members m ON m.id = p.member_id
         WHERE m.last_name = ?1 AND p.task_number = ?2;",
        rusqlite::params![last_name, task_number],
        |row| row.get(0),
    )
    .unwrap()
}
