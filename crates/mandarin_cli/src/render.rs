//! Text and JSON output for command results.

use anyhow::Result;
use mandarin_core::{
    LeaderboardView, MemberDetails, MemberStanding, ReconcileStats, Snapshot, SyncStatus,
    TeamDetails, ToggleOutcome,
};
use serde::Serialize;

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn snapshot_summary(snapshot: &Snapshot, json: bool) -> Result<()> {
    if json {
        return print_json(snapshot);
    }
    let summary = snapshot.summary();
    println!(
        "parsed teams={} members={} team_tasks={} personal_tasks={}",
        summary.teams, summary.members, summary.team_tasks, summary.personal_tasks
    );
    Ok(())
}

pub fn reconcile_stats(stats: &ReconcileStats, json: bool) -> Result<()> {
    if json {
        return print_json(stats);
    }
    println!("{:<16} {:>8} {:>8}", "", "created", "updated");
    for (label, created, updated) in [
        ("teams", stats.teams_created, stats.teams_updated),
        ("members", stats.members_created, stats.members_updated),
        ("team tasks", stats.team_tasks_created, stats.team_tasks_updated),
        (
            "personal tasks",
            stats.personal_tasks_created,
            stats.personal_tasks_updated,
        ),
    ] {
        println!("{label:<16} {created:>8} {updated:>8}");
    }
    Ok(())
}

pub fn leaderboard(view: &LeaderboardView, json: bool) -> Result<()> {
    if json {
        return print_json(view);
    }
    if !view.visible {
        println!("leaderboard is hidden");
        return Ok(());
    }
    println!(
        "{:>4}  {:<24} {:>6} {:>8} {:>6}",
        "rank", "team", "team", "members", "total"
    );
    for row in &view.rows {
        println!(
            "{:>4}  {:<24} {:>6} {:>8} {:>6}",
            row.rank, row.name, row.team_score, row.members_score, row.total
        );
    }
    Ok(())
}

pub fn team_details(details: &TeamDetails, json: bool) -> Result<()> {
    if json {
        return print_json(details);
    }
    let standing = &details.standing;
    println!(
        "{} (#{}) rank={} total={} team={} members={}",
        standing.name,
        standing.number,
        standing.rank,
        standing.total,
        standing.team_score,
        standing.members_score
    );
    println!("tasks:");
    for task in &details.tasks {
        let mark = if task.is_completed { "x" } else { " " };
        println!("  [{mark}] {:>3} {}. {}", task.id, task.task_number, task.description);
    }
    println!("members:");
    for member in &details.members {
        println!("  {:>3} {:<32} {:>3}", member.id, member.full_name(), member.score);
    }
    Ok(())
}

pub fn member_details(details: &MemberDetails, json: bool) -> Result<()> {
    if json {
        return print_json(details);
    }
    let member = &details.member;
    println!(
        "{} (id {}) team {} (#{}) score={}",
        member.full_name(),
        member.id,
        details.team_name,
        details.team_number,
        member.score
    );
    for task in &details.tasks {
        let mark = if task.is_completed { "x" } else { " " };
        println!("  [{mark}] {:>3} {}. {}", task.id, task.task_number, task.description);
    }
    Ok(())
}

pub fn member_ranking(rows: &[MemberStanding], json: bool) -> Result<()> {
    if json {
        return print_json(&rows);
    }
    for row in rows {
        println!(
            "{:>3}. {:<32} team {:>2} score {:>3}",
            row.rank, row.full_name, row.team_number, row.score
        );
    }
    Ok(())
}

pub fn toggle_outcome(outcome: &ToggleOutcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }
    let state = if outcome.is_completed {
        "completed"
    } else {
        "not completed"
    };
    println!("{} is now {state}; score={}", outcome.target, outcome.owner_score);
    match &outcome.sync {
        SyncStatus::Synced => println!("sheet updated"),
        SyncStatus::Skipped => println!("sheet not configured; skipped"),
        SyncStatus::Failed(err) => println!("sheet update failed: {err}"),
    }
    Ok(())
}
