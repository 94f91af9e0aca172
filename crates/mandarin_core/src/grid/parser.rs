//! Snapshot parser over the fixed grid layout.
//!
//! # Responsibility
//! - Read the team sheet and every member sheet once each.
//! - Extract teams, members, tasks and completion flags into a `Snapshot`.
//!
//! # Invariants
//! - Reads outside fetched bounds yield an empty string, never an error.
//! - A completion flag is set iff the status cell contains a done marker
//!   (case-insensitive).
//! - A missing member sheet is skipped; any other read failure aborts the
//!   whole parse.

use crate::grid::client::{GridClient, GridError, GridResult, SheetValues};
use crate::grid::layout::{
    member_labels, member_sheet_title, team_labels, GridPosition, PERSONAL_TASK_COUNT,
    TEAM_SHEET_TITLE, TEAM_TASK_COUNT,
};
use crate::model::entities::default_team_name;
use crate::model::snapshot::{MemberRecord, Snapshot, TaskRecord, TeamRecord};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;

/// Status words that mark a task as completed.
pub const DONE_MARKERS: &[&str] = &["сделано", "выполнено", "done", "completed"];

static DONE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = DONE_MARKERS
        .iter()
        .map(|marker| regex::escape(marker))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{alternation})")).expect("valid done marker regex")
});

/// Returns whether a status cell text marks completion.
pub fn is_done_marker(status: &str) -> bool {
    DONE_MARKER_RE.is_match(status)
}

/// Cell text at `position`, or `""` past the fetched bounds.
pub fn cell_text(values: &SheetValues, position: GridPosition) -> &str {
    values
        .get(position.row as usize)
        .and_then(|row| row.get(position.column as usize))
        .map(String::as_str)
        .unwrap_or("")
}

/// Splits a `Last First ...` label into `(last_name, first_name)`.
pub fn split_member_name(label: &str) -> (String, String) {
    let mut parts = label.split_whitespace();
    let last = parts.next().unwrap_or("").to_string();
    let first = parts.next().unwrap_or("").to_string();
    (last, first)
}

/// Parses team labels and team tasks from the team sheet.
///
/// Always yields one record per layout position, in ascending team order.
pub fn parse_team_sheet(values: &SheetValues) -> Vec<TeamRecord> {
    team_labels()
        .map(|(number, label)| {
            let name = non_blank(cell_text(values, label))
                .unwrap_or_else(|| default_team_name(number));
            let tasks = parse_tasks(values, label, TEAM_TASK_COUNT, |task| {
                format!("Team task {task}")
            });
            TeamRecord {
                number,
                name,
                tasks,
                members: Vec::new(),
            }
        })
        .collect()
}

/// Parses occupied member seats from one team's sheet.
pub fn parse_member_sheet(values: &SheetValues) -> Vec<MemberRecord> {
    member_labels()
        .filter_map(|(slot, label)| {
            let full_name = non_blank(cell_text(values, label))?;
            let (last_name, first_name) = split_member_name(&full_name);
            let tasks = parse_tasks(values, label, PERSONAL_TASK_COUNT, |task| {
                format!("Personal task {task}")
            });
            Some(MemberRecord {
                first_name,
                last_name,
                sheet_index: slot,
                tasks,
            })
        })
        .collect()
}

fn parse_tasks(
    values: &SheetValues,
    label: GridPosition,
    count: u32,
    placeholder: impl Fn(u32) -> String,
) -> Vec<TaskRecord> {
    (1..=count)
        .map(|number| {
            let description = non_blank(cell_text(values, label.task_label(number)))
                .unwrap_or_else(|| placeholder(number));
            let status = cell_text(values, label.task_status(number));
            TaskRecord {
                number,
                description,
                is_completed: is_done_marker(status),
            }
        })
        .collect()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reads the whole grid through a `GridClient` and builds a snapshot.
pub struct SnapshotParser<C: GridClient> {
    client: C,
}

impl<C: GridClient> SnapshotParser<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Parses the team sheet and all member sheets.
    ///
    /// # Errors
    /// - Any failure reading the team sheet.
    /// - Any member-sheet failure other than `SheetNotFound`.
    pub fn parse_all(&self) -> GridResult<Snapshot> {
        let started_at = Instant::now();
        info!("event=snapshot_parse module=grid status=start");

        let result = self.parse_all_inner();
        match &result {
            Ok(snapshot) => {
                let summary = snapshot.summary();
                info!(
                    "event=snapshot_parse module=grid status=ok duration_ms={} teams={} members={} team_tasks={} personal_tasks={}",
                    started_at.elapsed().as_millis(),
                    summary.teams,
                    summary.members,
                    summary.team_tasks,
                    summary.personal_tasks
                );
            }
            Err(err) => {
                error!(
                    "event=snapshot_parse module=grid status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
            }
        }
        result
    }

    fn parse_all_inner(&self) -> GridResult<Snapshot> {
        let team_values = self.read(TEAM_SHEET_TITLE)?;
        let mut teams = parse_team_sheet(&team_values);

        for team in &mut teams {
            let title = member_sheet_title(team.number);
            match self.read(&title) {
                Ok(values) => team.members = parse_member_sheet(&values),
                Err(GridError::SheetNotFound(_)) => {
                    warn!(
                        "event=grid_read module=grid status=skipped sheet={} reason=sheet_not_found",
                        title
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Snapshot::new(teams))
    }

    fn read(&self, sheet: &str) -> GridResult<SheetValues> {
        let values = self.client.read_sheet(sheet)?;
        debug!(
            "event=grid_read module=grid status=ok sheet={} rows={}",
            sheet,
            values.len()
        );
        Ok(values)
    }
}
