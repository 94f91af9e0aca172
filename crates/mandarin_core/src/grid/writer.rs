//! Reverse sync of task completion into the grid.
//!
//! # Responsibility
//! - Resolve the status cell of a team or personal task.
//! - Write the done marker and fill, or clear both.
//!
//! # Invariants
//! - Whatever this writer marks as completed, `grid::parser` reads back as
//!   completed, and a cleared cell reads back as not completed.

use crate::grid::client::{CellFill, GridClient, GridResult};
use crate::grid::layout::{
    member_sheet_title, resolve_member_cell, resolve_team_cell, GridPosition, TEAM_SHEET_TITLE,
};
use log::info;

/// Text written into a completed task's status cell.
pub const DONE_TEXT: &str = "Сделано";

/// Receiver of committed task-state changes.
///
/// The score ledger calls this after its transaction commits; failures are
/// reported back but never undo the commit.
pub trait ReverseSync {
    fn sync_team_task(&self, team_number: u32, task_number: u32, is_completed: bool)
        -> GridResult<()>;

    fn sync_personal_task(
        &self,
        team_number: u32,
        slot: u32,
        task_number: u32,
        is_completed: bool,
    ) -> GridResult<()>;
}

/// `ReverseSync` implementation writing through a `GridClient`.
pub struct SheetWriter<C: GridClient> {
    client: C,
}

impl<C: GridClient> SheetWriter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Writes the status of team task `task_number` for team `team_number`.
    pub fn write_team_task_status(
        &self,
        team_number: u32,
        task_number: u32,
        is_completed: bool,
    ) -> GridResult<()> {
        let cell = resolve_team_cell(team_number, task_number)?;
        self.write_status(TEAM_SHEET_TITLE, cell, is_completed)
    }

    /// Writes the status of a personal task on the team's member sheet.
    pub fn write_member_task_status(
        &self,
        team_number: u32,
        slot: u32,
        task_number: u32,
        is_completed: bool,
    ) -> GridResult<()> {
        let cell = resolve_member_cell(slot, task_number)?;
        self.write_status(&member_sheet_title(team_number), cell, is_completed)
    }

    fn write_status(&self, sheet: &str, cell: GridPosition, is_completed: bool) -> GridResult<()> {
        let (text, fill) = status_cell_content(is_completed);
        self.client.write_cell(sheet, cell, text, fill)?;
        info!(
            "event=grid_write module=grid status=ok sheet={} cell={} completed={}",
            sheet, cell, is_completed
        );
        Ok(())
    }
}

impl<C: GridClient> ReverseSync for SheetWriter<C> {
    fn sync_team_task(
        &self,
        team_number: u32,
        task_number: u32,
        is_completed: bool,
    ) -> GridResult<()> {
        self.write_team_task_status(team_number, task_number, is_completed)
    }

    fn sync_personal_task(
        &self,
        team_number: u32,
        slot: u32,
        task_number: u32,
        is_completed: bool,
    ) -> GridResult<()> {
        self.write_member_task_status(team_number, slot, task_number, is_completed)
    }
}

/// Text and fill encoding one completion state.
pub fn status_cell_content(is_completed: bool) -> (&'static str, CellFill) {
    if is_completed {
        (DONE_TEXT, CellFill::Done)
    } else {
        ("", CellFill::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::{status_cell_content, SheetWriter, DONE_TEXT};
    use crate::grid::client::{CellFill, GridClient, GridError};
    use crate::grid::layout::{GridPosition, TEAM_SHEET_TITLE};
    use crate::grid::memory::InMemoryGrid;
    use crate::grid::parser::is_done_marker;

    #[test]
    fn done_text_is_accepted_by_parser() {
        let (text, fill) = status_cell_content(true);
        assert!(is_done_marker(text));
        assert_eq!(fill, CellFill::Done);

        let (text, fill) = status_cell_content(false);
        assert!(!is_done_marker(text));
        assert_eq!(fill, CellFill::Neutral);
    }

    #[test]
    fn writes_team_status_next_to_task_label() {
        let grid = InMemoryGrid::new();
        grid.add_sheet(TEAM_SHEET_TITLE);
        let writer = SheetWriter::new(&grid);

        writer
            .write_team_task_status(6, 3, true)
            .expect("write succeeds");
        let cell = GridPosition::new(1, 11);
        assert_eq!(grid.cell_text(TEAM_SHEET_TITLE, cell).as_deref(), Some(DONE_TEXT));
        assert_eq!(grid.cell_fill(TEAM_SHEET_TITLE, cell), Some(CellFill::Done));

        writer
            .write_team_task_status(6, 3, false)
            .expect("clear succeeds");
        assert_eq!(grid.cell_text(TEAM_SHEET_TITLE, cell).as_deref(), Some(""));
        assert_eq!(grid.cell_fill(TEAM_SHEET_TITLE, cell), Some(CellFill::Neutral));
    }

    #[test]
    fn invalid_slot_fails_before_any_write() {
        let grid = InMemoryGrid::new();
        grid.add_sheet("2");
        let writer = SheetWriter::new(&grid);

        let err = writer
            .write_member_task_status(2, 12, 1, true)
            .expect_err("slot 12 is outside the layout");
        assert!(matches!(err, GridError::Layout(_)));
        assert!(grid.read_sheet("2").expect("sheet exists").is_empty());
    }
}
