//! In-process grid backend.
//!
//! Holds sheets as ragged row vectors the same way the remote API returns
//! them, so parsing behaves identically offline.

use crate::grid::client::{CellFill, GridClient, GridError, GridResult, SheetValues};
use crate::grid::layout::GridPosition;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default, Clone)]
struct MemorySheet {
    values: SheetValues,
    fills: BTreeMap<GridPosition, CellFill>,
}

/// `GridClient` backed by in-memory sheets.
#[derive(Debug, Default)]
pub struct InMemoryGrid {
    sheets: Mutex<BTreeMap<String, MemorySheet>>,
    reads: Mutex<Vec<String>>,
}

impl InMemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a sheet with the given rows.
    pub fn insert_sheet(&self, title: impl Into<String>, values: SheetValues) {
        self.lock_sheets().insert(
            title.into(),
            MemorySheet {
                values,
                fills: BTreeMap::new(),
            },
        );
    }

    /// Adds an empty sheet.
    pub fn add_sheet(&self, title: impl Into<String>) {
        self.insert_sheet(title, Vec::new());
    }

    /// Sets one cell, growing the sheet as needed. Creates the sheet if absent.
    pub fn set_cell(&self, title: &str, position: GridPosition, text: impl Into<String>) {
        let mut sheets = self.lock_sheets();
        let sheet = sheets.entry(title.to_string()).or_default();
        put_cell(&mut sheet.values, position, text.into());
    }

    /// Returns one cell text, `None` when the sheet or cell is absent.
    pub fn cell_text(&self, title: &str, position: GridPosition) -> Option<String> {
        let sheets = self.lock_sheets();
        sheets
            .get(title)?
            .values
            .get(position.row as usize)?
            .get(position.column as usize)
            .cloned()
    }

    /// Returns the last fill painted on a cell.
    pub fn cell_fill(&self, title: &str, position: GridPosition) -> Option<CellFill> {
        self.lock_sheets().get(title)?.fills.get(&position).copied()
    }

    /// Sheet titles read so far, in request order.
    pub fn read_log(&self) -> Vec<String> {
        match self.reads.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock_sheets(&self) -> MutexGuard<'_, BTreeMap<String, MemorySheet>> {
        match self.sheets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl GridClient for InMemoryGrid {
    fn read_sheet(&self, sheet: &str) -> GridResult<SheetValues> {
        match self.reads.lock() {
            Ok(mut guard) => guard.push(sheet.to_string()),
            Err(poisoned) => poisoned.into_inner().push(sheet.to_string()),
        }
        self.lock_sheets()
            .get(sheet)
            .map(|stored| stored.values.clone())
            .ok_or_else(|| GridError::SheetNotFound(sheet.to_string()))
    }

    fn write_cell(
        &self,
        sheet: &str,
        position: GridPosition,
        text: &str,
        fill: CellFill,
    ) -> GridResult<()> {
        let mut sheets = self.lock_sheets();
        let stored = sheets
            .get_mut(sheet)
            .ok_or_else(|| GridError::SheetNotFound(sheet.to_string()))?;
        put_cell(&mut stored.values, position, text.to_string());
        stored.fills.insert(position, fill);
        Ok(())
    }
}

fn put_cell(values: &mut SheetValues, position: GridPosition, text: String) {
    let row = position.row as usize;
    let column = position.column as usize;
    if values.len() <= row {
        values.resize_with(row + 1, Vec::new);
    }
    let cells = &mut values[row];
    if cells.len() <= column {
        cells.resize(column + 1, String::new());
    }
    cells[column] = text;
}

#[cfg(test)]
mod tests {
    use super::InMemoryGrid;
    use crate::grid::client::{CellFill, GridClient, GridError};
    use crate::grid::layout::GridPosition;

    #[test]
    fn set_cell_grows_ragged_rows() {
        let grid = InMemoryGrid::new();
        grid.set_cell("1", GridPosition::new(3, 2), "x");

        let values = grid.read_sheet("1").expect("sheet exists");
        assert_eq!(values.len(), 3);
        assert!(values[0].is_empty());
        assert_eq!(values[2], vec!["", "", "", "x"]);
    }

    #[test]
    fn missing_sheet_is_reported_by_title() {
        let grid = InMemoryGrid::new();
        let err = grid.read_sheet("7").expect_err("sheet is absent");
        assert!(matches!(err, GridError::SheetNotFound(title) if title == "7"));
    }

    #[test]
    fn write_records_text_and_fill() {
        let grid = InMemoryGrid::new();
        grid.add_sheet("команды");
        let cell = GridPosition::new(1, 1);
        grid.write_cell("команды", cell, "Сделано", CellFill::Done)
            .expect("write succeeds");

        assert_eq!(grid.cell_text("команды", cell).as_deref(), Some("Сделано"));
        assert_eq!(grid.cell_fill("команды", cell), Some(CellFill::Done));
    }
}
