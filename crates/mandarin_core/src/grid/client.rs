//! External grid access contract.
//!
//! # Responsibility
//! - Define the two operations the core needs from a spreadsheet backend:
//!   read one sheet whole, write one status cell.
//! - Pace outgoing requests to the backend's rate limit.
//!
//! # Invariants
//! - `read_sheet` returns rows as fetched; rows may be ragged or short.
//! - Consecutive paced requests are at least `REQUEST_INTERVAL` apart.

use crate::grid::layout::{GridPosition, LayoutError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum spacing between two requests to the external grid.
pub const REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Raw sheet content: rows of cell texts.
pub type SheetValues = Vec<Vec<String>>;

pub type GridResult<T> = Result<T, GridError>;

/// Errors from grid reads and writes.
#[derive(Debug)]
pub enum GridError {
    /// The requested sheet title does not exist in the spreadsheet.
    SheetNotFound(String),
    /// Network-level failure before an HTTP status was received.
    Transport(String),
    /// Backend answered with a non-success status.
    Http { status: u16, message: String },
    /// Backend answered with a body that could not be interpreted.
    InvalidResponse(String),
    /// Coordinates could not be resolved.
    Layout(LayoutError),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SheetNotFound(title) => write!(f, "sheet not found: `{title}`"),
            Self::Transport(message) => write!(f, "grid transport error: {message}"),
            Self::Http { status, message } => write!(f, "grid http error {status}: {message}"),
            Self::InvalidResponse(message) => write!(f, "invalid grid response: {message}"),
            Self::Layout(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for GridError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

/// Background colour written next to a task status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellFill {
    /// Light green marking a completed task.
    Done,
    /// Plain white.
    Neutral,
}

impl CellFill {
    /// RGB components in the 0.0..=1.0 range used by the Sheets API.
    pub fn rgb(self) -> (f32, f32, f32) {
        match self {
            Self::Done => (0.56, 0.93, 0.56),
            Self::Neutral => (1.0, 1.0, 1.0),
        }
    }
}

/// Spreadsheet backend seam.
pub trait GridClient {
    /// Fetches every populated cell of `sheet` in one request.
    fn read_sheet(&self, sheet: &str) -> GridResult<SheetValues>;
    /// Writes `text` into one cell and paints its background.
    fn write_cell(
        &self,
        sheet: &str,
        position: GridPosition,
        text: &str,
        fill: CellFill,
    ) -> GridResult<()>;
}

impl<C: GridClient + ?Sized> GridClient for &C {
    fn read_sheet(&self, sheet: &str) -> GridResult<SheetValues> {
        (**self).read_sheet(sheet)
    }

    fn write_cell(
        &self,
        sheet: &str,
        position: GridPosition,
        text: &str,
        fill: CellFill,
    ) -> GridResult<()> {
        (**self).write_cell(sheet, position, text, fill)
    }
}

/// Serializes requests behind a fixed minimum interval.
///
/// Owned by a backend client so reads and writes share one budget.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Pacer honoring the backend limit of one request per second.
    pub fn new() -> Self {
        Self::with_interval(REQUEST_INTERVAL)
    }

    /// Pacer with a custom interval. `Duration::ZERO` disables waiting.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Blocks until the next request may be issued, then books the slot.
    pub fn wait_turn(&self) {
        let mut last = match self.last_request.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{CellFill, RequestPacer};
    use std::time::{Duration, Instant};

    #[test]
    fn pacer_spaces_consecutive_requests() {
        let pacer = RequestPacer::with_interval(Duration::from_millis(30));
        let started = Instant::now();
        pacer.wait_turn();
        pacer.wait_turn();
        pacer.wait_turn();
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn zero_interval_never_waits() {
        let pacer = RequestPacer::with_interval(Duration::ZERO);
        let started = Instant::now();
        for _ in 0..100 {
            pacer.wait_turn();
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn fills_map_to_sheet_colours() {
        assert_eq!(CellFill::Done.rgb(), (0.56, 0.93, 0.56));
        assert_eq!(CellFill::Neutral.rgb(), (1.0, 1.0, 1.0));
    }
}
