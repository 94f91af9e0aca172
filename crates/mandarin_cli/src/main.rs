//! Mandarin competition command-line shell.
//!
//! # Usage
//!
//! ```text
//! mandarin parse --caller <id> [--out FILE]
//! mandarin import --caller <id> [--from FILE]
//! mandarin leaderboard [--json]
//! mandarin team <number> [--json]
//! mandarin member <id> [--json]
//! mandarin ranking [--limit N] [--json]
//! mandarin toggle-team-task <id> --caller <id>
//! mandarin toggle-personal-task <id> --caller <id>
//! mandarin hide --caller <id> [--until EPOCH_MS]
//! mandarin show --caller <id>
//! ```
//!
//! Configuration comes from the environment (`MANDARIN_DB_PATH`,
//! `GOOGLE_SHEET_ID`, `GOOGLE_SHEETS_TOKEN`, `CHECKER_IDS`, ...).
//! Logs go to rolling files under `MANDARIN_LOG_DIR` when set, else stderr.
//! Leaderboard visibility is stored in the database, so `hide` and `show`
//! apply to later invocations.

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mandarin_core::grid::writer::ReverseSync;
use mandarin_core::{
    init_logging, init_stderr_logging, open_db, CallerId, CheckerAllowList, CompetitionApi,
    LeaderboardDisplay, Settings, SheetWriter, SheetsApiClient, Snapshot,
};
use std::path::PathBuf;

const SHEETS_REQUIRED: &str = "GOOGLE_SHEET_ID and GOOGLE_SHEETS_TOKEN must be set to read the sheet";

#[derive(Parser, Debug)]
#[command(
    name = "mandarin",
    version,
    about = "Track team and personal task scores mirrored from a Google Sheet",
    long_about = None,
)]
struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read the whole sheet and print (or save) the parsed snapshot.
    Parse {
        #[arg(long)]
        caller: CallerId,
        /// Write the snapshot as JSON to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Reconcile a snapshot into the database, from the sheet or a JSON file.
    Import {
        #[arg(long)]
        caller: CallerId,
        /// Snapshot JSON file; the live sheet is read when omitted.
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Show the team leaderboard.
    Leaderboard,

    /// Show one team with its tasks and members.
    Team { number: u32 },

    /// Show one member with personal task ids and completion.
    Member { id: i64 },

    /// Show the top members across all teams.
    Ranking {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Flip a team task and mirror it to the sheet.
    ToggleTeamTask {
        id: i64,
        #[arg(long)]
        caller: CallerId,
    },

    /// Flip a personal task and mirror it to the sheet.
    TogglePersonalTask {
        id: i64,
        #[arg(long)]
        caller: CallerId,
    },

    /// Hide the leaderboard, optionally until an epoch-millisecond time.
    Hide {
        #[arg(long)]
        caller: CallerId,
        #[arg(long)]
        until: Option<i64>,
    },

    /// Make the leaderboard visible again.
    Show {
        #[arg(long)]
        caller: CallerId,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("failed to read configuration")?;
    let logging = match &settings.log_dir {
        Some(log_dir) => init_logging(&settings.log_level, log_dir),
        None => init_stderr_logging(&settings.log_level),
    };
    logging.context("failed to start logging")?;

    let conn = open_db(&settings.database_path).with_context(|| {
        format!(
            "failed to open database `{}`",
            settings.database_path.display()
        )
    })?;
    let checkers = CheckerAllowList::new(settings.checker_ids.iter().copied());
    let display = LeaderboardDisplay::new();

    let sheets = if settings.has_sheets() {
        Some(SheetsApiClient::new(settings.sheets()?))
    } else {
        None
    };
    let writer = sheets.as_ref().map(SheetWriter::new);

    let mut api = CompetitionApi::new(&conn, &checkers, &display);
    if let Some(writer) = &writer {
        api = api.with_reverse_sync(writer as &dyn ReverseSync);
    }
    api.restore_display().context("failed to load leaderboard visibility")?;

    match cli.command {
        Commands::Parse { caller, out } => {
            let client = sheets.as_ref().context(SHEETS_REQUIRED)?;
            let snapshot = api.parse_grid(caller, client)?;
            if let Some(path) = out {
                snapshot
                    .save(&path)
                    .with_context(|| format!("failed to write `{}`", path.display()))?;
            }
            render::snapshot_summary(&snapshot, cli.json)
        }
        Commands::Import { caller, from } => {
            let stats = match from {
                Some(path) => {
                    let snapshot = Snapshot::load(&path)
                        .with_context(|| format!("failed to load `{}`", path.display()))?;
                    api.import_snapshot(caller, &snapshot)?
                }
                None => {
                    let client = sheets.as_ref().context(SHEETS_REQUIRED)?;
                    api.sync_from_grid(caller, client)?.stats
                }
            };
            render::reconcile_stats(&stats, cli.json)
        }
        Commands::Leaderboard => render::leaderboard(&api.leaderboard()?, cli.json),
        Commands::Team { number } => render::team_details(&api.team_details(number)?, cli.json),
        Commands::Member { id } => render::member_details(&api.member_details(id)?, cli.json),
        Commands::Ranking { limit } => {
            render::member_ranking(&api.member_ranking(Some(limit))?, cli.json)
        }
        Commands::ToggleTeamTask { id, caller } => {
            render::toggle_outcome(&api.toggle_team_task(caller, id)?, cli.json)
        }
        Commands::TogglePersonalTask { id, caller } => {
            render::toggle_outcome(&api.toggle_personal_task(caller, id)?, cli.json)
        }
        Commands::Hide { caller, until } => {
            api.hide_leaderboard(caller, until)?;
            render::leaderboard(&api.leaderboard()?, cli.json)
        }
        Commands::Show { caller } => {
            api.show_leaderboard(caller)?;
            render::leaderboard(&api.leaderboard()?, cli.json)
        }
    }
}
