use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI годового реестра пчеловодов
#[derive(Parser, Debug)]
#[command(name = "pcelica", version, about = "Beekeeper yearly registry CLI")]
pub struct Cli {
    /// Data directory (overrides PCELICA_DATA_DIR; default "data")
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

/// Editable registrant fields shared by add/edit.
#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    /// Muško | Žensko | Drugo (m/z/f also accepted)
    #[arg(long)]
    pub gender: Option<String>,
    /// yyyy-mm-dd
    #[arg(long)]
    pub birth_date: Option<String>,
    #[arg(long)]
    pub birth_place: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub colonies: Option<u32>,
    /// yyyy-mm-dd; "-" clears it
    #[arg(long)]
    pub cert_date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Registry status (counts, years, last persistence pass)
    Status {
        #[arg(long)]
        json: bool,
    },
    /// List registrants of a year (default: current year)
    List {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    /// Register a beekeeper: reserves the next number of the year.
    ///
    /// Data from the latest earlier registration with the same name is used
    /// as the starting point; flags override it.
    Add {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        #[command(flatten)]
        fields: FieldArgs,
        #[arg(long)]
        json: bool,
    },
    /// Edit a registrant (id, number and year never change)
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        first: Option<String>,
        #[arg(long)]
        last: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete a registrant (its number stays reserved)
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        year: i32,
    },
    /// Reserve the next free number of a year without registering anyone
    Reserve {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Case- and diacritic-insensitive search within a year
    Search {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Years with registrants (plus the current year)
    Years {
        #[arg(long)]
        json: bool,
    },
    /// Backup catalog, newest first
    Backups {
        #[arg(long)]
        json: bool,
        /// Show at most N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Open a backup read-only; optionally commit it as the new main state
    ViewBackup {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        query: Option<String>,
        /// merge | replace
        #[arg(long)]
        commit: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Restore the state the previous invocation started from (its STARTUP backup)
    RestoreStartup,
    /// Adopt a record file as the new main state
    Import {
        #[arg(long)]
        file: PathBuf,
        /// Replace reservations with the file's numbers (may free numbers)
        #[arg(long)]
        replace: bool,
    },
    /// Copy the canonical files into a directory
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Explicit save (CLOSE backup)
    Close,
    /// Process metrics after opening the registry
    Metrics {
        #[arg(long)]
        json: bool,
    },
}
