use crate::models::MediaKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line interface definition for idletracker
#[derive(Parser)]
#[command(
    name = "idletracker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Activity lifecycle and retention engine: status events, overtime, inactivity alerts and purge",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Use this configuration file instead of ~/.idletracker/idletracker.conf
    #[arg(global = true, long = "config")]
    pub config: Option<PathBuf>,

    /// Override the media root directory
    #[arg(global = true, long = "media-root")]
    pub media_root: Option<String>,

    /// Print results as JSON
    #[arg(global = true, long = "json")]
    pub json: bool,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the effective configuration
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Create the configured admin account if it does not exist yet
    BootstrapAdmin,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Record a status transition (shift_start, active, inactive)
    Status {
        /// Username or email
        user: String,

        /// New status
        status: String,

        /// Length in seconds of the streak this transition ends
        #[arg(long = "duration", allow_hyphen_values = true)]
        duration: Option<i64>,
    },

    /// Accrue or query overtime
    Overtime {
        #[command(subcommand)]
        action: OvertimeAction,
    },

    /// Store or list screenshots and recordings
    Media {
        #[command(subcommand)]
        action: MediaAction,
    },

    /// Send pending inactivity alerts to the administrators
    Notify,

    /// Delete data older than the retention period
    Purge {
        /// Retention period in days (default from config)
        #[arg(long = "days", allow_hyphen_values = true)]
        days: Option<i64>,

        /// Report what would be deleted without deleting anything
        #[arg(long = "dry-run")]
        dry_run: bool,

        /// Ids per DELETE statement (default from config)
        #[arg(long = "batch-size")]
        batch_size: Option<usize>,
    },

    /// Active/inactive totals for a user over a date range
    Summary {
        /// Username or email
        user: String,

        /// First day (YYYY-MM-DD)
        from: String,

        /// Last day (YYYY-MM-DD)
        to: String,
    },

    /// Recent inactivity events of a user, newest first
    History {
        /// Username or email
        user: String,

        #[arg(long = "from", requires = "to", help = "First day (YYYY-MM-DD)")]
        from: Option<String>,

        #[arg(long = "to", requires = "from", help = "Last day (YYYY-MM-DD)")]
        to: Option<String>,

        #[arg(long = "limit", help = "Maximum rows (default 300)")]
        limit: Option<i64>,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Create a user
    Add {
        username: String,

        #[arg(long = "email")]
        email: String,

        #[arg(long = "password")]
        password: String,

        /// Display name (defaults to the username)
        #[arg(long = "name")]
        name: Option<String>,

        #[arg(long = "department", default_value = "")]
        department: String,

        #[arg(long = "admin", help = "Create the user with the admin role")]
        admin: bool,

        #[arg(long = "shift-start", default_value = "09:00")]
        shift_start: String,

        #[arg(long = "shift-end", default_value = "18:00")]
        shift_end: String,
    },

    /// List users
    List {
        #[arg(long = "search", help = "Filter on username, name or department")]
        search: Option<String>,
    },

    /// Delete a user and everything recorded for them
    Del {
        /// Username or email
        user: String,
    },
}

#[derive(Subcommand)]
pub enum OvertimeAction {
    /// Add seconds of overtime to a day
    Add {
        user: String,
        date: String,
        #[arg(allow_hyphen_values = true)]
        seconds: i64,
    },

    /// Total overtime over an inclusive date range
    Total { user: String, from: String, to: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MediaKindArg {
    Screenshot,
    Recording,
}

impl From<MediaKindArg> for MediaKind {
    fn from(k: MediaKindArg) -> Self {
        match k {
            MediaKindArg::Screenshot => MediaKind::Screenshot,
            MediaKindArg::Recording => MediaKind::Recording,
        }
    }
}

#[derive(Subcommand)]
pub enum MediaAction {
    /// Copy a file into the media store and record it
    Add {
        user: String,

        file: PathBuf,

        #[arg(long = "kind", value_enum, default_value = "screenshot")]
        kind: MediaKindArg,

        /// Recording length in seconds
        #[arg(long = "duration", default_value_t = 0)]
        duration: i64,

        /// Event the capture belongs to
        #[arg(long = "event")]
        event: Option<i64>,
    },

    /// Most recent captures of a user
    List {
        user: String,

        #[arg(long = "kind", value_enum, default_value = "screenshot")]
        kind: MediaKindArg,

        #[arg(long = "limit", default_value_t = 20)]
        limit: i64,
    },
}
