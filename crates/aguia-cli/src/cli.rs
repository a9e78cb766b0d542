use std::path::PathBuf;

use aguia_core::models::{ColorblindMode, ContrastMode, PreferenceUpdate};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "aguia")]
#[command(about = "Inspect, edit and erase stored accessibility preferences")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the preferences stored for a user
    Show {
        /// User id
        #[arg(long, value_name = "ID")]
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change some preferences of a user, keeping the others
    Set {
        /// User id
        #[arg(long, value_name = "ID")]
        user: String,
        #[command(flatten)]
        values: PreferenceArgs,
    },
    /// Erase the preferences stored for a user
    Delete {
        /// User id
        #[arg(long, value_name = "ID")]
        user: String,
    },
    /// Export everything stored for a user
    Export {
        /// User id
        #[arg(long, value_name = "ID")]
        user: String,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// List users that have stored preferences
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Talk to a running aguia-api instead of the local database
    Remote {
        #[command(subcommand)]
        command: RemoteCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RemoteCommands {
    /// Fetch the preferences of the token's user
    Get {
        #[command(flatten)]
        target: RemoteTarget,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change preferences of the token's user
    Save {
        #[command(flatten)]
        target: RemoteTarget,
        #[command(flatten)]
        values: PreferenceArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RemoteTarget {
    /// Base URL of the API (e.g. <https://lms.example.edu/aguia>)
    #[arg(long, value_name = "URL")]
    pub url: String,
    /// Bearer token issued by the host platform
    #[arg(long, value_name = "TOKEN")]
    pub token: String,
}

/// Preference values settable from the command line; omitted flags keep the stored value
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct PreferenceArgs {
    /// Font size in percent
    #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u32).range(1..))]
    pub fontsize: Option<u32>,
    #[arg(long, value_enum)]
    pub contrast: Option<ContrastArg>,
    #[arg(long, value_name = "BOOL")]
    pub readablefonts: Option<bool>,
    /// Line spacing in percent
    #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u32).range(1..))]
    pub linespacing: Option<u32>,
    #[arg(long, value_name = "BOOL")]
    pub speech: Option<bool>,
    /// Reading helper overlay
    #[arg(long, value_name = "BOOL")]
    pub texthelper: Option<bool>,
    #[arg(long, value_enum)]
    pub colorblind: Option<ColorblindArg>,
}

impl From<PreferenceArgs> for PreferenceUpdate {
    fn from(args: PreferenceArgs) -> Self {
        Self {
            font_size: args.fontsize,
            contrast: args.contrast.map(Into::into),
            readable_fonts: args.readablefonts,
            line_spacing: args.linespacing,
            speech: args.speech,
            reading_helper: args.texthelper,
            colorblind: args.colorblind.map(Into::into),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ContrastArg {
    Normal,
    High,
    Inverted,
}

impl From<ContrastArg> for ContrastMode {
    fn from(value: ContrastArg) -> Self {
        match value {
            ContrastArg::Normal => Self::Normal,
            ContrastArg::High => Self::High,
            ContrastArg::Inverted => Self::Inverted,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ColorblindArg {
    None,
    Protanopia,
    Deuteranopia,
    Tritanopia,
}

impl From<ColorblindArg> for ColorblindMode {
    fn from(value: ColorblindArg) -> Self {
        match value {
            ColorblindArg::None => Self::None,
            ColorblindArg::Protanopia => Self::Protanopia,
            ColorblindArg::Deuteranopia => Self::Deuteranopia,
            ColorblindArg::Tritanopia => Self::Tritanopia,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for aguia_core::export::ExportFormat {
    fn from(value: ExportFormat) -> Self {
        match value {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
