//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::record::EvalOption;

/// Selects the record a command works on.
#[derive(Debug, Clone, Default, Args)]
pub struct RecordArg {
    /// Record id (defaults to the most recently created record)
    #[arg(short, long, value_name = "ID")]
    pub id: Option<String>,
}

/// `new` arguments.
#[derive(Debug, Args)]
pub struct NewCommand {
    /// Family name
    #[arg(long)]
    pub surname: Option<String>,

    /// Given name
    #[arg(long)]
    pub first_name: Option<String>,
}

/// `list` arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// `show` arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Record selection.
    #[command(flatten)]
    pub record: RecordArg,

    /// Only this page (0 = cover, 1-10 = days, 11 = evaluation, 12 = review)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=12))]
    pub page: Option<u8>,

    /// Output the record as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// `set` arguments: identity fields.
#[derive(Debug, Args)]
pub struct SetCommand {
    /// Record selection.
    #[command(flatten)]
    pub record: RecordArg,

    /// Family name
    #[arg(long)]
    pub surname: Option<String>,

    /// Given name
    #[arg(long)]
    pub first_name: Option<String>,

    /// Start date (YYYY-MM-DD, empty to clear)
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD, empty to clear)
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Placement location
    #[arg(long)]
    pub location: Option<String>,
}

/// `day` arguments: one journal page.
#[derive(Debug, Args)]
pub struct DayCommand {
    /// Day number
    #[arg(value_parser = clap::value_parser!(u8).range(1..=10))]
    pub day: u8,

    /// Record selection.
    #[command(flatten)]
    pub record: RecordArg,

    /// Work done that day
    #[arg(short, long)]
    pub description: Option<String>,

    /// Attach an image file (at most two per day)
    #[arg(long, value_name = "FILE")]
    pub add_photo: Vec<PathBuf>,

    /// Remove the photo at this position (1 or 2)
    #[arg(long, value_name = "POS", value_parser = clap::value_parser!(u8).range(1..=2))]
    pub remove_photo: Option<u8>,
}

/// `eval` arguments: one self-evaluation answer.
#[derive(Debug, Args)]
pub struct EvalCommand {
    /// Statement number as shown on the evaluation page
    #[arg(value_parser = clap::value_parser!(u8).range(1..=19))]
    pub point: u8,

    /// Toujours, Souvent, Parfois or Jamais
    pub option: EvalOption,

    /// Record selection.
    #[command(flatten)]
    pub record: RecordArg,
}

/// `comment` arguments: one final-review answer.
#[derive(Debug, Args)]
pub struct CommentCommand {
    /// Prompt number as shown on the review page
    #[arg(value_parser = clap::value_parser!(u8).range(20..=28))]
    pub prompt: u8,

    /// The answer
    pub text: String,

    /// Record selection.
    #[command(flatten)]
    pub record: RecordArg,
}

/// `stats` arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Backup file commands.
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write a record to a JSON backup file
    Export {
        /// Record selection.
        #[command(flatten)]
        record: RecordArg,

        /// Backup label (defaults to Carnet_<surname>_<date>)
        #[arg(short, long)]
        name: Option<String>,

        /// Output directory (defaults to the configured one)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Read a JSON backup file and save it locally
    Import {
        /// The backup file
        file: PathBuf,
    },
}

/// `pdf` arguments.
#[derive(Debug, Args)]
pub struct PdfCommand {
    /// Record selection.
    #[command(flatten)]
    pub record: RecordArg,

    /// Report label (defaults to Rapport_Stage_<surname>)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory (defaults to the configured one)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_arg_default() {
        assert!(RecordArg::default().id.is_none());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
