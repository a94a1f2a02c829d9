//! Command-line interface for carnet.
//!
//! This module provides the CLI structure for the `carnet` binary and the
//! glue that turns a command's record selection into an editing session.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BackupCommand, CommentCommand, ConfigCommand, DayCommand, EvalCommand, ListCommand,
    NewCommand, PdfCommand, RecordArg, SetCommand, ShowCommand, StatsCommand,
};

use crate::app::AppState;
use crate::error::{Error, Result};
use crate::logging::Verbosity;
use crate::record::RecordId;
use crate::storage::RecordStore;

/// carnet - Work-placement logbook
///
/// Fill in a ten-day placement logbook (identity, daily journal with
/// photos, self-evaluation, final review) and export it as a PDF report.
#[derive(Debug, Parser)]
#[command(name = "carnet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new logbook
    New(NewCommand),

    /// List saved logbooks
    List(ListCommand),

    /// Print the pages of a logbook
    Show(ShowCommand),

    /// Set identity fields
    Set(SetCommand),

    /// Edit one day of the journal
    Day(DayCommand),

    /// Answer one self-evaluation statement
    Eval(EvalCommand),

    /// Answer one final-review prompt
    Comment(CommentCommand),

    /// Show local storage statistics
    Stats(StatsCommand),

    /// Export or import JSON backups
    #[command(subcommand)]
    Backup(BackupCommand),

    /// Generate the PDF report
    Pdf(PdfCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// Open an editing session on the record selected by `arg`: the given id,
/// or else the most recently created saved record.
///
/// # Errors
///
/// Returns [`Error::RecordNotFound`] if the id is unknown or nothing has
/// been saved yet.
pub fn open_session(store: &RecordStore, arg: &RecordArg) -> Result<AppState> {
    let mut state = AppState::from_store(store)?;
    let id = match &arg.id {
        Some(id) => RecordId::from(id.as_str()),
        None => state
            .saved()
            .last()
            .map(|record| record.id.clone())
            .ok_or_else(|| Error::RecordNotFound {
                id: "(aucun carnet enregistré)".to_string(),
            })?,
    };
    state.open_record(&id)?;
    Ok(state)
}
