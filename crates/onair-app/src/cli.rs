//! Command-line surface.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "onair")]
#[command(about = "What is on air now, what is next, and where to watch it")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Only show events whose name contains this text (case-insensitive)
    #[arg(long, global = true)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Live and upcoming occurrences
    Now,
    /// Occurrences grouped by day
    Timeline,
    /// Player state for one event
    Player {
        /// Event id
        #[arg(long)]
        event: String,
        /// Occurrence key to open, e.g. 2025-06-01T22:00
        #[arg(long)]
        occ: Option<String>,
        /// Preferred channel when the event has several
        #[arg(long)]
        channel: Option<String>,
    },
    /// Keep the schedule on screen, refreshing at every status change
    Watch,
}

impl Cli {
    /// The subcommand to run; `now` when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Now)
    }
}
