//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "mentormatch",
    version,
    about = "Store mentor and mentee profiles and match them by similarity"
)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./mentormatch.toml if present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the index if it does not exist.
    Init,

    /// Embed and store profiles from a JSON array.
    Store {
        /// JSON file holding an array of profiles.
        path: PathBuf,
    },

    /// Match mentees from a JSON array against the stored mentors.
    Match {
        /// JSON file holding an array of mentee profiles.
        path: PathBuf,

        /// Print assignments as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete every record in the configured namespace.
    Reset,

    /// Cosine similarity of two stored records.
    Similarity { id1: String, id2: String },

    /// Pairwise similarity of the records whose metadata `field` equals `value`.
    Connections {
        field: String,
        value: String,

        /// Print connections as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Reset, store a fixture's mentors and mentees, then match the mentees.
    Demo {
        /// JSON file with `mentors` and `mentees` arrays.
        path: PathBuf,

        /// Print assignments as JSON.
        #[arg(long)]
        json: bool,
    },
}
