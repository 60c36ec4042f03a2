use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.yaml and the catalog file.
    #[clap(long, global = true, default_value = ".")]
    pub base_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start reelscout as a service.
    Daemon {},

    /// Resolve a content id into a playable video url
    Resolve {
        /// Content id, e.g. a TMDB movie id
        id: String,

        /// Only try direct extraction: skip the cache and the embed fallback
        #[clap(long, default_value = "false")]
        direct_only: bool,
    },

    /// Print the generic embed url without fetching anything
    Embed {
        id: String,
    },
}
