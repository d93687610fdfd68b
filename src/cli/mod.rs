//! CLI Module
//!
//! Command-line front end: run tool-call scripts, serve tool calls over
//! stdin/stdout, and inspect or render project files.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tracksmith - agent-driven music project editing
#[derive(Parser, Debug)]
#[command(name = "tracksmith")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Renderer executable (overrides TRACKSMITH_RENDERER)
    #[arg(long, global = true)]
    pub renderer: Option<PathBuf>,

    /// Render timeout in milliseconds (overrides TRACKSMITH_RENDER_TIMEOUT_MS)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an empty project file
    #[command(name = "new")]
    New {
        /// Where to write the project
        path: PathBuf,

        /// Tempo in BPM
        #[arg(short, long, default_value_t = 120.0)]
        tempo: f64,

        /// Time signature, e.g. 3/4
        #[arg(short = 's', long, default_value = "4/4")]
        time_signature: String,

        /// Project name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Run a JSON file of tool calls (an array, or one call per line)
    #[command(name = "script")]
    Script {
        /// Script file
        file: PathBuf,

        /// Keep going after a failed call
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Read tool calls from stdin, one JSON object per line
    #[command(name = "stdio")]
    Stdio,

    /// Print a description of a project file
    #[command(name = "describe")]
    Describe {
        /// Project file
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render a project file to audio
    #[command(name = "render")]
    Render {
        /// Project file
        path: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: wav, flac, ogg or mp3
        #[arg(short, long)]
        format: Option<String>,
    },
}
