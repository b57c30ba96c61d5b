//! CLI Module
//!
//! Command-line interface for the text2fx effect engine.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::dsp::params::EffectKind;

/// text2fx - 12-band EQ and delay-network reverb for WAV files
#[derive(Parser, Debug)]
#[command(name = "text2fx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Effect parameters given on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// JSON file with gains_db / decays_s / mix
    #[arg(long, conflicts_with_all = ["gains", "decays", "mix"])]
    pub params: Option<PathBuf>,

    /// Per-band gains in dB (comma separated, up to 12)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub gains: Option<Vec<f64>>,

    /// Per-band decays in seconds (comma separated, up to 12)
    #[arg(long, value_delimiter = ',')]
    pub decays: Option<Vec<f64>>,

    /// Wet/dry mix, 0 to 1
    #[arg(long)]
    pub mix: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply one effect to a WAV file
    #[command(name = "process")]
    Process {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file (32-bit float)
        #[arg(short, long)]
        output: PathBuf,

        /// Effect to apply (eq or reverb)
        #[arg(short, long)]
        effect: EffectKind,

        #[command(flatten)]
        params: ParamArgs,

        /// Decode target sample rate
        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Apply one effect to every WAV file under a directory
    #[command(name = "batch")]
    Batch {
        /// Directory to scan recursively
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory for processed files (mirrors the input layout)
        #[arg(long)]
        output_dir: PathBuf,

        /// Effect to apply (eq or reverb)
        #[arg(short, long)]
        effect: EffectKind,

        #[command(flatten)]
        params: ParamArgs,

        /// Decode target sample rate
        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Print the chat messages for a translation request
    #[command(name = "prompt")]
    Prompt {
        /// Effect to translate for
        #[arg(long, default_value = "reverb")]
        fx_type: EffectKind,

        /// Instrument name (up to 30 characters)
        #[arg(long)]
        instrument: String,

        /// Mixing instruction (up to 200 characters)
        #[arg(long)]
        instruction: String,
    },

    /// Translate an instruction into reverb parameters with a chat model
    #[command(name = "text2fx")]
    Text2Fx {
        /// Effect to translate for
        #[arg(long, default_value = "reverb")]
        fx_type: EffectKind,

        /// Instrument name (up to 30 characters)
        #[arg(long)]
        instrument: String,

        /// Mixing instruction (up to 200 characters)
        #[arg(long)]
        instruction: String,
    },
}
