use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SIGNATURE_EPSILON: f64 = 0.01;
pub const DEFAULT_RANGE_FLOOR: u8 = 21;

#[derive(Parser, Debug)]
#[command(
    name = "midi_timeline",
    about = "Convert a MIDI file into a timeline of notes, tempos and measures."
)]
pub struct Args {
    /// Path to the source MIDI file.
    pub midi: PathBuf,

    /// Where to write the JSON timeline.
    #[arg(short, long, default_value = "output.json")]
    pub output: PathBuf,

    /// Indent the JSON output.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Tolerance in seconds when deciding whether a time signature change has been reached.
    #[arg(long, default_value_t = DEFAULT_SIGNATURE_EPSILON)]
    pub signature_epsilon: f64,

    /// Pitches below this are left out of the reported note range (they are still emitted).
    #[arg(long, default_value_t = DEFAULT_RANGE_FLOOR)]
    pub range_floor: u8,

    /// Dry run (print a summary of the timeline and exit without writing).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum notes per track to print in dry run.
    #[arg(long, default_value_t = 16)]
    pub dry_run_max: usize,
}

impl Args {
    pub fn conversion_config(&self) -> ConversionConfig {
        ConversionConfig {
            signature_epsilon: self.signature_epsilon,
            range_floor: self.range_floor,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ConversionConfig {
    pub signature_epsilon: f64,
    pub range_floor: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            signature_epsilon: DEFAULT_SIGNATURE_EPSILON,
            range_floor: DEFAULT_RANGE_FLOOR,
        }
    }
}
