mod assembler;
mod clock;
mod matcher;
mod measures;
mod tempo_map;

pub use assembler::{TimelineAssembler, bpm_from_mpqn};
pub use clock::TickClock;
pub use matcher::{NoteMatcher, Resolution};
pub use measures::{MeasureSegmenter, measure_of};
pub use tempo_map::{TempoMap, TimeSignatureMap};

use crate::error::TimelineError;
use crate::model::config::ConversionConfig;
use crate::model::events::EventStream;
use crate::model::song::Timeline;

/// Converts a whole event stream in one go.
pub fn build_timeline(
    stream: &EventStream,
    config: ConversionConfig,
) -> Result<Timeline, TimelineError> {
    TimelineAssembler::new(config).assemble(stream)
}
