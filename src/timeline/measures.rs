use crate::error::TimelineError;
use crate::model::song::{MeasureBoundary, TimeSignatureMark};
use crate::timeline::tempo_map::TempoMap;
use log::debug;

/// Lays out measure boundaries over the wall clock.
#[derive(Debug)]
pub struct MeasureSegmenter<'a> {
    tempo_map: &'a TempoMap,
    signatures: &'a [TimeSignatureMark],
    ticks_per_beat: u16,
    epsilon: f64,
}

impl<'a> MeasureSegmenter<'a> {
    /// `signatures` must already carry their start times in seconds, in ascending order.
    pub fn new(
        tempo_map: &'a TempoMap,
        signatures: &'a [TimeSignatureMark],
        ticks_per_beat: u16,
        epsilon: f64,
    ) -> Result<Self, TimelineError> {
        if signatures.is_empty() {
            return Err(TimelineError::MissingTimeSignature);
        }

        Ok(Self {
            tempo_map,
            signatures,
            ticks_per_beat,
            epsilon,
        })
    }

    /// Boundaries from time 0 until one past `last_note_start`, the last one closing the
    /// final measure.
    ///
    /// Measures are stepped in ticks and every boundary is read off a single clock, so a
    /// measure spanning a tempo change gets each part at its own tempo. A signature
    /// change takes effect at the first boundary at or past its start (within epsilon).
    pub fn boundaries(&self, last_note_start: f64) -> Result<Vec<MeasureBoundary>, TimelineError> {
        let mut clock = self.tempo_map.clock(self.ticks_per_beat)?;
        let ticks_per_beat = self.ticks_per_beat as f64;

        let mut boundaries: Vec<MeasureBoundary> = Vec::new();
        let mut signature = 0;
        let mut tick = 0.0;
        let mut current_time = 0.0;
        let mut index = 1;

        while current_time <= last_note_start {
            boundaries.push(MeasureBoundary {
                start: current_time,
                index,
            });

            let active = &self.signatures[signature];
            let ticks_per_measure = ticks_per_beat
                * active.numerator as f64
                * (4.0 / active.denominator as f64);

            tick += ticks_per_measure;
            current_time = clock.seconds_at_fractional(tick);
            index += 1;

            while let Some(next) = self.signatures.get(signature + 1)
                && next.start <= current_time + self.epsilon
            {
                signature += 1;
                debug!(
                    "Measure {} switches to {}/{} at {:.3}s",
                    index, next.numerator, next.denominator, current_time
                );
            }
        }

        boundaries.push(MeasureBoundary {
            start: current_time,
            index,
        });

        Ok(boundaries)
    }
}

/// The 1-based measure a note starting at `start` falls in. Starts at or past the last
/// boundary belong to the last measure.
pub fn measure_of(boundaries: &[MeasureBoundary], start: f64) -> usize {
    let pos = boundaries.partition_point(|b| b.start <= start);
    boundaries
        .get(pos.saturating_sub(1))
        .map(|b| b.index)
        .unwrap_or(1)
}
