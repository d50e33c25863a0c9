use crate::error::TimelineError;
use crate::model::song::TempoEvent;
use crate::timeline::tempo_map::TempoMap;
use log::trace;

const MICROSECONDS_PER_SECOND: f64 = 1_000_000.0;

/// Tempo-aware tick to seconds converter.
///
/// The clock is a cursor: it remembers the tempo segment and elapsed time of its last
/// query, so a run of non-decreasing queries costs O(1) amortized each. A query behind
/// the cursor restarts the walk from tick 0. Build a new clock for every pass that
/// orders its ticks differently.
#[derive(Debug)]
pub struct TickClock<'a> {
    tempo_map: &'a TempoMap,
    ticks_per_beat: f64,
    index: usize,
    tick: f64,
    seconds: f64,
}

impl<'a> TickClock<'a> {
    pub fn new(tempo_map: &'a TempoMap, ticks_per_beat: u16) -> Result<Self, TimelineError> {
        if tempo_map.is_empty() {
            return Err(TimelineError::MissingTempo);
        }
        if ticks_per_beat == 0 {
            return Err(TimelineError::InvalidResolution);
        }

        Ok(Self {
            tempo_map,
            ticks_per_beat: ticks_per_beat as f64,
            index: 0,
            tick: 0.0,
            seconds: 0.0,
        })
    }

    pub fn seconds_at(&mut self, tick: u64) -> f64 {
        self.seconds_at_fractional(tick as f64)
    }

    /// Measure lengths are not always a whole number of ticks, hence the float variant.
    pub fn seconds_at_fractional(&mut self, tick: f64) -> f64 {
        self.advance_to(tick);
        self.seconds + self.span(tick - self.tick)
    }

    /// The tempo in effect at `tick`. Moves the cursor like [`Self::seconds_at`].
    pub fn active_tempo_at(&mut self, tick: u64) -> TempoEvent {
        self.advance_to(tick as f64);
        self.tempo_map.entries()[self.index]
    }

    fn advance_to(&mut self, tick: f64) {
        if tick < self.tick {
            trace!(
                "Clock queried behind its cursor ({} < {}), rewinding..!",
                tick, self.tick
            );
            self.index = 0;
            self.tick = 0.0;
            self.seconds = 0.0;
        }

        let tempo_map = self.tempo_map;
        let entries = tempo_map.entries();
        while let Some(next) = entries.get(self.index + 1) {
            let next_tick = next.tick as f64;
            if next_tick > tick {
                break;
            }

            self.seconds += self.span(next_tick - self.tick);
            self.tick = next_tick;
            self.index += 1;
        }
    }

    /// Seconds covered by `ticks` at the tempo under the cursor.
    fn span(&self, ticks: f64) -> f64 {
        let mpqn = self.tempo_map.entries()[self.index].microseconds_per_beat as f64;
        (ticks / self.ticks_per_beat) * (mpqn / MICROSECONDS_PER_SECOND)
    }
}
