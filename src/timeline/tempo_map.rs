use crate::error::TimelineError;
use crate::model::events::{EventKind, EventStream};
use crate::model::song::{TempoEvent, TimeSignatureEvent};
use crate::timeline::clock::TickClock;
use log::debug;

/// Tempo changes in tick order. Changes sharing a tick are all kept, in stream order.
#[derive(Debug, Clone, Default)]
pub struct TempoMap {
    entries: Vec<TempoEvent>,
}

impl TempoMap {
    pub fn from_events(stream: &EventStream) -> Result<Self, TimelineError> {
        let mut entries: Vec<TempoEvent> = Vec::new();

        for event in stream.timed() {
            if let EventKind::TempoChange {
                microseconds_per_beat,
            } = *event.kind
            {
                debug!(
                    "Tempo change at tick {} -> {} us/qn (track {})",
                    event.tick, microseconds_per_beat, event.track
                );
                entries.push(TempoEvent {
                    tick: event.tick,
                    microseconds_per_beat,
                });
            }
        }

        Self::from_entries(entries)
    }

    pub fn from_entries(mut entries: Vec<TempoEvent>) -> Result<Self, TimelineError> {
        if let Some(bad) = entries.iter().find(|e| e.microseconds_per_beat == 0) {
            return Err(TimelineError::InvalidTempo { tick: bad.tick });
        }

        // stable: ties keep stream order
        entries.sort_by_key(|e| e.tick);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TempoEvent] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A fresh cursor over this map. Every ascending pass gets its own.
    pub fn clock(&self, ticks_per_beat: u16) -> Result<TickClock<'_>, TimelineError> {
        TickClock::new(self, ticks_per_beat)
    }
}

/// Time signature changes in tick order, same tie rules as [`TempoMap`].
#[derive(Debug, Clone, Default)]
pub struct TimeSignatureMap {
    entries: Vec<TimeSignatureEvent>,
}

impl TimeSignatureMap {
    pub fn from_events(stream: &EventStream) -> Result<Self, TimelineError> {
        let mut entries: Vec<TimeSignatureEvent> = Vec::new();

        for event in stream.timed() {
            if let EventKind::TimeSignatureChange {
                numerator,
                denominator,
            } = *event.kind
            {
                debug!(
                    "Time signature change at tick {} -> {}/{} (track {})",
                    event.tick, numerator, denominator, event.track
                );
                entries.push(TimeSignatureEvent {
                    tick: event.tick,
                    numerator,
                    denominator,
                });
            }
        }

        Self::from_entries(entries)
    }

    pub fn from_entries(mut entries: Vec<TimeSignatureEvent>) -> Result<Self, TimelineError> {
        if let Some(bad) = entries
            .iter()
            .find(|e| e.numerator == 0 || e.denominator == 0)
        {
            return Err(TimelineError::InvalidTimeSignature {
                tick: bad.tick,
                numerator: bad.numerator,
                denominator: bad.denominator,
            });
        }

        entries.sort_by_key(|e| e.tick);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TimeSignatureEvent] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
