use serde::{Deserialize, Serialize};

/// A single decoded event, as handed over by a decoder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Marks the beginning of a new track: the tick accumulator restarts at 0.
    TrackStart,
    TrackName(String),
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    TempoChange { microseconds_per_beat: u32 },
    TimeSignatureChange { numerator: u8, denominator: u8 },
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Ticks elapsed since the previous event of the same track.
    pub delta: u64,
    pub kind: EventKind,
}

impl RawEvent {
    pub fn new(delta: u64, kind: EventKind) -> Self {
        Self { delta, kind }
    }
}

/// Every track of a document flattened into one ordered list, each track introduced
/// by an [`EventKind::TrackStart`], plus the document-wide resolution.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EventStream {
    pub ticks_per_beat: u16,
    pub events: Vec<RawEvent>,
}

/// An event placed on the absolute tick axis of its track.
#[derive(Debug, Clone, Copy)]
pub struct TimedEvent<'a> {
    pub tick: u64,
    pub track: usize,
    pub kind: &'a EventKind,
}

impl EventStream {
    pub fn new(ticks_per_beat: u16) -> Self {
        Self {
            ticks_per_beat,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, delta: u64, kind: EventKind) {
        self.events.push(RawEvent::new(delta, kind));
    }

    /// Walks the stream accumulating deltas into absolute ticks.
    ///
    /// Events preceding the first `TrackStart` belong to track 0, as does the first
    /// `TrackStart` itself.
    pub fn timed(&self) -> impl Iterator<Item = TimedEvent<'_>> + '_ {
        let mut tick: u64 = 0;
        let mut track: usize = 0;
        let mut started = false;

        self.events.iter().map(move |event| {
            if event.kind == EventKind::TrackStart {
                if started {
                    track += 1;
                }
                started = true;
                tick = 0;
            }

            tick = tick.saturating_add(event.delta);

            TimedEvent {
                tick,
                track,
                kind: &event.kind,
            }
        })
    }
}
