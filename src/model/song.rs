use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A note closed by the matcher, still on the tick axis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNote {
    pub start_tick: u64,
    pub end_tick: u64,
    pub duration_ticks: u64,
    pub pitch: u8,
    pub track: String,
}

/// A note placed on the wall clock, tagged with the measure it starts in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimedNote {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub pitch: u8,
    pub measure: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoEvent {
    pub tick: u64,
    pub microseconds_per_beat: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureEvent {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TempoMark {
    pub start: f64,
    pub bpm: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeSignatureMark {
    pub start: f64,
    pub numerator: u8,
    pub denominator: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRange {
    pub low: u8,
    pub high: u8,
}

impl NoteRange {
    pub fn include(range: Option<Self>, pitch: u8) -> Self {
        match range {
            Some(r) => Self {
                low: r.low.min(pitch),
                high: r.high.max(pitch),
            },
            None => Self {
                low: pitch,
                high: pitch,
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MeasureBoundary {
    pub start: f64,
    /// 1-based.
    pub index: usize,
}

/// The finished timeline of one conversion run.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Timeline {
    #[serde(rename = "Tracks")]
    pub tracks: BTreeMap<String, Vec<TimedNote>>,

    #[serde(rename = "Tempo")]
    pub tempo: Vec<TempoMark>,

    #[serde(rename = "TimeSig")]
    pub time_signatures: Vec<TimeSignatureMark>,

    #[serde(rename = "TotalNotes")]
    pub total_notes: usize,

    #[serde(rename = "NoteRange")]
    pub note_range: Option<NoteRange>,

    #[serde(rename = "MeasureStart")]
    pub measure_starts: Vec<f64>,

    #[serde(skip)]
    pub dropped_note_offs: usize,

    #[serde(skip)]
    pub unclosed_notes: usize,
}

impl Timeline {
    pub fn note_count(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }
}
