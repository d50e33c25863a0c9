use crate::error::TimelineError;
use crate::model::config::ConversionConfig;
use crate::model::events::EventStream;
use crate::model::song::{ResolvedNote, TempoMark, TimeSignatureMark, TimedNote, Timeline};
use crate::timeline::matcher::NoteMatcher;
use crate::timeline::measures::{MeasureSegmenter, measure_of};
use crate::timeline::tempo_map::{TempoMap, TimeSignatureMap};
use log::{debug, info};
use std::collections::BTreeMap;

const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

pub fn bpm_from_mpqn(microseconds_per_beat: u32) -> u32 {
    (MICROSECONDS_PER_MINUTE / microseconds_per_beat as f64).round() as u32
}

/// Runs one ascending pass with its own clock. `ticks` must be non-decreasing.
fn convert_ascending<I>(
    tempo_map: &TempoMap,
    ticks_per_beat: u16,
    ticks: I,
) -> Result<Vec<f64>, TimelineError>
where
    I: IntoIterator<Item = u64>,
{
    let mut clock = tempo_map.clock(ticks_per_beat)?;
    Ok(ticks.into_iter().map(|tick| clock.seconds_at(tick)).collect())
}

/// Turns a decoded event stream into a [`Timeline`].
#[derive(Debug, Clone, Default)]
pub struct TimelineAssembler {
    config: ConversionConfig,
}

impl TimelineAssembler {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn assemble(&self, stream: &EventStream) -> Result<Timeline, TimelineError> {
        let ticks_per_beat = stream.ticks_per_beat;
        if ticks_per_beat == 0 {
            return Err(TimelineError::InvalidResolution);
        }

        let resolution = NoteMatcher::resolve(stream, self.config.range_floor);
        debug!(
            "Resolved {} notes from {} note-ons ({} orphaned note-offs, {} unclosed)",
            resolution.notes.len(),
            resolution.total_notes,
            resolution.dropped_note_offs,
            resolution.unclosed_notes
        );

        let tempo_map = TempoMap::from_events(stream)?;
        if tempo_map.is_empty() {
            return Err(TimelineError::MissingTempo);
        }
        let signature_map = TimeSignatureMap::from_events(stream)?;
        if signature_map.is_empty() {
            return Err(TimelineError::MissingTimeSignature);
        }

        let mut per_track: BTreeMap<String, Vec<ResolvedNote>> = BTreeMap::new();
        for note in resolution.notes {
            per_track.entry(note.track.clone()).or_default().push(note);
        }

        let mut timed_tracks: BTreeMap<String, Vec<TimedNote>> = BTreeMap::new();
        for (track, mut notes) in per_track {
            notes.sort_by_key(|n| n.start_tick);
            let timed = self.time_track(&tempo_map, ticks_per_beat, &notes)?;
            timed_tracks.insert(track, timed);
        }

        let signature_starts = convert_ascending(
            &tempo_map,
            ticks_per_beat,
            signature_map.entries().iter().map(|e| e.tick),
        )?;
        let time_signatures: Vec<TimeSignatureMark> = signature_map
            .entries()
            .iter()
            .zip(signature_starts)
            .map(|(e, start)| TimeSignatureMark {
                start,
                numerator: e.numerator,
                denominator: e.denominator,
            })
            .collect();

        let tempo_starts = convert_ascending(
            &tempo_map,
            ticks_per_beat,
            tempo_map.entries().iter().map(|e| e.tick),
        )?;
        let tempo: Vec<TempoMark> = tempo_map
            .entries()
            .iter()
            .zip(tempo_starts)
            .map(|(e, start)| TempoMark {
                start,
                bpm: bpm_from_mpqn(e.microseconds_per_beat),
            })
            .collect();

        let last_note_start = timed_tracks
            .values()
            .filter_map(|notes| notes.last())
            .map(|n| n.start)
            .fold(0.0, f64::max);

        let segmenter = MeasureSegmenter::new(
            &tempo_map,
            &time_signatures,
            ticks_per_beat,
            self.config.signature_epsilon,
        )?;
        let boundaries = segmenter.boundaries(last_note_start)?;

        for note in timed_tracks.values_mut().flatten() {
            note.measure = measure_of(&boundaries, note.start);
        }

        info!(
            "Built timeline: {} tracks, {} tempo changes, {} time signatures, {} measures..!",
            timed_tracks.len(),
            tempo.len(),
            time_signatures.len(),
            boundaries.len().saturating_sub(1)
        );

        Ok(Timeline {
            tracks: timed_tracks,
            tempo,
            time_signatures,
            total_notes: resolution.total_notes,
            note_range: resolution.note_range,
            measure_starts: boundaries.iter().map(|b| b.start).collect(),
            dropped_note_offs: resolution.dropped_note_offs,
            unclosed_notes: resolution.unclosed_notes,
        })
    }

    /// `notes` must be sorted by start tick. Ends get their own pass in end order, walked
    /// through an index so the start order never has to be restored.
    fn time_track(
        &self,
        tempo_map: &TempoMap,
        ticks_per_beat: u16,
        notes: &[ResolvedNote],
    ) -> Result<Vec<TimedNote>, TimelineError> {
        let starts = convert_ascending(tempo_map, ticks_per_beat, notes.iter().map(|n| n.start_tick))?;

        let mut by_end: Vec<usize> = (0..notes.len()).collect();
        by_end.sort_by_key(|&i| notes[i].end_tick);
        let sorted_ends = convert_ascending(tempo_map, ticks_per_beat, by_end.iter().map(|&i| notes[i].end_tick))?;

        let mut ends = vec![0.0; notes.len()];
        for (&i, end) in by_end.iter().zip(sorted_ends) {
            ends[i] = end;
        }

        Ok(notes
            .iter()
            .zip(starts.into_iter().zip(ends))
            .map(|(note, (start, end))| TimedNote {
                start,
                end,
                duration: end - start,
                pitch: note.pitch,
                measure: 1,
            })
            .collect())
    }
}
