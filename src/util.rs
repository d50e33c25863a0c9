use crate::model::song::Timeline;
use anyhow::{Result, anyhow};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn timeline_to_json(timeline: &Timeline, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(timeline)
    } else {
        serde_json::to_string(timeline)
    };

    json.map_err(|e| anyhow!("Failed to serialize timeline: {}", e))
}

pub fn write_timeline<P: AsRef<Path>>(timeline: &Timeline, path: P, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| anyhow!("Failed to create output file {}: {}", path.display(), e))?;

    let mut writer = BufWriter::new(file);
    writer.write_all(timeline_to_json(timeline, pretty)?.as_bytes())?;
    writer.flush()?;

    info!("Output written to {}", path.display());
    Ok(())
}

/// Human readable lines describing a timeline, at most `max_notes` notes per track.
pub fn summarize(timeline: &Timeline, max_notes: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "{} notes in {} tracks ({} note-ons total), {} measures",
        timeline.note_count(),
        timeline.tracks.len(),
        timeline.total_notes,
        timeline.measure_starts.len().saturating_sub(1)
    )];

    if let Some(range) = timeline.note_range {
        lines.push(format!("Note range: {}..={}", range.low, range.high));
    }

    for tempo in &timeline.tempo {
        lines.push(format!("Tempo {:>4} bpm at {:>9.3}s", tempo.bpm, tempo.start));
    }
    for sig in &timeline.time_signatures {
        lines.push(format!(
            "Time signature {}/{} at {:>9.3}s",
            sig.numerator, sig.denominator, sig.start
        ));
    }

    for (track, notes) in &timeline.tracks {
        lines.push(format!("Track '{}': {} notes", track, notes.len()));
        for note in notes.iter().take(max_notes) {
            lines.push(format!(
                "  pitch={:>3} start={:>9.3}s end={:>9.3}s dur={:>7.3}s measure={}",
                note.pitch, note.start, note.end, note.duration, note.measure
            ));
        }
    }

    lines
}
