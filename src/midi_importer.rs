use crate::model::events::{EventKind, EventStream};
use anyhow::{Result, anyhow};
use log::{debug, warn};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::Path;

pub fn import_midi_file<P: AsRef<Path>>(path: P) -> Result<EventStream> {
    let bytes = fs::read(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read MIDI file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    midi_bytes_to_stream(&bytes)
}

/// Decodes a Standard MIDI File into one flat [`EventStream`], each track opened by a
/// `TrackStart`. Deltas are passed through untouched.
pub fn midi_bytes_to_stream(bytes: &[u8]) -> Result<EventStream> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(_fps, _subframe) => {
            return Err(anyhow!(
                "SMPTE timecode midi timing is not currently supported..!"
            ));
        }
    };

    debug!("Ticks per quarter note: {}", ticks_per_beat);
    debug!(
        "MIDI format: {:?}, tracks: {}",
        smf.header.format,
        smf.tracks.len()
    );

    let mut stream = EventStream::new(ticks_per_beat);

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        stream.push(0, EventKind::TrackStart);

        for event in track.iter() {
            let delta = event.delta.as_int() as u64;

            let kind = match &event.kind {
                TrackEventKind::Meta(meta) => match meta {
                    MetaMessage::Tempo(micro) => EventKind::TempoChange {
                        microseconds_per_beat: micro.as_int(),
                    },
                    MetaMessage::TimeSignature(numerator, denominator_pow, _, _) => {
                        match 1u8.checked_shl(*denominator_pow as u32) {
                            Some(denominator) => EventKind::TimeSignatureChange {
                                numerator: *numerator,
                                denominator,
                            },
                            None => {
                                warn!(
                                    "Ignoring time signature with denominator 2^{} on track {}..!",
                                    denominator_pow, track_idx
                                );
                                EventKind::Other
                            }
                        }
                    }
                    MetaMessage::TrackName(name) => {
                        EventKind::TrackName(String::from_utf8_lossy(name).into_owned())
                    }
                    _ => EventKind::Other,
                },
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
                        pitch: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    MidiMessage::NoteOff { key, vel: _ } => EventKind::NoteOff {
                        pitch: key.as_int(),
                    },
                    _ => EventKind::Other,
                },
                _ => EventKind::Other,
            };

            stream.push(delta, kind);
        }
    }

    Ok(stream)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::config::ConversionConfig;
    use crate::timeline::build_timeline;
    use midly::num::{u4, u7, u15, u24, u28};
    use midly::{Format, Header, TrackEvent};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9
    }

    fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Meta(message),
        }
    }

    fn midi(delta: u32, message: MidiMessage) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message,
            },
        }
    }

    fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
        midi(
            delta,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        )
    }

    fn note_off(delta: u32, key: u8) -> TrackEvent<'static> {
        midi(
            delta,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        )
    }

    /// A two-track type 1 file: a conductor track and one melody track.
    fn twinkle() -> Vec<u8> {
        let conductor = vec![
            meta(0, MetaMessage::Tempo(u24::new(500_000))),
            meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
            meta(1920, MetaMessage::Tempo(u24::new(1_000_000))),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let melody = vec![
            meta(0, MetaMessage::TrackName(b"Melody")),
            note_on(0, 60, 90),
            note_off(480, 60),
            note_on(0, 60, 90),
            note_on(480, 60, 0),
            note_on(0, 67, 90),
            note_off(960, 67),
            note_on(0, 69, 90),
            note_off(480, 69),
            note_off(0, 69),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let mut smf = Smf::new(Header::new(Format::Parallel, Timing::Metrical(u15::new(480))));
        smf.tracks.push(conductor);
        smf.tracks.push(melody);

        let mut bytes: Vec<u8> = Vec::new();
        smf.write_std(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn decodes_tracks_and_meta_events() {
        env_logger::try_init().unwrap_or(());

        let stream = midi_bytes_to_stream(&twinkle()).unwrap();
        assert_eq!(stream.ticks_per_beat, 480);

        let track_starts = stream
            .events
            .iter()
            .filter(|e| e.kind == EventKind::TrackStart)
            .count();
        assert_eq!(track_starts, 2);

        assert!(stream.events.iter().any(|e| e.kind
            == EventKind::TimeSignatureChange {
                numerator: 4,
                denominator: 4
            }));
        assert!(
            stream
                .events
                .iter()
                .any(|e| e.kind == EventKind::TrackName("Melody".into()))
        );
        assert!(stream.events.iter().any(|e| e.kind
            == EventKind::NoteOn {
                pitch: 60,
                velocity: 0
            }));
    }

    #[test]
    fn midi_file_to_timeline() {
        env_logger::try_init().unwrap_or(());

        let stream = midi_bytes_to_stream(&twinkle()).unwrap();
        let timeline = build_timeline(&stream, ConversionConfig::default()).unwrap();

        assert_eq!(timeline.total_notes, 4);
        assert_eq!(timeline.dropped_note_offs, 1);

        let notes = &timeline.tracks["Melody"];
        let got: Vec<(u8, f64, f64, usize)> = notes
            .iter()
            .map(|n| (n.pitch, n.start, n.end, n.measure))
            .collect();
        let want = [
            (60, 0.0, 0.5, 1),
            (60, 0.5, 1.0, 1),
            (67, 1.0, 2.0, 1),
            (69, 2.0, 3.0, 2),
        ];

        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want) {
            assert_eq!(g.0, w.0);
            assert!(approx_eq(g.1, w.1) && approx_eq(g.2, w.2), "{:?} vs {:?}", g, w);
            assert_eq!(g.3, w.3);
        }

        let bpms: Vec<u32> = timeline.tempo.iter().map(|t| t.bpm).collect();
        assert_eq!(bpms, vec![120, 60]);
        assert!(approx_eq(timeline.measure_starts[1], 2.0));
        assert!(approx_eq(timeline.measure_starts[2], 6.0));
    }

    #[test]
    fn timecode_files_are_rejected() {
        env_logger::try_init().unwrap_or(());

        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Timecode(midly::Fps::Fps25, 40),
        ));
        smf.tracks.push(vec![meta(0, MetaMessage::EndOfTrack)]);
        let mut bytes: Vec<u8> = Vec::new();
        smf.write_std(&mut bytes).unwrap();

        assert!(midi_bytes_to_stream(&bytes).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        env_logger::try_init().unwrap_or(());

        let result = import_midi_file("./does/not/exist.mid");
        if let Err(e) = &result {
            warn!("{:?}", e);
        }
        assert!(result.is_err());
    }
}
