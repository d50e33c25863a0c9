use crate::model::events::{EventKind, EventStream};
use crate::model::song::{NoteRange, ResolvedNote};
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};

/// Output of [`NoteMatcher::resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub notes: Vec<ResolvedNote>,
    /// Every note-on with a non-zero velocity, matched or not.
    pub total_notes: usize,
    pub note_range: Option<NoteRange>,
    pub dropped_note_offs: usize,
    pub unclosed_notes: usize,
}

/// Pairs note-ons with note-offs, one FIFO of start ticks per pitch.
#[derive(Debug)]
pub struct NoteMatcher {
    range_floor: u8,
    open_notes: HashMap<u8, VecDeque<u64>>,
    track_name: Option<String>,
    track: usize,
    resolution: Resolution,
}

impl NoteMatcher {
    pub fn new(range_floor: u8) -> Self {
        Self {
            range_floor,
            open_notes: HashMap::new(),
            track_name: None,
            track: 0,
            resolution: Resolution::default(),
        }
    }

    pub fn resolve(stream: &EventStream, range_floor: u8) -> Resolution {
        let mut matcher = Self::new(range_floor);

        for event in stream.timed() {
            if event.track != matcher.track {
                matcher.finish_track();
                matcher.track = event.track;
            }

            match event.kind {
                EventKind::TrackStart => matcher.finish_track(),
                EventKind::TrackName(name) => {
                    debug!("Track {} name: {}", event.track, name);
                    matcher.track_name = Some(name.clone());
                }
                EventKind::NoteOn { pitch, velocity } if *velocity > 0 => {
                    matcher.note_on(*pitch, event.tick)
                }
                EventKind::NoteOn { pitch, .. } | EventKind::NoteOff { pitch } => {
                    matcher.note_off(*pitch, event.tick)
                }
                _ => {}
            }
        }

        matcher.finish_track();
        matcher.resolution
    }

    fn note_on(&mut self, pitch: u8, tick: u64) {
        if pitch > 127 {
            debug!("Ignoring NoteOn with malformed pitch {} at tick {}..!", pitch, tick);
            return;
        }

        self.resolution.total_notes += 1;
        if pitch >= self.range_floor {
            self.resolution.note_range = Some(NoteRange::include(self.resolution.note_range, pitch));
        }

        self.open_notes.entry(pitch).or_default().push_back(tick);
    }

    fn note_off(&mut self, pitch: u8, tick: u64) {
        if pitch > 127 {
            debug!("Ignoring NoteOff with malformed pitch {} at tick {}..!", pitch, tick);
            return;
        }

        let Some(start_tick) = self.open_notes.get_mut(&pitch).and_then(VecDeque::pop_front) else {
            self.resolution.dropped_note_offs += 1;
            debug!(
                "Orphaned NoteOff for {} on track {} at tick {}..!",
                pitch, self.track, tick
            );
            return;
        };

        self.resolution.notes.push(ResolvedNote {
            start_tick,
            end_tick: tick,
            duration_ticks: tick - start_tick,
            pitch,
            track: self.track_key(),
        });
    }

    fn track_key(&self) -> String {
        self.track_name
            .clone()
            .unwrap_or_else(|| format!("Track {}", self.track))
    }

    /// Drops whatever is still open and forgets the track name.
    fn finish_track(&mut self) {
        for (pitch, queue) in self.open_notes.drain() {
            for start_tick in queue {
                self.resolution.unclosed_notes += 1;
                warn!(
                    "Unclosed NoteOn for {} on track {} at tick {}, dropping it..!",
                    pitch, self.track, start_tick
                );
            }
        }

        self.track_name = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn stream(events: &[(u64, EventKind)]) -> EventStream {
        let mut stream = EventStream::new(480);
        for (delta, kind) in events {
            stream.push(*delta, kind.clone());
        }
        stream
    }

    fn on(pitch: u8) -> EventKind {
        EventKind::NoteOn { pitch, velocity: 100 }
    }

    fn off(pitch: u8) -> EventKind {
        EventKind::NoteOff { pitch }
    }

    #[test]
    fn same_pitch_pairs_first_in_first_out() {
        env_logger::try_init().unwrap_or(());

        let s = stream(&[
            (0, EventKind::TrackStart),
            (0, on(60)),
            (10, on(60)),
            (10, off(60)),
            (10, off(60)),
        ]);

        let res = NoteMatcher::resolve(&s, 21);
        let spans: Vec<(u64, u64)> = res.notes.iter().map(|n| (n.start_tick, n.end_tick)).collect();
        assert_eq!(spans, vec![(0, 20), (10, 30)]);
        assert_eq!(res.notes[1].duration_ticks, 20);
    }

    #[test]
    fn orphaned_note_off_is_dropped_and_counted() {
        env_logger::try_init().unwrap_or(());

        let s = stream(&[
            (0, EventKind::TrackStart),
            (0, on(64)),
            (5, off(64)),
            (5, off(64)),
        ]);

        let res = NoteMatcher::resolve(&s, 21);
        assert_eq!(res.notes.len(), 1);
        assert_eq!(res.total_notes, 1);
        assert_eq!(res.dropped_note_offs, 1);
        assert_eq!(res.notes[0].end_tick, 5);
    }

    #[test]
    fn zero_velocity_note_on_closes() {
        env_logger::try_init().unwrap_or(());

        let s = stream(&[
            (0, EventKind::TrackStart),
            (0, on(72)),
            (240, EventKind::NoteOn { pitch: 72, velocity: 0 }),
        ]);

        let res = NoteMatcher::resolve(&s, 21);
        assert_eq!(res.total_notes, 1);
        assert_eq!(res.notes.len(), 1);
        assert_eq!(res.notes[0].duration_ticks, 240);
    }

    #[test]
    fn low_pitches_are_emitted_but_not_ranged() {
        env_logger::try_init().unwrap_or(());

        let s = stream(&[
            (0, EventKind::TrackStart),
            (0, on(12)),
            (0, on(40)),
            (0, on(90)),
            (10, off(12)),
            (0, off(40)),
            (0, off(90)),
        ]);

        let res = NoteMatcher::resolve(&s, 21);
        assert_eq!(res.notes.len(), 3);
        assert_eq!(res.note_range, Some(NoteRange { low: 40, high: 90 }));
    }

    #[test]
    fn track_start_resets_queues_but_not_counters() {
        env_logger::try_init().unwrap_or(());

        let s = stream(&[
            (0, EventKind::TrackStart),
            (0, EventKind::TrackName("Piano".into())),
            (0, on(60)),
            (100, on(61)),
            (10, off(61)),
            (0, EventKind::TrackStart),
            (50, off(60)),
            (0, on(30)),
            (20, off(30)),
        ]);

        let res = NoteMatcher::resolve(&s, 21);
        assert_eq!(res.total_notes, 3);
        assert_eq!(res.unclosed_notes, 1);
        assert_eq!(res.dropped_note_offs, 1);
        assert_eq!(res.note_range, Some(NoteRange { low: 30, high: 61 }));

        assert_eq!(res.notes.len(), 2);
        assert_eq!(res.notes[0].track, "Piano");
        assert_eq!((res.notes[0].start_tick, res.notes[0].end_tick), (100, 110));
        assert_eq!(res.notes[1].track, "Track 1");
        assert_eq!((res.notes[1].start_tick, res.notes[1].end_tick), (50, 70));
    }

    #[test]
    fn malformed_pitch_is_ignored() {
        env_logger::try_init().unwrap_or(());

        let s = stream(&[(0, on(200)), (10, off(200))]);

        let res = NoteMatcher::resolve(&s, 21);
        assert!(res.notes.is_empty());
        assert_eq!(res.total_notes, 0);
        assert_eq!(res.dropped_note_offs, 0);
    }
}
