use serde::Serialize;

use super::event::{EventKind, HopEvents, NoteEvent};

/// A note event placed on the absolute timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimedEvent {
    /// Seconds from the start of the stream, latency-compensated
    pub time: f32,
    /// Hop that reported the event
    pub hop: u64,
    #[serde(flatten)]
    pub event: NoteEvent,
}

/// A closed note.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Note {
    pub start: f32,
    pub end: f32,
    pub midi: u8,
}

impl Note {
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }
}

/// Collects per-hop events and folds note-on/note-off pairs into notes.
#[derive(Clone, Debug)]
pub struct NoteTimeline {
    hop_duration: f32,
    events: Vec<TimedEvent>,
    notes: Vec<Note>,
    open: Option<(f32, u8)>,
}

impl NoteTimeline {
    pub fn new(hop_duration: f32) -> Self {
        Self {
            hop_duration,
            events: Vec::new(),
            notes: Vec::new(),
            open: None,
        }
    }

    /// Hop `hop` is reported at the end of that hop, `(hop + 1) * hop_duration`.
    pub fn push(&mut self, hop: u64, events: &HopEvents) {
        let reported = (hop + 1) as f32 * self.hop_duration;
        for &event in events {
            let time = (reported + event.time_compensation).max(0.0);
            match event.kind {
                EventKind::NoteOn => {
                    // a stray note-on closes whatever is open
                    self.close(time);
                    self.open = Some((time, event.note));
                }
                EventKind::NoteOff => match self.open {
                    Some((_, midi)) if midi == event.note => self.close(time),
                    _ => log::warn!("Note off {} at {:.3}s without matching note on", event.note, time),
                },
            }
            self.events.push(TimedEvent { time, hop, event });
        }
    }

    fn close(&mut self, end: f32) {
        if let Some((start, midi)) = self.open.take() {
            self.notes.push(Note {
                start,
                end: end.max(start),
                midi,
            });
        }
    }

    /// Closes a note still sounding at `end_time`.
    pub fn finish(&mut self, end_time: f32) {
        self.close(end_time);
    }

    pub fn is_sounding(&self) -> bool {
        self.open.is_some()
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOP: f32 = 0.01;

    fn on(note: i32, comp: f32) -> HopEvents {
        HopEvents::single(NoteEvent::new(EventKind::NoteOn, note, comp))
    }

    fn off(note: i32, comp: f32) -> HopEvents {
        HopEvents::single(NoteEvent::new(EventKind::NoteOff, note, comp))
    }

    #[test]
    fn applies_compensation() {
        let mut timeline = NoteTimeline::new(HOP);
        timeline.push(9, &on(69, -0.05));
        timeline.push(59, &off(69, -0.2));
        timeline.push(99, &on(72, -0.05));
        timeline.push(149, &off(72, -0.2));

        let notes = timeline.notes();
        assert_eq!(notes.len(), 2);
        assert!((notes[0].start - 0.05).abs() < 1e-5);
        assert!((notes[0].end - 0.4).abs() < 1e-5);
        assert_eq!(notes[0].midi, 69);
        assert!((notes[1].start - 0.95).abs() < 1e-5);
        assert!((notes[1].duration() - 0.35).abs() < 1e-5);
        assert_eq!(timeline.events().len(), 4);
        assert!(!timeline.is_sounding());
    }

    #[test]
    fn clamps_to_stream_start() {
        let mut timeline = NoteTimeline::new(HOP);
        timeline.push(0, &on(60, -0.075));
        assert_eq!(timeline.events()[0].time, 0.0);
    }

    #[test]
    fn legato_pair_shares_boundary() {
        let mut timeline = NoteTimeline::new(HOP);
        timeline.push(9, &on(69, 0.0));
        let change = HopEvents::note_change(
            NoteEvent::new(EventKind::NoteOff, 69, -0.03),
            NoteEvent::new(EventKind::NoteOn, 72, -0.03),
        );
        timeline.push(49, &change);
        timeline.finish(1.0);

        let notes = timeline.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].end, notes[1].start);
        assert_eq!(notes[1].midi, 72);
        assert_eq!(notes[1].end, 1.0);
    }

    #[test]
    fn unmatched_note_off_is_ignored() {
        let mut timeline = NoteTimeline::new(HOP);
        timeline.push(3, &off(64, 0.0));
        assert!(timeline.notes().is_empty());
        assert_eq!(timeline.events().len(), 1);
    }

    #[test]
    fn serializes_flat_events() {
        let mut timeline = NoteTimeline::new(0.5);
        timeline.push(1, &on(69, -0.5));
        let json = serde_json::to_string(&timeline.events()[0]).unwrap();
        assert_eq!(json, r#"{"time":0.5,"hop":1,"kind":"noteon","note":69,"time_compensation":-0.5}"#);
    }
}
