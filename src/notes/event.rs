use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    NoteOn,
    NoteOff,
}

/// One note toggle. `time_compensation` is zero or negative: the event
/// happened that many seconds before the hop that reported it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NoteEvent {
    pub kind: EventKind,
    pub note: u8,
    pub time_compensation: f32,
}

impl NoteEvent {
    pub fn new(kind: EventKind, midi_note: i32, time_compensation: f32) -> Self {
        let note = midi_note.clamp(0, 127);
        if note != midi_note {
            log::warn!("MIDI note {} outside 0-127, clipped to {}", midi_note, note);
        }
        Self {
            kind,
            note: note as u8,
            time_compensation,
        }
    }
}

/// Summary of what a hop emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    NoteOn,
    NoteOff,
    NoteOffThenNoteOn,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::NoteOn => "noteon",
            MessageType::NoteOff => "noteoff",
            MessageType::NoteOffThenNoteOn => "noteoff-noteon",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered events of a single hop: none, one toggle, or an outgoing note-off
/// followed by the incoming note-on.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HopEvents {
    events: Vec<NoteEvent>,
}

impl HopEvents {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(event: NoteEvent) -> Self {
        Self { events: vec![event] }
    }

    pub fn note_change(off: NoteEvent, on: NoteEvent) -> Self {
        Self {
            events: vec![off, on],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn as_slice(&self) -> &[NoteEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteEvent> {
        self.events.iter()
    }

    pub fn message_type(&self) -> Option<MessageType> {
        match self.events.as_slice() {
            [] => None,
            [e] if e.kind == EventKind::NoteOn => Some(MessageType::NoteOn),
            [_] => Some(MessageType::NoteOff),
            _ => Some(MessageType::NoteOffThenNoteOn),
        }
    }
}

impl<'a> IntoIterator for &'a HopEvents {
    type Item = &'a NoteEvent;
    type IntoIter = std::slice::Iter<'a, NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_out_of_range_notes() {
        assert_eq!(NoteEvent::new(EventKind::NoteOn, 140, 0.0).note, 127);
        assert_eq!(NoteEvent::new(EventKind::NoteOn, -3, 0.0).note, 0);
        assert_eq!(NoteEvent::new(EventKind::NoteOff, 64, -0.2).note, 64);
    }

    #[test]
    fn message_types() {
        let on = NoteEvent::new(EventKind::NoteOn, 72, -0.03);
        let off = NoteEvent::new(EventKind::NoteOff, 69, -0.03);
        assert_eq!(HopEvents::none().message_type(), None);
        assert_eq!(HopEvents::single(on).message_type(), Some(MessageType::NoteOn));
        assert_eq!(HopEvents::single(off).message_type(), Some(MessageType::NoteOff));
        let change = HopEvents::note_change(off, on);
        assert_eq!(change.message_type().map(MessageType::as_str), Some("noteoff-noteon"));
        assert_eq!(change.as_slice()[0].kind, EventKind::NoteOff);
        assert_eq!(change.as_slice()[1].kind, EventKind::NoteOn);
    }

    #[test]
    fn serializes_as_event_list() {
        let events = HopEvents::single(NoteEvent::new(EventKind::NoteOn, 69, -0.075));
        let json = serde_json::to_string(&events).unwrap();
        assert_eq!(json, r#"[{"kind":"noteon","note":69,"time_compensation":-0.075}]"#);
    }
}
