/// MIDI note number of the tuning reference (A4).
pub const REFERENCE_MIDI_NOTE: i32 = 69;

/// Semitone offset of `pitch` from `tuning`, shifted by `transposition`.
/// `None` for non-positive or non-finite pitch.
pub fn note_index(pitch: f32, tuning: f32, transposition: i32) -> Option<i32> {
    if !pitch.is_finite() || pitch <= 0.0 {
        return None;
    }
    Some((12.0 * (pitch / tuning).log2()).round() as i32 + transposition)
}

pub fn midi_note(index: i32) -> i32 {
    REFERENCE_MIDI_NOTE + index
}

/// What the voting buffer stores for one hop: the MIDI note, or `None` for
/// "no pitch". Notes outside 0..=127 still vote; clipping happens on output.
pub fn voting_value(pitch: f32, tuning: f32, transposition: i32) -> Option<i32> {
    note_index(pitch, tuning, transposition).map(midi_note)
}

const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Scientific pitch name, 60 = C4.
pub fn note_name(midi: u8) -> String {
    format!("{}{}", NAMES[(midi % 12) as usize], midi as i32 / 12 - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pitch_is_index_zero() {
        assert_eq!(note_index(440.0, 440.0, 0), Some(0));
        assert_eq!(midi_note(0), 69);
        assert_eq!(note_index(432.0, 432.0, 0), Some(0));
    }

    #[test]
    fn rounds_to_nearest_semitone() {
        assert_eq!(note_index(523.25, 440.0, 0), Some(3)); // C5
        assert_eq!(note_index(261.63, 440.0, 0), Some(-9)); // C4
        assert_eq!(note_index(452.0, 440.0, 0), Some(0)); // +46 cents
        assert_eq!(note_index(454.0, 440.0, 0), Some(1)); // +54 cents
    }

    #[test]
    fn applies_transposition() {
        // Bb instrument: written D sounds C
        assert_eq!(note_index(261.63, 440.0, 2), Some(-7));
        assert_eq!(voting_value(440.0, 440.0, -12), Some(57));
    }

    #[test]
    fn names_notes() {
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(73), "C#5");
    }

    #[test]
    fn invalid_pitch_has_no_note() {
        assert_eq!(note_index(0.0, 440.0, 0), None);
        assert_eq!(note_index(-3.0, 440.0, 0), None);
        assert_eq!(note_index(f32::NAN, 440.0, 0), None);
        assert_eq!(voting_value(0.0, 440.0, 5), None);
        // the lowest MIDI note is distinct from "no pitch"
        assert_eq!(voting_value(440.0, 440.0, -69), Some(0));
    }
}
