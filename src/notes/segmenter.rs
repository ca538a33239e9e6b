use crate::config::Config;
use crate::error::ConfigError;

use super::event::{EventKind, HopEvents, NoteEvent};
use super::mapper::voting_value;
use super::voting::VotingBuffer;

/// Debounce counters and the confirmed note of one tracking session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentationState {
    /// MIDI note currently sounding
    pub confirmed: Option<i32>,
    /// Coherent majority whose stability is being counted
    pub candidate: Option<i32>,
    pub onset_hops: u32,
    pub offset_hops: u32,
    /// Restarts at every confirmation, so consecutive changes are always at
    /// least the note-change period apart
    pub change_hops: u32,
}

impl SegmentationState {
    pub fn is_note_on(&self) -> bool {
        self.confirmed.is_some()
    }
}

/// A confirmation window in seconds and its length in hops.
#[derive(Clone, Copy, Debug)]
struct Debounce {
    period: f32,
    hops: u32,
}

impl Debounce {
    fn new(period: f32, hop_duration: f32) -> Self {
        Self {
            period,
            hops: required_hops(period, hop_duration),
        }
    }

    fn compensation(&self, apply: bool) -> f32 {
        if apply {
            -self.period
        } else {
            0.0
        }
    }
}

/// Number of hops whose total duration reaches `period`.
pub fn required_hops(period: f32, hop_duration: f32) -> u32 {
    // absorb float noise when the period is an exact multiple of the hop
    ((period / hop_duration) - 1e-4).ceil().max(1.0) as u32
}

/// Counts consecutive hops on the same candidate; a new candidate restarts at 1.
fn advance(slot: &mut Option<i32>, counter: &mut u32, candidate: i32) -> u32 {
    if *slot == Some(candidate) {
        *counter += 1;
    } else {
        *slot = Some(candidate);
        *counter = 1;
    }
    *counter
}

/// Turns per-hop (pitch, voiced) pairs into note-on/note-off events.
///
/// Silent until a coherent, voiced majority holds for the onset period;
/// sounding until unvoiced hops fill the offset period. While sounding, a
/// different coherent majority that holds for the note-change period
/// produces a note-off/note-on pair in the same hop. The change counter
/// starts from zero after every confirmation, which also keeps changes at
/// least one note-change period apart.
pub struct NoteSegmenter {
    buffer: VotingBuffer,
    state: SegmentationState,
    hop_duration: f32,
    min_occurrence_rate: f32,
    onset: Debounce,
    offset: Debounce,
    note_change: Debounce,
    apply_compensation: bool,
    tuning_frequency: f32,
    transposition: i32,
}

impl NoteSegmenter {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate_segmentation()?;
        let a = &config.analysis;
        let s = &config.segmentation;
        let hop_duration = config.hop_duration();

        let requested = VotingBuffer::capacity_for(s.midi_buffer_duration, a.sample_rate, a.hop_size);
        let buffer = VotingBuffer::new(requested);
        if buffer.capacity() != requested {
            log::warn!(
                "Voting buffer of {:.3}s holds only {} hops, using {}",
                s.midi_buffer_duration,
                requested,
                buffer.capacity()
            );
        }

        let segmenter = Self {
            buffer,
            state: SegmentationState::default(),
            hop_duration,
            min_occurrence_rate: s.min_occurrence_rate,
            onset: Debounce::new(s.min_onset_check_period, hop_duration),
            offset: Debounce::new(s.min_offset_check_period, hop_duration),
            note_change: Debounce::new(s.min_note_change_period, hop_duration),
            apply_compensation: s.apply_time_compensation,
            tuning_frequency: s.tuning_frequency,
            transposition: s.transposition,
        };

        log::debug!(
            "Segmenter: hop={:.2}ms buffer={} onset={} offset={} change={} hops",
            hop_duration * 1000.0,
            segmenter.buffer.capacity(),
            segmenter.onset.hops,
            segmenter.offset.hops,
            segmenter.note_change.hops
        );

        Ok(segmenter)
    }

    /// Advances one hop. Never fails: invalid pitch votes as "no pitch".
    pub fn process(&mut self, pitch: f32, voiced: bool) -> HopEvents {
        let value = if voiced {
            voting_value(pitch, self.tuning_frequency, self.transposition)
        } else {
            None
        };
        self.buffer.push(value);
        let coherent = self.buffer.coherent_majority(self.min_occurrence_rate);

        match self.state.confirmed {
            None => self.silent_hop(voiced, coherent),
            Some(note) => self.sounding_hop(note, voiced, coherent),
        }
    }

    fn silent_hop(&mut self, voiced: bool, coherent: Option<i32>) -> HopEvents {
        let Some(candidate) = coherent.filter(|_| voiced) else {
            self.state.candidate = None;
            self.state.onset_hops = 0;
            return HopEvents::none();
        };

        let stable = advance(&mut self.state.candidate, &mut self.state.onset_hops, candidate);
        if stable < self.onset.hops {
            return HopEvents::none();
        }

        self.confirm(candidate);
        log::debug!("Note on {}", candidate);
        HopEvents::single(NoteEvent::new(
            EventKind::NoteOn,
            candidate,
            self.onset.compensation(self.apply_compensation),
        ))
    }

    fn sounding_hop(&mut self, note: i32, voiced: bool, coherent: Option<i32>) -> HopEvents {
        if !voiced {
            self.state.candidate = None;
            self.state.change_hops = 0;
            self.state.offset_hops += 1;
            if self.state.offset_hops < self.offset.hops {
                return HopEvents::none();
            }
            self.release();
            log::debug!("Note off {}", note);
            return HopEvents::single(NoteEvent::new(
                EventKind::NoteOff,
                note,
                self.offset.compensation(self.apply_compensation),
            ));
        }
        self.state.offset_hops = 0;

        let Some(candidate) = coherent.filter(|&c| c != note) else {
            self.state.candidate = None;
            self.state.change_hops = 0;
            return HopEvents::none();
        };

        let stable = advance(&mut self.state.candidate, &mut self.state.change_hops, candidate);
        if stable < self.note_change.hops {
            return HopEvents::none();
        }

        self.confirm(candidate);
        log::debug!("Note change {} -> {}", note, candidate);
        let compensation = self.note_change.compensation(self.apply_compensation);
        HopEvents::note_change(
            NoteEvent::new(EventKind::NoteOff, note, compensation),
            NoteEvent::new(EventKind::NoteOn, candidate, compensation),
        )
    }

    fn confirm(&mut self, note: i32) {
        self.state = SegmentationState {
            confirmed: Some(note),
            ..SegmentationState::default()
        };
    }

    fn release(&mut self) {
        self.state = SegmentationState::default();
    }

    /// Back to silent with an empty voting buffer.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.release();
    }

    pub fn state(&self) -> &SegmentationState {
        &self.state
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn hop_duration(&self) -> f32 {
        self.hop_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::event::MessageType;

    const A4: f32 = 440.0;
    const C5: f32 = 523.251;
    const D5: f32 = 587.33;

    fn segmenter() -> NoteSegmenter {
        NoteSegmenter::new(&Config::default()).unwrap()
    }

    /// Feeds `hops` identical hops and returns (hop offset, events) for every
    /// hop that emitted something.
    fn feed(seg: &mut NoteSegmenter, pitch: f32, voiced: bool, hops: usize) -> Vec<(usize, HopEvents)> {
        (0..hops)
            .map(|i| (i, seg.process(pitch, voiced)))
            .filter(|(_, e)| !e.is_empty())
            .collect()
    }

    /// Silent → sounding on A4, returns the segmenter right after the note-on.
    fn sounding_a4() -> NoteSegmenter {
        let mut seg = segmenter();
        let out = feed(&mut seg, A4, true, 28);
        assert_eq!(out.len(), 1);
        seg
    }

    #[test]
    fn derived_hop_counts() {
        let seg = segmenter();
        assert_eq!(seg.capacity(), 5);
        assert_eq!(seg.onset.hops, 26);
        assert_eq!(seg.offset.hops, 69);
        assert_eq!(seg.note_change.hops, 11);
    }

    #[test]
    fn required_hops_handles_exact_multiples() {
        assert_eq!(required_hops(0.01, 0.001), 10);
        assert_eq!(required_hops(0.0105, 0.001), 11);
        assert_eq!(required_hops(0.0001, 0.001), 1);
    }

    #[test]
    fn onset_after_26_coherent_hops() {
        let mut seg = segmenter();
        let out = feed(&mut seg, A4, true, 60);
        assert_eq!(out.len(), 1);
        // coherence needs 3 of 5 votes, so the 26th coherent hop is hop index 27
        let (hop, events) = &out[0];
        assert_eq!(*hop, 27);
        assert_eq!(events.message_type(), Some(MessageType::NoteOn));
        let on = events.as_slice()[0];
        assert_eq!(on.note, 69);
        assert!((on.time_compensation + 0.075).abs() < 1e-6);
        assert_eq!(seg.state().confirmed, Some(69));
    }

    #[test]
    fn offset_after_69_unvoiced_hops() {
        let mut seg = sounding_a4();
        let out = feed(&mut seg, 0.0, false, 100);
        assert_eq!(out.len(), 1);
        let (hop, events) = &out[0];
        assert_eq!(*hop, 68);
        assert_eq!(events.message_type(), Some(MessageType::NoteOff));
        let off = events.as_slice()[0];
        assert_eq!(off.note, 69);
        assert!((off.time_compensation + 0.2).abs() < 1e-6);
        assert!(!seg.state().is_note_on());
    }

    #[test]
    fn voiced_hop_resets_offset_counter() {
        let mut seg = sounding_a4();
        assert!(feed(&mut seg, 0.0, false, 60).is_empty());
        seg.process(A4, true);
        assert_eq!(seg.state().offset_hops, 0);
        assert!(feed(&mut seg, 0.0, false, 68).is_empty());
        assert_eq!(feed(&mut seg, 0.0, false, 1).len(), 1);
    }

    #[test]
    fn legato_change_emits_pair_on_threshold_hop() {
        let mut seg = sounding_a4();
        let out = feed(&mut seg, C5, true, 40);
        assert_eq!(out.len(), 1);
        // 72 becomes the majority on its 3rd hop, then needs 11 coherent hops
        let (hop, events) = &out[0];
        assert_eq!(*hop, 12);
        assert_eq!(events.message_type(), Some(MessageType::NoteOffThenNoteOn));
        let [off, on] = events.as_slice() else {
            panic!("expected two events");
        };
        assert_eq!((off.kind, off.note), (EventKind::NoteOff, 69));
        assert_eq!((on.kind, on.note), (EventKind::NoteOn, 72));
        assert!((off.time_compensation + 0.03).abs() < 1e-6);
        assert!((on.time_compensation + 0.03).abs() < 1e-6);
        assert_eq!(seg.state().confirmed, Some(72));
    }

    #[test]
    fn unvoiced_gap_restarts_note_change() {
        let mut seg = sounding_a4();
        assert!(feed(&mut seg, C5, true, 10).is_empty());
        assert!(feed(&mut seg, 0.0, false, 1).is_empty());
        assert_eq!(seg.state().change_hops, 0);
        // the gap voted "no pitch", 72 stays the majority (4 of 5)
        let out = feed(&mut seg, C5, true, 20);
        assert_eq!(out[0].0, 10);
    }

    #[test]
    fn single_frame_glitch_is_ignored() {
        let mut seg = sounding_a4();
        let mut events = Vec::new();
        for i in 0..200 {
            let pitch = if i % 7 == 3 { 880.0 } else { A4 };
            events.extend(seg.process(pitch, true).iter().copied());
        }
        assert!(events.is_empty());
        assert_eq!(seg.state().confirmed, Some(69));
    }

    #[test]
    fn fast_alternation_never_changes_note() {
        let mut seg = sounding_a4();
        for hop in 0..400 {
            // C5 and D5 swap every 5 hops, never stable for 11
            let pitch = if (hop / 5) % 2 == 0 { C5 } else { D5 };
            assert!(seg.process(pitch, true).is_empty());
        }
        assert_eq!(seg.state().confirmed, Some(69));
    }

    #[test]
    fn changes_are_spaced_by_note_change_period() {
        let mut seg = sounding_a4();
        let mut changes = Vec::new();
        for hop in 0..200 {
            let pitch = if (hop / 20) % 2 == 0 { C5 } else { D5 };
            if seg.process(pitch, true).message_type() == Some(MessageType::NoteOffThenNoteOn) {
                changes.push(hop);
            }
        }
        assert!(changes.len() >= 5);
        assert_eq!(changes[0], 12);
        for pair in changes.windows(2) {
            assert!(pair[1] - pair[0] >= 11);
        }
    }

    #[test]
    fn no_double_note_on() {
        let mut seg = segmenter();
        let mut sounding: Option<u8> = None;
        let pattern = [(A4, true, 40), (C5, true, 40), (0.0, false, 80), (C5, true, 40), (D5, true, 30)];
        for &(pitch, voiced, hops) in &pattern {
            for _ in 0..hops {
                for event in &seg.process(pitch, voiced) {
                    match event.kind {
                        EventKind::NoteOn => {
                            assert!(sounding.is_none(), "note on while {:?} sounds", sounding);
                            sounding = Some(event.note);
                        }
                        EventKind::NoteOff => {
                            assert_eq!(sounding, Some(event.note));
                            sounding = None;
                        }
                    }
                }
            }
        }
        assert_eq!(sounding, Some(74));
    }

    #[test]
    fn replay_is_deterministic() {
        let input: Vec<(f32, bool)> = (0..600)
            .map(|i| match i % 150 {
                0..=59 => (A4, true),
                60..=99 => (C5 * (1.0 + 0.001 * (i % 3) as f32), true),
                100..=109 => (0.0, false),
                _ => (D5, i % 11 != 0),
            })
            .collect();

        let run = || {
            let mut seg = segmenter();
            input
                .iter()
                .map(|&(p, v)| seg.process(p, v))
                .collect::<Vec<_>>()
        };
        let first = run();
        assert!(first.iter().any(|e| !e.is_empty()));
        assert_eq!(first, run());
    }

    #[test]
    fn compensation_can_be_disabled() {
        let mut config = Config::default();
        config.segmentation.apply_time_compensation = false;
        let mut seg = NoteSegmenter::new(&config).unwrap();
        let out = feed(&mut seg, A4, true, 30);
        assert_eq!(out[0].1.as_slice()[0].time_compensation, 0.0);
    }

    #[test]
    fn invalid_pitch_never_triggers() {
        let mut seg = segmenter();
        assert!(feed(&mut seg, 0.0, true, 100).is_empty());
        assert!(feed(&mut seg, -20.0, true, 100).is_empty());
        assert!(feed(&mut seg, f32::NAN, true, 100).is_empty());
        assert!(!seg.state().is_note_on());
    }

    #[test]
    fn unvoiced_pitch_never_triggers() {
        let mut seg = segmenter();
        assert!(feed(&mut seg, A4, false, 200).is_empty());
    }

    #[test]
    fn transposition_shifts_reported_notes() {
        let mut config = Config::default();
        config.segmentation.transposition = 2;
        let mut seg = NoteSegmenter::new(&config).unwrap();
        let out = feed(&mut seg, A4, true, 30);
        assert_eq!(out[0].1.as_slice()[0].note, 71);
    }

    #[test]
    fn lowest_midi_note_is_tracked() {
        // 10 Hz sits 66 semitones below A4, i.e. MIDI 3
        let notes_for = |transposition: i32| {
            let mut config = Config::default();
            config.segmentation.transposition = transposition;
            let mut seg = NoteSegmenter::new(&config).unwrap();
            feed(&mut seg, 10.0, true, 100)
                .iter()
                .flat_map(|(_, events)| events.iter().map(|e| e.note).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };
        assert_eq!(notes_for(-2), vec![1]);
        assert_eq!(notes_for(-3), vec![0]);
        // below the MIDI range the note still sounds, clipped to 0
        assert_eq!(notes_for(-4), vec![0]);
    }

    #[test]
    fn timing_follows_hop_duration() {
        // 48 kHz, hop 64: onset needs ceil(0.075 / 0.001333) = 57 hops
        let mut config = Config::default();
        config.analysis.sample_rate = 48000;
        config.analysis.hop_size = 64;
        let mut seg = NoteSegmenter::new(&config).unwrap();
        assert_eq!(seg.onset.hops, 57);
        let capacity = seg.capacity();
        let majority_after = (capacity + 1) / 2;
        let out = feed(&mut seg, A4, true, 200);
        assert_eq!(out[0].0, majority_after - 1 + 57 - 1);
    }

    #[test]
    fn reset_returns_to_silent() {
        let mut seg = sounding_a4();
        seg.reset();
        assert_eq!(seg.state(), &SegmentationState::default());
        // buffer is empty again, so onset takes the full run
        let out = feed(&mut seg, A4, true, 28);
        assert_eq!(out[0].0, 27);
    }
}
