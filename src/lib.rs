//! Real-time monophonic note tracking: per-frame pitch and voicing, then a
//! debounced segmenter that turns them into latency-compensated MIDI
//! note-on/note-off events.

pub mod audio;
pub mod config;
pub mod error;
pub mod notes;
pub mod pitch;
pub mod tracker;

pub use config::Config;
pub use error::{ConfigError, FrameError, TrackError};
pub use notes::{EventKind, HopEvents, MessageType, Note, NoteEvent, NoteSegmenter, NoteTimeline};
pub use pitch::front_end::PitchFrontEnd;
pub use pitch::PitchEstimate;
pub use tracker::{track_signal, NoteTracker, TrackedHop};
