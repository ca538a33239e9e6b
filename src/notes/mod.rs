pub mod event;
pub mod mapper;
pub mod segmenter;
pub mod timeline;
pub mod voting;

pub use event::{EventKind, HopEvents, MessageType, NoteEvent};
pub use segmenter::{NoteSegmenter, SegmentationState};
pub use timeline::{Note, NoteTimeline, TimedEvent};
pub use voting::{Vote, VotingBuffer};
