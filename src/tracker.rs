use crate::audio::frames::FrameCutter;
use crate::config::Config;
use crate::error::{ConfigError, FrameError, TrackError};
use crate::notes::{HopEvents, NoteSegmenter, NoteTimeline};
use crate::pitch::front_end::PitchFrontEnd;
use crate::pitch::PitchEstimate;

/// Output of one hop: the front-end estimate and the events it triggered.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedHop {
    pub estimate: PitchEstimate,
    pub events: HopEvents,
}

/// One tracking session: a front end feeding a segmenter, one frame per hop.
/// Sessions share nothing, so tracking several instruments needs one each.
pub struct NoteTracker {
    front_end: PitchFrontEnd,
    segmenter: NoteSegmenter,
    hops: u64,
}

impl NoteTracker {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            front_end: PitchFrontEnd::new(config)?,
            segmenter: NoteSegmenter::new(config)?,
            hops: 0,
        })
    }

    /// A malformed frame fails before the segmenter sees anything.
    pub fn process(&mut self, frame: &[f32]) -> Result<TrackedHop, FrameError> {
        let estimate = self.front_end.analyze(frame)?;
        let events = self.segmenter.process(estimate.pitch, estimate.voiced);
        self.hops += 1;
        Ok(TrackedHop { estimate, events })
    }

    pub fn hops_processed(&self) -> u64 {
        self.hops
    }

    pub fn segmenter(&self) -> &NoteSegmenter {
        &self.segmenter
    }

    pub fn hop_duration(&self) -> f32 {
        self.segmenter.hop_duration()
    }

    pub fn reset(&mut self) {
        self.segmenter.reset();
        self.hops = 0;
    }
}

/// Tracks a whole mono signal and returns its timeline, with any note still
/// sounding closed at the end of the signal. `on_hop` is called after every
/// hop, for progress reporting.
pub fn track_signal(
    config: &Config,
    samples: &[f32],
    mut on_hop: impl FnMut(u64),
) -> Result<NoteTimeline, TrackError> {
    let mut tracker = NoteTracker::new(config)?;
    let mut timeline = NoteTimeline::new(tracker.hop_duration());

    let frames = FrameCutter::new(samples, config.analysis.frame_size, config.analysis.hop_size);
    for (hop, frame) in frames.enumerate() {
        let tracked = tracker.process(&frame)?;
        timeline.push(hop as u64, &tracked.events);
        on_hop(hop as u64);
    }

    timeline.finish(samples.len() as f32 / config.analysis.sample_rate as f32);
    Ok(timeline)
}
