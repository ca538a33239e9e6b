use std::collections::VecDeque;

/// Most frequent value in the buffer. `None` is the "no pitch" vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vote {
    pub value: Option<i32>,
    pub count: usize,
}

/// Fixed-capacity ring of the most recent voting values, one per hop.
#[derive(Clone, Debug)]
pub struct VotingBuffer {
    values: VecDeque<Option<i32>>,
    capacity: usize,
    // reused by every majority() call
    tally: Vec<Vote>,
}

impl VotingBuffer {
    /// Smallest capacity with a well-defined majority.
    pub const MIN_CAPACITY: usize = 3;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(Self::MIN_CAPACITY);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            tally: Vec::with_capacity(capacity),
        }
    }

    /// Capacity covering `duration` seconds of hops, before clamping.
    pub fn capacity_for(duration: f32, sample_rate: u32, hop_size: usize) -> usize {
        (duration * sample_rate as f32 / hop_size as f32).round() as usize
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Option<i32>) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Ties go to whichever tied value was pushed most recently.
    pub fn majority(&mut self) -> Option<Vote> {
        // tally in order of most recent occurrence
        self.tally.clear();
        for &value in self.values.iter().rev() {
            match self.tally.iter_mut().find(|v| v.value == value) {
                Some(vote) => vote.count += 1,
                None => self.tally.push(Vote { value, count: 1 }),
            }
        }

        let mut best: Option<Vote> = None;
        for &vote in &self.tally {
            if best.map_or(true, |b| vote.count > b.count) {
                best = Some(vote);
            }
        }
        best
    }

    /// The count is measured against the full capacity, so a buffer that is
    /// still filling needs proportionally more agreement.
    pub fn is_coherent(&self, vote: &Vote, min_occurrence_rate: f32) -> bool {
        vote.value.is_some() && vote.count as f32 / self.capacity as f32 >= min_occurrence_rate
    }

    /// Majority note when it passes the coherence test.
    pub fn coherent_majority(&mut self, min_occurrence_rate: f32) -> Option<i32> {
        let vote = self.majority()?;
        if self.is_coherent(&vote, min_occurrence_rate) {
            vote.value
        } else {
            None
        }
    }
}
