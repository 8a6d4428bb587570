// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use base::{bail, Error};

use crate::traits::Punctuator;

/// One registered `(nextFiringTime, interval, processor)` schedule.
struct Schedule {
    next_firing_time: i64,
    interval_ms: i64,
    seq: u64,
    processor: Box<dyn Punctuator>,
}

impl PartialEq for Schedule {
    fn eq(&self, other: &Self) -> bool {
        self.next_firing_time == other.next_firing_time && self.seq == other.seq
    }
}
impl Eq for Schedule {}
impl PartialOrd for Schedule {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Schedule {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.next_firing_time, self.seq).cmp(&(other.next_firing_time, other.seq))
    }
}

/// An ordered set of punctuation schedules, earliest `nextFiringTime` first.
#[derive(Default)]
pub struct PunctuationQueue {
    heap: BinaryHeap<Reverse<Schedule>>,
    next_seq: u64,
}

impl PunctuationQueue {
    pub fn new() -> Self {
        PunctuationQueue {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Registers `processor` to be punctuated every `interval_ms` of stream
    /// time, starting at `initial_stream_time + interval_ms`.
    ///
    /// `interval_ms` must be positive.
    pub fn schedule(
        &mut self,
        processor: Box<dyn Punctuator>,
        interval_ms: i64,
        initial_stream_time: i64,
    ) -> Result<(), Error> {
        if interval_ms <= 0 {
            bail!(
                InvalidArgument,
                msg("punctuation interval must be positive, got {interval_ms}")
            );
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Schedule {
            next_firing_time: initial_stream_time + interval_ms,
            interval_ms,
            seq,
            processor,
        }));
        Ok(())
    }

    /// Fires every schedule whose `nextFiringTime` has been reached,
    /// earliest first, each with the same `stream_time` argument. A
    /// schedule whose interval is smaller than how far `stream_time` has
    /// jumped fires once per elapsed interval, not once total: firings are
    /// never coalesced.
    pub fn may_punctuate(&mut self, stream_time: i64) {
        while matches!(self.heap.peek(), Some(Reverse(s)) if s.next_firing_time <= stream_time) {
            let Reverse(mut due) = self.heap.pop().expect("peek just matched");
            tracing::debug!(
                next_firing_time = due.next_firing_time,
                stream_time,
                "punctuating"
            );
            due.processor.punctuate(stream_time);
            due.next_firing_time += due.interval_ms;
            self.heap.push(Reverse(due));
        }
    }
}
