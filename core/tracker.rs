// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::collections::VecDeque;

use crate::record::NO_TIMESTAMP;

/// Tracks the minimum timestamp of a FIFO-ordered multiset of elements,
/// each identified by a partition offset, under interleaved `add`/`remove`
/// where removals happen in the same order as the matching additions.
///
/// This is the monotone-minimum-deque trick: only elements that could still
/// become the minimum are retained. An element can be evicted from the back
/// by a later, strictly smaller element without ever being explicitly
/// removed; when its `remove` eventually arrives, it is simply not found at
/// the front and the call is a no-op, because a smaller element already
/// took over as the tracked minimum.
#[derive(Debug, Default)]
pub struct TimestampTracker {
    deque: VecDeque<Entry>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    offset: i64,
    timestamp: i64,
}

impl TimestampTracker {
    pub fn new() -> Self {
        TimestampTracker {
            deque: VecDeque::new(),
        }
    }

    /// Registers a newly buffered record. `offset` must be the identity by
    /// which the matching `remove` call will refer to this record.
    pub fn add(&mut self, offset: i64, timestamp: i64) {
        while matches!(self.deque.back(), Some(e) if e.timestamp > timestamp) {
            self.deque.pop_back();
        }
        self.deque.push_back(Entry { offset, timestamp });
    }

    /// Removes the record identified by `offset`, if it is still tracked.
    /// The caller must call this in the same order records were `add`ed.
    pub fn remove(&mut self, offset: i64) {
        if matches!(self.deque.front(), Some(e) if e.offset == offset) {
            self.deque.pop_front();
        }
    }

    /// Returns the minimum timestamp currently tracked, or [`NO_TIMESTAMP`]
    /// if nothing is buffered.
    pub fn get(&self) -> i64 {
        self.deque.front().map_or(NO_TIMESTAMP, |e| e.timestamp)
    }
}
