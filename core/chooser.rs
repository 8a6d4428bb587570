// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use crate::record::PartitionId;

/// Selects which partition's [`crate::queue::RecordQueue`] to drain next.
///
/// Unlike the host's own chooser, this one does not hold a reference to the
/// queue itself: the [`crate::group::StreamGroup`]'s stash remains the sole
/// owner of every `RecordQueue`, and the chooser deals only in
/// [`PartitionId`] tokens (plus, for the time-based variant, a timestamp
/// snapshot taken at `add` time). That sidesteps the aliasing a back-
/// reference would require and matches Design Note 9's preference for
/// one-directional ownership.
///
/// Both variants assume single-threaded access; the surrounding
/// [`crate::group::StreamGroup`] serializes all access under its own lock.
pub enum Chooser {
    Fifo(VecDeque<PartitionId>),
    TimeBased {
        heap: BinaryHeap<Reverse<TimeEntry>>,
        next_seq: u64,
    },
}

#[derive(Debug, Clone)]
pub struct TimeEntry {
    timestamp: i64,
    seq: u64,
    partition: PartitionId,
}

impl PartialEq for TimeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.seq == other.seq
    }
}
impl Eq for TimeEntry {}

impl PartialOrd for TimeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.timestamp, self.seq).cmp(&(other.timestamp, other.seq))
    }
}

impl Chooser {
    pub fn fifo() -> Self {
        Chooser::Fifo(VecDeque::new())
    }

    pub fn time_based() -> Self {
        Chooser::TimeBased {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Registers `partition` as having a non-empty queue.
    ///
    /// Callers guarantee a given partition is added at most once while
    /// resident in the chooser; idempotency is not required.
    pub fn add(&mut self, partition: PartitionId, tracked_timestamp: i64) {
        match self {
            Chooser::Fifo(q) => q.push_back(partition),
            Chooser::TimeBased { heap, next_seq } => {
                let seq = *next_seq;
                *next_seq += 1;
                heap.push(Reverse(TimeEntry {
                    timestamp: tracked_timestamp,
                    seq,
                    partition,
                }));
            }
        }
    }

    /// Removes and returns the partition to drain next, or `None` if the
    /// chooser currently holds nothing.
    pub fn next(&mut self) -> Option<PartitionId> {
        match self {
            Chooser::Fifo(q) => q.pop_front(),
            Chooser::TimeBased { heap, .. } => heap.pop().map(|Reverse(e)| e.partition),
        }
    }

    pub fn close(&mut self) {
        match self {
            Chooser::Fifo(q) => q.clear(),
            Chooser::TimeBased { heap, .. } => heap.clear(),
        }
    }
}
