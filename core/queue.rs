// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::collections::VecDeque;

use crate::record::{PartitionId, StampedRecord, NO_TIMESTAMP};
use crate::tracker::TimestampTracker;
use crate::traits::Receiver;

/// A per-partition FIFO of [`StampedRecord`]s with a tracked minimum
/// timestamp, plus the [`Receiver`] records are ultimately dispatched to.
///
/// The queue owns its receiver outright (`Box<dyn Receiver>`): there is no
/// back-reference from the receiver to the queue, and no shared-ownership
/// need, so a plain box is simpler than the reference-counted handles the
/// rest of this crate uses for [`PartitionId`].
pub struct RecordQueue<K, V> {
    partition: PartitionId,
    records: VecDeque<StampedRecord<K, V>>,
    tracker: TimestampTracker,
    receiver: Box<dyn Receiver<K, V>>,
    /// Offset of the most recently *enqueued* record, independent of how
    /// many records have since been popped.
    offset: Option<i64>,
}

impl<K, V> RecordQueue<K, V> {
    pub fn new(partition: PartitionId, receiver: Box<dyn Receiver<K, V>>) -> Self {
        RecordQueue {
            partition,
            records: VecDeque::new(),
            tracker: TimestampTracker::new(),
            receiver,
            offset: None,
        }
    }

    pub fn partition(&self) -> &PartitionId {
        &self.partition
    }

    pub fn add(&mut self, record: StampedRecord<K, V>) {
        self.tracker.add(record.offset, record.timestamp);
        self.offset = Some(record.offset);
        self.records.push_back(record);
    }

    pub fn next(&mut self) -> Option<StampedRecord<K, V>> {
        let record = self.records.pop_front()?;
        self.tracker.remove(record.offset);
        Some(record)
    }

    pub fn tracked_timestamp(&self) -> i64 {
        self.tracker.get()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Offset of the most recently enqueued record. `None` iff nothing has
    /// ever been added.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn receiver_mut(&mut self) -> &mut dyn Receiver<K, V> {
        self.receiver.as_mut()
    }
}
