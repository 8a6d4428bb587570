// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::sync::Arc;

/// Sentinel returned by [`crate::tracker::TimestampTracker::get`] and
/// [`crate::queue::RecordQueue::tracked_timestamp`] when there is nothing
/// buffered: the minimum representable `i64`, so that any real timestamp
/// compares greater than it.
pub const NO_TIMESTAMP: i64 = i64::MIN;

/// An opaque, hashable identifier for one partition of one topic.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PartitionId {
    pub topic: Arc<str>,
    pub partition: i32,
}

impl PartitionId {
    pub fn new(topic: impl Into<Arc<str>>, partition: i32) -> Self {
        PartitionId {
            topic: topic.into(),
            partition,
        }
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// A record as handed to [`crate::group::StreamGroup::add_records`], before
/// deserialization. Carries no timestamp: the timestamp is a function of the
/// *deserialized* key/value (see [`crate::traits::TimestampExtractor`]), not
/// of the wire bytes.
#[derive(Clone, Debug)]
pub struct RawRecord {
    pub offset: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// An immutable, deserialized, timestamped record plus its source offset.
#[derive(Clone, Debug)]
pub struct StampedRecord<K, V> {
    pub key: K,
    pub value: V,
    pub timestamp: i64,
    pub offset: i64,
}
