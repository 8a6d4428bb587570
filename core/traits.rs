// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use base::Error;

use crate::record::PartitionId;

/// The external fetcher abstraction. `pause`/`unpause` are requests, not
/// commands with an acknowledgement: the core never waits to learn whether
/// they took effect.
///
/// Both methods must be safe to call from the thread running
/// [`crate::group::StreamGroup::process`] while a different thread is
/// concurrently inside the fetcher's own fetch loop for the same partition.
pub trait Ingestor: Send + Sync {
    /// Idempotent request to stop delivering records for `partition`.
    fn pause(&self, partition: &PartitionId);

    /// Idempotent request to resume delivery for `partition`, starting at
    /// `from_offset`.
    fn unpause(&self, partition: &PartitionId, from_offset: i64);
}

/// The downstream sink bound to one partition.
///
/// Called synchronously, with the group lock held. Must not call back into
/// the [`crate::group::StreamGroup`] that owns it; doing so is undefined
/// behavior (in practice, a deadlock on the group's mutex).
pub trait Receiver<K, V>: Send {
    fn receive(
        &mut self,
        key: K,
        value: V,
        record_timestamp: i64,
        stream_time: i64,
    ) -> Result<(), Error>;
}

/// Extracts the logical timestamp of a deserialized key/value pair.
///
/// Shared across every partition in a [`crate::group::StreamGroup`] (unlike
/// [`KeyValueDeserializer`], which is configured per partition), since the
/// timestamp extraction policy is a property of the task, not of any one
/// topic.
pub trait TimestampExtractor<K, V>: Send + Sync {
    fn extract(&self, topic: &str, key: &K, value: &V) -> Result<i64, Error>;
}

/// Deserializes the raw key/value bytes of one partition's records.
///
/// Configured per partition at [`crate::group::StreamGroup::add_partition`]
/// time, since different topics may use different wire encodings.
pub trait KeyValueDeserializer<K, V>: Send + Sync {
    fn deserialize_key(&self, topic: &str, bytes: &[u8]) -> Result<K, Error>;
    fn deserialize_value(&self, topic: &str, bytes: &[u8]) -> Result<V, Error>;
}

/// A callback fired when stream time crosses a scheduled threshold.
///
/// Invoked synchronously inside `process`, with the group lock held.
pub trait Punctuator: Send {
    fn punctuate(&mut self, stream_time: i64);
}
