// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base::{bail, Error, FastHashMap};

use crate::chooser::Chooser;
use crate::config::StreamGroupConfig;
use crate::punctuate::PunctuationQueue;
use crate::queue::RecordQueue;
use crate::record::{PartitionId, RawRecord, StampedRecord, NO_TIMESTAMP};
use crate::traits::{Ingestor, KeyValueDeserializer, Punctuator, Receiver, TimestampExtractor};

/// Output parameter of [`StreamGroup::process`]: advisory hints for the
/// caller about whether the upstream fetcher should be invoked again.
///
/// A spurious `true` is harmless; a spurious `false` is a bug. Callers
/// should pass a fresh, zeroed `ProcessStatus` to each `process` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessStatus {
    pub poll_required: bool,
}

struct PartitionEntry<K, V> {
    queue: RecordQueue<K, V>,
    deserializer: Arc<dyn KeyValueDeserializer<K, V>>,
}

struct Inner<K, V> {
    stash: FastHashMap<PartitionId, PartitionEntry<K, V>>,
    staging: Vec<(PartitionId, Vec<RawRecord>)>,
    consumed_offsets: FastHashMap<PartitionId, i64>,
    stream_time: i64,
    chooser: Chooser,
    punctuation: PunctuationQueue,
}

/// Drains per-partition record queues into their receivers one record at a
/// time, biasing toward whichever partition is furthest behind in event
/// time, applying per-partition backpressure, and firing punctuation
/// callbacks as stream time advances.
///
/// All mutable state lives behind a single lock (`inner`), matching the
/// host crate family's own "one monitor per logical unit of shared state"
/// convention: exactly one thread may be inside [`StreamGroup::process`] at
/// a time, while [`StreamGroup::add_records`] may be called concurrently
/// from a fetcher thread. `buffered` is additionally tracked outside the
/// lock so [`StreamGroup::buffered`] never has to acquire it.
pub struct StreamGroup<K, V> {
    inner: base::Mutex<Inner<K, V>>,
    ingestor: Arc<dyn Ingestor>,
    timestamp_extractor: Arc<dyn TimestampExtractor<K, V>>,
    config: StreamGroupConfig,
    buffered: AtomicUsize,
}

impl<K, V> StreamGroup<K, V> {
    pub fn new(
        config: StreamGroupConfig,
        ingestor: Arc<dyn Ingestor>,
        timestamp_extractor: Arc<dyn TimestampExtractor<K, V>>,
        chooser: Chooser,
    ) -> Self {
        StreamGroup {
            inner: base::Mutex::new(Inner {
                stash: FastHashMap::default(),
                staging: Vec::new(),
                consumed_offsets: FastHashMap::default(),
                stream_time: NO_TIMESTAMP,
                chooser,
                punctuation: PunctuationQueue::new(),
            }),
            ingestor,
            timestamp_extractor,
            config,
            buffered: AtomicUsize::new(0),
        }
    }

    /// Registers `partition`, bound to `receiver` and `deserializer`.
    ///
    /// Fails with [`base::ErrorKind::AlreadyExists`] if the partition was
    /// already added; the core never silently replaces a receiver.
    pub fn add_partition(
        &self,
        partition: PartitionId,
        receiver: Box<dyn Receiver<K, V>>,
        deserializer: Arc<dyn KeyValueDeserializer<K, V>>,
    ) -> Result<(), Error> {
        let mut inner = self.inner.lock();
        if inner.stash.contains_key(&partition) {
            tracing::debug!(%partition, "rejecting duplicate add_partition");
            bail!(AlreadyExists, msg("partition {partition} already added"));
        }
        let queue = RecordQueue::new(partition.clone(), receiver);
        inner
            .stash
            .insert(partition, PartitionEntry { queue, deserializer });
        Ok(())
    }

    /// Defers `records` for later draining by `process`. Does no
    /// deserialization or timestamp extraction, and never fails: an unknown
    /// partition (one that has been revoked since the fetcher last checked)
    /// is silently dropped when the batch is eventually drained.
    pub fn add_records(&self, partition: PartitionId, records: Vec<RawRecord>) {
        if records.is_empty() {
            return;
        }
        self.inner.lock().staging.push((partition, records));
    }

    /// Schedules `processor` to first fire at `initial_stream_time +
    /// interval_ms`, and every `interval_ms` of stream time thereafter.
    ///
    /// `initial_stream_time` is taken as an explicit parameter, rather than
    /// read from the group's own current stream time, so that a processor
    /// registered before any record has ever been processed (when stream
    /// time is still [`crate::record::NO_TIMESTAMP`]) is not accidentally
    /// scheduled against that sentinel.
    pub fn schedule_punctuation(
        &self,
        processor: Box<dyn Punctuator>,
        interval_ms: i64,
        initial_stream_time: i64,
    ) -> Result<(), Error> {
        self.inner
            .lock()
            .punctuation
            .schedule(processor, interval_ms, initial_stream_time)
    }

    /// Drains staged records, dispatches at most one record to its
    /// receiver, and fires any punctuations that matured as a result.
    ///
    /// See the module-level ordering: ingest, select, backpressure, pop,
    /// dispatch, bookkeeping, punctuate. If the receiver returns an error
    /// it propagates here immediately, *after* the record has already left
    /// its queue and stream time has already advanced — the core does not
    /// retry and does not un-pop the record.
    pub fn process(&self, status: &mut ProcessStatus) -> Result<(), Error> {
        status.poll_required = false;
        let mut inner = self.inner.lock();

        self.ingest_new_records(&mut inner)?;

        let Some(partition) = inner.chooser.next() else {
            status.poll_required = true;
            return Ok(());
        };

        let desired = self.config.desired_unprocessed_per_partition();
        let entry = inner
            .stash
            .get_mut(&partition)
            .expect("the chooser only ever holds partitions present in the stash");

        if entry.queue.is_empty() {
            tracing::error!(%partition, "chooser handed back an empty queue");
            bail!(
                Internal,
                msg("chooser returned an empty queue for partition {partition}")
            );
        }

        if entry.queue.len() == desired {
            let from_offset = entry
                .queue
                .offset()
                .expect("a non-empty queue has a last-added offset");
            tracing::debug!(%partition, from_offset, "unpausing");
            self.ingestor.unpause(&partition, from_offset);
        }

        let tracked_timestamp = entry.queue.tracked_timestamp();
        let record = entry.queue.next().expect("checked non-empty above");
        if entry.queue.len() < desired {
            status.poll_required = true;
        }

        inner.stream_time = inner.stream_time.max(tracked_timestamp);
        let stream_time = inner.stream_time;

        let Inner {
            stash,
            chooser,
            consumed_offsets,
            punctuation,
            ..
        } = &mut *inner;
        let entry = stash.get_mut(&partition).expect("looked up above");

        entry
            .queue
            .receiver_mut()
            .receive(record.key, record.value, record.timestamp, stream_time)?;

        consumed_offsets.insert(partition.clone(), record.offset);
        if !entry.queue.is_empty() {
            chooser.add(partition, entry.queue.tracked_timestamp());
        }
        self.buffered.fetch_sub(1, Ordering::SeqCst);
        punctuation.may_punctuate(stream_time);

        Ok(())
    }

    /// Drains every batch staged by `add_records` into its partition's
    /// queue.
    ///
    /// A deserialize/extract failure on one record must not cost any other
    /// partition its staged batch, nor skip the chooser/pause bookkeeping
    /// for records the failing batch already got in before the failure: on
    /// error, the undrained remainder of the failing batch and every batch
    /// not yet visited are pushed back onto `inner.staging` so a later call
    /// drains them, and the chooser/pause checks below still run first for
    /// whatever this batch did manage to add.
    fn ingest_new_records(&self, inner: &mut Inner<K, V>) -> Result<(), Error> {
        let mut batches = std::mem::take(&mut inner.staging).into_iter();
        let desired = self.config.desired_unprocessed_per_partition();

        while let Some((partition, records)) = batches.next() {
            let Inner {
                stash,
                chooser,
                staging,
                ..
            } = &mut *inner;
            let Some(entry) = stash.get_mut(&partition) else {
                tracing::debug!(%partition, "dropping records for an unknown (revoked?) partition");
                continue;
            };

            let was_empty = entry.queue.is_empty();
            let mut records = records.into_iter();
            let mut ingest_err = None;
            for raw in records.by_ref() {
                let stamped = (|| -> Result<StampedRecord<K, V>, Error> {
                    let key = entry
                        .deserializer
                        .deserialize_key(&partition.topic, &raw.key)?;
                    let value = entry
                        .deserializer
                        .deserialize_value(&partition.topic, &raw.value)?;
                    let timestamp =
                        self.timestamp_extractor
                            .extract(&partition.topic, &key, &value)?;
                    Ok(StampedRecord {
                        key,
                        value,
                        timestamp,
                        offset: raw.offset,
                    })
                })();
                match stamped {
                    Ok(stamped) => {
                        entry.queue.add(stamped);
                        self.buffered.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => {
                        ingest_err = Some(e);
                        break;
                    }
                }
            }

            if was_empty && !entry.queue.is_empty() {
                chooser.add(partition.clone(), entry.queue.tracked_timestamp());
            }
            if entry.queue.len() >= desired {
                tracing::debug!(%partition, size = entry.queue.len(), "pausing");
                self.ingestor.pause(&partition);
            }

            if let Some(err) = ingest_err {
                tracing::warn!(%partition, "deserialize/extract failure mid-batch; requeuing the rest of this batch and any undrained batches");
                let remainder: Vec<RawRecord> = records.collect();
                if !remainder.is_empty() {
                    staging.push((partition, remainder));
                }
                staging.extend(batches);
                return Err(err);
            }
        }
        Ok(())
    }

    /// A snapshot of the last-consumed offset per partition, as of the most
    /// recently completed `process` call. Returned by value, since the
    /// core does not expose its internal lock to callers.
    pub fn consumed_offsets(&self) -> FastHashMap<PartitionId, i64> {
        self.inner.lock().consumed_offsets.clone()
    }

    /// The total number of records currently buffered across all
    /// partitions. Backed by an atomic outside the group lock.
    pub fn buffered(&self) -> usize {
        self.buffered.load(Ordering::SeqCst)
    }

    /// The current stream time, or [`NO_TIMESTAMP`] if no record has ever
    /// been popped.
    pub fn stream_time(&self) -> i64 {
        self.inner.lock().stream_time
    }

    /// Releases the chooser and clears the stash. The group is unusable
    /// afterward.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.chooser.close();
        inner.stash.clear();
    }
}
