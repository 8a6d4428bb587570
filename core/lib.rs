// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

//! A per-task stream synchronization core.
//!
//! [`StreamGroup`] drains per-partition record queues into user-supplied
//! [`Receiver`]s one record at a time, advances a shared logical stream-time
//! clock, biases toward whichever partition is furthest behind in event
//! time, applies per-partition backpressure through an [`Ingestor`], and
//! fires stream-time-indexed punctuation callbacks. Everything else in this
//! crate is a supporting data structure `StreamGroup` owns outright; none of
//! it is meant to be driven directly by a caller.
//!
//! The group holds no threads of its own: a fetcher thread calls
//! [`StreamGroup::add_records`] and a processing thread calls
//! [`StreamGroup::process`] in a loop, and the two may run concurrently.

mod chooser;
mod config;
mod group;
mod punctuate;
mod queue;
mod record;
mod tracker;
mod traits;


#[cfg(test)]
mod scenarios;

pub use chooser::Chooser;
pub use config::StreamGroupConfig;
pub use group::{ProcessStatus, StreamGroup};
pub use record::{PartitionId, RawRecord, StampedRecord, NO_TIMESTAMP};
pub use traits::{Ingestor, KeyValueDeserializer, Punctuator, Receiver, TimestampExtractor};

pub use base::{Error, ErrorKind};
