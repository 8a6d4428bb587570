// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

//! Ambient infrastructure shared by every crate in this workspace: a generic
//! error taxonomy, a fast hash map alias, and a re-exported mutex.
//!
//! Nothing in this crate knows anything about streams, partitions, or
//! records. That keeps it reusable if a second crate ever joins `core` in
//! this workspace.

mod error;

pub use error::{Error, ErrorKind};
pub use parking_lot::Mutex;

/// A `HashMap` keyed on a faster, non-DoS-resistant hasher.
///
/// Appropriate for maps whose keys never originate from an untrusted,
/// attacker-controlled source — which is true of every map in this
/// workspace (partition ids are assigned by the enclosing task, not read
/// off the wire by this crate).
pub type FastHashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
