// This file is part of streamsync, a per-task stream synchronization core.
// Copyright (C) 2026 The streamsync Authors; see AUTHORS and LICENSE.txt.
// SPDX-License-Identifier: MIT.

use std::fmt;

/// General-purpose error classification.
///
/// These codes are taken from
/// [grpc::StatusCode](https://github.com/grpc/grpc/blob/master/include/grpcpp/impl/codegen/status_code_enum.h),
/// which is a nice general-purpose classification of errors independent of
/// any one crate's domain. Every fallible operation in this workspace
/// returns one of these rather than a bespoke per-operation error enum.
#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("cancelled")]
    Cancelled,
    #[error("unknown")]
    Unknown,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("permission denied")]
    PermissionDenied,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("resource exhausted")]
    ResourceExhausted,
    #[error("failed precondition")]
    FailedPrecondition,
    #[error("aborted")]
    Aborted,
    #[error("out of range")]
    OutOfRange,
    #[error("unimplemented")]
    Unimplemented,
    #[error("internal")]
    Internal,
    #[error("unavailable")]
    Unavailable,
    #[error("data loss")]
    DataLoss,
}

/// An error carrying an [`ErrorKind`], a human-readable message, and
/// optionally the lower-level error that caused it.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Builds an error from a kind and a pre-formatted message.
    pub fn msg(kind: ErrorKind, message: impl Into<String>) -> Error {
        Error {
            kind,
            message: Some(message.into()),
            source: None,
        }
    }

    /// Builds an error from a kind and an underlying cause, with no
    /// additional message of its own.
    pub fn from_source(
        kind: ErrorKind,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Error {
        Error {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.source) {
            (Some(m), _) => write!(f, "{}: {m}", self.kind),
            (None, Some(s)) => write!(f, "{}: {s}", self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|s| s.as_ref() as _)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            message: None,
            source: None,
        }
    }
}

/// Builds an [`Error`] without returning it.
///
/// ```
/// use streamsync_base::{err, ErrorKind};
/// let e = err!(NotFound, msg("unknown partition {}", 3));
/// assert_eq!(e.kind(), ErrorKind::NotFound);
/// ```
#[macro_export]
macro_rules! err {
    ($kind:ident, msg($($arg:tt)+)) => {
        $crate::Error::msg($crate::ErrorKind::$kind, format!($($arg)+))
    };
    ($kind:ident, source($src:expr)) => {
        $crate::Error::from_source($crate::ErrorKind::$kind, $src)
    };
}

/// Like [`err!`], but returns the error from the enclosing function.
///
/// ```
/// use streamsync_base::{bail, Error, ErrorKind};
/// fn check(ok: bool) -> Result<(), Error> {
///     if !ok {
///         bail!(FailedPrecondition, msg("not ok"));
///     }
///     Ok(())
/// }
/// assert_eq!(check(false).unwrap_err().kind(), ErrorKind::FailedPrecondition);
/// ```
#[macro_export]
macro_rules! bail {
    ($kind:ident, msg($($arg:tt)+)) => {
        return Err($crate::err!($kind, msg($($arg)+)))
    };
    ($kind:ident, source($src:expr)) => {
        return Err($crate::err!($kind, source($src)))
    };
}
