use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every failure surfaced by the index layer is an `InternalError`; the
/// taxonomy callers branch on lives in `detail`.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// A key byte layout does not match its expected kind or length.
    pub(crate) fn malformed_key(kind: KeyKind, len: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(%kind, len, %reason, "malformed key");

        Self {
            class: ErrorClass::Corruption,
            origin: ErrorOrigin::Serialize,
            message: format!("malformed {kind} key ({len} bytes): {reason}"),
            detail: Some(ErrorDetail::MalformedKey { kind, len }),
        }
    }

    /// The primary object contiguity invariant is violated for `id`.
    pub(crate) fn corrupted_store(id: u64, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(id, %message, "primary object run corrupted");

        Self {
            class: ErrorClass::Corruption,
            origin: ErrorOrigin::Data,
            message: format!("corrupted store at object {id}: {message}"),
            detail: Some(ErrorDetail::CorruptedStore { id, message }),
        }
    }

    /// An expected entity, index declaration or namespace is absent.
    pub fn not_found(origin: ErrorOrigin, what: impl Into<String>) -> Self {
        let what = what.into();

        Self {
            class: ErrorClass::NotFound,
            origin,
            message: format!("not found: {what}"),
            detail: Some(ErrorDetail::NotFound { what }),
        }
    }

    /// Index and primary namespaces disagree about whether data exists.
    pub(crate) fn inconsistent_index(
        namespace: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        let message = message.into();

        Self {
            class: ErrorClass::Inconsistent,
            origin: ErrorOrigin::Schema,
            message: format!("inconsistent namespace '{namespace}': {message}"),
            detail: Some(ErrorDetail::InconsistentIndex { namespace, message }),
        }
    }

    /// Construct a store-origin internal error.
    pub(crate) fn store_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Store, message)
    }

    /// Construct an index-origin corruption error.
    pub(crate) fn index_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Index, message)
    }

    /// Construct an index-origin unsupported error.
    pub(crate) fn index_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Index, message)
    }

    /// Construct a query-origin unsupported error.
    pub(crate) fn query_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Query, message)
    }

    /// Construct a data-origin unsupported error.
    pub(crate) fn data_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Data, message)
    }

    /// Construct a data-origin invariant violation.
    pub(crate) fn data_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Data, message)
    }

    #[must_use]
    pub const fn is_malformed_key(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::MalformedKey { .. }))
    }

    #[must_use]
    pub const fn is_corrupted_store(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::CorruptedStore { .. }))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::NotFound { .. }))
    }

    #[must_use]
    pub const fn is_inconsistent(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::InconsistentIndex { .. }))
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("malformed {kind} key ({len} bytes)")]
    MalformedKey { kind: KeyKind, len: usize },

    #[error("corrupted store at object {id}: {message}")]
    CorruptedStore { id: u64, message: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("inconsistent namespace '{namespace}': {message}")]
    InconsistentIndex { namespace: String, message: String },
}

///
/// KeyKind
///
/// Which binary key layout a decode failure refers to.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KeyKind {
    Field,
    Hash,
    Prefix,
    Interval,
    Sequence,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Field => "field",
            Self::Hash => "hash index",
            Self::Prefix => "prefix index",
            Self::Interval => "interval index",
            Self::Sequence => "sequence",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Unsupported,
    InvariantViolation,
    Inconsistent,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
            Self::Inconsistent => "inconsistent",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Serialize,
    Store,
    Data,
    Index,
    Query,
    Schema,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Serialize => "serialize",
            Self::Store => "store",
            Self::Data => "data",
            Self::Index => "index",
            Self::Query => "query",
            Self::Schema => "schema",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
