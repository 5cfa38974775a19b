//! The precondition-violation error taxonomy of spec §7.
//!
//! Invariant failures (a zero refcount decremented again, a `create` that
//! would violate right-chain order) are programming errors internal to this
//! crate; they are guarded with `debug_assert!`/`assert!` and abort in debug
//! builds rather than surfacing as [`MddError`] — per spec §7 there are "no
//! recoverable error classes" for those. `MddError` covers only the
//! *caller-triggerable* preconditions: mixing nodes from different
//! factories, and subscripting a value absent from a set.

use thiserror::Error;

/// Precondition violations a caller can trigger (spec §7, class 1).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MddError {
    /// Two wrapper values (or a wrapper and a factory) that do not share the
    /// same underlying [`crate::factory::Factory`] were combined. Every
    /// binary operation in spec §6's wrapper table requires both operands to
    /// come from the same factory.
    #[error("operands belong to different MDD factories")]
    ForeignFactory,

    /// [`crate::wrappers::MddSet::subscript`] was asked for a value not
    /// present at the set's top level (spec §6: "missing key is an error").
    #[error("value not present in set at this level")]
    MissingKey,
}

pub type Result<T> = std::result::Result<T, MddError>;
