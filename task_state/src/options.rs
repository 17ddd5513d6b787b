//! The compile-time-configurable facets of an [`crate::OperationState`].
//!
//! Four facets distinguish one operation state from another: whether it is
//! continuable, stoppable, shared, and whether its task launch is deferred.
//! Rust generics let two of these be genuinely zero-cost type parameters:
//! whether a state is [`Shared`] or [`Unique`] changes `get_value`'s
//! signature and bounds (shared states need `T: Clone`), and whether it is
//! [`Continuable`] or [`NonContinuable`] changes whether the continuation
//! list does anything at all ([`crate::continuation::NoContinuations`] is a
//! zero-sized no-op).
//!
//! `stoppable`, `deferred` and `always_detached` stay as plain
//! always-present fields on the state (an `Option<StopSource>`, a launch
//! guard, an `AtomicBool`) rather than additional generic axes: the
//! combinatorics of four independent type-level booleans buys little here
//! since every concrete future type in `task_future` already needs to
//! decide at construction time whether it has a stop source or a deferred
//! task, and an unused `Option`/`bool` field costs a few bytes, not a
//! synchronization primitive. This tradeoff is recorded in DESIGN.md.

use crate::continuation::{ContinuationSlot, NoContinuations, WithContinuations};

/// Whether an operation state may have more than one [`Future`](crate) holder.
pub trait Cardinality: Send + Sync + 'static {
    const SHARED: bool;
}

/// A unique (non-shared) state: exactly one future holder, entitled to
/// move the value out of the slot on `get_value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unique;

impl Cardinality for Unique {
    const SHARED: bool = false;
}

/// A shared state: any number of future holders, each of which clones the
/// value out of the slot on `get_value` (requires `T: Clone`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Shared;

impl Cardinality for Shared {
    const SHARED: bool = true;
}

/// Whether an operation state maintains a continuation list at all.
pub trait ContinuationKind: Send + Sync + 'static {
    type Slot: ContinuationSlot + Default + Send;
    const CONTINUABLE: bool;
}

/// States that support `attach_continuation`/`.then()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Continuable;

impl ContinuationKind for Continuable {
    type Slot = WithContinuations;
    const CONTINUABLE: bool = true;
}

/// States that never accept continuations; the continuation list facet
/// compiles down to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonContinuable;

impl ContinuationKind for NonContinuable {
    type Slot = NoContinuations;
    const CONTINUABLE: bool = false;
}
