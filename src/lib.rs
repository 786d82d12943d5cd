#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Thread-safe collection and aggregation of errors.
//!
//! ## Overview
//!
//! This crate provides small collector types that accumulate the errors of a
//! batch of independent operations (worker-pool tasks, per-file validation,
//! fan-out requests) and resolve them into a single aggregate error, or into
//! nothing when every operation succeeded.
//!
//! ## Quick Example
//!
//! ```
//! use errcatch::{Catcher, errorf};
//!
//! fn validate(lines: &[&str]) -> Option<errcatch::Resolved> {
//!     let catcher = Catcher::plain();
//!     for (number, line) in lines.iter().enumerate() {
//!         if line.is_empty() {
//!             errorf!(catcher, "line {number} is empty");
//!         }
//!         catcher.check(|| line.parse::<u32>());
//!     }
//!     catcher.resolve()
//! }
//!
//! assert!(validate(&["1", "2"]).is_none());
//! assert_eq!(validate(&["1", "x"]).unwrap().lines().count(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! A [`Catcher`] is an ordered, optionally bounded sequence of errors behind
//! a reader/writer lock. Every method takes `&self`, so a catcher can be
//! shared between threads and filled concurrently.
//!
//! Every value handed to a collector goes through [`IntoCaught`]. This is
//! where the collection rules live:
//! - `None`, `Ok` and empty aggregates are **absent** and silently ignored.
//! - Any `Error + Send + Sync + 'static` is a **leaf** and is erased into a
//!   shared [`Caught`] handle.
//! - A reference to an [`Aggregate`] (such as another `Catcher`) is
//!   **flattened**: its errors are merged one by one.
//!
//! Resolving a catcher renders each stored error according to its
//! [`Format`] and joins the lines into a [`Resolved`] error.
//!
//! ## Capacity
//!
//! A catcher built with [`Catcher::bounded`] keeps at most `max_size`
//! errors. When full, the oldest error is dropped to make room, so the
//! catcher always holds the most recent failures.
//!
//! ## Timestamps
//!
//! With the `std` feature, the [`timestamp`] module annotates errors with the
//! instant they were captured, and the [`Format::Timestamp`] and
//! [`Format::ExtendedTimestamp`] collectors do so for every stored error.
//!
//! ## Error channels
//!
//! With the `channel` feature, [`ErrorChannel`] wraps a catcher in a tokio
//! task that records errors and forwards them to an outbound queue, bounded
//! by a cancellation scope.
//!
//! ## Features
//!
//! - `std` (default): `std::sync::RwLock` for collectors and the
//!   [`timestamp`] module. Without it the crate is `no_std` + `alloc` and
//!   uses a spin lock.
//! - `channel` (default): [`ErrorChannel`]. Implies `std`.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod macros;

pub mod markers;
pub mod prelude;
#[cfg(feature = "std")]
pub mod timestamp;

mod catcher;
mod caught;
#[cfg(feature = "channel")]
mod channel;
mod into_caught;
mod message;
mod resolved;

#[cfg(feature = "channel")]
pub use self::channel::{ErrorChannel, Outbound, WaitError};
pub use self::{
    catcher::{Catcher, CheckFn, Format},
    caught::{Caught, Chain, Extended},
    into_caught::{Aggregate, IntoCaught, Submission},
    message::Message,
    resolved::Resolved,
};

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    use core::fmt;

    #[doc(hidden)]
    pub use core::format_args;

    use crate::{Caught, Message};

    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub fn format_caught(args: fmt::Arguments<'_>) -> Caught {
        Caught::new(Message::from_args(args))
    }
}
