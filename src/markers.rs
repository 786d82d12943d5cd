//! Marker types used to select an [`IntoCaught`] conversion.
//!
//! Every ingestion point of this crate ([`Catcher::add`],
//! [`Catcher::extend`], the error channel's `collect`, ...) accepts any value
//! implementing [`IntoCaught<M>`]. The marker parameter `M` only exists so
//! that several blanket conversions can live side by side without
//! overlapping:
//!
//! - [`Leaf`]: any `Error + Send + Sync + 'static` value.
//! - [`Erased`]: an already erased [`Caught`].
//! - [`Flatten`]: something implementing [`Aggregate`], whose errors are
//!   merged one by one instead of being stored as a single entry.
//! - [`Optional`]: an [`Option`]; `None` is an absent error.
//! - [`Outcome`]: a [`Result`]; `Ok` is an absent error.
//!
//! The markers are never constructed and callers never have to name them:
//! the compiler infers the marker from the argument type.
//!
//! ```
//! use errcatch::Catcher;
//!
//! let catcher = Catcher::plain();
//! catcher.add(std::fmt::Error); // Leaf
//! catcher.add(None::<std::fmt::Error>); // Optional<Leaf>
//! catcher.add(Ok::<(), std::fmt::Error>(())); // Outcome<Leaf>
//! assert_eq!(catcher.len(), 1);
//! ```
//!
//! [`IntoCaught`]: crate::IntoCaught
//! [`IntoCaught<M>`]: crate::IntoCaught
//! [`Caught`]: crate::Caught
//! [`Aggregate`]: crate::Aggregate
//! [`Catcher::add`]: crate::Catcher::add
//! [`Catcher::extend`]: crate::Catcher::extend

use core::marker::PhantomData;

/// Marker for a plain error value.
#[derive(Debug, Clone, Copy)]
pub enum Leaf {}

/// Marker for a value that is already a [`Caught`](crate::Caught).
#[derive(Debug, Clone, Copy)]
pub enum Erased {}

/// Marker for an [`Aggregate`](crate::Aggregate) whose errors are merged
/// individually.
#[derive(Debug, Clone, Copy)]
pub enum Flatten {}

/// Marker for an [`Option`] around another convertible value.
#[derive(Debug, Clone, Copy)]
pub struct Optional<M>(PhantomData<M>);

/// Marker for a [`Result`] whose error side is another convertible value.
#[derive(Debug, Clone, Copy)]
pub struct Outcome<M>(PhantomData<M>);
