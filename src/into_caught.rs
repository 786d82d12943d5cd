use alloc::{boxed::Box, vec::Vec};
use core::{error::Error, fmt};

use crate::{Caught, Format, markers};

/// The capability that makes a value flatten when it is added to a
/// collector.
///
/// Anything that already holds a set of collected errors can implement
/// `Aggregate`. When a reference to it is passed to
/// [`Catcher::add`](crate::Catcher::add) or
/// [`Catcher::extend`](crate::Catcher::extend), its errors are merged into the
/// receiving collector one by one, so nesting collectors never produces a
/// collector-holding-a-collector.
///
/// ```
/// use errcatch::{Aggregate, Catcher};
///
/// let inner = Catcher::plain();
/// inner.message("a");
/// inner.message("b");
///
/// let outer = Catcher::plain();
/// outer.message("c");
/// outer.add(&inner);
///
/// assert_eq!(outer.len(), 3);
/// assert!(inner.has_errors());
/// ```
pub trait Aggregate {
    /// Returns `true` if at least one error is held.
    fn has_errors(&self) -> bool;

    /// Returns the held errors in insertion order.
    fn errors(&self) -> Vec<Caught>;

    /// Returns the rendering used when the aggregate is stored as a single
    /// error by a collector that does not flatten.
    fn format(&self) -> Format {
        Format::Plain
    }
}

/// The result of converting a value with [`IntoCaught`].
#[derive(Clone, Debug)]
pub enum Submission {
    /// Nothing to store: `None`, `Ok`, or an empty aggregate.
    Absent,
    /// One error to store.
    Single(Caught),
    /// The errors of a nested aggregate, to be stored one by one.
    Flatten {
        /// The nested errors in insertion order.
        errors: Vec<Caught>,
        /// The nested aggregate's own rendering.
        format: Format,
    },
}

impl Submission {
    /// Returns `true` if there is nothing to store.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        match self {
            Submission::Absent => true,
            Submission::Single(_) => false,
            Submission::Flatten { errors, .. } => errors.is_empty(),
        }
    }

    /// Collapses the submission into at most one error.
    ///
    /// A flattened aggregate becomes a single [`Resolved`](crate::Resolved)
    /// error holding the aggregate's own rendering of its members, one per
    /// line. This is how collectors that never flatten (the timestamp
    /// formats) store a nested aggregate.
    #[must_use]
    pub fn into_single(self) -> Option<Caught> {
        match self {
            Submission::Absent => None,
            Submission::Single(error) => Some(error),
            Submission::Flatten { errors, .. } if errors.is_empty() => None,
            Submission::Flatten { errors, format } => {
                let text = crate::catcher::join(format, errors.iter());
                Some(Caught::new(crate::Resolved::new(text)))
            }
        }
    }
}

/// Conversion into something a collector can store.
///
/// This trait is accepted by every ingestion point of the crate. The marker
/// parameter `M` is inferred by the compiler and only keeps the blanket
/// implementations apart; see the [`markers`] module.
///
/// Implemented for:
/// - every `E: Error + Send + Sync + 'static`,
/// - `Box<dyn Error + Send + Sync>`,
/// - [`Caught`] and `&Caught`,
/// - `&A` for every `A: Aggregate` (flattening), and
///   [`Catcher`](crate::Catcher) by value,
/// - `Option<T>` and `Result<_, T>` for every convertible `T`; `None` and
///   `Ok` are absent errors.
pub trait IntoCaught<M> {
    /// Performs the conversion.
    #[must_use]
    fn into_submission(self) -> Submission;
}

impl<E> IntoCaught<markers::Leaf> for E
where
    E: Error + Send + Sync + 'static,
{
    #[inline]
    fn into_submission(self) -> Submission {
        Submission::Single(Caught::new(self))
    }
}

impl IntoCaught<markers::Erased> for Caught {
    #[inline]
    fn into_submission(self) -> Submission {
        Submission::Single(self)
    }
}

impl IntoCaught<markers::Erased> for &Caught {
    #[inline]
    fn into_submission(self) -> Submission {
        Submission::Single(self.clone())
    }
}

impl IntoCaught<markers::Erased> for Box<dyn Error + Send + Sync + 'static> {
    #[inline]
    fn into_submission(self) -> Submission {
        Submission::Single(Caught::new(BoxedError(self)))
    }
}

impl<A> IntoCaught<markers::Flatten> for &A
where
    A: Aggregate + ?Sized,
{
    fn into_submission(self) -> Submission {
        if self.has_errors() {
            Submission::Flatten {
                errors: self.errors(),
                format: self.format(),
            }
        } else {
            Submission::Absent
        }
    }
}

impl<M, T> IntoCaught<markers::Optional<M>> for Option<T>
where
    T: IntoCaught<M>,
{
    #[inline]
    fn into_submission(self) -> Submission {
        match self {
            Some(error) => error.into_submission(),
            None => Submission::Absent,
        }
    }
}

impl<M, T, E> IntoCaught<markers::Outcome<M>> for Result<T, E>
where
    E: IntoCaught<M>,
{
    #[inline]
    fn into_submission(self) -> Submission {
        match self {
            Ok(_) => Submission::Absent,
            Err(error) => error.into_submission(),
        }
    }
}

/// Adapter letting a boxed trait object be stored as a concrete error.
struct BoxedError(Box<dyn Error + Send + Sync + 'static>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Error for BoxedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}
