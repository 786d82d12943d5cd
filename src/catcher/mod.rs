//! The bounded, thread-safe error collector.
//!
//! A [`Catcher`] accumulates the errors of a batch of independent
//! operations and resolves them into a single aggregate error at the end.
//! It is meant for "continue on error" code: every operation runs, every
//! failure is recorded, and the caller decides afterwards what to do with
//! the aggregate.
//!
//! ```
//! use std::{sync::Arc, thread};
//!
//! use errcatch::Catcher;
//!
//! let catcher = Arc::new(Catcher::plain());
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|id| {
//!         let catcher = Arc::clone(&catcher);
//!         thread::spawn(move || {
//!             if id % 2 == 1 {
//!                 errcatch::errorf!(catcher, "worker {id} failed");
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//!
//! assert_eq!(catcher.len(), 2);
//! assert!(catcher.resolve().is_some());
//! ```

use alloc::{
    borrow::Cow,
    collections::VecDeque,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt;

use crate::{Aggregate, Caught, IntoCaught, Message, Resolved, Submission, markers};

mod format;
mod lock;

pub use self::format::Format;
use self::{format::Joined, lock::CatcherLock};

/// A zero-argument check function returning an optional error, boxed so
/// that different closures can be stored together.
///
/// ```
/// use errcatch::{Catcher, CheckFn, Message};
///
/// let checks: Vec<CheckFn<Message>> = vec![
///     Box::new(|| Ok(())),
///     Box::new(|| Err(Message::new("disk full"))),
/// ];
///
/// let catcher = Catcher::plain();
/// catcher.check_extend(checks);
/// assert_eq!(catcher.len(), 1);
/// ```
pub type CheckFn<E> = alloc::boxed::Box<dyn FnOnce() -> Result<(), E> + Send>;

/// A thread-safe, optionally bounded collector of errors.
///
/// All methods take `&self`; share a `Catcher` between threads with an
/// `Arc` or a scoped borrow. Mutating methods take an exclusive lock and
/// read-only methods a shared one. No method ever blocks on anything other
/// than that lock, and no user code (check functions, nested aggregates)
/// runs while the exclusive lock is held.
///
/// # Capacity
///
/// A catcher created with [`Catcher::bounded`] and a non-zero `max_size`
/// never holds more than `max_size` errors: once full, adding an error drops
/// the oldest one first. A `max_size` of zero means unbounded.
///
/// # Absent errors
///
/// `None`, `Ok` and empty aggregates are accepted everywhere and ignored;
/// they never count towards [`len`](Catcher::len).
///
/// # Flattening
///
/// Adding a reference to anything implementing [`Aggregate`] (including
/// another `Catcher`) merges its errors one by one. The timestamp formats
/// are the exception: they store the nested aggregate as one error.
///
/// # Examples
///
/// ```
/// use errcatch::{Catcher, Format};
///
/// let catcher = Catcher::bounded(Format::Plain, 2);
/// catcher.message("one");
/// catcher.message("two");
/// catcher.message("three");
///
/// assert_eq!(catcher.len(), 2);
/// assert_eq!(catcher.resolve().unwrap().as_str(), "two\nthree");
/// ```
pub struct Catcher {
    errors: CatcherLock<VecDeque<Caught>>,
    max_size: usize,
    format: Format,
}

impl Catcher {
    /// Creates an unbounded catcher with the given format.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self::bounded(format, 0)
    }

    /// Creates a catcher that never holds more than `max_size` errors.
    ///
    /// A `max_size` of zero means unbounded.
    #[must_use]
    pub const fn bounded(format: Format, max_size: usize) -> Self {
        Self {
            errors: CatcherLock::new(VecDeque::new()),
            max_size,
            format,
        }
    }

    /// Creates an unbounded catcher rendering errors with
    /// [`Format::Plain`].
    #[must_use]
    pub const fn plain() -> Self {
        Self::new(Format::Plain)
    }

    /// Creates an unbounded catcher rendering errors with
    /// [`Format::Simple`].
    #[must_use]
    pub const fn simple() -> Self {
        Self::new(Format::Simple)
    }

    /// Creates an unbounded catcher rendering errors with
    /// [`Format::Extended`].
    #[must_use]
    pub const fn extended() -> Self {
        Self::new(Format::Extended)
    }

    /// Creates an unbounded catcher that annotates every error with the
    /// instant it was collected.
    #[cfg(feature = "std")]
    #[must_use]
    pub const fn timestamp() -> Self {
        Self::new(Format::Timestamp)
    }

    /// Creates an unbounded catcher that annotates every error with the
    /// instant it was collected and renders it with its `source()` chain.
    #[cfg(feature = "std")]
    #[must_use]
    pub const fn extended_timestamp() -> Self {
        Self::new(Format::ExtendedTimestamp)
    }

    /// Returns the rendering format chosen at construction.
    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns the capacity bound, or zero when unbounded.
    #[inline]
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Adds an error.
    ///
    /// Absent errors are ignored and aggregates are flattened; see the type
    /// level documentation.
    ///
    /// ```
    /// use errcatch::{Catcher, Message};
    ///
    /// let catcher = Catcher::plain();
    /// catcher.add(Message::new("failed"));
    /// catcher.add(None::<Message>);
    /// assert_eq!(catcher.len(), 1);
    /// ```
    pub fn add<M>(&self, error: impl IntoCaught<M>) {
        self.submit(error.into_submission());
    }

    /// Adds an error only when `condition` holds.
    pub fn add_when<M>(&self, condition: bool, error: impl IntoCaught<M>) {
        if condition {
            self.add(error);
        }
    }

    /// Adds every error of a sequence, in order.
    ///
    /// Each element is treated exactly as [`add`](Catcher::add) would treat
    /// it. The whole sequence is inserted under a single lock acquisition,
    /// so concurrent readers observe either none or all of it.
    ///
    /// ```
    /// use errcatch::{Catcher, Message};
    ///
    /// let catcher = Catcher::plain();
    /// catcher.extend([None, Some(Message::new("what")), None]);
    /// assert_eq!(catcher.len(), 1);
    /// ```
    pub fn extend<M, I>(&self, errors: I)
    where
        I: IntoIterator,
        I::Item: IntoCaught<M>,
    {
        let submissions: Vec<Submission> = errors
            .into_iter()
            .map(IntoCaught::into_submission)
            .filter(|submission| !submission.is_absent())
            .collect();
        if submissions.is_empty() {
            return;
        }

        let mut stored = self.errors.write();
        for submission in submissions {
            self.admit(&mut stored, submission);
        }
    }

    /// Adds every error of a sequence only when `condition` holds.
    ///
    /// The sequence is not iterated at all when `condition` is false.
    pub fn extend_when<M, I>(&self, condition: bool, errors: I)
    where
        I: IntoIterator,
        I::Item: IntoCaught<M>,
    {
        if condition {
            self.extend(errors);
        }
    }

    /// Adds a [`Message`] error. Empty messages are ignored.
    pub fn message(&self, message: impl Into<Cow<'static, str>>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }
        self.add(Message::new(message));
    }

    /// Adds a [`Message`] error only when `condition` holds.
    pub fn message_when(&self, condition: bool, message: impl Into<Cow<'static, str>>) {
        if condition {
            self.message(message);
        }
    }

    /// Adds a [`Message`] error built from format arguments.
    ///
    /// Arguments without any interpolated values are taken literally and go
    /// through [`message`](Catcher::message), so an empty literal is
    /// ignored. Usually called through the [`errorf!`](crate::errorf) macro.
    ///
    /// ```
    /// use errcatch::Catcher;
    ///
    /// let catcher = Catcher::plain();
    /// catcher.errorf(format_args!(""));
    /// assert!(catcher.is_empty());
    ///
    /// let attempt = 3;
    /// catcher.errorf(format_args!("attempt {attempt} failed"));
    /// assert_eq!(catcher.to_string(), "attempt 3 failed");
    /// ```
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(message) => self.message(message),
            None => self.add(Message::from_args(args)),
        }
    }

    /// Adds a formatted [`Message`] error only when `condition` holds.
    ///
    /// Usually called through the [`errorf_when!`](crate::errorf_when) macro.
    pub fn errorf_when(&self, condition: bool, args: fmt::Arguments<'_>) {
        if condition {
            self.errorf(args);
        }
    }

    /// Runs a check function and adds its error, if any.
    ///
    /// Returns the function's success value.
    ///
    /// ```
    /// use errcatch::{Catcher, Message};
    ///
    /// let catcher = Catcher::plain();
    /// let parsed = catcher.check(|| "42".parse::<u32>());
    /// let failed = catcher.check(|| Err::<u32, _>(Message::new("no input")));
    ///
    /// assert_eq!(parsed, Some(42));
    /// assert_eq!(failed, None);
    /// assert_eq!(catcher.len(), 1);
    /// ```
    pub fn check<M, T, E, F>(&self, check: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: IntoCaught<M>,
    {
        match check() {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(error);
                None
            }
        }
    }

    /// Runs a check function only when `condition` holds.
    ///
    /// When `condition` is false the function is not called at all, so none
    /// of its side effects happen.
    pub fn check_when<M, T, E, F>(&self, condition: bool, check: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: IntoCaught<M>,
    {
        if condition { self.check(check) } else { None }
    }

    /// Runs every check function in order and adds each error.
    pub fn check_extend<M, T, E, F, I>(&self, checks: I)
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Result<T, E>,
        E: IntoCaught<M>,
    {
        for check in checks {
            self.check(check);
        }
    }

    /// Returns the number of stored errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.read().len()
    }

    /// Returns `true` if no error is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.read().is_empty()
    }

    /// Returns `true` if at least one error is stored.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.is_empty()
    }

    /// Returns a copy of the stored errors in insertion order.
    ///
    /// The returned vector is independent of the catcher; the errors inside
    /// are shared handles.
    #[must_use]
    pub fn errors(&self) -> Vec<Caught> {
        self.errors.read().iter().cloned().collect()
    }

    /// Resolves the stored errors into one aggregate error.
    ///
    /// Returns `None` when no error is stored. Resolving never changes the
    /// catcher, and resolving twice without an intervening change produces
    /// equal text.
    #[must_use]
    pub fn resolve(&self) -> Option<Resolved> {
        let errors = self.errors.read();
        if errors.is_empty() {
            return None;
        }
        Some(Resolved::new(join(self.format, errors.iter())))
    }

    /// Adds `error` prefixed with `message` and annotated with the current
    /// instant.
    ///
    /// See [`wrap_with_message`](crate::timestamp::wrap_with_message).
    #[cfg(feature = "std")]
    pub fn wrap<M>(&self, error: impl IntoCaught<M>, message: impl Into<String>) {
        self.add(crate::timestamp::wrap_with_message(error, message));
    }

    /// Like [`wrap`](Catcher::wrap), with a message built from format
    /// arguments.
    #[cfg(feature = "std")]
    pub fn wrapf<M>(&self, error: impl IntoCaught<M>, args: fmt::Arguments<'_>) {
        self.add(crate::timestamp::wrap_with_message_fmt(error, args));
    }

    /// Stores an already converted submission.
    pub(crate) fn submit(&self, submission: Submission) {
        if submission.is_absent() {
            return;
        }
        let mut errors = self.errors.write();
        self.admit(&mut errors, submission);
    }

    fn admit(&self, errors: &mut VecDeque<Caught>, submission: Submission) {
        match submission {
            Submission::Absent => {}
            Submission::Single(error) => self.push(errors, error),
            Submission::Flatten { errors: nested, .. } if self.format.flattens() => {
                for error in nested {
                    self.push(errors, error);
                }
            }
            nested @ Submission::Flatten { .. } => {
                if let Some(error) = nested.into_single() {
                    self.push(errors, error);
                }
            }
        }
    }

    fn push(&self, errors: &mut VecDeque<Caught>, error: Caught) {
        let error = self.annotate(error);
        if self.max_size > 0 && errors.len() >= self.max_size {
            errors.pop_front();
            tracing::trace!(max_size = self.max_size, "evicted oldest collected error");
        }
        errors.push_back(error);
    }

    #[cfg(feature = "std")]
    fn annotate(&self, error: Caught) -> Caught {
        use crate::timestamp::Timestamped;

        if !self.format.is_timestamped() || error.is::<Timestamped>() {
            return error;
        }
        Caught::new(Timestamped::capture(error).with_extended(self.format.is_extended()))
    }

    #[cfg(not(feature = "std"))]
    #[inline]
    fn annotate(&self, error: Caught) -> Caught {
        error
    }
}

/// Renders errors with `format`, one per line.
pub(crate) fn join<'a>(format: Format, errors: impl Iterator<Item = &'a Caught> + Clone) -> String {
    Joined { format, errors }.to_string()
}

impl Default for Catcher {
    fn default() -> Self {
        Self::new(Format::default())
    }
}

impl Aggregate for Catcher {
    fn has_errors(&self) -> bool {
        Catcher::has_errors(self)
    }

    fn errors(&self) -> Vec<Caught> {
        Catcher::errors(self)
    }

    fn format(&self) -> Format {
        self.format
    }
}

impl IntoCaught<markers::Flatten> for Catcher {
    fn into_submission(self) -> Submission {
        let format = self.format;
        let errors: Vec<Caught> = self.errors.into_inner().into();
        if errors.is_empty() {
            Submission::Absent
        } else {
            Submission::Flatten { errors, format }
        }
    }
}

/// Renders the same text as [`Catcher::resolve`], or nothing when empty.
impl fmt::Display for Catcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors.read();
        let joined = Joined {
            format: self.format,
            errors: errors.iter(),
        };
        fmt::Display::fmt(&joined, f)
    }
}

impl fmt::Debug for Catcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors.read();
        f.debug_struct("Catcher")
            .field("format", &self.format)
            .field("max_size", &self.max_size)
            .field("errors", &*errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, format, vec};
    use core::cell::Cell;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("request failed ({code})")]
    struct Detailed {
        code: u16,
        #[source]
        cause: Message,
    }

    fn detailed() -> Detailed {
        Detailed {
            code: 503,
            cause: Message::new("upstream closed"),
        }
    }

    #[test]
    fn test_catcher_send_sync() {
        static_assertions::assert_impl_all!(Catcher: Send, Sync, Default);
        static_assertions::assert_not_impl_any!(Catcher: Clone, core::error::Error);
    }

    #[test]
    fn test_initial_state() {
        let catcher = Catcher::default();
        assert!(!catcher.has_errors());
        assert!(catcher.is_empty());
        assert_eq!(catcher.len(), 0);
        assert_eq!(catcher.to_string(), "");
        assert!(catcher.resolve().is_none());
    }

    #[test]
    fn test_absent_errors_are_ignored() {
        let catcher = Catcher::plain();
        for _ in 0..100 {
            catcher.add(None::<Message>);
            catcher.add(Ok::<(), Message>(()));
        }
        catcher.add_when(true, None::<Message>);
        assert!(catcher.is_empty());
    }

    #[test]
    fn test_eviction_keeps_newest_in_order() {
        let catcher = Catcher::bounded(Format::Plain, 3);
        for i in 0..6 {
            catcher.errorf(format_args!("{i}"));
        }
        let rendered: Vec<String> = catcher.errors().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["3", "4", "5"]);
    }

    #[test]
    fn test_flatten_adds_each_error() {
        let inner = Catcher::plain();
        inner.message("a");
        inner.message("b");

        let outer = Catcher::extended();
        outer.message("c");
        outer.add(&inner);
        assert_eq!(outer.len(), 3);
        assert_eq!(inner.len(), 2);

        outer.add(Catcher::plain());
        assert_eq!(outer.len(), 3);
    }

    #[test]
    fn test_flatten_self_does_not_deadlock() {
        let catcher = Catcher::plain();
        catcher.message("a");
        catcher.add(&catcher);
        catcher.extend([&catcher]);
        assert_eq!(catcher.len(), 4);
    }

    #[test]
    fn test_extend_keeps_shared_errors() {
        let catcher = Catcher::plain();
        catcher.message("x");
        let errors = catcher.errors();
        catcher.extend(&errors);
        assert_eq!(catcher.len(), 2);
        let stored = catcher.errors();
        assert!(stored[0].ptr_eq(&stored[1]));
    }

    #[test]
    fn test_extend_when_false_does_not_iterate() {
        let catcher = Catcher::plain();
        let iterated = Cell::new(false);
        catcher.extend_when(
            false,
            core::iter::from_fn(|| {
                iterated.set(true);
                None::<Message>
            }),
        );
        assert!(!iterated.get());
    }

    #[test]
    fn test_errors_returns_independent_copy() {
        let catcher = Catcher::plain();
        catcher.message("kept");
        let mut copy = catcher.errors();
        copy.clear();
        assert_eq!(catcher.len(), 1);
    }

    #[test]
    fn test_errorf_literal_is_not_interpreted() {
        let catcher = Catcher::plain();
        catcher.errorf(format_args!("%s what"));
        crate::errorf!(catcher, "");
        assert_eq!(catcher.len(), 1);
        assert!(catcher.to_string().contains("%s what"));
    }

    #[test]
    fn test_message_when() {
        let catcher = Catcher::plain();
        catcher.message_when(false, "one");
        catcher.message_when(true, "");
        assert!(catcher.is_empty());
        catcher.message_when(true, "one");
        assert_eq!(catcher.len(), 1);
    }

    #[test]
    fn test_check_when_false_never_calls() {
        let catcher = Catcher::plain();
        let calls = Cell::new(0);
        let result = catcher.check_when(false, || {
            calls.set(calls.get() + 1);
            Err::<(), _>(Message::new("nope"))
        });
        assert_eq!(result, None);
        assert_eq!(calls.get(), 0);
        assert!(catcher.is_empty());

        catcher.check_when(true, || {
            calls.set(calls.get() + 1);
            Err::<(), _>(Message::new("yes"))
        });
        assert_eq!(calls.get(), 1);
        assert_eq!(catcher.len(), 1);
    }

    #[test]
    fn test_check_extend_runs_every_function() {
        let catcher = Catcher::plain();
        let checks: Vec<CheckFn<Message>> = vec![
            Box::new(|| Err(Message::new("a"))),
            Box::new(|| Ok(())),
            Box::new(|| Err(Message::new("b"))),
        ];
        catcher.check_extend(checks);
        assert_eq!(catcher.to_string(), "a\nb");
    }

    #[test]
    fn test_resolve_is_pure() {
        let catcher = Catcher::simple();
        catcher.message("foo");
        let first = catcher.resolve().unwrap();
        let second = catcher.resolve().unwrap();
        assert_eq!(first, second);
        assert_eq!(catcher.len(), 1);
        assert!(first.as_str().contains("foo"));
    }

    #[test]
    fn test_extended_appends_sources() {
        let plain = Catcher::plain();
        let extended = Catcher::extended();
        plain.add(detailed());
        extended.add(detailed());
        assert_eq!(plain.to_string(), "request failed (503)");
        assert_eq!(extended.to_string(), "request failed (503): upstream closed");
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_timestamp_catcher_stores_nested_rendering() {
        let nested = Catcher::extended();
        nested.add(detailed());

        let catcher = Catcher::timestamp();
        catcher.add(&nested);
        assert_eq!(catcher.len(), 1);
        assert!(
            catcher
                .to_string()
                .ends_with("] request failed (503): upstream closed")
        );
    }

    #[test]
    fn test_default_catcher_keeps_error_text() {
        #[derive(Debug, thiserror::Error)]
        #[error("foo")]
        struct Foo;

        let catcher = Catcher::default();
        catcher.add(Foo);
        assert_eq!(catcher.resolve().unwrap().as_str(), "foo");
    }

    #[test]
    fn test_debug_lists_errors() {
        let catcher = Catcher::bounded(Format::Plain, 4);
        catcher.message("x");
        let debug = format!("{catcher:?}");
        assert!(debug.contains("max_size: 4"));
        assert!(debug.contains("Plain"));
    }
}
