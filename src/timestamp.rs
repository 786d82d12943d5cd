//! Capture-time annotation of errors.
//!
//! A [`Timestamped`] error records the instant an error was collected. The
//! timestamp collector formats wrap every stored error this way, and the free
//! functions in this module do the same for errors handled outside of a
//! collector.
//!
//! The capture time survives further wrapping: [`find_timestamp`] walks the
//! `source()` chain, so an error that was timestamped and then wrapped by an
//! unrelated layer still reports when it was first captured.
//!
//! ```
//! use errcatch::{Message, timestamp};
//!
//! let stamped = timestamp::wrap(Message::new("connection reset")).unwrap();
//! let again = timestamp::wrap(stamped.clone()).unwrap();
//!
//! assert_eq!(stamped.time(), again.time());
//! assert_eq!(timestamp::find_timestamp(&again), Some(stamped.time()));
//! ```

use alloc::string::{String, ToString};
use core::{error::Error, fmt};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Caught, IntoCaught};

/// An error annotated with the instant it was captured.
///
/// `Display` renders `"[<RFC 3339 instant>], <inner>"`, where the inner text
/// is the wrapped error's `Display`, or its
/// [extended rendering](Caught::extended) when the extended flag is set.
/// [`Timestamped::quoted`] renders the same instant with only the inner text
/// quoted.
///
/// The wrapped error is exposed through [`Error::source`].
#[derive(Clone)]
pub struct Timestamped {
    error: Caught,
    time: DateTime<Utc>,
    extended: bool,
}

impl Timestamped {
    /// Stamps `error` with the current instant, unless it already is a
    /// `Timestamped`, in which case the existing capture time is kept.
    pub(crate) fn capture(error: Caught) -> Self {
        if let Some(stamped) = error.downcast_ref::<Timestamped>() {
            return stamped.clone();
        }
        Self {
            error,
            time: Utc::now(),
            extended: false,
        }
    }

    /// Returns the capture instant.
    #[inline]
    #[must_use]
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Returns the wrapped error.
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &Caught {
        &self.error
    }

    /// Returns `true` if the wrapped error is rendered with its `source()`
    /// chain.
    #[inline]
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    /// Selects the extended rendering of the wrapped error. The capture time
    /// is unchanged.
    #[must_use]
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Returns a display adaptor rendering `[<instant>] "<inner>"`.
    ///
    /// Only the inner text is quoted and escaped.
    ///
    /// ```
    /// use errcatch::{Message, timestamp};
    ///
    /// let stamped = timestamp::wrap(Message::new("bad \"input\"")).unwrap();
    /// let quoted = stamped.quoted().to_string();
    ///
    /// assert!(quoted.starts_with('['));
    /// assert!(quoted.ends_with(r#"] "bad \"input\"""#));
    /// ```
    #[must_use]
    pub fn quoted(&self) -> Quoted<'_> {
        Quoted(self)
    }

    fn rfc3339(&self) -> String {
        self.time.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn inner_text(&self, extended: bool) -> String {
        if extended {
            self.error.extended().to_string()
        } else {
            self.error.to_string()
        }
    }

    /// Writes the collector rendering, `[<instant>] <inner>`.
    pub(crate) fn write_annotated(
        &self,
        f: &mut fmt::Formatter<'_>,
        extended: bool,
    ) -> fmt::Result {
        write!(f, "[{}] ", self.rfc3339())?;
        if extended {
            fmt::Display::fmt(&self.error.extended(), f)
        } else {
            fmt::Display::fmt(&self.error, f)
        }
    }
}

impl fmt::Display for Timestamped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}], ", self.rfc3339())?;
        if self.extended {
            fmt::Display::fmt(&self.error.extended(), f)
        } else {
            fmt::Display::fmt(&self.error, f)
        }
    }
}

impl fmt::Debug for Timestamped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_annotated(f, true)
    }
}

impl Error for Timestamped {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.error.as_error())
    }
}

/// Display adaptor returned by [`Timestamped::quoted`].
#[derive(Clone, Copy)]
pub struct Quoted<'a>(&'a Timestamped);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.inner_text(self.0.extended);
        write!(f, "[{}] {inner:?}", self.0.rfc3339())
    }
}

impl fmt::Debug for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An error prefixed with a message: `"<message>: <error>"`.
///
/// Built by [`wrap_with_message`]. The prefixed error is exposed through
/// [`Error::source`].
#[derive(Clone)]
pub struct Annotated {
    message: String,
    error: Caught,
}

impl Annotated {
    /// Returns the prefix message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the prefixed error.
    #[must_use]
    pub fn inner(&self) -> &Caught {
        &self.error
    }
}

impl fmt::Display for Annotated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message, self.error)
    }
}

impl fmt::Debug for Annotated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.message, self.error)
    }
}

impl Error for Annotated {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.error.as_error())
    }
}

/// Stamps an error with the current instant.
///
/// Returns `None` for absent errors. An error that already is a
/// [`Timestamped`] is returned unchanged, so the first capture time wins. A
/// nested aggregate is stamped as the single error it resolves to.
pub fn wrap<M>(error: impl IntoCaught<M>) -> Option<Timestamped> {
    error
        .into_submission()
        .into_single()
        .map(Timestamped::capture)
}

/// Prefixes an error with `message` and stamps the result.
///
/// Returns `None` for absent errors. The result renders as
/// `"<message>: <error>"` behind the timestamp.
///
/// ```
/// use errcatch::{Message, timestamp};
///
/// let stamped = timestamp::wrap_with_message(Message::new("timeout"), "fetch").unwrap();
/// assert_eq!(stamped.inner().to_string(), "fetch: timeout");
///
/// assert!(timestamp::wrap_with_message(None::<Message>, "fetch").is_none());
/// ```
pub fn wrap_with_message<M>(
    error: impl IntoCaught<M>,
    message: impl Into<String>,
) -> Option<Timestamped> {
    let error = error.into_submission().into_single()?;
    let annotated = Annotated {
        message: message.into(),
        error,
    };
    Some(Timestamped::capture(Caught::new(annotated)))
}

/// Like [`wrap_with_message`], with a message built from format arguments.
///
/// Usually called through the
/// [`wrap_with_message!`](crate::wrap_with_message) macro.
pub fn wrap_with_message_fmt<M>(
    error: impl IntoCaught<M>,
    args: fmt::Arguments<'_>,
) -> Option<Timestamped> {
    let message = match args.as_str() {
        Some(literal) => String::from(literal),
        None => alloc::fmt::format(args),
    };
    wrap_with_message(error, message)
}

/// Finds the capture instant of the first [`Timestamped`] in `error` or its
/// `source()` chain.
pub fn find_timestamp(error: &(dyn Error + 'static)) -> Option<DateTime<Utc>> {
    let mut next = Some(error);
    while let Some(current) = next {
        if let Some(stamped) = current.downcast_ref::<Timestamped>() {
            return Some(stamped.time);
        }
        next = current.source();
    }
    None
}
