use core::fmt;

use crate::Caught;

/// How a collector renders each stored error when it is resolved.
///
/// Every format renders one line per stored error and joins the lines with
/// `'\n'`. The formats differ only in how a single error becomes text:
///
/// | Format              | Rendering of one error                 |
/// |---------------------|----------------------------------------|
/// | `Plain`             | `Display`                              |
/// | `Simple`            | `Display`                              |
/// | `Extended`          | `Display`, then the `source()` chain   |
/// | `Timestamp`         | `[<RFC 3339 instant>] <Display>`       |
/// | `ExtendedTimestamp` | `[<RFC 3339 instant>] <extended>`      |
///
/// The extended rendering is described on [`Caught::extended`]. It always
/// starts with the error's `Display` text.
///
/// `Plain` and `Simple` produce the same text; both exist so callers can
/// keep the name that matches their intent.
///
/// The timestamp formats also change what is stored: every error is wrapped
/// in a [`Timestamped`](crate::timestamp::Timestamped) when it is added, and
/// nested aggregates are not flattened.
///
/// The default format is `Extended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// The error's own `Display` text.
    Plain,
    /// The error's `Display` text, kept apart from `Plain` for callers that
    /// name the rendering by intent.
    Simple,
    /// The error's `Display` text followed by its `source()` chain.
    #[default]
    Extended,
    /// `Display` text prefixed with the instant the error was collected.
    #[cfg(feature = "std")]
    Timestamp,
    /// Extended text prefixed with the instant the error was collected.
    #[cfg(feature = "std")]
    ExtendedTimestamp,
}

impl Format {
    /// Returns `true` for formats that annotate errors with their capture
    /// time.
    #[must_use]
    pub const fn is_timestamped(self) -> bool {
        match self {
            Format::Plain | Format::Simple | Format::Extended => false,
            #[cfg(feature = "std")]
            Format::Timestamp | Format::ExtendedTimestamp => true,
        }
    }

    /// Returns `true` for formats that render the `source()` chain.
    #[must_use]
    pub const fn is_extended(self) -> bool {
        match self {
            Format::Plain | Format::Simple => false,
            Format::Extended => true,
            #[cfg(feature = "std")]
            Format::Timestamp => false,
            #[cfg(feature = "std")]
            Format::ExtendedTimestamp => true,
        }
    }

    /// Returns `true` if nested aggregates are merged error by error.
    #[must_use]
    pub const fn flattens(self) -> bool {
        !self.is_timestamped()
    }

    /// Writes the rendering of one stored error.
    pub(crate) fn write_entry(self, error: &Caught, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "std")]
        if self.is_timestamped()
            && let Some(stamped) = error.downcast_ref::<crate::timestamp::Timestamped>()
        {
            return stamped.write_annotated(f, self.is_extended());
        }

        if self.is_extended() {
            fmt::Display::fmt(&error.extended(), f)
        } else {
            fmt::Display::fmt(error, f)
        }
    }
}

/// Newline-joined rendering of a sequence of errors.
pub(crate) struct Joined<I> {
    pub(crate) format: Format,
    pub(crate) errors: I,
}

impl<'a, I> fmt::Display for Joined<I>
where
    I: Iterator<Item = &'a Caught> + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.clone().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            self.format.write_entry(error, f)?;
        }
        Ok(())
    }
}
