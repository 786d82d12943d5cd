use alloc::string::String;
use core::{error::Error, fmt};

/// The aggregate error produced by resolving a collector.
///
/// A `Resolved` is opaque text: the rendering of every error the collector
/// held at the time of resolution, one per line, in insertion order. Callers
/// that need the individual errors should read them with
/// [`Catcher::errors`](crate::Catcher::errors) before resolving.
///
/// ```
/// use errcatch::Catcher;
///
/// let catcher = Catcher::plain();
/// catcher.message("first");
/// catcher.message("second");
///
/// let resolved = catcher.resolve().unwrap();
/// assert_eq!(resolved.as_str(), "first\nsecond");
/// assert_eq!(resolved.lines().count(), 2);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Resolved {
    text: String,
}

impl Resolved {
    pub(crate) fn new(text: String) -> Self {
        Self { text }
    }

    /// Returns the aggregate text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Iterates over the lines of the aggregate text.
    ///
    /// Each stored error renders to at least one line, but an error whose
    /// own text spans several lines also spans several lines here.
    pub fn lines(&self) -> core::str::Lines<'_> {
        self.text.lines()
    }

    /// Consumes the error and returns the aggregate text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Error for Resolved {}

impl From<Resolved> for String {
    fn from(resolved: Resolved) -> Self {
        resolved.text
    }
}
