use alloc::{borrow::Cow, string::String};
use core::{error::Error, fmt};

/// A plain error made of nothing but a message.
///
/// This is the error type created by [`Catcher::message`] and
/// [`Catcher::errorf`], and by the [`caught!`](crate::caught) macro. Both its
/// `Display` and `Debug` forms are the bare message, so it renders the same
/// under every collector format.
///
/// [`Catcher::message`]: crate::Catcher::message
/// [`Catcher::errorf`]: crate::Catcher::errorf
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Message(Cow<'static, str>);

impl Message {
    /// Creates a new message error.
    ///
    /// ```
    /// use errcatch::Message;
    ///
    /// let error = Message::new("connection reset");
    /// assert_eq!(error.to_string(), "connection reset");
    /// assert_eq!(format!("{error:?}"), "connection reset");
    /// ```
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self(message.into())
    }

    /// Creates a message from format arguments, without allocating when the
    /// arguments are a plain literal.
    #[must_use]
    pub fn from_args(args: fmt::Arguments<'_>) -> Self {
        match args.as_str() {
            Some(message) => Self(Cow::Borrowed(message)),
            None => Self(Cow::Owned(alloc::fmt::format(args))),
        }
    }

    /// Returns the message text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for Message {}

impl From<&'static str> for Message {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Message {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
