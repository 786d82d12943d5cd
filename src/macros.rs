/// Adds a formatted message to a collector.
///
/// The first argument is the collector (anything that dereferences to a
/// [`Catcher`](crate::Catcher)); the rest is interpreted the same way as by
/// the [`format!()`] macro. A format string without arguments is taken
/// literally, and an empty one adds nothing.
///
/// This is equivalent to writing `catcher.errorf(format_args!(...))`.
///
/// [`format!()`]: std::format
///
/// # Examples
///
/// ```
/// use errcatch::{Catcher, errorf};
///
/// let catcher = Catcher::plain();
/// let path = "/etc/app.toml";
///
/// errorf!(catcher, "cannot read {path}");
/// errorf!(catcher, "");
///
/// assert_eq!(catcher.len(), 1);
/// assert_eq!(catcher.to_string(), "cannot read /etc/app.toml");
/// ```
#[macro_export]
macro_rules! errorf {
    ($catcher:expr, $($arg:tt)+) => {
        $catcher.errorf($crate::__private::format_args!($($arg)+))
    };
}

/// Adds a formatted message to a collector when a condition holds.
///
/// The format arguments are not evaluated when the condition is false.
///
/// # Examples
///
/// ```
/// use errcatch::{Catcher, errorf_when};
///
/// let catcher = Catcher::plain();
/// for status in [200, 503, 200] {
///     errorf_when!(catcher, status >= 500, "upstream returned {status}");
/// }
///
/// assert_eq!(catcher.to_string(), "upstream returned 503");
/// ```
#[macro_export]
macro_rules! errorf_when {
    ($catcher:expr, $condition:expr, $($arg:tt)+) => {
        if $condition {
            $crate::errorf!($catcher, $($arg)+)
        }
    };
}

/// Creates a [`Caught`](crate::Caught) holding a formatted
/// [`Message`](crate::Message).
///
/// Useful for pushing messages through an error channel's inbound sender.
///
/// # Examples
///
/// ```
/// use errcatch::caught;
///
/// let shard = 3;
/// let error = caught!("shard {shard} unreachable");
/// assert_eq!(error.to_string(), "shard 3 unreachable");
/// ```
#[macro_export]
macro_rules! caught {
    ($($arg:tt)+) => {
        $crate::__private::format_caught($crate::__private::format_args!($($arg)+))
    };
}

/// Prefixes an error with a formatted message and stamps the result with the
/// current instant.
///
/// Expands to a call to
/// [`timestamp::wrap_with_message_fmt`](crate::timestamp::wrap_with_message_fmt)
/// and returns `Option<Timestamped>`.
///
/// # Examples
///
/// ```
/// use errcatch::{Message, wrap_with_message};
///
/// let id = 42;
/// let stamped = wrap_with_message!(Message::new("not found"), "order {id}").unwrap();
/// assert_eq!(stamped.inner().to_string(), "order 42: not found");
/// ```
#[cfg(feature = "std")]
#[macro_export]
macro_rules! wrap_with_message {
    ($error:expr, $($arg:tt)+) => {
        $crate::timestamp::wrap_with_message_fmt(
            $error,
            $crate::__private::format_args!($($arg)+),
        )
    };
}
