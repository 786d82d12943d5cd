use alloc::string::ToString;
use core::{error::Error, fmt, ops::Deref};

use triomphe::Arc;
use unsize::CoerceUnsize;

/// Object-safe view of any error that can be stored in a [`Caught`].
trait ErasedError: Send + Sync + 'static {
    fn as_error(&self) -> &(dyn Error + Send + Sync + 'static);
}

impl<E> ErasedError for E
where
    E: Error + Send + Sync + 'static,
{
    #[inline]
    fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self
    }
}

/// A shared, type-erased error stored by a collector.
///
/// Every error that enters a [`Catcher`](crate::Catcher) is erased into a
/// `Caught`. Cloning a `Caught` only bumps a reference count, which is what
/// makes [`Catcher::errors`](crate::Catcher::errors) cheap: the returned
/// vector is a fresh copy of the sequence, but the errors themselves are
/// shared.
///
/// `Caught` dereferences to `dyn Error + Send + Sync`, so the usual error
/// API (`source`, `downcast_ref`, `to_string`) is available on it directly.
/// It deliberately does not implement [`Error`] itself; wrap it with
/// [`Caught::as_error`] when an `&dyn Error` is needed.
///
/// The [`Display`](fmt::Display) implementation forwards to the wrapped
/// error's `Display`, and the [`Debug`](fmt::Debug) implementation forwards
/// to its `Debug`. [`Caught::extended`] adds the `source()` chain, which is
/// what collectors use for their extended rendering.
///
/// # Examples
///
/// ```
/// use errcatch::{Caught, Message};
///
/// let caught = Caught::new(Message::new("disk full"));
/// let shared = caught.clone();
///
/// assert!(caught.ptr_eq(&shared));
/// assert!(caught.is::<Message>());
/// assert_eq!(caught.to_string(), "disk full");
/// ```
#[derive(Clone)]
pub struct Caught {
    inner: Arc<dyn ErasedError>,
}

impl Caught {
    /// Erases an error into a shared handle.
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        let inner: Arc<E> = Arc::new(error);
        let inner = inner.unsize(unsize::Coercion!(to dyn ErasedError));
        Self { inner }
    }

    /// Returns the wrapped error as a trait object.
    #[inline]
    #[must_use]
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.inner.as_error()
    }

    /// Returns `true` if the wrapped error is of type `E`.
    #[inline]
    #[must_use]
    pub fn is<E>(&self) -> bool
    where
        E: Error + 'static,
    {
        self.as_error().is::<E>()
    }

    /// Returns a reference to the wrapped error if it is of type `E`.
    ///
    /// Only the outermost error is inspected; use [`Caught::chain`] to look
    /// through `source()` links.
    #[inline]
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        self.as_error().downcast_ref::<E>()
    }

    /// Returns `true` if both handles point to the same stored error.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Iterates over the wrapped error followed by its `source()` chain.
    ///
    /// ```
    /// use errcatch::Caught;
    ///
    /// #[derive(Debug)]
    /// struct Outer(std::fmt::Error);
    ///
    /// impl std::fmt::Display for Outer {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         f.write_str("outer")
    ///     }
    /// }
    ///
    /// impl std::error::Error for Outer {
    ///     fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    ///         Some(&self.0)
    ///     }
    /// }
    ///
    /// let caught = Caught::new(Outer(std::fmt::Error));
    /// assert_eq!(caught.chain().count(), 2);
    /// ```
    #[must_use]
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self.as_error()),
        }
    }

    /// Returns a display adaptor for the extended rendering.
    ///
    /// The extended rendering is the error's own text followed by the text of
    /// each `source()` in its chain, separated by `": "`. A source whose text
    /// already ends the rendering so far is skipped, so wrappers that embed
    /// their source in their own message are not repeated. An error without a
    /// source renders exactly like its `Display` form.
    ///
    /// ```
    /// use errcatch::{Caught, Message};
    ///
    /// #[derive(Debug, thiserror::Error)]
    /// #[error("loading profile failed")]
    /// struct LoadFailed(#[source] Message);
    ///
    /// let caught = Caught::new(LoadFailed(Message::new("permission denied")));
    /// assert_eq!(caught.to_string(), "loading profile failed");
    /// assert_eq!(
    ///     caught.extended().to_string(),
    ///     "loading profile failed: permission denied"
    /// );
    /// ```
    #[must_use]
    pub fn extended(&self) -> Extended<'_> {
        Extended(self.as_error())
    }

    /// Returns the capture instant of the first timestamp wrapper found in
    /// this error's chain.
    ///
    /// See [`find_timestamp`](crate::timestamp::find_timestamp).
    #[cfg(feature = "std")]
    #[must_use]
    pub fn timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        crate::timestamp::find_timestamp(self.as_error())
    }
}

impl Deref for Caught {
    type Target = dyn Error + Send + Sync + 'static;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_error()
    }
}

impl fmt::Display for Caught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_error(), f)
    }
}

impl fmt::Debug for Caught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_error(), f)
    }
}

/// Display adaptor for the extended rendering, returned by
/// [`Caught::extended`].
#[derive(Clone, Copy)]
pub struct Extended<'a>(&'a (dyn Error + 'static));

impl fmt::Display for Extended<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.0.to_string();
        let mut next = self.0.source();
        while let Some(source) = next {
            let detail = source.to_string();
            if !text.ends_with(detail.as_str()) {
                text.push_str(": ");
                text.push_str(&detail);
            }
            next = source.source();
        }
        f.write_str(&text)
    }
}

impl fmt::Debug for Extended<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Iterator over an error and its `source()` chain, returned by
/// [`Caught::chain`].
#[derive(Clone, Copy)]
pub struct Chain<'a> {
    next: Option<&'a (dyn Error + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

impl fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(*self).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString};

    use super::*;
    use crate::Message;

    #[derive(Debug)]
    struct Wrapper(Message);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("wrapper")
        }
    }

    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_caught_send_sync_clone() {
        static_assertions::assert_impl_all!(Caught: Send, Sync, Clone);
        static_assertions::assert_not_impl_any!(Caught: Copy, Error);
    }

    #[test]
    fn test_caught_display_and_debug_forward() {
        let caught = Caught::new(Message::new("boom"));
        assert_eq!(caught.to_string(), "boom");
        assert_eq!(format!("{caught:?}"), "boom");
    }

    #[test]
    fn test_caught_downcast() {
        let caught = Caught::new(Wrapper(Message::new("inner")));
        assert!(caught.is::<Wrapper>());
        assert!(!caught.is::<Message>());
        assert!(caught.downcast_ref::<Wrapper>().is_some());
        assert!(caught.downcast_ref::<Message>().is_none());
    }

    #[test]
    fn test_caught_clones_share_storage() {
        let caught = Caught::new(Message::new("shared"));
        let other = Caught::new(Message::new("shared"));
        assert!(caught.ptr_eq(&caught.clone()));
        assert!(!caught.ptr_eq(&other));
    }

    #[test]
    fn test_extended_keeps_own_text_and_adds_sources() {
        let leaf = Caught::new(Message::new("boom"));
        assert_eq!(leaf.extended().to_string(), "boom");

        let wrapped = Caught::new(Wrapper(Message::new("inner")));
        assert_eq!(wrapped.extended().to_string(), "wrapper: inner");
    }

    #[test]
    fn test_extended_skips_embedded_source_text() {
        #[derive(Debug)]
        struct Prefixed(Message);

        impl fmt::Display for Prefixed {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "load: {}", self.0)
            }
        }

        impl Error for Prefixed {
            fn source(&self) -> Option<&(dyn Error + 'static)> {
                Some(&self.0)
            }
        }

        let caught = Caught::new(Prefixed(Message::new("denied")));
        assert_eq!(caught.extended().to_string(), "load: denied");
    }

    #[test]
    fn test_caught_chain_walks_sources() {
        let caught = Caught::new(Wrapper(Message::new("inner")));
        let rendered: alloc::vec::Vec<_> = caught.chain().map(|e| e.to_string()).collect();
        assert_eq!(rendered, ["wrapper", "inner"]);
    }
}
