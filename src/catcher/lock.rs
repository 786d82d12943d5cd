#[cfg(feature = "std")]
use std::sync as impl_;

#[cfg(not(feature = "std"))]
use spin as impl_;

/// Reader/writer lock guarding a collector's sequence.
///
/// Backed by `std::sync::RwLock` when `std` is enabled and by
/// `spin::RwLock` otherwise. Poisoning is ignored: every write leaves the
/// sequence consistent (one `pop_front` and one `push_back` at most), so the
/// data behind a poisoned lock is still valid.
#[repr(transparent)]
pub(crate) struct CatcherLock<T>(impl_::RwLock<T>);

pub(crate) type CatcherReadGuard<'a, T> = impl_::RwLockReadGuard<'a, T>;

pub(crate) type CatcherWriteGuard<'a, T> = impl_::RwLockWriteGuard<'a, T>;

impl<T> CatcherLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(impl_::RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> CatcherReadGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.read();

        #[cfg(feature = "std")]
        let guard = self.0.read().unwrap_or_else(std::sync::PoisonError::into_inner);

        guard
    }

    #[inline]
    pub(crate) fn write(&self) -> CatcherWriteGuard<'_, T> {
        #[cfg(not(feature = "std"))]
        let guard = self.0.write();

        #[cfg(feature = "std")]
        let guard = self
            .0
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        guard
    }

    pub(crate) fn into_inner(self) -> T {
        #[cfg(not(feature = "std"))]
        let value = self.0.into_inner();

        #[cfg(feature = "std")]
        let value = self
            .0
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        value
    }
}
