//! Deferred change notification
//!
//! Observed fields store their value immediately but defer notification
//! to the end of the current processing step: the driver flushes every
//! dirty field once per step, so multiple writes within one decode
//! coalesce into a single notification carrying only the final value.

/// A value with change tracking
///
/// `set` compares-and-stores; the dirty flag stays up until the driver's
/// end-of-step flush drains it with [`Observed::take_dirty`].
#[derive(Debug, Clone)]
pub struct Observed<T> {
    value: T,
    dirty: bool,
}

impl<T: Copy + PartialEq> Observed<T> {
    /// Wrap an initial value (not considered a change)
    pub const fn new(value: T) -> Self {
        Self {
            value,
            dirty: false,
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.value
    }

    /// Store a new value; marks dirty only on an effective change.
    ///
    /// Returns whether the value changed.
    pub fn set(&mut self, value: T) -> bool {
        if value != self.value {
            self.value = value;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Drain the pending notification, if any.
    ///
    /// Yields the final value once per batch of changes; a second call
    /// without an intervening `set` yields `None`.
    pub fn take_dirty(&mut self) -> Option<T> {
        if self.dirty {
            self.dirty = false;
            Some(self.value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut field = Observed::new(0u16);
        assert_eq!(field.get(), 0);
        assert!(field.set(5));
        assert_eq!(field.get(), 5);
    }

    #[test]
    fn test_no_notification_without_change() {
        let mut field = Observed::new(7u16);
        assert!(!field.set(7));
        assert_eq!(field.take_dirty(), None);
    }

    #[test]
    fn test_coalescing() {
        let mut field = Observed::new(0u16);
        field.set(1);
        field.set(2);
        field.set(3);
        // one notification, final value only
        assert_eq!(field.take_dirty(), Some(3));
        assert_eq!(field.take_dirty(), None);
    }

    #[test]
    fn test_no_double_notify() {
        let mut field = Observed::new(0u16);
        field.set(1);
        assert_eq!(field.take_dirty(), Some(1));
        assert_eq!(field.take_dirty(), None);
        field.set(2);
        assert_eq!(field.take_dirty(), Some(2));
    }
}
