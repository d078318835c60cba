use core::fmt::{Debug, Formatter};

/// Helper struct for managing a stack of type names.
///
/// Tracks where in the graph the walker is, so a failure can be reported
/// with the path of types that led to it. Only kept when the `debug`
/// feature is on in a debug build, otherwise every method is a no-op.
#[derive(Default, Clone)]
pub(super) struct TypeStack {
    #[cfg(all(debug_assertions, feature = "debug"))]
    stack: Vec<String>,
}

impl TypeStack {
    /// Create a new empty [`TypeStack`].
    pub const fn new() -> Self {
        Self {
            #[cfg(all(debug_assertions, feature = "debug"))]
            stack: Vec::new(),
        }
    }

    /// Push a type name onto the stack.
    #[inline]
    pub fn push(&mut self, name: &str) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.push(name.to_owned());
        #[cfg(not(all(debug_assertions, feature = "debug")))]
        let _ = name;
    }

    /// Pop the last type name off the stack.
    #[inline]
    pub fn pop(&mut self) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.pop();
    }

    /// Clear the stack.
    #[inline]
    pub fn clear(&mut self) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.clear();
    }

    /// Logs `message` at debug level, with the stack when it is kept.
    pub fn report(&self, message: impl core::fmt::Display) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        if !self.stack.is_empty() {
            log::debug!("{message} (stack:\n{self:?})");
            return;
        }
        log::debug!("{message}");
    }
}

impl Debug for TypeStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        #[cfg(all(debug_assertions, feature = "debug"))]
        {
            let mut iter = self.stack.iter();

            if let Some(first) = iter.next() {
                writeln!(f, "`{first}`")?;
            }

            for name in iter {
                writeln!(f, " -> `{name}`")?;
            }
        }
        #[cfg(not(all(debug_assertions, feature = "debug")))]
        let _ = f;

        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
