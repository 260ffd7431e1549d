//! Unified error type.

use std::fmt;

/// The error type carried through a middleware chain.
///
/// Anything a middleware aborts with ends up here, and the same value comes
/// out of [`Application::start`](crate::Application::start) untouched. The
/// control signals `END` and `SKIP` are not errors and never appear as one;
/// see [`Halt`](crate::Halt).
#[derive(Debug)]
pub struct Error(Box<dyn std::error::Error + Send + Sync + 'static>);

impl Error {
    /// Wraps any error value.
    pub fn new<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(e.into())
    }

    /// Builds an error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(Box::new(e))
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self(message.into())
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_displayed_verbatim() {
        let err = Error::msg("something wrong");
        assert_eq!(err.to_string(), "something wrong");
    }

    #[test]
    fn wrapped_error_can_be_recovered() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::from(io);
        let inner = err.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(err.to_string(), "gone");
    }
}
