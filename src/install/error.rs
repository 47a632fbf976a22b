use std::fmt::Display;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The one error the installer reports. Whatever went wrong underneath (network, archive, file
/// system) is kept as the source, and the message says what we were doing at the time.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct InstallError {
    message: String,

    #[source]
    source: Option<BoxedError>,
}

impl InstallError {
    /// Creates an error with no underlying cause.
    pub fn new(message: impl Into<String>) -> InstallError {
        InstallError {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps `err`, describing what we were doing with `context`.
    pub fn wrap(context: impl Display, err: impl Into<BoxedError>) -> InstallError {
        let err = err.into();

        InstallError {
            message: format!("{context}: {err}"),
            source: Some(err),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;

/// Adds context to errors from other crates, turning them into `InstallError`s.
pub trait Context<T> {
    fn context(self, context: impl Display) -> Result<T>;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Display) -> Result<T> {
        self.map_err(|err| InstallError::wrap(context, err))
    }
}
