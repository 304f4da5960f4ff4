use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by a [`WeatherSource`](crate::provider::WeatherSource).
///
/// The three kinds stay distinct at the client boundary; the reducer collapses
/// all of them into [`UiState::Error`](crate::reducer::UiState::Error).
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No route, refused connection, timeout, or a body that could not be read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("provider returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// The body did not match the expected shape.
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl WeatherError {
    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        WeatherError::Decode {
            what,
            reason: reason.to_string(),
        }
    }

    /// HTTP status for [`WeatherError::Http`], `None` otherwise.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            WeatherError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;
