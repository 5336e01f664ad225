use std::fmt;

/// Error type for adapter operations
/// Implements Clone so a final cause can be boxed into
/// a `Transport` error and still be inspected by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Missing or unrecognized configuration
    InvalidConfiguration(String)
  , /// Connection or request failure
    HttpError(String)
  , /// Endpoint answered with a non-success status
    ApiError
    {   status: u16
      , body: String
    }
  , /// Response body was not JSON
    ParseError(String)
  , /// Attempt exceeded the configured timeout
    Timeout
  , /// Retries exhausted, carries the final attempt's cause
    Transport
    {   endpoint: String
      , attempts: usize
      , cause: Box<Error>
    }
}

impl Error
{   /// Whether a single attempt that failed with this error
    /// may be retried
    pub fn is_retryable(&self) -> bool
    {   matches!(
          self,
          Error::HttpError(_)
            | Error::ApiError { .. }
            | Error::ParseError(_)
            | Error::Timeout
        )
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, body } => {
              write!(f, "API error (status {}): {}", status, body)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::Transport { endpoint, attempts, cause } => {
              write!(f,
                "Generation service unavailable at {} \
                 after {} attempt(s): {}",
                endpoint, attempts, cause
              )
            }
        }
    }
}

impl std::error::Error for Error
{   fn source(&self)
      -> Option<&(dyn std::error::Error + 'static)>
    {   match self
        {   Error::Transport { cause, .. } => Some(cause.as_ref())
          , _ => None
        }
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else if e.is_decode()
        {   Error::ParseError(e.to_string())
        } else if let Some(status) = e.status()
        {   Error::ApiError
            {   status: status.as_u16()
              , body: e.to_string()
            }
        } else
        {   Error::HttpError(e.to_string())
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
