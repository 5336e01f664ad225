//! HTTP transport for a single POST attempt

use std::future::Future;
use std::time::Duration;

use log::{error, trace};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{Error, Result};

/// Issues one JSON POST and returns the parsed JSON body.
///
/// Implementations perform exactly one attempt per call; retrying
/// is the caller's concern. Every failure mode (connection, status,
/// timeout, non-JSON body) maps to a retryable [`Error`].
pub trait Transport: Send + Sync
{   fn post(
      &self
    , url: &str
    , headers: &[(String, String)]
    , body: &serde_json::Value
    , timeout: Duration
    ) -> impl Future<Output = Result<serde_json::Value>> + Send;
}

/// reqwest-backed transport
///
/// Builds a fresh client for every attempt, so no connection is
/// kept between calls and dropping the future releases it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport
{   fn header_map(headers: &[(String, String)]) -> Result<HeaderMap>
    {   let mut map = HeaderMap::new();
        for (name, value) in headers
        {   let name = HeaderName::from_bytes(name.as_bytes())
              .map_err(|e| Error::InvalidConfiguration(
                format!("invalid header name {:?}: {}", name, e)
              ))?;
            let value = HeaderValue::from_str(value)
              .map_err(|e| Error::InvalidConfiguration(
                format!("invalid value for header {}: {}", name, e)
              ))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl Transport for HttpTransport
{   fn post(
      &self
    , url: &str
    , headers: &[(String, String)]
    , body: &serde_json::Value
    , timeout: Duration
    ) -> impl Future<Output = Result<serde_json::Value>> + Send
    {   let url = url.to_string();
        let headers = Self::header_map(headers);
        let body = body.clone();
        async move
        {   let headers = headers?;
            let client = reqwest::Client::builder()
              .timeout(timeout)
              .build()
              .map_err(|e| Error::HttpError(e.to_string()))?;

            trace!("POST {} body: {}", url, body);
            let response = client
              .post(&url)
              .headers(headers)
              .json(&body)
              .send()
              .await
              .map_err(Error::from)?;

            let status = response.status();
            trace!("Response status from {}: {}", url, status);

            if !status.is_success()
            {   let text = response.text().await
                  .unwrap_or_else(|_| "Unknown error".to_string());
                error!("Endpoint {} returned {}: {}", url, status, text);
                return Err(Error::ApiError
                {   status: status.as_u16()
                  , body: text
                });
            }

            let text = response.text().await.map_err(Error::from)?;
            let parsed: serde_json::Value = serde_json::from_str(&text)
              .map_err(|e| Error::ParseError(e.to_string()))?;
            match parsed
            {   serde_json::Value::Object(_)
              | serde_json::Value::Array(_) => Ok(parsed)
              , other => Err(Error::ParseError(format!(
                  "expected a JSON object or array, got {}", other
                )))
            }
        }
    }
}
