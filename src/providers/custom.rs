//! Adapter for arbitrary JSON chat APIs
//!
//! Each call runs format -> send (with retry) -> extract. The adapter
//! holds only its immutable configuration, so one instance can serve
//! any number of concurrent calls through `&self`.

use futures::stream::{self, Stream};
use log::{debug, error, warn};
use serde_json::Value;

use crate::config::{ProviderConfig, ProviderSettings};
use crate::error::{Error, Result};
use crate::extract::extract_response;
use crate::format::format_request;
use crate::request::{
  GenerationParameters, Message, ModelInfo, NormalizedResponse
};
use crate::retry::{Sleeper, TokioSleeper};
use crate::transport::{HttpTransport, Transport};

/// Configuration-driven adapter for a custom endpoint
#[derive(Debug, Clone)]
pub struct CustomApiProvider<T = HttpTransport, S = TokioSleeper>
{   config: ProviderConfig
  , transport: T
  , sleeper: S
}

impl CustomApiProvider
{   /// Adapter over HTTP with real sleeps between attempts
    pub fn new(config: ProviderConfig) -> Self
    {   CustomApiProvider::with_transport(
          config, HttpTransport, TokioSleeper
        )
    }

    /// Validate settings and build an HTTP adapter
    pub fn from_settings(settings: ProviderSettings) -> Result<Self>
    {   Ok(CustomApiProvider::new(
          ProviderConfig::from_settings(settings)?
        ))
    }
}

impl<T, S> CustomApiProvider<T, S>
where T: Transport
    , S: Sleeper
{   pub fn with_transport(
      config: ProviderConfig
    , transport: T
    , sleeper: S
    ) -> Self
    {   debug!(
          "Creating CustomApiProvider for {} ({})",
          config.endpoint, config.provider
        );
        CustomApiProvider
        {   config
          , transport
          , sleeper
        }
    }

    pub fn config(&self) -> &ProviderConfig
    {   &self.config
    }

    /// Request body for `messages` with per-call overrides
    pub fn format_request(
      &self
    , messages: &[Message]
    , params: &GenerationParameters
    ) -> Value
    {   let resolved = params.resolve(&self.config.defaults);
        format_request(&self.config.request_shape, messages, &resolved)
    }

    /// Read a provider body into the uniform response
    pub fn parse_response(&self, body: &Value) -> NormalizedResponse
    {   extract_response(body, &self.config)
    }

    /// POST `body`, retrying transient failures per the retry policy
    pub async fn send(&self, body: &Value) -> Result<Value>
    {   let policy = &self.config.retry;
        let headers = self.config.headers();
        let mut attempt = 0;

        loop
        {   let result = self.transport
              .post(
                &self.config.endpoint
              , &headers
              , body
              , self.config.timeout
              )
              .await;

            match result
            {   Ok(response) => {
                  debug!(
                    "Request to {} succeeded on attempt {}",
                    self.config.endpoint, attempt + 1
                  );
                  return Ok(response);
                }
              , Err(e) if !e.is_retryable() => {
                  error!(
                    "Request attempt {} to {} failed, not retrying: {}",
                    attempt + 1, self.config.endpoint, e
                  );
                  return Err(e);
                }
              , Err(e) => {
                  if !policy.has_next(attempt)
                  {   error!(
                        "Request attempt {} to {} failed, giving up: {}",
                        attempt + 1, self.config.endpoint, e
                      );
                      return Err(Error::Transport
                      {   endpoint: self.config.endpoint.clone()
                        , attempts: attempt + 1
                        , cause: Box::new(e)
                      });
                  }
                  let delay = policy.backoff_for_attempt(attempt);
                  warn!(
                    "Request attempt {} to {} failed: {}; retrying in {:?}",
                    attempt + 1, self.config.endpoint, e, delay
                  );
                  self.sleeper.sleep(delay).await;
                  attempt += 1;
                }
            }
        }
    }

    /// Run one chat completion
    pub async fn chat_completion(
      &self
    , messages: &[Message]
    , params: &GenerationParameters
    ) -> Result<NormalizedResponse>
    {   debug!(
          "chat_completion with {} message(s) to {}",
          messages.len(), self.config.endpoint
        );
        let body = self.format_request(messages, params);
        match self.send(&body).await
        {   Ok(response) => Ok(self.parse_response(&response))
          , Err(e) => {
              error!("Custom API error: {}", e);
              Err(e)
            }
        }
    }

    /// Single user prompt
    pub async fn text_completion(
      &self
    , prompt: &str
    , params: &GenerationParameters
    ) -> Result<NormalizedResponse>
    {   let messages = [Message::user(prompt)];
        self.chat_completion(&messages, params).await
    }

    /// Yields the whole completion as a single chunk. Nothing is sent
    /// until the stream is polled; each new stream sends a new request.
    pub fn stream_chat_completion<'a>(
      &'a self
    , messages: &'a [Message]
    , params: &'a GenerationParameters
    ) -> impl Stream<Item = Result<String>> + Send + 'a
    where T: 'a
        , S: 'a
    {   stream::once(async move {
          self.chat_completion(messages, params)
            .await
            .map(|response| response.content)
        })
    }

    pub fn model_info(&self) -> ModelInfo
    {   ModelInfo
        {   model: self.config.defaults.model.clone()
          , provider: self.config.provider.clone()
          , endpoint: self.config.endpoint.clone()
          , request_format: self.config.request_shape.label().to_string()
          , response_format: self.config.response_shape.label().to_string()
        }
    }
}
