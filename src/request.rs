//! Uniform message, parameter and response types

use serde::{Deserialize, Serialize};

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   System
  , User
  , Assistant
}

impl Role
{   /// Wire label of the role
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Role::System => "system"
          , Role::User => "user"
          , Role::Assistant => "assistant"
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn new(role: Role, content: impl Into<String>) -> Self
    {   Message
        {   role
          , content: content.into()
        }
    }

    pub fn system(content: impl Into<String>) -> Self
    {   Message::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Message::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   Message::new(Role::Assistant, content)
    }
}

/// Per-call overrides; unset fields fall back to the
/// configured defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GenerationParameters
{   /// Model identifier
    pub model: Option<String>
  , /// Maximum output length in tokens
    pub max_tokens: Option<u64>
  , /// Sampling temperature
    pub temperature: Option<f64>
  , /// Nucleus-sampling threshold
    pub top_p: Option<f64>
}

impl GenerationParameters
{   pub fn new() -> Self
    {   GenerationParameters::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u64) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self
    {   self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self
    {   self.top_p = Some(top_p);
        self
    }

    /// Merge with defaults for a single call
    pub fn resolve(
      &self
    , defaults: &crate::config::GenerationDefaults
    ) -> ResolvedParameters
    {   ResolvedParameters
        {   model: self.model.clone()
              .unwrap_or_else(|| defaults.model.clone())
          , max_tokens: self.max_tokens
              .unwrap_or(defaults.max_tokens)
          , temperature: self.temperature
              .unwrap_or(defaults.temperature)
          , top_p: self.top_p.unwrap_or(defaults.top_p)
        }
    }
}

/// Parameters after merging overrides onto defaults
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedParameters
{   pub model: String
  , pub max_tokens: u64
  , pub temperature: f64
  , pub top_p: f64
}

/// Token counters reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Usage
{   pub prompt_tokens: u64
  , pub completion_tokens: u64
  , pub total_tokens: u64
}

/// Identifies the adapter instance that produced a response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseMetadata
{   /// Provider label, e.g. "custom"
    pub provider: String
  , /// Endpoint the request was sent to
    pub endpoint: String
}

/// Uniform result of a completion call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NormalizedResponse
{   /// Generated text, empty when nothing was extracted
    pub content: String
  , /// Reported model, or the configured default
    pub model: String
  , pub usage: Usage
  , /// Stop reason, when the response shape carries one
    pub finish_reason: Option<String>
  , pub metadata: ResponseMetadata
}

/// Diagnostic description of an adapter instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelInfo
{   pub model: String
  , pub provider: String
  , pub endpoint: String
  , pub request_format: String
  , pub response_format: String
}
