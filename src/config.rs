//! Configuration for a custom API adapter
//!
//! `ProviderSettings` is the raw surface handed over by whatever
//! settings layer the host application uses (a JSON file, the
//! environment, ...). `ProviderConfig` is the validated, immutable
//! form the adapter runs on.

use std::fmt;
use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::DotPath;
use crate::retry::RetryPolicy;

pub const DEFAULT_PROVIDER_LABEL: &str = "custom";
pub const DEFAULT_KEY_HEADER: &str = "Authorization";
pub const DEFAULT_KEY_PREFIX: &str = "Bearer";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_CONTENT_PATH: &str = "choices.0.message.content";
pub const DEFAULT_MODEL_PATH: &str = "model";
pub const DEFAULT_USAGE_PATH: &str = "usage";
pub const DEFAULT_MODEL: &str = "default";
pub const DEFAULT_MAX_TOKENS: u64 = 2000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 1.0;

/// Raw adapter settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings
{   /// Label reported in response metadata and model info
    pub provider: String
  , pub api_url: String
  , pub api_key: String
  , pub api_key_header: String
  , /// Empty means the key is sent bare
    pub api_key_prefix: String
  , pub timeout_secs: u64
  , /// Total attempts per call
    pub max_retries: usize
  , /// Delay before the second attempt, in milliseconds
    pub initial_backoff_ms: u64
  , pub backoff_multiplier: f64
  , /// `openai` / `built-in` or `custom` / `templated`
    pub request_format: String
  , pub custom_request_template: Option<serde_json::Value>
  , /// `openai` / `built-in` or `custom` / `path-based`
    pub response_format: String
  , pub response_content_path: String
  , pub response_model_path: String
  , pub response_usage_path: String
  , pub model: String
  , pub max_tokens: u64
  , pub temperature: f64
  , pub top_p: f64
}

impl Default for ProviderSettings
{   fn default() -> Self
    {   ProviderSettings
        {   provider: DEFAULT_PROVIDER_LABEL.to_string()
          , api_url: String::new()
          , api_key: String::new()
          , api_key_header: DEFAULT_KEY_HEADER.to_string()
          , api_key_prefix: DEFAULT_KEY_PREFIX.to_string()
          , timeout_secs: DEFAULT_TIMEOUT_SECS
          , max_retries: DEFAULT_MAX_RETRIES
          , initial_backoff_ms: 1000
          , backoff_multiplier: 2.0
          , request_format: "openai".to_string()
          , custom_request_template: None
          , response_format: "openai".to_string()
          , response_content_path: DEFAULT_CONTENT_PATH.to_string()
          , response_model_path: DEFAULT_MODEL_PATH.to_string()
          , response_usage_path: DEFAULT_USAGE_PATH.to_string()
          , model: DEFAULT_MODEL.to_string()
          , max_tokens: DEFAULT_MAX_TOKENS
          , temperature: DEFAULT_TEMPERATURE
          , top_p: DEFAULT_TOP_P
        }
    }
}

impl fmt::Debug for ProviderSettings
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ProviderSettings")
          .field("provider", &self.provider)
          .field("api_url", &self.api_url)
          .field("api_key", &"<redacted>")
          .field("api_key_header", &self.api_key_header)
          .field("request_format", &self.request_format)
          .field("response_format", &self.response_format)
          .field("model", &self.model)
          .finish_non_exhaustive()
    }
}

impl ProviderSettings
{   /// Load settings from `CUSTOM_*` environment variables
    pub fn from_env() -> Result<Self>
    {   Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup; unset keys
    /// keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where F: Fn(&str) -> Option<String>
    {   let mut s = ProviderSettings::default();

        if let Some(v) = lookup("CUSTOM_API_URL") { s.api_url = v; }
        if let Some(v) = lookup("CUSTOM_API_KEY") { s.api_key = v; }
        if let Some(v) = lookup("CUSTOM_API_KEY_HEADER")
        {   s.api_key_header = v;
        }
        if let Some(v) = lookup("CUSTOM_API_KEY_PREFIX")
        {   s.api_key_prefix = v;
        }
        if let Some(v) = lookup("CUSTOM_API_TIMEOUT")
        {   s.timeout_secs = parse_number("CUSTOM_API_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("CUSTOM_API_MAX_RETRIES")
        {   s.max_retries
              = parse_number("CUSTOM_API_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("CUSTOM_REQUEST_FORMAT")
        {   s.request_format = v;
        }
        if let Some(v) = lookup("CUSTOM_REQUEST_TEMPLATE")
        {   let template = serde_json::from_str(&v).map_err(|e| {
              Error::InvalidConfiguration(format!(
                "CUSTOM_REQUEST_TEMPLATE is not valid JSON: {}", e
              ))
            })?;
            s.custom_request_template = Some(template);
        }
        if let Some(v) = lookup("CUSTOM_RESPONSE_FORMAT")
        {   s.response_format = v;
        }
        if let Some(v) = lookup("CUSTOM_RESPONSE_CONTENT_PATH")
        {   s.response_content_path = v;
        }
        if let Some(v) = lookup("CUSTOM_RESPONSE_MODEL_PATH")
        {   s.response_model_path = v;
        }
        if let Some(v) = lookup("CUSTOM_RESPONSE_USAGE_PATH")
        {   s.response_usage_path = v;
        }
        if let Some(v) = lookup("CUSTOM_MODEL") { s.model = v; }
        if let Some(v) = lookup("CUSTOM_MAX_TOKENS")
        {   s.max_tokens = parse_number("CUSTOM_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("CUSTOM_TEMPERATURE")
        {   s.temperature = parse_number("CUSTOM_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("CUSTOM_TOP_P")
        {   s.top_p = parse_number("CUSTOM_TOP_P", &v)?;
        }

        debug!("Loaded provider settings: {:?}", s);
        Ok(s)
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where T: std::str::FromStr
    , T::Err: fmt::Display
{   raw.trim().parse::<T>().map_err(|e| {
      Error::InvalidConfiguration(format!(
        "{} has invalid value {:?}: {}", key, raw, e
      ))
    })
}

/// How request bodies are produced
#[derive(Debug, Clone, PartialEq)]
pub enum RequestShape
{   /// OpenAI-style chat body
    BuiltIn
  , /// Caller template with `{{name}}` placeholders
    Templated
    {   template: serde_json::Value
    }
}

impl RequestShape
{   pub fn label(&self) -> &'static str
    {   match self
        {   RequestShape::BuiltIn => "built-in"
          , RequestShape::Templated { .. } => "templated"
        }
    }

    fn from_settings(settings: &ProviderSettings) -> Result<Self>
    {   match settings.request_format.trim()
        {   "openai" | "built-in" | "builtin" => Ok(RequestShape::BuiltIn)
          , "custom" | "templated" => {
              let template = settings.custom_request_template
                .clone()
                .ok_or_else(|| Error::InvalidConfiguration(
                  "templated request shape requires a request template"
                    .to_string()
                ))?;
              Ok(RequestShape::Templated { template })
            }
          , other => Err(Error::InvalidConfiguration(
              format!("Unknown request format: {}", other)
            ))
        }
    }
}

/// How response bodies are read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape
{   /// OpenAI-style chat response
    BuiltIn
  , /// Three caller-declared field locators
    PathBased
    {   content_path: DotPath
      , model_path: DotPath
      , usage_path: DotPath
    }
}

impl ResponseShape
{   pub fn label(&self) -> &'static str
    {   match self
        {   ResponseShape::BuiltIn => "built-in"
          , ResponseShape::PathBased { .. } => "path-based"
        }
    }

    fn from_settings(settings: &ProviderSettings) -> Result<Self>
    {   match settings.response_format.trim()
        {   "openai" | "built-in" | "builtin" => Ok(ResponseShape::BuiltIn)
          , "custom" | "path-based" | "path" => {
              Ok(ResponseShape::PathBased
              {   content_path: DotPath::parse(
                    &settings.response_content_path
                  )
                , model_path: DotPath::parse(
                    &settings.response_model_path
                  )
                , usage_path: DotPath::parse(
                    &settings.response_usage_path
                  )
              })
            }
          , other => Err(Error::InvalidConfiguration(
              format!("Unknown response format: {}", other)
            ))
        }
    }
}

/// Where the credential goes on the wire
#[derive(Clone, PartialEq, Eq)]
pub struct Credential
{   pub header: String
  , pub prefix: Option<String>
  , key: String
}

impl Credential
{   /// Header value, `<prefix> <key>` or the bare key
    pub fn header_value(&self) -> String
    {   match &self.prefix
        {   Some(prefix) => format!("{} {}", prefix, self.key)
          , None => self.key.clone()
        }
    }
}

impl fmt::Debug for Credential
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("Credential")
          .field("header", &self.header)
          .field("prefix", &self.prefix)
          .field("key", &"<redacted>")
          .finish()
    }
}

/// Generation defaults applied when a call leaves a field unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults
{   pub model: String
  , pub max_tokens: u64
  , pub temperature: f64
  , pub top_p: f64
}

impl Default for GenerationDefaults
{   fn default() -> Self
    {   GenerationDefaults
        {   model: DEFAULT_MODEL.to_string()
          , max_tokens: DEFAULT_MAX_TOKENS
          , temperature: DEFAULT_TEMPERATURE
          , top_p: DEFAULT_TOP_P
        }
    }
}

/// Validated adapter configuration, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig
{   pub provider: String
  , pub endpoint: String
  , pub credential: Credential
  , pub timeout: Duration
  , pub retry: RetryPolicy
  , pub request_shape: RequestShape
  , pub response_shape: ResponseShape
  , pub defaults: GenerationDefaults
}

impl ProviderConfig
{   /// Validate raw settings
    pub fn from_settings(settings: ProviderSettings) -> Result<Self>
    {   let endpoint = settings.api_url.trim().to_string();
        if endpoint.is_empty()
        {   return Err(Error::InvalidConfiguration(
              "api_url is required".to_string()
            ));
        }
        if settings.api_key.is_empty()
        {   return Err(Error::InvalidConfiguration(
              "api_key is required".to_string()
            ));
        }

        let prefix = Some(settings.api_key_prefix.trim())
          .filter(|p| !p.is_empty())
          .map(str::to_string);
        let credential = Credential
        {   header: settings.api_key_header.trim().to_string()
          , prefix
          , key: settings.api_key.clone()
        };
        HeaderName::from_bytes(credential.header.as_bytes())
          .map_err(|e| Error::InvalidConfiguration(format!(
            "invalid api_key_header {:?}: {}", credential.header, e
          )))?;
        HeaderValue::from_str(&credential.header_value())
          .map_err(|_| Error::InvalidConfiguration(
            "api_key contains characters not allowed in a header"
              .to_string()
          ))?;

        if settings.backoff_multiplier < 0.0
          || !settings.backoff_multiplier.is_finite()
        {   return Err(Error::InvalidConfiguration(format!(
              "invalid backoff_multiplier: {}",
              settings.backoff_multiplier
            )));
        }

        let request_shape = RequestShape::from_settings(&settings)?;
        let response_shape = ResponseShape::from_settings(&settings)?;

        let config = ProviderConfig
        {   provider: settings.provider.clone()
          , endpoint
          , credential
          , timeout: Duration::from_secs(settings.timeout_secs)
          , retry: RetryPolicy::new(
              settings.max_retries
            , settings.backoff_multiplier
            , settings.initial_backoff_ms
            )
          , request_shape
          , response_shape
          , defaults: GenerationDefaults
            {   model: settings.model
              , max_tokens: settings.max_tokens
              , temperature: settings.temperature
              , top_p: settings.top_p
            }
        };
        debug!(
          "Built provider config for {} ({} request, {} response)",
          config.endpoint,
          config.request_shape.label(),
          config.response_shape.label()
        );
        Ok(config)
    }

    /// Content-Type plus the credential header
    pub fn headers(&self) -> Vec<(String, String)>
    {   vec![
          ("Content-Type".to_string(), "application/json".to_string())
        , (self.credential.header.clone(), self.credential.header_value())
        ]
    }
}
