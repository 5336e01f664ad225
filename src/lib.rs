//! Configuration-driven adapter for chat-style HTTP JSON APIs
//!
//! One uniform request syntax for endpoints whose request body and
//! response layout are only known at configuration time.
//!
//! ```text
//! messages + params
//!   -> format   (built-in OpenAI-style body, or a {{placeholder}} template)
//!   -> send     (POST with credential header, timeout, bounded retry)
//!   -> extract  (built-in OpenAI-style reading, or dot-path locators)
//!   -> NormalizedResponse
//! ```
//!
//! ```no_run
//! use llm_adapter::{CustomApiProvider, GenerationParameters, Message, ProviderSettings};
//!
//! # async fn run() -> llm_adapter::Result<()> {
//! let settings = ProviderSettings
//! {   api_url: "https://api.example.com/v1/chat".to_string()
//!   , api_key: "secret".to_string()
//!   , ..ProviderSettings::default()
//! };
//! let provider = CustomApiProvider::from_settings(settings)?;
//! let reply = provider
//!   .chat_completion(
//!     &[Message::user("Say hello")]
//!   , &GenerationParameters::new().with_temperature(0.2)
//!   )
//!   .await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod config;
pub mod request;
pub mod format;
pub mod extract;
pub mod retry;
pub mod transport;
pub mod providers;

pub use config::{
  GenerationDefaults, ProviderConfig, ProviderSettings
, RequestShape, ResponseShape
};
pub use error::{Error, Result};
pub use providers::CustomApiProvider;
pub use request::{
  GenerationParameters, Message, ModelInfo, NormalizedResponse
, ResponseMetadata, Role, Usage
};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{HttpTransport, Transport};
