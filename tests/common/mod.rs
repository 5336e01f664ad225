#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use llm_adapter::{
  Error, ProviderConfig, ProviderSettings, Result, Sleeper, Transport
};
use serde_json::Value;

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// Settings pointing at a dummy endpoint with a test key
pub fn test_settings() -> ProviderSettings
{   ProviderSettings
    {   api_url: "https://api.example.com/v1/chat".to_string()
      , api_key: "test-key".to_string()
      , model: "test-model".to_string()
      , ..ProviderSettings::default()
    }
}

pub fn test_config(settings: ProviderSettings) -> ProviderConfig
{   ProviderConfig::from_settings(settings)
      .expect("test settings should be valid")
}

/// One recorded POST
#[derive(Debug, Clone)]
pub struct RecordedPost
{   pub url: String
  , pub headers: Vec<(String, String)>
  , pub body: Value
  , pub timeout: Duration
}

/// Replays scripted results in order; once the script runs out
/// every further attempt fails with a connection error
#[derive(Default)]
pub struct ScriptedTransport
{   script: Mutex<VecDeque<Result<Value>>>
  , posts: Mutex<Vec<RecordedPost>>
  , attempts: AtomicUsize
}

impl ScriptedTransport
{   pub fn new(script: Vec<Result<Value>>) -> Self
    {   ScriptedTransport
        {   script: Mutex::new(script.into())
          , posts: Mutex::new(vec![])
          , attempts: AtomicUsize::new(0)
        }
    }

    pub fn always_failing() -> Self
    {   ScriptedTransport::new(vec![])
    }

    pub fn attempts(&self) -> usize
    {   self.attempts.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> Vec<RecordedPost>
    {   self.posts.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport
{   fn post(
      &self
    , url: &str
    , headers: &[(String, String)]
    , body: &Value
    , timeout: Duration
    ) -> impl Future<Output = Result<Value>> + Send
    {   self.attempts.fetch_add(1, Ordering::SeqCst);
        self.posts.lock().unwrap().push(RecordedPost
        {   url: url.to_string()
          , headers: headers.to_vec()
          , body: body.clone()
          , timeout
        });
        let result = self.script.lock().unwrap()
          .pop_front()
          .unwrap_or_else(|| Err(Error::HttpError(
            "connection refused".to_string()
          )));
        std::future::ready(result)
    }
}

impl<'a> Transport for &'a ScriptedTransport
{   fn post(
      &self
    , url: &str
    , headers: &[(String, String)]
    , body: &Value
    , timeout: Duration
    ) -> impl Future<Output = Result<Value>> + Send
    {   (**self).post(url, headers, body, timeout)
    }
}

/// Records requested delays without waiting
#[derive(Default)]
pub struct RecordingSleeper
{   delays: Mutex<Vec<Duration>>
}

impl RecordingSleeper
{   pub fn delays(&self) -> Vec<Duration>
    {   self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper
{   fn sleep(&self, duration: Duration)
      -> impl Future<Output = ()> + Send
    {   self.delays.lock().unwrap().push(duration);
        std::future::ready(())
    }
}

impl<'a> Sleeper for &'a RecordingSleeper
{   fn sleep(&self, duration: Duration)
      -> impl Future<Output = ()> + Send
    {   (**self).sleep(duration)
    }
}

pub fn openai_response(content: &str) -> Value
{   serde_json::json!({
      "id": "chatcmpl-123"
    , "object": "chat.completion"
    , "model": "gpt-test"
    , "choices": [{
        "index": 0
      , "message": { "role": "assistant", "content": content }
      , "finish_reason": "stop"
      }]
    , "usage": {
        "prompt_tokens": 9
      , "completion_tokens": 12
      , "total_tokens": 21
      }
    })
}
