//! Response extraction: arbitrary provider JSON to a uniform response

use std::fmt;

use log::{debug, trace};
use serde_json::Value;

use crate::config::{ProviderConfig, ResponseShape};
use crate::request::{NormalizedResponse, ResponseMetadata, Usage};

/// One step of a dot-path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment
{   /// Purely numeric segment, indexes an array
    Index(usize)
  , /// Anything else, looks up an object key
    Key(String)
}

/// A `.`-separated field locator such as `choices.0.message.content`.
/// The empty path locates the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotPath
{   segments: Vec<Segment>
}

/// Outcome of resolving a [`DotPath`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a>
{   Found(&'a Value)
  , Absent
}

impl<'a> Lookup<'a>
{   pub fn value(self) -> Option<&'a Value>
    {   match self
        {   Lookup::Found(v) => Some(v)
          , Lookup::Absent => None
        }
    }

    pub fn is_absent(&self) -> bool
    {   matches!(self, Lookup::Absent)
    }
}

impl DotPath
{   pub fn parse(path: &str) -> Self
    {   if path.is_empty()
        {   return DotPath { segments: vec![] };
        }
        let segments = path.split('.')
          .map(|part| {
            if !part.is_empty()
              && part.bytes().all(|b| b.is_ascii_digit())
            {   // Too large to be an index means out of range
                Segment::Index(part.parse().unwrap_or(usize::MAX))
            } else
            {   Segment::Key(part.to_string())
            }
          })
          .collect();
        DotPath { segments }
    }

    pub fn segments(&self) -> &[Segment]
    {   &self.segments
    }

    /// Walk the path through `root`. Any step that does not fit the
    /// current value (missing key, index out of range, wrong
    /// container type, null) makes the whole lookup absent.
    pub fn resolve<'a>(&self, root: &'a Value) -> Lookup<'a>
    {   let mut current = root;
        for segment in &self.segments
        {   let next = match (segment, current)
            {   (Segment::Index(i), Value::Array(items)) => items.get(*i)
              , (Segment::Key(k), Value::Object(map)) => map.get(k)
              , _ => None
            };
            match next
            {   Some(v) => current = v
              , None => return Lookup::Absent
            }
        }
        if current.is_null()
        {   Lookup::Absent
        } else
        {   Lookup::Found(current)
        }
    }
}

impl fmt::Display for DotPath
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   for (i, segment) in self.segments.iter().enumerate()
        {   if i > 0
            {   f.write_str(".")?;
            }
            match segment
            {   Segment::Index(n) => write!(f, "{}", n)?
              , Segment::Key(k) => f.write_str(k)?
            }
        }
        Ok(())
    }
}

/// Build a [`NormalizedResponse`] from a provider body. Never fails:
/// missing or malformed fields degrade to empty content, the default
/// model and zero usage.
pub fn extract_response(
  body: &Value
, config: &ProviderConfig
) -> NormalizedResponse
{   let metadata = ResponseMetadata
    {   provider: config.provider.clone()
      , endpoint: config.endpoint.clone()
    };
    let default_model = &config.defaults.model;

    let response = match &config.response_shape
    {   ResponseShape::BuiltIn => {
          let choice = body.get("choices")
            .and_then(|c| c.get(0));
          let content = choice
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .map(text_of)
            .unwrap_or_default();
          let finish_reason = choice
            .and_then(|c| c.get("finish_reason"))
            .and_then(Value::as_str)
            .map(str::to_string);
          NormalizedResponse
          {   content
            , model: model_or_default(body.get("model"), default_model)
            , usage: body.get("usage")
                .map(usage_of)
                .unwrap_or_default()
            , finish_reason
            , metadata
          }
        }
      , ResponseShape::PathBased {
          content_path, model_path, usage_path
        } => {
          let content = content_path.resolve(body);
          let model = model_path.resolve(body);
          let usage = usage_path.resolve(body);
          if content.is_absent()
          {   debug!("Content path {} is absent", content_path);
          }
          NormalizedResponse
          {   content: content.value()
                .map(text_of)
                .unwrap_or_default()
            , model: model_or_default(model.value(), default_model)
            , usage: usage.value()
                .map(usage_of)
                .unwrap_or_default()
            , finish_reason: None
            , metadata
          }
        }
    };
    trace!("Extracted response: {:?}", response);
    response
}

/// Strings verbatim, null as empty, everything else as compact JSON
fn text_of(value: &Value) -> String
{   match value
    {   Value::String(s) => s.clone()
      , Value::Null => String::new()
      , other => other.to_string()
    }
}

fn model_or_default(value: Option<&Value>, default: &str) -> String
{   value.map(text_of)
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| default.to_string())
}

/// Non-object usage, or counters that are not non-negative
/// integers, read as zero
fn usage_of(value: &Value) -> Usage
{   let Value::Object(map) = value
    else { return Usage::default(); };
    let counter = |key: &str| {
      map.get(key).and_then(Value::as_u64).unwrap_or(0)
    };
    Usage
    {   prompt_tokens: counter("prompt_tokens")
      , completion_tokens: counter("completion_tokens")
      , total_tokens: counter("total_tokens")
    }
}
