//! Request formatting: uniform messages to provider JSON bodies

use log::trace;
use serde_json::{json, Map, Value};

use crate::config::RequestShape;
use crate::request::{Message, ResolvedParameters};

/// Names a template may reference as `{{name}}`
pub const PLACEHOLDERS: [&str; 5]
  = ["model", "messages", "max_tokens", "temperature", "top_p"];

/// Build the request body for `messages` under `shape`
pub fn format_request(
  shape: &RequestShape
, messages: &[Message]
, params: &ResolvedParameters
) -> Value
{   let body = match shape
    {   RequestShape::BuiltIn => json!({
          "model": params.model
        , "messages": messages_value(messages)
        , "max_tokens": params.max_tokens
        , "temperature": params.temperature
        , "top_p": params.top_p
        , "stream": false
        })
      , RequestShape::Templated { template } => {
          let values = PlaceholderValues::new(messages, params);
          substitute(template, &values)
        }
    };
    trace!("Formatted {} request: {}", shape.label(), body);
    body
}

fn messages_value(messages: &[Message]) -> Value
{   Value::Array(
      messages.iter()
        .map(|m| json!({
          "role": m.role.as_str()
        , "content": m.content
        }))
        .collect()
    )
}

/// Values a template can pull in, by placeholder name
pub struct PlaceholderValues
{   values: Vec<(&'static str, Value)>
}

impl PlaceholderValues
{   pub fn new(
      messages: &[Message]
    , params: &ResolvedParameters
    ) -> Self
    {   let values = [
          Value::from(params.model.clone())
        , messages_value(messages)
        , Value::from(params.max_tokens)
        , Value::from(params.temperature)
        , Value::from(params.top_p)
        ];
        PlaceholderValues
        {   values: PLACEHOLDERS.into_iter().zip(values).collect()
        }
    }

    /// Known `{{name}}` token at the start of `s`, with its length
    fn match_at(&self, s: &str) -> Option<(&Value, usize)>
    {   let inner = s.strip_prefix("{{")?;
        self.values.iter()
          .find(|(name, _)| {
            inner.strip_prefix(*name)
              .is_some_and(|tail| tail.starts_with("}}"))
          })
          .map(|(name, value)| (value, name.len() + 4))
    }
}

/// Walk `template` and replace placeholders in string values.
///
/// A string that is exactly one known placeholder becomes the value
/// itself with its JSON type intact. Placeholders embedded in longer
/// strings are spliced in as text: strings verbatim, everything else
/// as compact JSON. Unknown placeholders stay as written. Object keys
/// are never rewritten.
pub fn substitute(template: &Value, values: &PlaceholderValues) -> Value
{   match template
    {   Value::Object(map) => Value::Object(
          map.iter()
            .map(|(k, v)| (k.clone(), substitute(v, values)))
            .collect::<Map<String, Value>>()
        )
      , Value::Array(items) => Value::Array(
          items.iter().map(|v| substitute(v, values)).collect()
        )
      , Value::String(s) => substitute_str(s, values)
      , other => other.clone()
    }
}

fn substitute_str(s: &str, values: &PlaceholderValues) -> Value
{   if let Some((value, len)) = values.match_at(s)
    {   if len == s.len()
        {   return value.clone();
        }
    }

    // Left to right, one byte at a time past any `{{` that does not
    // open a known token, so `{{{model}}}` still finds `{{model}}`
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{")
    {   out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match values.match_at(candidate)
        {   Some((value, len)) => {
              out.push_str(&inline_text(value));
              rest = &candidate[len..];
            }
          , None => {
              out.push('{');
              rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Value::String(out)
}

fn inline_text(value: &Value) -> String
{   match value
    {   Value::String(s) => s.clone()
      , other => other.to_string()
    }
}
