mod common;

use llm_adapter::format::format_request;
use llm_adapter::{
  CustomApiProvider, GenerationParameters, Message, RequestShape, Role
};
use serde_json::json;

use common::{test_config, test_settings};

fn conversation() -> Vec<Message>
{   vec![
      Message::system("You are terse")
    , Message::user("Hi")
    , Message::assistant("Hello")
    , Message::user("Tell me a joke")
    ]
}

fn templated(template: serde_json::Value) -> CustomApiProvider
{   let mut settings = test_settings();
    settings.request_format = "custom".to_string();
    settings.custom_request_template = Some(template);
    CustomApiProvider::new(test_config(settings))
}

#[test]
fn test_built_in_body_preserves_message_order()
{   let provider = CustomApiProvider::new(test_config(test_settings()));
    let messages = conversation();

    let body = provider.format_request(
      &messages, &GenerationParameters::new()
    );

    let sent = body["messages"].as_array().unwrap();
    assert_eq!(sent.len(), messages.len());
    for (sent, original) in sent.iter().zip(&messages)
    {   assert_eq!(sent["role"], original.role.as_str());
        assert_eq!(sent["content"], original.content.as_str());
    }
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][2]["role"], "assistant");
}

#[test]
fn test_built_in_body_uses_defaults()
{   let provider = CustomApiProvider::new(test_config(test_settings()));

    let body = provider.format_request(
      &[Message::user("Hi")], &GenerationParameters::new()
    );

    assert_eq!(body, json!({
      "model": "test-model"
    , "messages": [{ "role": "user", "content": "Hi" }]
    , "max_tokens": 2000
    , "temperature": 0.7
    , "top_p": 1.0
    , "stream": false
    }));
}

#[test]
fn test_overrides_apply_to_one_call_only()
{   let provider = CustomApiProvider::new(test_config(test_settings()));
    let overrides = GenerationParameters::new()
      .with_model("other-model")
      .with_max_tokens(64)
      .with_temperature(0.1);

    let first = provider.format_request(&[Message::user("a")], &overrides);
    let second = provider.format_request(
      &[Message::user("a")], &GenerationParameters::new()
    );

    assert_eq!(first["model"], "other-model");
    assert_eq!(first["max_tokens"], 64);
    assert_eq!(first["temperature"], 0.1);
    assert_eq!(first["top_p"], 1.0);
    assert_eq!(second["model"], "test-model");
    assert_eq!(second["max_tokens"], 2000);
}

#[test]
fn test_whole_placeholder_keeps_message_list_structured()
{   let provider = templated(json!({ "prompt": "{{messages}}" }));

    let body = provider.format_request(
      &[Message::system("sys"), Message::user("hi")]
    , &GenerationParameters::new()
    );

    assert_eq!(body["prompt"], json!([
      { "role": "system", "content": "sys" }
    , { "role": "user", "content": "hi" }
    ]));
}

#[test]
fn test_embedded_placeholder_is_spliced_as_text()
{   let provider = templated(json!({ "note": "model={{model}}" }));

    let body = provider.format_request(
      &[Message::user("hi")], &GenerationParameters::new()
    );

    assert_eq!(body, json!({ "note": "model=test-model" }));
}

#[test]
fn test_embedded_structured_value_is_compact_json()
{   let provider = templated(json!({
      "text": "history: {{messages}} (t={{temperature}})"
    }));

    let body = provider.format_request(
      &[Message::user("hi")], &GenerationParameters::new()
    );

    let text = body["text"].as_str().unwrap();
    let inner = text
      .strip_prefix("history: ")
      .and_then(|t| t.strip_suffix(" (t=0.7)"))
      .unwrap();
    assert!(!inner.contains(' '));
    let parsed: serde_json::Value = serde_json::from_str(inner).unwrap();
    assert_eq!(parsed, json!([{ "role": "user", "content": "hi" }]));
}

#[test]
fn test_whole_numeric_placeholders_keep_their_type()
{   let provider = templated(json!({
      "config": {
        "max_tokens": "{{max_tokens}}"
      , "temperature": "{{temperature}}"
      , "top_p": "{{top_p}}"
      }
    , "model": "{{model}}"
    }));

    let body = provider.format_request(
      &[Message::user("hi")]
    , &GenerationParameters::new().with_max_tokens(128)
    );

    assert_eq!(body, json!({
      "config": { "max_tokens": 128, "temperature": 0.7, "top_p": 1.0 }
    , "model": "test-model"
    }));
}

#[test]
fn test_unknown_placeholders_and_other_values_are_untouched()
{   let provider = templated(json!({
      "keep": "{{unknown}}"
    , "mixed": "{{unknown}} and {{model}}"
    , "{{model}}": true
    , "list": ["{{top_p}}", 3, null, "plain"]
    , "n": 42
    }));

    let body = provider.format_request(
      &[Message::user("hi")], &GenerationParameters::new()
    );

    assert_eq!(body, json!({
      "keep": "{{unknown}}"
    , "mixed": "{{unknown}} and test-model"
    , "{{model}}": true
    , "list": [1.0, 3, null, "plain"]
    , "n": 42
    }));
}

#[test]
fn test_format_request_with_explicit_shape()
{   let shape = RequestShape::Templated
    {   template: json!({ "input": "{{messages}}", "stream": false })
    };
    let params = GenerationParameters::new()
      .resolve(&llm_adapter::GenerationDefaults::default());

    let body = format_request(
      &shape, &[Message::new(Role::User, "x")], &params
    );

    assert_eq!(body, json!({
      "input": [{ "role": "user", "content": "x" }]
    , "stream": false
    }));
}

#[test]
fn test_placeholder_right_after_literal_brace()
{   let provider = templated(json!({
      "wrapped": "{{{model}}}"
    , "open": "x{{{max_tokens}}"
    , "object": "{{{messages}}, \"n\": {{top_p}}}"
    , "edges": "}}{{model}}{{"
    , "twice": "{{model}}{{model}}"
    }));

    let body = provider.format_request(
      &[Message::user("hi")], &GenerationParameters::new()
    );

    assert_eq!(body["wrapped"], "{test-model}");
    assert_eq!(body["open"], "x{2000");
    assert_eq!(body["edges"], "}}test-model{{");
    assert_eq!(body["twice"], "test-modeltest-model");
    let object = body["object"].as_str().unwrap();
    assert!(object.starts_with("{[{"));
    assert!(object.ends_with("}], \"n\": 1.0}"));
    assert!(!object.contains("{{"));
}
