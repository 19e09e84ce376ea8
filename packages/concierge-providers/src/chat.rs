use std::{sync::OnceLock, time::Duration};

use color_eyre::{Result, eyre};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

/// One chat-completion call expected to return structured JSON. No inline
/// retry: each pipeline stage owns its own fallback when the output is
/// malformed.
pub async fn complete(cfg: &concierge_config::LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_chat_json(json)
}

fn parse_chat_json(json: Value) -> Result<Value> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		let stripped = strip_code_fences(content);
		let parsed: Value = serde_json::from_str(stripped.trim())
			.map_err(|_| eyre::eyre!("Chat content is not valid JSON."))?;

		return Ok(parsed);
	}

	if json.is_object() {
		return Ok(json);
	}

	Err(eyre::eyre!("Chat response is missing JSON content."))
}

/// Models occasionally wrap their JSON in a markdown fence despite the
/// instructions; tolerate it.
fn strip_code_fences(content: &str) -> String {
	static FENCE: OnceLock<Regex> = OnceLock::new();
	let fence = FENCE.get_or_init(|| Regex::new(r"```(?:json)?\n?").expect("static regex"));

	fence.replace_all(content.trim(), "").into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_choice_content_json() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"queries\": []}" } }
			]
		});
		let parsed = parse_chat_json(json).expect("parse failed");
		assert!(parsed.get("queries").is_some());
	}

	#[test]
	fn strips_markdown_fences() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"kind\": \"tourism\"}\n```" } }
			]
		});
		let parsed = parse_chat_json(json).expect("parse failed");
		assert_eq!(parsed.get("kind").and_then(|v| v.as_str()), Some("tourism"));
	}

	#[test]
	fn rejects_non_json_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "Sure! Here are some ideas." } }
			]
		});
		assert!(parse_chat_json(json).is_err());
	}
}
