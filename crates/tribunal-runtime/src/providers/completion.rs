//! Shared response handling: status mapping and completion-text parsing.

use serde_json::Value as JsonValue;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use super::ProviderError;

/// Remove a surrounding markdown code fence, with or without a language tag.
///
/// Text without a leading fence is returned trimmed and otherwise untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop an info string such as `json` or `JSON` up to the first whitespace
    let tag_len = rest
        .find(|c: char| c.is_whitespace() || c == '{' || c == '[')
        .unwrap_or(rest.len());
    let body = rest[tag_len..].trim_start();

    body.strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(body)
}

/// Parse an adapter's completion text into JSON.
pub(crate) fn parse_completion(text: &str, provider: &str) -> Result<JsonValue, ProviderError> {
    serde_json::from_str(strip_code_fences(text)).map_err(|e| {
        ProviderError::MalformedOutput(format!("{provider} returned non-JSON output: {e}"))
    })
}

/// Pull `error.message` out of a provider error body, if present.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

/// Send one request and map the status line to a [`ProviderError`].
///
/// Returns the raw body on 2xx.
pub(crate) async fn send_checked(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    provider: &str,
) -> Result<String, ProviderError> {
    let HttpResponse {
        status,
        retry_after,
        body,
    } = transport.send(request).await?;

    if status == 429 {
        return Err(ProviderError::RateLimited { retry_after });
    }

    if !(200..300).contains(&status) {
        let message = error_message(&body).unwrap_or_else(|| format!("{provider} HTTP {status}"));
        return Err(ProviderError::Http { status, message });
    }

    Ok(body)
}

/// Require non-blank completion text.
pub(crate) fn non_empty(text: Option<String>, provider: &str) -> Result<String, ProviderError> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ProviderError::EmptyResponse(provider.to_string()))
}
