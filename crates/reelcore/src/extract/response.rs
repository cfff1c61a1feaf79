//! Extraction API payload shapes
//!
//! The API answers with one of several JSON contracts at once (current and
//! legacy). Shapes are tried in a fixed order and the first match wins:
//!
//! | # | Shape                                              | Outcome           |
//! |---|----------------------------------------------------|-------------------|
//! | a | `{status: "redirect" \| "success", url: string}`   | media URL         |
//! | b | `{status: "error", error: string \| {code}}`       | upstream error    |
//! | c | `{downloadUrl: string}` or `{url: string}`, no status | media URL      |
//! | d | anything else                                      | unknown response  |

use serde_json::{Map, Value};

use crate::error::ExtractError;

/// Media URL on success, otherwise the reason the payload was rejected
pub type ApiOutcome = Result<String, ExtractError>;

/// A 2xx payload matched against the known shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    /// a. `status` is `redirect` or `success`
    Media { url: String },
    /// b. `status` is `error`
    Error { message: String },
    /// c. no `status`, bare `downloadUrl`/`url`
    Legacy { url: String },
    /// d. nothing recognized
    Unknown,
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// `error` as a plain string or as `{code: string}`
fn error_message(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("error")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(inner) => non_empty_str(inner, "code").map(str::to_string),
        _ => None,
    }
}

impl ApiResponse {
    /// Matches a payload against the shape list.
    pub fn parse(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return ApiResponse::Unknown;
        };

        match obj.get("status") {
            Some(Value::String(status)) => match status.as_str() {
                "redirect" | "success" => non_empty_str(obj, "url")
                    .map(|url| ApiResponse::Media { url: url.to_string() })
                    .unwrap_or(ApiResponse::Unknown),
                "error" => error_message(obj)
                    .map(|message| ApiResponse::Error { message })
                    .unwrap_or(ApiResponse::Unknown),
                _ => ApiResponse::Unknown,
            },
            None | Some(Value::Null) => non_empty_str(obj, "downloadUrl")
                .or_else(|| non_empty_str(obj, "url"))
                .map(|url| ApiResponse::Legacy { url: url.to_string() })
                .unwrap_or(ApiResponse::Unknown),
            Some(_) => ApiResponse::Unknown,
        }
    }

    pub fn into_outcome(self) -> ApiOutcome {
        match self {
            ApiResponse::Media { url } | ApiResponse::Legacy { url } => Ok(url),
            ApiResponse::Error { message } => Err(ExtractError::Upstream(message)),
            ApiResponse::Unknown => Err(ExtractError::UnknownResponse),
        }
    }

    /// Shorthand for `parse` followed by `into_outcome`
    pub fn classify(value: &Value) -> ApiOutcome {
        Self::parse(value).into_outcome()
    }
}

/// Detail for a non-2xx answer: `error`, then `details`, then `HTTP <status>`.
pub fn server_error_detail(body: &str, status: u16) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|obj| error_message(obj).or_else(|| non_empty_str(obj, "details").map(str::to_string)))
        .unwrap_or_else(|| format!("HTTP {}", status))
}
