//! Buffered responses and classification of failed ones.

use std::sync::LazyLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, ErrorKind, Result};

/// `<15+ char org/session prefix>!<opaque>` as found in access tokens.
static ACCESS_TOKEN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}![A-Za-z0-9_.]+").expect("access token regex")
});

static SID_PARAM: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"sid=[A-Za-z0-9]{20,}").expect("sid regex"));

const MAX_MESSAGE_CHARS: usize = 500;

/// A response whose body has already been read.
///
/// Holding the body as a string lets callers report the provider's own
/// text whatever the status was.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: u16,
    body: String,
}

impl RawResponse {
    pub(crate) fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body exactly as received.
    pub fn into_body(self) -> String {
        self.body
    }

    /// Decode the body as JSON regardless of status.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turn a non-2xx response into a classified [`Error`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(classify_failure(self.status, &self.body))
        }
    }
}

/// One entry of the REST error array.
#[derive(Debug, Deserialize)]
struct ApiFault {
    #[serde(rename = "errorCode")]
    error_code: String,
    message: String,
}

/// REST endpoints usually answer with an array of faults, occasionally a
/// single object. The first fault wins.
fn first_fault(body: &str) -> Option<ApiFault> {
    serde_json::from_str::<Vec<ApiFault>>(body)
        .ok()
        .and_then(|faults| faults.into_iter().next())
        .or_else(|| serde_json::from_str::<ApiFault>(body).ok())
}

pub(crate) fn classify_failure(status: u16, body: &str) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited);
    }

    let fault = first_fault(body);
    let kind = match (status, fault) {
        (401 | 403, Some(fault)) => ErrorKind::Unauthorized {
            status,
            message: format!("{}: {}", fault.error_code, redact(&fault.message)),
        },
        (401 | 403, None) => ErrorKind::Unauthorized {
            status,
            message: redact(body),
        },
        (_, Some(fault)) => ErrorKind::Api {
            status,
            error_code: fault.error_code,
            message: redact(&fault.message),
        },
        (_, None) => ErrorKind::Status {
            status,
            message: redact(body),
        },
    };
    Error::new(kind)
}

/// Mask access tokens and session ids, and cap the length.
pub(crate) fn redact(message: &str) -> String {
    let masked = ACCESS_TOKEN.replace_all(message, "[REDACTED_TOKEN]");
    let masked = SID_PARAM.replace_all(&masked, "sid=[REDACTED]");

    if masked.chars().count() <= MAX_MESSAGE_CHARS {
        return masked.into_owned();
    }
    let mut capped: String = masked.chars().take(MAX_MESSAGE_CHARS).collect();
    capped.push_str("...[truncated]");
    capped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_masks_tokens_and_sids() {
        let out = redact("bad token 00D5e000000AbCdE!ARwAQFake.value_1 in header");
        assert_eq!(out, "bad token [REDACTED_TOKEN] in header");

        let out = redact("https://x.my.salesforce.com/?sid=A1b2C3d4E5f6G7h8I9j0K1");
        assert!(out.ends_with("sid=[REDACTED]"), "{out}");
    }

    #[test]
    fn test_redact_caps_length_and_keeps_short_text() {
        let out = redact(&"é".repeat(800));
        assert_eq!(out.chars().count(), MAX_MESSAGE_CHARS + "...[truncated]".len());

        assert_eq!(redact("Case is read-only"), "Case is read-only");
    }

    #[test]
    fn test_rest_fault_array_becomes_api_error() {
        let body = r#"[{"errorCode":"INVALID_FIELD","message":"No such column 'Bogus__c'","fields":["Bogus__c"]}]"#;
        match classify_failure(400, body).kind {
            ErrorKind::Api {
                status,
                error_code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(error_code, "INVALID_FIELD");
                assert_eq!(message, "No such column 'Bogus__c'");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_single_fault_object_is_understood() {
        let body = r#"{"errorCode":"NOT_FOUND","message":"The requested resource does not exist"}"#;
        let err = classify_failure(404, body);
        assert!(matches!(err.kind, ErrorKind::Api { status: 404, .. }));
    }

    #[test]
    fn test_rejected_session_keeps_error_code() {
        let body = r#"[{"errorCode":"INVALID_SESSION_ID","message":"Session expired or invalid"}]"#;
        let err = classify_failure(401, body);
        assert!(err.is_auth_error());
        assert!(err.to_string().contains("INVALID_SESSION_ID"));
    }

    #[test]
    fn test_unstructured_bodies_fall_back_on_status() {
        assert!(classify_failure(403, "<html>denied</html>").is_auth_error());
        assert!(matches!(
            classify_failure(502, "Bad Gateway").kind,
            ErrorKind::Status { status: 502, .. }
        ));
        assert!(matches!(
            classify_failure(429, "[]").kind,
            ErrorKind::RateLimited
        ));
    }

    #[test]
    fn test_error_for_status_passes_success_through() {
        let ok = RawResponse::new(204, String::new()).error_for_status().unwrap();
        assert_eq!(ok.status(), 204);

        let err = RawResponse::new(500, "boom".into())
            .error_for_status()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Status { status: 500, .. }));
    }
}
