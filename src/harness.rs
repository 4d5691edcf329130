//! Invocation harness: one JSON request on stdin, one envelope on stdout.
//!
//! Whatever happens inside a handler, the process writes parseable JSON and
//! exits with a status reflecting the outcome. "Found nothing" is a success;
//! only faults are failures.

use std::future::Future;
use std::process::ExitCode;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The uniform result object every capability returns.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the invocation succeeded. Empty results still succeed.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Extracted records; absent when nothing was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Machine-readable failure metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable kind, e.g. "session_busy".
    pub kind: String,
    /// Full error chain.
    pub detail: String,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn success(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>, error: Option<ErrorInfo>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

/// Classify an error for the envelope, falling back to "internal" for
/// faults outside the typed taxonomy.
pub fn error_info(err: &anyhow::Error) -> ErrorInfo {
    let kind = err.downcast_ref::<Error>().map_or("internal", Error::kind);
    ErrorInfo {
        kind: kind.to_string(),
        detail: format!("{err:#}"),
    }
}

/// Read the request, run the handler, emit the envelope, map the exit code.
///
/// Every fault ends up inside an envelope: a malformed request, a handler
/// error, anything. The handler owns its Session through the scoped
/// acquisition helper, so by the time an error reaches this boundary no
/// lock is left behind.
pub async fn run<I, T, F, Fut>(handler: F) -> ExitCode
where
    I: DeserializeOwned,
    T: Serialize,
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = anyhow::Result<Envelope<T>>>,
{
    let envelope = match read_request::<I>() {
        Ok(request) => match handler(request).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "Handler failed");
                Envelope::failure(format!("{err:#}"), Some(error_info(&err)))
            }
        },
        Err(err) => Envelope::failure(
            format!("invalid request: {err}"),
            Some(ErrorInfo {
                kind: "invalid_request".to_string(),
                detail: err.to_string(),
            }),
        ),
    };

    emit(&envelope);
    if envelope.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Write the envelope as the process's single line of stdout.
pub fn emit<T: Serialize>(envelope: &Envelope<T>) {
    match serde_json::to_string(envelope) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            tracing::error!(error = %err, "Failed to serialize envelope");
            println!(r#"{{"success":false,"message":"internal serialization failure"}}"#);
        }
    }
}

fn read_request<I: DeserializeOwned>() -> anyhow::Result<I> {
    use std::io::Read;
    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;
    parse_request(&raw)
}

/// Empty stdin is an empty request object, so capabilities whose fields all
/// have defaults run without any input.
pub fn parse_request<I: DeserializeOwned>(raw: &str) -> anyhow::Result<I> {
    let trimmed = raw.trim();
    let body = if trimmed.is_empty() { "{}" } else { trimmed };
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct SampleRequest {
        #[serde(default)]
        count: Option<usize>,
    }

    #[test]
    fn test_empty_stdin_parses_as_defaults() {
        let request: SampleRequest = parse_request("").unwrap();
        assert_eq!(request, SampleRequest { count: None });
        let request: SampleRequest = parse_request("  \n ").unwrap();
        assert_eq!(request, SampleRequest { count: None });
    }

    #[test]
    fn test_garbage_request_errors() {
        assert!(parse_request::<SampleRequest>("not json").is_err());
        assert!(parse_request::<SampleRequest>("{\"count\": \"x\"}").is_err());
    }

    #[test]
    fn test_success_envelope_omits_error_and_empty_data() {
        let envelope: Envelope<Vec<u32>> = Envelope::success("found nothing", None);
        let json = serde_json::to_value(&envelope).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object["success"], true);
        assert!(!object.contains_key("data"));
        assert!(!object.contains_key("error"));
    }

    #[test]
    fn test_failure_envelope_carries_kind() {
        let err = anyhow::Error::from(Error::SessionBusy("held by 42".to_string()));
        let envelope: Envelope<()> = Envelope::failure("busy", Some(error_info(&err)));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["kind"], "session_busy");
        assert_eq!(json["success"], false);
    }

    #[test]
    fn test_unknown_errors_classify_as_internal() {
        let err = anyhow::anyhow!("something odd");
        assert_eq!(error_info(&err).kind, "internal");
    }
}
