//! Uniform result contract returned by every archive operation

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Outcome of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Status/message pair with an optional operation-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response<T> {
    /// Whether the operation succeeded
    pub status: Status,
    /// Human-readable result or failure description
    pub message: String,
    /// Failure class, present only when `status` is `Error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Operation-specific data, present only on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> Response<T> {
    /// Successful response without payload
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
            kind: None,
            payload: None,
        }
    }

    /// Successful response carrying a payload
    pub fn ok_with(message: impl Into<String>, payload: T) -> Self {
        Self {
            payload: Some(payload),
            ..Self::ok(message)
        }
    }

    /// Failed response built from an error
    pub fn from_error(err: &Error) -> Self {
        Self {
            status: Status::Error,
            message: err.to_string(),
            kind: Some(err.kind()),
            payload: None,
        }
    }

    /// Convert an internal result into the caller-facing contract.
    ///
    /// `on_ok` builds the success response from the operation's value.
    pub fn from_result<V>(
        operation: &str,
        result: crate::Result<V>,
        on_ok: impl FnOnce(V) -> Self,
    ) -> Self {
        match result {
            Ok(value) => on_ok(value),
            Err(err) => {
                warn!("{} failed ({}): {}", operation, err.kind(), err);
                Self::from_error(&err)
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_serialization() {
        let response: Response<()> = Response::ok("Test passed for a.zip");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["message"], "Test passed for a.zip");
        assert!(json.get("kind").is_none());
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_error_response_carries_kind() {
        let err = Error::FileExists("out.zip".to_string());
        let response: Response<()> = Response::from_error(&err);

        assert!(!response.is_ok());
        assert_eq!(response.kind, Some(ErrorKind::AlreadyExists));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "AlreadyExists");
        assert_eq!(json["message"], "File exists: out.zip");
    }

    #[test]
    fn test_from_result() {
        let ok: Response<u32> = Response::from_result("count", Ok(3), |n| Response::ok_with("counted", n));
        assert_eq!(ok.payload, Some(3));

        let failed: Response<u32> = Response::from_result(
            "count",
            Err::<u32, _>(Error::Corrupt("a.txt".to_string())),
            |n| Response::ok_with("counted", n),
        );
        assert_eq!(failed.status, Status::Error);
        assert_eq!(failed.message, "a.txt");
        assert!(failed.payload.is_none());
    }
}
