//! Printing responses and mapping them to exit codes

use anyhow::Result;
use serde::Serialize;
use zipkit_core::{ErrorKind, Response, Status};

/// Print `response` as pretty JSON on stdout and return the exit code
pub fn emit<T: Serialize>(response: &Response<T>) -> Result<i32> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(exit_code(response.status, response.kind))
}

/// Exit code for a response: 0 on success, otherwise by failure kind
pub fn exit_code(status: Status, kind: Option<ErrorKind>) -> i32 {
    if status == Status::Ok {
        return 0;
    }

    match kind {
        Some(ErrorKind::NotFound) => 2,
        Some(ErrorKind::InvalidInput) | Some(ErrorKind::AlreadyExists) => 3,
        Some(ErrorKind::Corrupt) => 4,
        Some(ErrorKind::Unexpected) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Status::Ok, None), 0);
        assert_eq!(exit_code(Status::Error, Some(ErrorKind::NotFound)), 2);
        assert_eq!(exit_code(Status::Error, Some(ErrorKind::AlreadyExists)), 3);
        assert_eq!(exit_code(Status::Error, Some(ErrorKind::InvalidInput)), 3);
        assert_eq!(exit_code(Status::Error, Some(ErrorKind::Corrupt)), 4);
        assert_eq!(exit_code(Status::Error, Some(ErrorKind::Unexpected)), 1);
        assert_eq!(exit_code(Status::Error, None), 1);
    }
}
