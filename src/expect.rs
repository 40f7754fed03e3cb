//! Assertions that return [`CaseError`] instead of panicking.
//!
//! Case bodies chain these with `?`, so the first failed expectation aborts
//! the remainder of the case and the lease still gets to clean up.

use crate::client::Reply;
use crate::error::CaseError;
use std::fmt::Debug;

/// The reply carries a 2xx status.
pub fn expect_ok(reply: &Reply, step: &str) -> Result<(), CaseError> {
    if reply.ok() {
        Ok(())
    } else {
        Err(CaseError::assertion(
            step,
            format!("expected a 2xx response, got {}: {}", reply.describe(), snippet(reply)),
        ))
    }
}

/// The reply carries anything but a 2xx status.
pub fn expect_not_ok(reply: &Reply, step: &str) -> Result<(), CaseError> {
    if reply.ok() {
        Err(CaseError::assertion(
            step,
            format!("expected a non-2xx response, got {}", reply.describe()),
        ))
    } else {
        Ok(())
    }
}

/// The reply carries exactly `status`.
pub fn expect_status(reply: &Reply, status: u16, step: &str) -> Result<(), CaseError> {
    if reply.status().as_u16() == status {
        Ok(())
    } else {
        Err(CaseError::assertion(
            step,
            format!("expected status {status}, got {}: {}", reply.describe(), snippet(reply)),
        ))
    }
}

pub fn expect_eq<T>(actual: T, expected: T, step: &str) -> Result<(), CaseError>
where
    T: PartialEq + Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(CaseError::assertion(
            step,
            format!("expected {expected:?}, got {actual:?}"),
        ))
    }
}

pub fn expect_true(condition: bool, step: &str, message: impl Into<String>) -> Result<(), CaseError> {
    if condition {
        Ok(())
    } else {
        Err(CaseError::assertion(step, message))
    }
}

fn snippet(reply: &Reply) -> String {
    let text = reply.text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(200).collect()
}
