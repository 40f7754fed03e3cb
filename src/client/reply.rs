use crate::error::ClientError;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// A response, whatever its status.
///
/// Cases assert on replies; only failures to get a reply at all surface as
/// [`ClientError`].
#[derive(Debug, Clone)]
pub struct Reply {
    method: String,
    url: String,
    status: StatusCode,
    body: Bytes,
}

impl Reply {
    pub fn new(method: impl Into<String>, url: impl Into<String>, status: StatusCode, body: Bytes) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status,
            body,
        }
    }

    /// `true` for any 2xx status.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body as JSON into `T`; `what` names the payload in errors.
    pub fn json<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|source| ClientError::Decode {
            what,
            method: self.method.clone(),
            url: self.url.clone(),
            source,
        })
    }

    /// `METHOD url -> status`, used in assertion messages.
    pub fn describe(&self) -> String {
        format!("{} {} -> {}", self.method, self.url, self.status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Pet;

    #[test]
    fn ok_means_2xx() {
        let reply = Reply::new("GET", "http://x/pet/1", StatusCode::NO_CONTENT, Bytes::new());
        assert!(reply.ok());
        let reply = Reply::new("GET", "http://x/pet/1", StatusCode::NOT_FOUND, Bytes::new());
        assert!(!reply.ok());
        assert_eq!(reply.describe(), "GET http://x/pet/1 -> 404");
    }

    #[test]
    fn json_errors_name_the_payload() {
        let reply = Reply::new("GET", "http://x/pet/1", StatusCode::OK, Bytes::from_static(b"<html>"));
        let err = reply.json::<Pet>("pet").unwrap_err();
        assert!(err.to_string().starts_with("cannot decode pet from GET http://x/pet/1"));
    }
}
