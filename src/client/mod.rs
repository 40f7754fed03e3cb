//! # Client Module
//!
//! Typed async client for the pet-store endpoints the suite exercises.
//!
//! ## Endpoints
//!
//! | operation                 | request                                  | body        |
//! |---------------------------|------------------------------------------|-------------|
//! | `add_pet`                 | `POST pet`                               | JSON        |
//! | `get_pet`                 | `GET pet/{id}`                           | -           |
//! | `find_by_status`          | `GET pet/findByStatus?status=`           | -           |
//! | `update_pet`              | `PUT pet`                                | JSON        |
//! | `update_pet_with_form`    | `POST pet/{id}`                          | form        |
//! | `delete_pet`              | `DELETE pet/{id}`                        | -           |
//! | `upload_image`            | `POST pet/{id}/uploadImage`              | multipart   |
//!
//! All paths are relative to the configured base origin. Every request
//! carries the `api_key` header and an `x-request-id` ULID.
//!
//! ## Replies, Not Errors
//!
//! An operation returns `Ok(Reply)` for every HTTP status, including 4xx and
//! 5xx; negative cases need to see those. `Err` means no response arrived.
//!
//! ## Traces
//!
//! A client built with [`PetStoreClient::with_trace`] appends every exchange
//! to a [`TraceRecorder`]. The `api_key` value is redacted in the recording.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use petstore_e2e::client::PetStoreClient;
//! use petstore_e2e::config::RunConfig;
//! use petstore_e2e::model::Pet;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PetStoreClient::new(&RunConfig::defaults(false))?;
//! let pet = Pet::fresh();
//! let created = client.add_pet(&pet).await?;
//! assert!(created.ok());
//! client.delete_pet(pet.id).await?;
//! # Ok(())
//! # }
//! ```

mod reply;
mod trace;

pub use reply::Reply;
pub use trace::{TraceBody, TraceEntry, TraceRecorder, MAX_TRACE_BODY_BYTES, REDACTED};

use crate::config::RunConfig;
use crate::error::ClientError;
use crate::ids::{PetId, RequestId};
use crate::model::{Pet, PetStatus};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use std::time::Instant;
use tracing::debug;
use url::Url;

pub const API_KEY_HEADER: &str = "api_key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// File attached by [`PetStoreClient::upload_image`].
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn jpeg(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: "image/jpeg".to_string(),
            bytes,
        }
    }
}

enum Outgoing {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        file_field: &'static str,
        upload: ImageUpload,
    },
}

impl Outgoing {
    fn describe(&self) -> TraceBody {
        match self {
            Outgoing::Empty => TraceBody::Empty,
            Outgoing::Json(json) => TraceBody::Json { json: json.clone() },
            Outgoing::Form(fields) => TraceBody::Form {
                fields: fields.clone(),
            },
            Outgoing::Multipart { fields, upload, .. } => TraceBody::Multipart {
                fields: fields.iter().map(|(name, _)| name.clone()).collect(),
                file: upload.file_name.clone(),
                bytes: upload.bytes.len(),
            },
        }
    }

    fn attach(self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        Ok(match self {
            Outgoing::Empty => builder,
            Outgoing::Json(json) => builder.json(&json),
            Outgoing::Form(fields) => builder.form(&fields),
            Outgoing::Multipart {
                fields,
                file_field,
                upload,
            } => {
                let part = Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(&upload.mime_type)
                    .map_err(ClientError::Multipart)?;
                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value))
                    .part(file_field, part);
                builder.multipart(form)
            }
        })
    }
}

/// Client for one base origin. Cheap to clone; clones share the connection
/// pool and, when set, the trace recorder.
#[derive(Debug, Clone)]
pub struct PetStoreClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    trace: Option<TraceRecorder>,
}

impl PetStoreClient {
    /// Build a client from the run configuration. The configured timeout
    /// bounds each individual request.
    pub fn new(config: &RunConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("petstore-e2e/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self::from_parts(http, config.base_url.clone(), config.api_key.clone()))
    }

    pub fn from_parts(http: reqwest::Client, base_url: Url, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            trace: None,
        }
    }

    /// A client sharing this one's connection pool that records into `recorder`.
    #[must_use]
    pub fn with_trace(&self, recorder: TraceRecorder) -> Self {
        Self {
            trace: Some(recorder),
            ..self.clone()
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn trace(&self) -> Option<&TraceRecorder> {
        self.trace.as_ref()
    }

    /// `POST pet` with a typed pet.
    pub async fn add_pet(&self, pet: &Pet) -> Result<Reply, ClientError> {
        let json = serde_json::to_value(pet).map_err(|source| ClientError::Encode {
            what: "pet",
            source,
        })?;
        self.add_pet_raw(&json).await
    }

    /// `POST pet` with an arbitrary JSON body, for payloads the typed model
    /// cannot express (malformed ids).
    pub async fn add_pet_raw(&self, body: &serde_json::Value) -> Result<Reply, ClientError> {
        self.send(Method::POST, "pet", &[], Outgoing::Json(body.clone()))
            .await
    }

    /// `GET pet/{id}`.
    pub async fn get_pet(&self, id: PetId) -> Result<Reply, ClientError> {
        self.send(Method::GET, &format!("pet/{id}"), &[], Outgoing::Empty)
            .await
    }

    /// `GET pet/findByStatus?status=...`.
    pub async fn find_by_status(&self, status: PetStatus) -> Result<Reply, ClientError> {
        self.send(
            Method::GET,
            "pet/findByStatus",
            &[("status", status.as_str())],
            Outgoing::Empty,
        )
        .await
    }

    /// `PUT pet`: full replace.
    pub async fn update_pet(&self, pet: &Pet) -> Result<Reply, ClientError> {
        let json = serde_json::to_value(pet).map_err(|source| ClientError::Encode {
            what: "pet",
            source,
        })?;
        self.send(Method::PUT, "pet", &[], Outgoing::Json(json)).await
    }

    /// `POST pet/{id}` with form-encoded `petId`, `name` and `status`.
    pub async fn update_pet_with_form(
        &self,
        id: PetId,
        name: Option<&str>,
        status: Option<PetStatus>,
    ) -> Result<Reply, ClientError> {
        let mut fields = vec![("petId".to_string(), id.to_string())];
        if let Some(name) = name {
            fields.push(("name".to_string(), name.to_string()));
        }
        if let Some(status) = status {
            fields.push(("status".to_string(), status.as_str().to_string()));
        }
        self.send(Method::POST, &format!("pet/{id}"), &[], Outgoing::Form(fields))
            .await
    }

    /// `DELETE pet/{id}`.
    pub async fn delete_pet(&self, id: PetId) -> Result<Reply, ClientError> {
        self.send(Method::DELETE, &format!("pet/{id}"), &[], Outgoing::Empty)
            .await
    }

    /// `POST pet/{id}/uploadImage` as multipart: a `petId` field and the file
    /// under `file`.
    pub async fn upload_image(&self, id: PetId, upload: ImageUpload) -> Result<Reply, ClientError> {
        let outgoing = Outgoing::Multipart {
            fields: vec![("petId".to_string(), id.to_string())],
            file_field: "file",
            upload,
        };
        self.send(Method::POST, &format!("pet/{id}/uploadImage"), &[], outgoing)
            .await
    }

    /// Resolve a relative path (and optional query) against the base origin.
    pub fn resolve(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ClientError::Url {
                path: path.to_string(),
                source,
            })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Outgoing,
    ) -> Result<Reply, ClientError> {
        let url = self.resolve(path, query)?;
        let request_id = RequestId::new();
        let trace_body = self.trace.as_ref().map(|_| body.describe());

        let builder = self
            .http
            .request(method.clone(), url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .header(ACCEPT, "application/json");
        let builder = body.attach(builder)?;

        let started = Instant::now();
        let outcome = async {
            let response = builder.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        }
        .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &outcome {
            Ok((status, bytes)) => debug!(
                request_id = %request_id,
                method = %method,
                url = %url,
                status = status.as_u16(),
                bytes = bytes.len(),
                elapsed_ms,
                "pet-store exchange"
            ),
            Err(err) => debug!(
                request_id = %request_id,
                method = %method,
                url = %url,
                error = %err,
                elapsed_ms,
                "pet-store request failed"
            ),
        }

        if let (Some(recorder), Some(request_body)) = (&self.trace, trace_body) {
            recorder.push(TraceEntry {
                sequence: recorder.next_sequence(),
                request_id,
                method: method.to_string(),
                url: url.to_string(),
                request_headers: vec![
                    (API_KEY_HEADER.to_string(), REDACTED.to_string()),
                    (REQUEST_ID_HEADER.to_string(), request_id.to_string()),
                    (ACCEPT.as_str().to_string(), "application/json".to_string()),
                ],
                request_body,
                status: outcome.as_ref().ok().map(|(status, _)| status.as_u16()),
                response_body: outcome
                    .as_ref()
                    .ok()
                    .map(|(_, bytes)| trace::truncate_body(bytes)),
                elapsed_ms,
                error: outcome.as_ref().err().map(ToString::to_string),
            });
        }

        let (status, bytes) = outcome.map_err(|source| ClientError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source,
        })?;
        Ok(Reply::new(method.as_str(), url.as_str(), status, bytes))
    }
}
