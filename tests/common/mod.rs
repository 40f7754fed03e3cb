#![allow(dead_code)]

pub mod mock_store {
    //! In-process pet store speaking the subset of the Swagger pet-store API
    //! the suite uses. Runs on a std thread; dropped stores shut down.

    use petstore_e2e::config::RunConfig;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::net::SocketAddr;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::thread::JoinHandle;
    use std::time::Duration;
    use tiny_http::{Header, Method, Request, Response, Server};

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub path: String,
        pub api_key: Option<String>,
        pub request_id: Option<String>,
    }

    #[derive(Default)]
    struct State {
        pets: BTreeMap<u64, Value>,
        requests: Vec<RecordedRequest>,
        uploads: Vec<(u64, usize)>,
        fail_next: usize,
        ignore_updates: bool,
        stall_next_create: Option<Duration>,
    }

    /// Pet owned by "someone else", always listed by findByStatus.
    fn resident() -> Value {
        json!({
            "id": 9_223_372_036_854_775_807u64,
            "name": "resident",
            "photoUrls": [],
            "tags": [],
            "status": "available"
        })
    }

    pub struct MockPetStore {
        addr: SocketAddr,
        server: Arc<Server>,
        state: Arc<Mutex<State>>,
        handle: Option<JoinHandle<()>>,
    }

    impl MockPetStore {
        pub fn start() -> Self {
            let server = Arc::new(Server::http("127.0.0.1:0").expect("http server"));
            let addr = server.server_addr().to_ip().expect("ip listener");
            let state = Arc::new(Mutex::new(State::default()));

            let handle = {
                let server = Arc::clone(&server);
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for request in server.incoming_requests() {
                        handle_request(&state, request);
                    }
                })
            };

            Self {
                addr,
                server,
                state,
                handle: Some(handle),
            }
        }

        pub fn base_url(&self) -> String {
            format!("http://{}/v2/", self.addr)
        }

        /// Local defaults pointed at this store, writing under `output_dir`.
        pub fn config(&self, output_dir: &Path) -> RunConfig {
            let mut config = RunConfig::for_base_url(&self.base_url()).expect("mock base url");
            config.output_dir = output_dir.to_path_buf();
            config.asset_path = super::asset_path().into();
            config.reporters = Vec::new();
            config
        }

        pub fn pet_count(&self) -> usize {
            self.state.lock().unwrap().pets.len()
        }

        pub fn pet(&self, id: u64) -> Option<Value> {
            self.state.lock().unwrap().pets.get(&id).cloned()
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.state.lock().unwrap().requests.clone()
        }

        pub fn uploads(&self) -> Vec<(u64, usize)> {
            self.state.lock().unwrap().uploads.clone()
        }

        /// Answer the next `n` requests with 500.
        pub fn fail_next(&self, n: usize) {
            self.state.lock().unwrap().fail_next = n;
        }

        /// Store the next created pet, then hold the response for `delay`.
        pub fn stall_next_create(&self, delay: Duration) {
            self.state.lock().unwrap().stall_next_create = Some(delay);
        }

        /// Poll until the store holds no pets or two seconds pass; returns the
        /// final count. Deletes scheduled by dropped leases land asynchronously.
        pub async fn settled_pet_count(&self) -> usize {
            for _ in 0..100 {
                if self.pet_count() == 0 {
                    return 0;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            self.pet_count()
        }

        /// Accept `PUT pet` and form updates without applying them.
        pub fn ignore_updates(&self, ignore: bool) {
            self.state.lock().unwrap().ignore_updates = ignore;
        }
    }

    impl Drop for MockPetStore {
        fn drop(&mut self) {
            self.server.unblock();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }

    fn header(request: &Request, name: &str) -> Option<String> {
        request
            .headers()
            .iter()
            .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str().to_string())
    }

    fn json_response(status: u16, body: &Value) -> Response<std::io::Cursor<Vec<u8>>> {
        Response::from_string(body.to_string())
            .with_status_code(status)
            .with_header(Header::from_bytes("Content-Type", "application/json").unwrap())
    }

    fn message(code: u16, kind: &str, message: &str) -> Value {
        json!({ "code": code, "type": kind, "message": message })
    }

    fn numeric_id(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn handle_request(state: &Mutex<State>, mut request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
        let path = path.to_string();
        let query = query.to_string();
        let content_type = header(&request, "content-type").unwrap_or_default();

        let mut body = Vec::new();
        let _ = request.as_reader().read_to_end(&mut body);

        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            api_key: header(&request, "api_key"),
            request_id: header(&request, "x-request-id"),
        });

        if state.fail_next > 0 {
            state.fail_next -= 1;
            drop(state);
            let _ = request.respond(json_response(500, &message(500, "unknown", "something bad happened")));
            return;
        }

        let segments: Vec<&str> = path
            .trim_start_matches("/v2/")
            .trim_end_matches('/')
            .split('/')
            .collect();
        let stall = match (&method, segments.as_slice()) {
            (Method::Post, ["pet"]) => state.stall_next_create.take(),
            _ => None,
        };
        let (status, response) = match (&method, segments.as_slice()) {
            (Method::Post, ["pet"]) => upsert(&mut state, &body, false),
            (Method::Put, ["pet"]) => upsert(&mut state, &body, true),
            (Method::Get, ["pet", "findByStatus"]) => find_by_status(&state, &query),
            (Method::Get, ["pet", id]) => match id.parse::<u64>().ok().and_then(|id| state.pets.get(&id)) {
                Some(pet) => (200, pet.clone()),
                None => (404, message(1, "error", "Pet not found")),
            },
            (Method::Post, ["pet", id]) => form_update(&mut state, id, &content_type, &body),
            (Method::Delete, ["pet", id]) => {
                match id.parse::<u64>().ok().and_then(|id| state.pets.remove(&id)) {
                    Some(_) => (200, message(200, "unknown", id)),
                    None => (404, Value::Null),
                }
            }
            (Method::Post, ["pet", id, "uploadImage"]) => upload(&mut state, id, &content_type, &body),
            _ => (405, message(405, "unknown", "method not allowed")),
        };
        drop(state);
        if let Some(delay) = stall {
            std::thread::sleep(delay);
        }

        let response = if response.is_null() {
            Response::from_string(String::new()).with_status_code(status)
        } else {
            json_response(status, &response)
        };
        let _ = request.respond(response);
    }

    fn upsert(state: &mut State, body: &[u8], replace: bool) -> (u16, Value) {
        let Ok(mut pet) = serde_json::from_slice::<Value>(body) else {
            return (400, message(400, "unknown", "bad input"));
        };
        let Some(id) = pet.get("id").and_then(numeric_id) else {
            return (500, message(500, "unknown", "something bad happened"));
        };
        pet["id"] = json!(id);
        if replace {
            if !state.pets.contains_key(&id) {
                return (404, message(1, "error", "Pet not found"));
            }
            if state.ignore_updates {
                return (200, pet);
            }
        }
        state.pets.insert(id, pet.clone());
        (200, pet)
    }

    fn find_by_status(state: &State, query: &str) -> (u16, Value) {
        let wanted: Vec<String> = url::form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == "status")
            .map(|(_, value)| value.into_owned())
            .collect();
        let pets: Vec<Value> = std::iter::once(resident())
            .chain(state.pets.values().cloned())
            .filter(|pet| {
                pet.get("status")
                    .and_then(Value::as_str)
                    .is_some_and(|status| wanted.iter().any(|w| w == status))
            })
            .collect();
        (200, Value::Array(pets))
    }

    fn form_update(state: &mut State, id: &str, content_type: &str, body: &[u8]) -> (u16, Value) {
        if !content_type.starts_with("application/x-www-form-urlencoded") {
            return (415, message(415, "unknown", "unsupported media type"));
        }
        let Some(pet) = id.parse::<u64>().ok().and_then(|id| state.pets.get_mut(&id)) else {
            return (404, message(404, "unknown", "not found"));
        };
        if !state.ignore_updates {
            for (key, value) in url::form_urlencoded::parse(body) {
                match key.as_ref() {
                    "name" => pet["name"] = json!(value),
                    "status" => pet["status"] = json!(value),
                    _ => {}
                }
            }
        }
        (200, message(200, "unknown", id))
    }

    fn upload(state: &mut State, id: &str, content_type: &str, body: &[u8]) -> (u16, Value) {
        if !content_type.starts_with("multipart/form-data") {
            return (415, message(415, "unknown", "unsupported media type"));
        }
        let text = String::from_utf8_lossy(body).to_lowercase();
        let has_file = text.contains(r#"name="file""#) && text.contains("content-type: image/jpeg");
        let has_pet_id = text.contains(r#"name="petid""#);
        let Some(id) = id.parse::<u64>().ok().filter(|_| has_file && has_pet_id) else {
            return (400, message(400, "unknown", "bad upload"));
        };
        state.uploads.push((id, body.len()));
        (
            200,
            message(
                200,
                "unknown",
                &format!("additionalMetadata: null\nFile uploaded to ./dog.jpeg, {} bytes", body.len()),
            ),
        )
    }
}

/// The upload fixture shipped with the crate.
pub fn asset_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/dog.jpeg")
}
