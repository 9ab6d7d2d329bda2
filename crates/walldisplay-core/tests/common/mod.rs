//! Shared test doubles.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use walldisplay_core::{HttpResponse, Result, SessionedClient, Transport, WallDisplayConfig};

pub const HOST: &str = "https://photos.example.org";
pub const CONTROLLER: &str = "photos_example_org";

pub const LOGIN_OK: &str = r#"{"stat":"ok","result":true}"#;
pub const LOGIN_FAIL: &str = r#"{"stat":"fail","err":999,"message":"Invalid username/password"}"#;

/// Request seen by the scripted transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl Recorded {
    pub fn is_login(&self) -> bool {
        self.method == "POST" && self.url.ends_with("/ws.php")
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport that replays queued replies: logins from one queue, plugin
/// GETs from another.
#[derive(Default)]
pub struct ScriptedTransport {
    logins: Mutex<VecDeque<Result<HttpResponse>>>,
    gets: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_login(&self, reply: Result<HttpResponse>) {
        self.logins.lock().unwrap().push_back(reply);
    }

    pub fn push_get(&self, reply: Result<HttpResponse>) {
        self.gets.lock().unwrap().push_back(reply);
    }

    pub fn login_ok(&self) {
        self.push_login(Ok(HttpResponse::ok(LOGIN_OK)));
    }

    pub fn get_ok(&self, body: &str) {
        self.push_get(Ok(HttpResponse::ok(body)));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn login_count(&self) -> usize {
        self.requests().iter().filter(|r| r.is_login()).count()
    }

    fn record(
        &self,
        method: &'static str,
        url: &str,
        query: &[(&str, String)],
        form: &[(&str, String)],
    ) {
        let owned = |pairs: &[(&str, String)]| -> Vec<(String, String)> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect()
        };
        self.requests.lock().unwrap().push(Recorded {
            method,
            url: url.to_string(),
            query: owned(query),
            form: owned(form),
        });
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse> {
        self.record("GET", url, query, &[]);
        self.gets
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected GET")
    }

    async fn post_form(
        &self,
        url: &str,
        query: &[(&str, String)],
        form: &[(&str, String)],
    ) -> Result<HttpResponse> {
        self.record("POST", url, query, form);
        self.logins
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected login")
    }
}

pub fn config() -> WallDisplayConfig {
    WallDisplayConfig::new(HOST, "display", "secret")
}

pub fn client(transport: &Arc<ScriptedTransport>) -> SessionedClient {
    SessionedClient::new(&config(), transport.clone())
}

/// The Vacations/2024/sunset table.
pub const VACATIONS_TABLE: &str = r#"{
    "cats": {
        "5": {
            "id": "5",
            "name": "Vacations",
            "id_uppercat": null,
            "Enabled": "1",
            "children": {
                "9": {"id": "9", "name": "2024", "id_uppercat": "5", "Enabled": "0", "children": []}
            }
        }
    },
    "tags": {
        "3": {"id": "3", "name": "sunset", "Enabled": "1"}
    },
    "mode": "cat"
}"#;
