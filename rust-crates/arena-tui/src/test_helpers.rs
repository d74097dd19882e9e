use crate::http::{
    HttpResponse,
    HttpTransport,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: String,
}

/// Replays scripted responses in order and records every request. `None` in
/// the script stands for a connection failure.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Option<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.script.lock().unwrap().push_back(Some(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self) -> Self {
        self.script.lock().unwrap().push_back(None);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, method: &'static str, url: &str, body: String) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            body,
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(eyre!("connection refused: {url}")),
            None => Err(eyre!("no scripted response for {method} {url}")),
        }
    }
}

impl HttpTransport for ScriptedTransport {
    async fn put(&self, url: &str, body: String) -> Result<HttpResponse> {
        self.next("PUT", url, body)
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.next("GET", url, String::new())
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse> {
        self.next("POST", url, body.to_string())
    }
}
