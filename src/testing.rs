// In-memory transport for unit tests: records every request and replays
// queued responses in order. An empty queue answers `200 []`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use reqwest::Method;
use serde_json::Value;

use crate::api::{PreparedRequest, RawResponse, RestClient, Transport};
use crate::config::BackendConfig;
use crate::error::Result;

#[derive(Default)]
struct State {
    responses: VecDeque<RawResponse>,
    requests: Vec<PreparedRequest>,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<State>>,
}

impl FakeTransport {
    pub fn push(&self, status: u16, body: &str) {
        self.state.borrow_mut().responses.push_back(RawResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn push_json(&self, body: Value) {
        self.push(200, &body.to_string());
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn requests_with(&self, method: Method) -> Vec<PreparedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub fn client(&self) -> RestClient {
        let config = BackendConfig::new("https://db.example.co", "test-key");
        RestClient::with_transport(&config, self.clone()).expect("valid test config")
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &PreparedRequest) -> Result<RawResponse> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());
        Ok(state.responses.pop_front().unwrap_or(RawResponse {
            status: 200,
            body: "[]".to_string(),
        }))
    }
}
