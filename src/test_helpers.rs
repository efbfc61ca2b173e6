use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::record::{Priority, TestCaseRecord, TestType};
use crate::transport::Transport;

/// Create a `TestCaseRecord` with sensible defaults for tests.
pub fn make_record(id: &str) -> TestCaseRecord {
    TestCaseRecord {
        id: id.to_string(),
        name: format!("{id} name"),
        scenario: Some("User submits the form".to_string()),
        steps: Some("1. Open page\n2. Submit form".to_string()),
        expected_result: Some("Success message shown".to_string()),
        preconditions: Some("User is registered".to_string()),
        test_data: Some("user@example.com".to_string()),
        priority: Priority::Medium,
        test_type: TestType::Functional,
        raw_response: None,
    }
}

/// Chat-completion body whose message content is `content`.
pub fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

/// Transport that replays queued outcomes and records every prompt it was sent.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<std::result::Result<String, (u16, String)>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn ok(body: &str) -> Self {
        let fake = Self::default();
        fake.push_ok(body);
        fake
    }

    pub fn status(status: u16, body: &str) -> Self {
        let fake = Self::default();
        fake.push_status(status, body);
        fake
    }

    pub fn push_ok(&self, body: &str) {
        self.replies.lock().unwrap().push_back(Ok(body.to_string()));
    }

    pub fn push_status(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err((status, body.to_string())));
    }
}

impl Transport for FakeTransport {
    async fn send(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(body)) => Ok(body),
            Some(Err((status, body))) => Err(Error::Transport { status, body }),
            None => Err(Error::Network("no reply queued".to_string())),
        }
    }
}
