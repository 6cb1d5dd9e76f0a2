use super::gemini::Content;
use super::GenerativeModel;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned model that records every request it receives.
pub struct MockModelClient {
    responses: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<(u16, String)>>>,
    requests: Arc<Mutex<Vec<Vec<Content>>>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Make every call fail as if the provider returned `status`.
    pub fn with_upstream_error(self, status: u16, body: String) -> Self {
        *self.failure.lock().unwrap() = Some((status, body));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Contents of every call so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeModel for MockModelClient {
    async fn generate_content(&self, contents: &[Content]) -> Result<String> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(contents.to_vec());
            requests.len()
        };

        if let Some((status, body)) = self.failure.lock().unwrap().clone() {
            return Err(Error::Upstream {
                status,
                message: format!("Gemini API error: {}", body),
            });
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("Mock answer".to_string())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
