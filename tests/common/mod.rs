#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

/// A stand-in for a remote API that replays scripted outcomes in order.
pub struct MockRemote {
    responses: Mutex<VecDeque<Result<String, String>>>,
    received: Mutex<Vec<String>>,
}

impl MockRemote {
    /// Create a mock from a sequence of outcomes (popped in order).
    pub fn with_outcomes(outcomes: Vec<Result<&str, &str>>) -> Self {
        let responses = outcomes
            .into_iter()
            .map(|o| o.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            responses: Mutex::new(responses),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that answers `count` messages successfully.
    pub fn always_ok(count: usize) -> Self {
        Self::with_outcomes(vec![Ok("ok"); count])
    }

    pub fn send(&self, message: &str) -> Result<String, String> {
        self.received.lock().unwrap().push(message.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("MockRemote: no more responses in queue".to_string()))
    }

    /// Every message received so far, in order.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}
