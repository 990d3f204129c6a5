//! A mock chat client for exercising the dispatch path without a network.

use alertbot::ChatClient;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockChatClient {
    /// Every delivered (channel_id, text) pair, in order.
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    /// When set, every delivery fails.
    pub fail: bool,
}

impl MockChatClient {
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn deliver(&self, channel_id: &str, text: &str) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("mock delivery failure");
        }
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok("1712.0001".to_string())
    }
}
