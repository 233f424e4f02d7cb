#![allow(dead_code)]

use async_trait::async_trait;
use essay_marker::domain::ports::ModelClient;
use essay_marker::{MarkerError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 依序回傳預先安排的結果，並記錄每次收到的提示
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub async fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn invoke(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        self.calls
            .lock()
            .await
            .push((prompt.to_string(), max_output_tokens));
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(model_failure("unscripted")))
    }
}

pub fn model_failure(message: &str) -> MarkerError {
    MarkerError::ValidationError {
        message: message.to_string(),
    }
}
