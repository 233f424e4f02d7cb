//! AWS Bedrock 上的 Claude 模型呼叫
//!
//! 整個行程只建立一個 [`BedrockClient`]，以 `Arc` 共用給批改流程與 HTTP 服務。
//! 每次呼叫只送出一次請求：SDK 的重試被關閉，失敗直接回傳給呼叫端。

use crate::config::toml_config::ModelConfig;
use crate::domain::ports::ModelClient;
use crate::utils::error::{MarkerError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::config::retry::RetryConfig;
use aws_sdk_bedrockruntime::config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const TEMPERATURE: f32 = 0.5;
pub const TOP_K: u32 = 250;
pub const TOP_P: f32 = 1.0;
pub const STOP_SEQUENCE: &str = "\n\nHuman:";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Anthropic Messages 格式的請求本體
#[derive(Debug, Serialize)]
pub struct InvokeRequest<'a> {
    pub anthropic_version: &'static str,
    pub max_tokens: u32,
    pub messages: Vec<Message<'a>>,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub stop_sequences: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ContentBlock<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: &'a str,
}

impl<'a> InvokeRequest<'a> {
    pub fn for_prompt(prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            anthropic_version: ANTHROPIC_VERSION,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
            temperature: TEMPERATURE,
            top_k: TOP_K,
            top_p: TOP_P,
            stop_sequences: vec![STOP_SEQUENCE],
        }
    }
}

/// 從回應中取出所有 text 區塊並以換行串接
///
/// 沒有任何文字時回傳整個序列化後的回應，絕不回傳空字串。
pub fn extract_text(body: &[u8]) -> Result<String> {
    let envelope: Value = serde_json::from_slice(body)?;

    let completion = envelope
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    if completion.is_empty() {
        tracing::warn!("⚠️ Model response has no text content, returning raw envelope");
        return Ok(envelope.to_string());
    }

    Ok(completion)
}

pub struct BedrockClient {
    client: Client,
    model_id: String,
    permits: Semaphore,
}

impl BedrockClient {
    pub fn new(client: Client, config: &ModelConfig) -> Self {
        Self {
            client,
            model_id: config.model_id.clone(),
            permits: Semaphore::new(config.max_concurrent_invocations),
        }
    }

    /// 從預設的 AWS 憑證鏈建立客戶端
    pub async fn from_config(config: &ModelConfig) -> Result<Self> {
        config.validate()?;

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let service_config =
            Self::service_config(aws_sdk_bedrockruntime::config::Builder::from(&shared), config);

        tracing::info!(
            "🤖 Bedrock client ready (region: {}, model: {})",
            config.region,
            config.model_id
        );

        Ok(Self::new(Client::from_conf(service_config), config))
    }

    /// 套用逾時、端點覆寫並關閉重試
    pub fn service_config(
        builder: aws_sdk_bedrockruntime::config::Builder,
        config: &ModelConfig,
    ) -> aws_sdk_bedrockruntime::Config {
        let mut builder = builder
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .read_timeout(Duration::from_secs(config.read_timeout_seconds))
                    .build(),
            );

        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        builder.build()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl ModelClient for BedrockClient {
    async fn invoke(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(MarkerError::ValidationError {
                message: "Prompt cannot be empty".to_string(),
            });
        }
        if max_output_tokens == 0 {
            return Err(MarkerError::ValidationError {
                message: "max_output_tokens must be positive".to_string(),
            });
        }

        let body = serde_json::to_vec(&InvokeRequest::for_prompt(prompt, max_output_tokens))?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| MarkerError::ConfigError {
                message: format!("Invocation limiter unavailable: {}", e),
            })?;

        tracing::debug!(
            "Invoking {} (prompt: {} chars, max_tokens: {})",
            self.model_id,
            prompt.chars().count(),
            max_output_tokens
        );

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                let source = aws_sdk_bedrockruntime::Error::from(e);
                tracing::error!("❌ Error invoking {}: {}", self.model_id, source);
                MarkerError::ModelInvocationError {
                    model_id: self.model_id.clone(),
                    source,
                }
            })?;

        tracing::debug!("Model response: {} bytes", response.body().as_ref().len());

        extract_text(response.body().as_ref())
    }
}
