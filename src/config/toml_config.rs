use crate::core::ConfigProvider;
use crate::utils::error::{MarkerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MODEL_ID: &str = "global.anthropic.claude-sonnet-4-20250514-v1:0";
pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub model: ModelConfig,
    pub marking: MarkingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub region: String,
    pub model_id: String,
    pub read_timeout_seconds: u64,
    /// 同時進行中的模型呼叫上限（跨所有請求）
    pub max_concurrent_invocations: usize,
    pub endpoint_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            read_timeout_seconds: 1000,
            max_concurrent_invocations: 4,
            endpoint_url: None,
        }
    }
}

impl ModelConfig {
    /// 讀取 BEDROCK_REGION / BEDROCK_LARGE_MODEL_ID 覆寫
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            region: std::env::var("BEDROCK_REGION").unwrap_or(default.region),
            model_id: std::env::var("BEDROCK_LARGE_MODEL_ID").unwrap_or(default.model_id),
            ..default
        }
    }
}

impl Validate for ModelConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("model.region", &self.region)?;
        validation::validate_non_empty_string("model.model_id", &self.model_id)?;
        validation::validate_positive_number(
            "model.read_timeout_seconds",
            self.read_timeout_seconds as usize,
            1,
        )?;
        validation::validate_positive_number(
            "model.max_concurrent_invocations",
            self.max_concurrent_invocations,
            1,
        )?;
        if let Some(endpoint_url) = &self.endpoint_url {
            validation::validate_url("model.endpoint_url", endpoint_url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 記錄錯誤並略過該篇作文
    #[default]
    Continue,
    /// 第一篇失敗即中止整批
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkingConfig {
    pub essays_dir: String,
    pub rubric_dir: String,
    pub guidance_file: String,
    pub output_dir: String,
    pub rubric: Option<String>,
    pub on_essay_failure: FailurePolicy,
}

impl Default for MarkingConfig {
    fn default() -> Self {
        Self {
            essays_dir: "essays".to_string(),
            rubric_dir: "rubric".to_string(),
            guidance_file: "feedback_guidance.md".to_string(),
            output_dir: "outputs".to_string(),
            rubric: None,
            on_essay_failure: FailurePolicy::Continue,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MarkerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarkerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置；未設定的欄位取預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarkerError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 無檔案時的起點：預設值加上環境變數
    pub fn from_env() -> Self {
        Self {
            model: ModelConfig::from_env(),
            ..Self::default()
        }
    }

    /// 替換環境變數 (例如 ${AWS_REGION})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarkerError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ConfigProvider for MarkerConfig {
    fn essays_dir(&self) -> &str {
        &self.marking.essays_dir
    }

    fn rubric_dir(&self) -> &str {
        &self.marking.rubric_dir
    }

    fn guidance_file(&self) -> &str {
        &self.marking.guidance_file
    }

    fn output_dir(&self) -> &str {
        &self.marking.output_dir
    }

    fn selected_rubric(&self) -> Option<&str> {
        self.marking.rubric.as_deref()
    }
}

impl Validate for MarkerConfig {
    fn validate(&self) -> Result<()> {
        self.model.validate()?;

        validation::validate_path("marking.essays_dir", &self.marking.essays_dir)?;
        validation::validate_path("marking.rubric_dir", &self.marking.rubric_dir)?;
        validation::validate_path("marking.guidance_file", &self.marking.guidance_file)?;
        validation::validate_path("marking.output_dir", &self.marking.output_dir)?;
        if let Some(rubric) = &self.marking.rubric {
            validation::validate_non_empty_string("marking.rubric", rubric)?;
        }

        validation::validate_non_empty_string("server.host", &self.server.host)?;
        Ok(())
    }
}
