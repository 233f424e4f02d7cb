use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkerError {
    #[error("Model invocation failed ({model_id}): {source}")]
    ModelInvocationError {
        model_id: String,
        #[source]
        source: aws_sdk_bedrockruntime::Error,
    },

    #[error("Response decoding error: {0}")]
    ResponseDecodeError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFieldError { fields: Vec<String> },

    #[error("Rubric '{name}' is not loaded")]
    RubricNotFoundError { name: String },

    #[error("Marking essay '{name}' failed: {message}")]
    EssayFailedError { name: String, message: String },
}

impl MarkerError {
    /// 呼叫端輸入錯誤（不需重試，也不會觸發遠端呼叫）
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MarkerError::ValidationError { .. }
                | MarkerError::MissingFieldError { .. }
                | MarkerError::RubricNotFoundError { .. }
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarkerError::ModelInvocationError { .. } => {
                "The feedback model could not be reached or returned an error".to_string()
            }
            MarkerError::ResponseDecodeError(_) => {
                "The feedback model returned a response that could not be read".to_string()
            }
            MarkerError::IoError(e) => format!("File access failed: {}", e),
            MarkerError::ConfigError { .. }
            | MarkerError::ConfigValidationError { .. }
            | MarkerError::InvalidConfigValueError { .. } => format!("Configuration problem: {}", self),
            MarkerError::ValidationError { message } => message.clone(),
            MarkerError::MissingFieldError { .. } => "Missing required fields".to_string(),
            MarkerError::RubricNotFoundError { name } => {
                format!("Rubric '{}' was not found among the loaded rubrics", name)
            }
            MarkerError::EssayFailedError { name, .. } => {
                format!("Marking stopped at essay '{}'", name)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MarkerError::ModelInvocationError { .. } => {
                "Check AWS credentials, the Bedrock region and that the model id is enabled for your account"
            }
            MarkerError::ResponseDecodeError(_) => "Re-run the batch; the model output may have been cut off",
            MarkerError::IoError(_) => "Check that the input folders exist and the output folder is writable",
            MarkerError::ConfigError { .. }
            | MarkerError::ConfigValidationError { .. }
            | MarkerError::InvalidConfigValueError { .. } => "Fix the configuration file or command line flags",
            MarkerError::ValidationError { .. } | MarkerError::MissingFieldError { .. } => {
                "Load essays, a rubric and feedback guidance before marking"
            }
            MarkerError::RubricNotFoundError { .. } => "Pick one of the rubric file names in the rubric folder",
            MarkerError::EssayFailedError { .. } => {
                "Set on_essay_failure = \"continue\" to skip failing essays"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MarkerError>;
