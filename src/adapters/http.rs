//! HTTP 服務邊界
//!
//! `POST /api/mark-essay` 批改單篇作文，`POST /api/class-feedback` 產生全班總評。
//! 欄位缺少時回 400 且不呼叫模型；模型呼叫失敗回 500。

use crate::core::marker::Marker;
use crate::domain::model::{Essay, Feedback};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;
use crate::utils::validation::RequiredFields;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const ESSAY_FAILED: &str = "Failed to generate feedback";
pub const CLASS_FAILED: &str = "Failed to generate class feedback";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEssayRequest {
    pub essay_text: Option<String>,
    pub essay_name: Option<String>,
    pub rubric_text: Option<String>,
    pub feedback_guidance: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkEssayResponse {
    pub feedback: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFeedbackRequest {
    pub all_feedbacks: Option<Vec<Feedback>>,
    pub rubric_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFeedbackResponse {
    pub class_feedback: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

struct MarkEssayInput {
    essay: Essay,
    rubric_text: String,
    guidance_text: String,
}

impl MarkEssayRequest {
    fn into_input(self) -> Result<MarkEssayInput> {
        let mut fields = RequiredFields::default();
        let content = fields.text("essayText", self.essay_text);
        let name = fields.text("essayName", self.essay_name);
        let rubric_text = fields.text("rubricText", self.rubric_text);
        let guidance_text = fields.text("feedbackGuidance", self.feedback_guidance);
        fields.finish()?;

        Ok(MarkEssayInput {
            essay: Essay::new(name, content),
            rubric_text,
            guidance_text,
        })
    }
}

impl ClassFeedbackRequest {
    // 空的回饋清單是合法的
    fn into_input(self) -> Result<(Vec<Feedback>, String)> {
        let mut fields = RequiredFields::default();
        let feedbacks = fields.value("allFeedbacks", self.all_feedbacks);
        let rubric_text = fields.text("rubricText", self.rubric_text);
        fields.finish()?;
        Ok((feedbacks, rubric_text))
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub fn routes<M: ModelClient + 'static>(marker: Arc<Marker<M>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/mark-essay", post(mark_essay::<M>))
        .route("/api/class-feedback", post(class_feedback::<M>))
        .with_state(marker)
}

async fn health() -> &'static str {
    "OK"
}

async fn mark_essay<M: ModelClient + 'static>(
    State(marker): State<Arc<Marker<M>>>,
    payload: std::result::Result<Json<MarkEssayRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("⚠️ Rejected mark-essay body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
        }
    };

    let input = match request.into_input() {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!("⚠️ {}", e);
            return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
        }
    };

    match marker
        .mark_essay(&input.essay, &input.rubric_text, &input.guidance_text)
        .await
    {
        Ok(feedback) => Json(MarkEssayResponse {
            feedback: feedback.feedback,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("❌ Error marking essay {}: {}", input.essay.name, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ESSAY_FAILED)
        }
    }
}

async fn class_feedback<M: ModelClient + 'static>(
    State(marker): State<Arc<Marker<M>>>,
    payload: std::result::Result<Json<ClassFeedbackRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("⚠️ Rejected class-feedback body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
        }
    };

    let (feedbacks, rubric_text) = match request.into_input() {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!("⚠️ {}", e);
            return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
        }
    };

    match marker.generate_class_feedback(&feedbacks, &rubric_text).await {
        Ok(class_feedback) => Json(ClassFeedbackResponse {
            class_feedback: class_feedback.0,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("❌ Error generating class feedback: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CLASS_FAILED)
        }
    }
}

/// 綁定位址並提供服務，直到收到 Ctrl-C
pub async fn serve<M: ModelClient + 'static>(marker: Arc<Marker<M>>, address: &str) -> Result<()> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!("🌐 Listening on {}", listener.local_addr()?);

    axum::serve(listener, routes(marker))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_essay_request_lists_missing_fields() {
        let request: MarkEssayRequest =
            serde_json::from_str(r#"{"essayText":"text","rubricText":""}"#).unwrap();

        let err = request.into_input().err().unwrap();
        assert_eq!(
            err.to_string(),
            "Missing required fields: essayName, rubricText, feedbackGuidance"
        );
    }

    #[test]
    fn test_class_feedback_request_accepts_empty_list() {
        let request: ClassFeedbackRequest =
            serde_json::from_str(r#"{"allFeedbacks":[],"rubricText":"rubric"}"#).unwrap();

        let (feedbacks, rubric) = request.into_input().unwrap();
        assert!(feedbacks.is_empty());
        assert_eq!(rubric, "rubric");
    }

    #[test]
    fn test_class_feedback_request_requires_list() {
        let request: ClassFeedbackRequest =
            serde_json::from_str(r#"{"rubricText":"rubric"}"#).unwrap();
        assert!(request.into_input().is_err());
    }
}
