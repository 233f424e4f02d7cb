//! 批改流程編排
//!
//! 依輸入順序逐篇批改（一次只有一個模型呼叫），每篇前後推送進度，
//! 最後以成功的回饋產生全班總評。

use crate::config::toml_config::FailurePolicy;
use crate::core::prompt::{build_class_prompt, build_essay_prompt};
use crate::domain::model::{
    ClassFeedback, Essay, EssayOutcome, Feedback, MarkingBatch, MarkingReport, MarkingRunState,
    Rubric,
};
use crate::domain::ports::{ModelClient, ProgressObserver};
use crate::utils::error::{MarkerError, Result};
use chrono::Utc;
use std::sync::Arc;

pub const ESSAY_MAX_TOKENS: u32 = 3000;
pub const CLASS_MAX_TOKENS: u32 = 4000;

pub const CLASS_PHASE_STATUS: &str = "Generating class overall feedback...";
pub const COMPLETE_STATUS: &str = "✓ Marking complete!";

pub struct Marker<M: ModelClient> {
    model: Arc<M>,
    policy: FailurePolicy,
}

impl<M: ModelClient> Marker<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            policy: FailurePolicy::Continue,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn mark_essay(
        &self,
        essay: &Essay,
        rubric_text: &str,
        guidance_text: &str,
    ) -> Result<Feedback> {
        tracing::info!("📝 Generating feedback for essay: {}", essay.name);

        let prompt = build_essay_prompt(&essay.content, rubric_text, guidance_text);
        let feedback = self.model.invoke(&prompt, ESSAY_MAX_TOKENS).await?;

        Ok(Feedback {
            name: essay.name.clone(),
            feedback,
        })
    }

    pub async fn generate_class_feedback(
        &self,
        feedbacks: &[Feedback],
        rubric_text: &str,
    ) -> Result<ClassFeedback> {
        tracing::info!("📊 Generating class overall feedback from {} essays", feedbacks.len());

        let prompt = build_class_prompt(feedbacks, rubric_text);
        let class_feedback = self.model.invoke(&prompt, CLASS_MAX_TOKENS).await?;

        Ok(ClassFeedback(class_feedback))
    }

    pub async fn run_batch(
        &self,
        batch: &MarkingBatch,
        observer: &dyn ProgressObserver,
    ) -> Result<MarkingReport> {
        let rubric = active_rubric(batch)?;
        let total = batch.essays.len();
        let started_at = Utc::now();

        tracing::info!(
            "🚀 Marking {} essay(s) with rubric '{}' ({:?} on failure)",
            total,
            rubric.name,
            self.policy
        );

        let mut state = MarkingRunState {
            is_running: true,
            ..MarkingRunState::idle()
        };
        let mut outcomes = Vec::with_capacity(total);
        let mut feedbacks = Vec::with_capacity(total);

        for (idx, essay) in batch.essays.iter().enumerate() {
            state.status = format!("Marking essay {} of {}: {}", idx + 1, total, essay.name);
            observer.on_progress(&state);

            match self
                .mark_essay(essay, &rubric.content, batch.guidance.as_str())
                .await
            {
                Ok(feedback) => {
                    feedbacks.push(feedback.clone());
                    outcomes.push(EssayOutcome::Marked(feedback));
                }
                Err(e) => {
                    tracing::error!("❌ Error processing {}: {}", essay.name, e);

                    if self.policy == FailurePolicy::Abort {
                        state.status = format!("Marking stopped at {}", essay.name);
                        state.is_running = false;
                        observer.on_progress(&state);
                        return Err(MarkerError::EssayFailedError {
                            name: essay.name.clone(),
                            message: e.to_string(),
                        });
                    }

                    outcomes.push(EssayOutcome::Failed {
                        name: essay.name.clone(),
                        error: e.to_string(),
                    });
                }
            }

            state.percent_complete = MarkingRunState::percent(idx + 1, total);
            observer.on_progress(&state);
        }

        state.status = CLASS_PHASE_STATUS.to_string();
        observer.on_progress(&state);

        let (class_feedback, class_feedback_error) =
            match self.generate_class_feedback(&feedbacks, &rubric.content).await {
                Ok(class_feedback) => (Some(class_feedback), None),
                Err(e) => {
                    tracing::error!("❌ Error generating class feedback: {}", e);
                    (None, Some(e.to_string()))
                }
            };

        state.status = COMPLETE_STATUS.to_string();
        state.is_running = false;
        observer.on_progress(&state);

        let report = MarkingReport {
            rubric_name: rubric.name.clone(),
            outcomes,
            class_feedback,
            class_feedback_error,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "✅ Marked {}/{} essay(s), {} failed, class feedback: {}",
            report.marked_count(),
            total,
            report.failures().len(),
            if report.class_feedback.is_some() { "yes" } else { "no" }
        );

        Ok(report)
    }
}

/// 開跑前檢查：有作文、有已選且存在的評分標準、指引非空白
fn active_rubric(batch: &MarkingBatch) -> Result<&Rubric> {
    if batch.essays.is_empty() {
        return Err(MarkerError::ValidationError {
            message: "No essays loaded".to_string(),
        });
    }

    let name = batch
        .selected_rubric
        .as_deref()
        .ok_or_else(|| MarkerError::ValidationError {
            message: "No rubric selected for marking".to_string(),
        })?;
    let rubric = batch
        .rubric(name)
        .ok_or_else(|| MarkerError::RubricNotFoundError {
            name: name.to_string(),
        })?;

    if batch.guidance.is_blank() {
        return Err(MarkerError::ValidationError {
            message: "No feedback guidance loaded".to_string(),
        });
    }

    Ok(rubric)
}
