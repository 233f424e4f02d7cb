pub mod engine;
pub mod marker;
pub mod pipeline;
pub mod progress;
pub mod prompt;

pub use crate::domain::model::{
    ClassFeedback, Essay, EssayOutcome, Feedback, FeedbackGuidance, MarkingBatch, MarkingReport,
    MarkingRunState, Rubric,
};
pub use crate::domain::ports::{ConfigProvider, ModelClient, Pipeline, ProgressObserver, Storage};
pub use crate::utils::error::Result;
