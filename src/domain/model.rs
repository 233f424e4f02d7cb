use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一份學生作文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Essay {
    pub name: String,
    pub content: String,
}

impl Essay {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    pub name: String,
    pub content: String,
}

impl Rubric {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// 語氣與結構指引，整批共用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackGuidance(pub String);

impl FeedbackGuidance {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// 單篇作文的回饋；`name` 與來源作文相同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub name: String,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassFeedback(pub String);

impl ClassFeedback {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 批次進度快照，每個里程碑推送一次給觀察者
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkingRunState {
    pub status: String,
    pub percent_complete: f64,
    pub is_running: bool,
}

impl MarkingRunState {
    pub fn idle() -> Self {
        Self {
            status: String::new(),
            percent_complete: 0.0,
            is_running: false,
        }
    }

    pub fn percent(completed: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        completed as f64 / total as f64 * 100.0
    }
}

/// 單篇作文的處理結果，失敗不再以「缺席」表示
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EssayOutcome {
    Marked(Feedback),
    Failed { name: String, error: String },
}

impl EssayOutcome {
    pub fn name(&self) -> &str {
        match self {
            EssayOutcome::Marked(feedback) => &feedback.name,
            EssayOutcome::Failed { name, .. } => name,
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            EssayOutcome::Marked(feedback) => Some(feedback),
            EssayOutcome::Failed { .. } => None,
        }
    }
}

/// 一次批改所需的全部輸入
#[derive(Debug, Clone, Default)]
pub struct MarkingBatch {
    pub essays: Vec<Essay>,
    pub rubrics: Vec<Rubric>,
    pub selected_rubric: Option<String>,
    pub guidance: FeedbackGuidance,
}

impl MarkingBatch {
    pub fn rubric(&self, name: &str) -> Option<&Rubric> {
        self.rubrics.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkingReport {
    pub rubric_name: String,
    pub outcomes: Vec<EssayOutcome>,
    pub class_feedback: Option<ClassFeedback>,
    pub class_feedback_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MarkingReport {
    /// 成功的回饋，保持作文原順序
    pub fn feedbacks(&self) -> Vec<&Feedback> {
        self.outcomes.iter().filter_map(EssayOutcome::feedback).collect()
    }

    pub fn failures(&self) -> Vec<&EssayOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, EssayOutcome::Failed { .. }))
            .collect()
    }

    pub fn marked_count(&self) -> usize {
        self.outcomes.len() - self.failures().len()
    }
}
