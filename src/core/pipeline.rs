use crate::core::marker::Marker;
use crate::core::progress::LogProgress;
use crate::core::{ConfigProvider, ModelClient, Pipeline, ProgressObserver, Storage};
use crate::domain::model::{Essay, FeedbackGuidance, MarkingBatch, MarkingReport, Rubric};
use crate::utils::error::{MarkerError, Result};
use std::path::Path;
use std::sync::Arc;

pub const CLASS_FEEDBACK_FILE: &str = "class_overall.feedback.md";
pub const REPORT_FILE: &str = "marking_report.json";

/// 從資料夾讀入作文、評分標準與指引，批改後把回饋寫回輸出資料夾
pub struct FolderPipeline<S: Storage, C: ConfigProvider, M: ModelClient> {
    storage: S,
    config: C,
    marker: Marker<M>,
    observer: Arc<dyn ProgressObserver>,
}

impl<S: Storage, C: ConfigProvider, M: ModelClient> FolderPipeline<S, C, M> {
    pub fn new(storage: S, config: C, marker: Marker<M>) -> Self {
        Self {
            storage,
            config,
            marker,
            observer: Arc::new(LogProgress),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// 讀取資料夾內所有指定副檔名的檔案；單一檔案失敗只記錄並略過
    async fn load_folder(&self, dir: &str, extension: &str, kind: &str) -> Result<Vec<(String, String)>> {
        let Some(names) = self.storage.list_files(dir, extension).await? else {
            tracing::warn!("⚠️ {} folder not found: {}", kind, dir);
            return Ok(Vec::new());
        };

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let path = format!("{}/{}", dir, name);
            match self.read_text(&path).await {
                Ok(content) => {
                    tracing::info!("📄 Loaded {}: {}", kind, name);
                    files.push((name, content));
                }
                Err(e) => tracing::error!("❌ Error loading {} {}: {}", kind, name, e),
            }
        }
        Ok(files)
    }

    async fn load_guidance(&self) -> FeedbackGuidance {
        let path = self.config.guidance_file();
        match self.read_text(path).await {
            Ok(content) => {
                tracing::info!("📄 Loaded feedback guidance from: {}", path);
                FeedbackGuidance(content)
            }
            Err(MarkerError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("⚠️ Feedback guidance file not found: {}", path);
                FeedbackGuidance::default()
            }
            Err(e) => {
                tracing::error!("❌ Error loading feedback guidance: {}", e);
                FeedbackGuidance::default()
            }
        }
    }

    async fn read_text(&self, path: &str) -> Result<String> {
        let bytes = self.storage.read_file(path).await?;
        String::from_utf8(bytes).map_err(|e| MarkerError::ValidationError {
            message: format!("{} is not valid UTF-8: {}", path, e),
        })
    }

    fn output_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.config.output_dir(), file_name)
    }
}

/// `essay1.txt` -> `essay1.feedback.txt`
pub fn feedback_file_name(essay_name: &str) -> String {
    let stem = Path::new(essay_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(essay_name);
    format!("{}.feedback.txt", stem)
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, M: ModelClient> Pipeline for FolderPipeline<S, C, M> {
    async fn extract(&self) -> Result<MarkingBatch> {
        let essays: Vec<Essay> = self
            .load_folder(self.config.essays_dir(), "txt", "essay")
            .await?
            .into_iter()
            .map(|(name, content)| Essay { name, content })
            .collect();

        let rubrics: Vec<Rubric> = self
            .load_folder(self.config.rubric_dir(), "md", "rubric")
            .await?
            .into_iter()
            .map(|(name, content)| Rubric { name, content })
            .collect();

        let guidance = self.load_guidance().await;

        // 未指定時沿用第一份評分標準
        let selected_rubric = self
            .config
            .selected_rubric()
            .map(str::to_string)
            .or_else(|| rubrics.first().map(|r| r.name.clone()));

        tracing::debug!(
            "Loaded {} essays, {} rubrics, guidance: {} chars, selected rubric: {:?}",
            essays.len(),
            rubrics.len(),
            guidance.as_str().chars().count(),
            selected_rubric
        );

        Ok(MarkingBatch {
            essays,
            rubrics,
            selected_rubric,
            guidance,
        })
    }

    async fn transform(&self, batch: MarkingBatch) -> Result<MarkingReport> {
        self.marker.run_batch(&batch, self.observer.as_ref()).await
    }

    async fn load(&self, report: MarkingReport) -> Result<String> {
        for feedback in report.feedbacks() {
            let path = self.output_path(&feedback_file_name(&feedback.name));
            self.storage
                .write_file(&path, feedback.feedback.as_bytes())
                .await?;
            tracing::info!("💾 Saved feedback to: {}", path);
        }

        if let Some(class_feedback) = &report.class_feedback {
            let path = self.output_path(CLASS_FEEDBACK_FILE);
            self.storage
                .write_file(&path, class_feedback.as_str().as_bytes())
                .await?;
            tracing::info!("💾 Saved class feedback to: {}", path);
        }

        let summary = serde_json::to_string_pretty(&report)?;
        self.storage
            .write_file(&self.output_path(REPORT_FILE), summary.as_bytes())
            .await?;

        Ok(self.config.output_dir().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::MarkerConfig;
    use crate::domain::model::{ClassFeedback, EssayOutcome, Feedback};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &[u8]) {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                MarkerError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.put(path, data).await;
            Ok(())
        }

        async fn list_files(&self, dir: &str, extension: &str) -> Result<Option<Vec<String>>> {
            let files = self.files.lock().await;
            let prefix = format!("{}/", dir);
            let suffix = format!(".{}", extension);
            let mut names: Vec<String> = files
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .filter(|n| n.ends_with(&suffix) && !n.contains('/'))
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Ok(None);
            }
            names.sort();
            Ok(Some(names))
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn invoke(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
            Ok(format!("{} chars / {} tokens", prompt.len(), max_output_tokens))
        }
    }

    fn pipeline(storage: MockStorage, config: MarkerConfig) -> FolderPipeline<MockStorage, MarkerConfig, EchoModel> {
        FolderPipeline::new(storage, config, Marker::new(Arc::new(EchoModel)))
    }

    #[tokio::test]
    async fn test_extract_loads_sorted_inputs_and_defaults_rubric() {
        let storage = MockStorage::default();
        storage.put("essays/b.txt", b"essay B").await;
        storage.put("essays/a.txt", b"essay A").await;
        storage.put("essays/skip.md", b"not an essay").await;
        storage.put("rubric/z.md", b"rubric Z").await;
        storage.put("rubric/m.md", b"rubric M").await;
        storage.put("feedback_guidance.md", b"be kind").await;

        let batch = pipeline(storage, MarkerConfig::default()).extract().await.unwrap();

        let names: Vec<&str> = batch.essays.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(batch.essays[0].content, "essay A");
        assert_eq!(batch.rubrics.len(), 2);
        assert_eq!(batch.selected_rubric.as_deref(), Some("m.md"));
        assert_eq!(batch.guidance.as_str(), "be kind");
    }

    #[tokio::test]
    async fn test_extract_tolerates_missing_inputs() {
        let batch = pipeline(MockStorage::default(), MarkerConfig::default())
            .extract()
            .await
            .unwrap();

        assert!(batch.essays.is_empty());
        assert!(batch.rubrics.is_empty());
        assert!(batch.selected_rubric.is_none());
        assert!(batch.guidance.is_blank());
    }

    #[tokio::test]
    async fn test_extract_skips_non_utf8_essay() {
        let storage = MockStorage::default();
        storage.put("essays/good.txt", b"fine").await;
        storage.put("essays/bad.txt", &[0xff, 0xfe, 0x00]).await;

        let batch = pipeline(storage, MarkerConfig::default()).extract().await.unwrap();

        assert_eq!(batch.essays.len(), 1);
        assert_eq!(batch.essays[0].name, "good.txt");
    }

    #[tokio::test]
    async fn test_extract_keeps_explicit_rubric_choice() {
        let storage = MockStorage::default();
        storage.put("rubric/a.md", b"A").await;
        storage.put("rubric/b.md", b"B").await;
        let mut config = MarkerConfig::default();
        config.marking.rubric = Some("b.md".to_string());

        let batch = pipeline(storage, config).extract().await.unwrap();
        assert_eq!(batch.selected_rubric.as_deref(), Some("b.md"));
    }

    #[tokio::test]
    async fn test_load_writes_feedback_files() {
        let storage = MockStorage::default();
        let report = MarkingReport {
            rubric_name: "r.md".to_string(),
            outcomes: vec![
                EssayOutcome::Marked(Feedback {
                    name: "alice.txt".to_string(),
                    feedback: "Band 5".to_string(),
                }),
                EssayOutcome::Failed {
                    name: "bob.txt".to_string(),
                    error: "timeout".to_string(),
                },
            ],
            class_feedback: Some(ClassFeedback("# Class".to_string())),
            class_feedback_error: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let output = pipeline(storage.clone(), MarkerConfig::default())
            .load(report)
            .await
            .unwrap();

        assert_eq!(output, "outputs");
        assert_eq!(storage.get_file("outputs/alice.feedback.txt").await.unwrap(), b"Band 5");
        assert!(storage.get_file("outputs/bob.feedback.txt").await.is_none());
        assert_eq!(
            storage.get_file("outputs/class_overall.feedback.md").await.unwrap(),
            b"# Class"
        );

        let summary: serde_json::Value =
            serde_json::from_slice(&storage.get_file("outputs/marking_report.json").await.unwrap()).unwrap();
        assert_eq!(summary["outcomes"][1]["outcome"], "failed");
        assert_eq!(summary["outcomes"][1]["name"], "bob.txt");
    }

    #[test]
    fn test_feedback_file_name() {
        assert_eq!(feedback_file_name("essay1.txt"), "essay1.feedback.txt");
        assert_eq!(feedback_file_name("no_extension"), "no_extension.feedback.txt");
        assert_eq!(feedback_file_name("a.b.txt"), "a.b.feedback.txt");
    }
}
