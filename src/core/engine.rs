use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct MarkingEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MarkingEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let start = Instant::now();
        tracing::info!("🚀 Starting marking run");

        tracing::info!("📂 Loading essays, rubrics and guidance...");
        let batch = self.pipeline.extract().await?;
        tracing::info!(
            "✓ Loaded {} essay(s), {} rubric(s)",
            batch.essays.len(),
            batch.rubrics.len()
        );

        let report = self.pipeline.transform(batch).await?;
        tracing::info!(
            "✓ Marked {}/{} essay(s) in {:?}",
            report.marked_count(),
            report.outcomes.len(),
            start.elapsed()
        );

        tracing::info!("💾 Saving feedback...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(output_path)
    }
}
