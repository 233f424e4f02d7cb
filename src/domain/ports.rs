use crate::domain::model::{MarkingBatch, MarkingReport, MarkingRunState};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 列出目錄下指定副檔名的檔名（不含目錄），依名稱排序；目錄不存在時回傳 `None`
    fn list_files(
        &self,
        dir: &str,
        extension: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<String>>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn essays_dir(&self) -> &str;
    fn rubric_dir(&self) -> &str;
    fn guidance_file(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn selected_rubric(&self) -> Option<&str>;
}

/// 遠端文字生成模型
///
/// 每次呼叫恰好送出一個 prompt，回傳正規化後的文字；不重試。
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}

/// 批改進度的接收端
///
/// 在模型呼叫之前同步呼叫，保證觀察者先看到「即將處理」的狀態。
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, state: &MarkingRunState);
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<MarkingBatch>;
    async fn transform(&self, batch: MarkingBatch) -> Result<MarkingReport>;
    async fn load(&self, report: MarkingReport) -> Result<String>;
}
