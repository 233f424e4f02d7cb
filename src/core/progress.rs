use crate::domain::model::MarkingRunState;
use crate::domain::ports::ProgressObserver;
use tokio::sync::mpsc::UnboundedSender;

/// 將進度寫入日誌
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, state: &MarkingRunState) {
        tracing::info!("📊 [{:>5.1}%] {}", state.percent_complete, state.status);
    }
}

/// 以 channel 推送進度；接收端關閉後的快照直接丟棄
impl ProgressObserver for UnboundedSender<MarkingRunState> {
    fn on_progress(&self, state: &MarkingRunState) {
        if self.send(state.clone()).is_err() {
            tracing::debug!("Progress receiver dropped");
        }
    }
}
