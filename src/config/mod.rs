pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::{FailurePolicy, MarkerConfig};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "essay-marker")]
#[command(about = "Generate essay feedback and a class overview with Amazon Bedrock")]
pub struct CliConfig {
    /// TOML 配置檔路徑
    #[arg(long, short, global = true)]
    pub config: Option<String>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, env = "BEDROCK_REGION")]
    pub region: Option<String>,

    #[arg(long, global = true, env = "BEDROCK_LARGE_MODEL_ID")]
    pub model_id: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 批改資料夾內所有作文並寫出回饋檔
    Mark {
        #[arg(long)]
        essays_dir: Option<String>,

        #[arg(long)]
        rubric_dir: Option<String>,

        #[arg(long)]
        guidance_file: Option<String>,

        #[arg(long)]
        output_dir: Option<String>,

        /// 評分標準檔名，未指定時使用第一份
        #[arg(long)]
        rubric: Option<String>,

        #[arg(long, value_enum)]
        on_essay_failure: Option<FailurePolicy>,
    },
    /// 啟動 HTTP 批改服務
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 依序套用：預設值、TOML 檔 (或環境變數)、命令列參數
    pub fn resolve(&self) -> Result<MarkerConfig> {
        let mut config = match &self.config {
            Some(path) => MarkerConfig::from_file(path)?,
            None => MarkerConfig::from_env(),
        };

        if let Some(region) = &self.region {
            config.model.region = region.clone();
        }
        if let Some(model_id) = &self.model_id {
            config.model.model_id = model_id.clone();
        }

        match &self.command {
            Command::Mark {
                essays_dir,
                rubric_dir,
                guidance_file,
                output_dir,
                rubric,
                on_essay_failure,
            } => {
                let marking = &mut config.marking;
                override_with(&mut marking.essays_dir, essays_dir);
                override_with(&mut marking.rubric_dir, rubric_dir);
                override_with(&mut marking.guidance_file, guidance_file);
                override_with(&mut marking.output_dir, output_dir);
                if rubric.is_some() {
                    marking.rubric = rubric.clone();
                }
                if let Some(policy) = on_essay_failure {
                    marking.on_essay_failure = *policy;
                }
            }
            Command::Serve { host, port } => {
                override_with(&mut config.server.host, host);
                if let Some(port) = port {
                    config.server.port = *port;
                }
            }
        }

        Ok(config)
    }
}

#[cfg(feature = "cli")]
fn override_with(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
