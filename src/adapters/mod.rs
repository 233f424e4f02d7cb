// 外部系統的具體實作：Bedrock 模型呼叫與 HTTP 服務
pub mod bedrock;
pub mod http;
