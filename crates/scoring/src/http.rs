use async_trait::async_trait;
use chartlab_core::config::ScoringConfig;
use chartlab_core::scoring::entity::{ScoreRequest, ScoreResponse, ScoreResult};
use chartlab_core::scoring::error::ScoringError;
use chartlab_core::scoring::port::ScoringService;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// # Summary
/// 通过 HTTP 调用外部评分后端的评分服务。
///
/// # Invariants
/// - 请求发往 `{base_url}/charting_exam/{exam_type}/validate`。
/// - 只传输时间/价格，不含任何像素坐标。
pub struct HttpScoringService {
    client: Client,
    base_url: String,
}

impl HttpScoringService {
    /// # Summary
    /// 根据配置创建服务。
    ///
    /// # Logic
    /// 1. 安装进程级 rustls 加密后端 (已安装则跳过)。
    /// 2. 构建带超时的 reqwest 客户端。
    ///
    /// # Returns
    /// 客户端构建失败返回 `ScoringError::Network`。
    pub fn new(config: &ScoringConfig) -> Result<Self, ScoringError> {
        install_crypto_provider();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScoringError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, exam_type: &str) -> String {
        format!("{}/charting_exam/{exam_type}/validate", self.base_url)
    }
}

fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

#[async_trait]
impl ScoringService for HttpScoringService {
    /// # Summary
    /// POST 评分请求并解析响应。
    ///
    /// # Logic
    /// 1. 发送失败 (连接、超时) 映射为 `Network`。
    /// 2. 400/422 表示请求内容被拒绝，映射为 `Validation`。
    /// 3. 其余非成功状态映射为 `Network`。
    /// 4. 响应体无法解析映射为 `Validation`。
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResult, ScoringError> {
        let url = self.endpoint(&request.exam_type);
        debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ScoringError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ScoringError::Validation(format!("{status}: {body}"))
                }
                _ => ScoringError::Network(format!("{status}: {body}")),
            });
        }

        let payload: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::Validation(e.to_string()))?;
        Ok(ScoreResult::from(payload))
    }
}
