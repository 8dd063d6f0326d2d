use thiserror::Error;

/// # Summary
/// 评分域错误枚举。
///
/// # Invariants
/// - 任何评分失败都不影响标注集合，用户可直接重试提交。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 评分服务拒绝了请求内容，或响应无法解析
    #[error("Validation error: {0}")]
    Validation(String),
    // 同一会话已有在途的评分请求
    #[error("A submission is already in flight")]
    Busy,
    // 响应返回时会话已被重置
    #[error("Session was reset while the submission was in flight")]
    Stale,
}

impl ScoringError {
    /// 是否可由用户直接重试。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScoringError::Network(_) | ScoringError::Validation(_) | ScoringError::Busy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_and_validation_failures_are_retryable() {
        assert!(ScoringError::Network("timeout".into()).is_retryable());
        assert!(ScoringError::Validation("422".into()).is_retryable());
        assert!(ScoringError::Busy.is_retryable());
        assert!(!ScoringError::Stale.is_retryable());
    }
}
