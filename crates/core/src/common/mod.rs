pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// # Summary
/// K 线周期枚举，随评分请求一并提交，决定评分服务使用的时间容差尺度。
///
/// # Invariants
/// - 序列化形式与外部评分服务约定一致 (例如 `1d`, `4h`)。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[default]
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl Interval {
    /// 单根 K 线覆盖的秒数。
    pub fn seconds(self) -> i64 {
        match self {
            Interval::Minute1 => 60,
            Interval::Minute5 => 300,
            Interval::Minute15 => 900,
            Interval::Hour1 => 3_600,
            Interval::Hour4 => 14_400,
            Interval::Day1 => 86_400,
            Interval::Week1 => 604_800,
        }
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "minute1" => Ok(Interval::Minute1),
            "5m" | "minute5" => Ok(Interval::Minute5),
            "15m" | "minute15" => Ok(Interval::Minute15),
            "1h" | "hour1" => Ok(Interval::Hour1),
            "4h" | "hour4" => Ok(Interval::Hour4),
            "1d" | "day1" => Ok(Interval::Day1),
            "1w" | "week1" => Ok(Interval::Week1),
            _ => Err(format!("Unknown Interval: {}", s)),
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Minute1 => write!(f, "1m"),
            Interval::Minute5 => write!(f, "5m"),
            Interval::Minute15 => write!(f, "15m"),
            Interval::Hour1 => write!(f, "1h"),
            Interval::Hour4 => write!(f, "4h"),
            Interval::Day1 => write!(f, "1d"),
            Interval::Week1 => write!(f, "1w"),
        }
    }
}

/// # Summary
/// 绘图会话的代际令牌。每次加载新图表时递增，
/// 在途的评分请求据此判断响应是否已过期。
///
/// # Invariants
/// - 令牌值单调递增，克隆体共享同一计数器。
#[derive(Debug, Clone, Default)]
pub struct SessionToken(Arc<AtomicU64>);

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取当前代际。
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// 进入下一代际并返回新值。
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse_and_display() {
        assert_eq!("4H".parse::<Interval>(), Ok(Interval::Hour4));
        assert_eq!(Interval::Week1.to_string(), "1w");
        assert!("2d".parse::<Interval>().is_err());
        assert_eq!(serde_json::to_string(&Interval::Day1).ok().as_deref(), Some("\"1d\""));
    }

    #[test]
    fn test_session_token_shared_between_clones() {
        let token = SessionToken::new();
        let observer = token.clone();
        assert_eq!(observer.current(), 0);
        assert_eq!(token.advance(), 1);
        assert_eq!(observer.current(), 1);
    }
}
