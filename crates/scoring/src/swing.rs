use chartlab_core::chart::entity::Candle;
use std::fmt;

/// 主要摆动点的前后比较根数
pub const MAJOR_LOOKBACK: usize = 5;
/// 次要摆动点的前后比较根数
pub const MINOR_LOOKBACK: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

impl fmt::Display for SwingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwingKind::High => write!(f, "high"),
            SwingKind::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Major,
    Minor,
}

impl Significance {
    /// 命中该点可获得的分值。
    pub fn points(self) -> f64 {
        match self {
            Significance::Major => 2.0,
            Significance::Minor => 1.0,
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::Major => write!(f, "major"),
            Significance::Minor => write!(f, "minor"),
        }
    }
}

/// 检测到的摆动点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub kind: SwingKind,
    pub significance: Significance,
    pub index: usize,
    pub candle: Candle,
}

impl SwingPoint {
    pub fn price(&self) -> f64 {
        match self.kind {
            SwingKind::High => self.candle.high,
            SwingKind::Low => self.candle.low,
        }
    }
}

/// # Summary
/// 检测 K 线序列中的摆动高点与低点。
///
/// # Logic
/// 1. 主要摆动点：high 严格高于前后各 `MAJOR_LOOKBACK` 根 K 线的 high (低点对称)。
/// 2. 次要摆动点：同样规则，窗口为 `MINOR_LOOKBACK`，跳过已被识别为主要点的位置。
/// 3. 高点与低点分别按时间排序。
///
/// # Returns
/// `(高点列表, 低点列表)`。
pub fn detect_swing_points(candles: &[Candle]) -> (Vec<SwingPoint>, Vec<SwingPoint>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    for (lookback, significance) in [
        (MAJOR_LOOKBACK, Significance::Major),
        (MINOR_LOOKBACK, Significance::Minor),
    ] {
        detect_pass(candles, lookback, significance, SwingKind::High, &mut highs);
        detect_pass(candles, lookback, significance, SwingKind::Low, &mut lows);
    }
    highs.sort_by_key(|p| p.candle.time);
    lows.sort_by_key(|p| p.candle.time);
    (highs, lows)
}

fn detect_pass(
    candles: &[Candle],
    lookback: usize,
    significance: Significance,
    kind: SwingKind,
    found: &mut Vec<SwingPoint>,
) {
    if candles.len() <= lookback * 2 {
        return;
    }
    let extreme = |c: &Candle| match kind {
        SwingKind::High => c.high,
        SwingKind::Low => -c.low,
    };
    for index in lookback..candles.len() - lookback {
        if found.iter().any(|p| p.index == index) {
            continue;
        }
        let current = extreme(&candles[index]);
        let is_swing = (1..=lookback).all(|j| {
            current > extreme(&candles[index - j]) && current > extreme(&candles[index + j])
        });
        if is_swing {
            found.push(SwingPoint {
                kind,
                significance,
                index,
                candle: candles[index],
            });
        }
    }
}
