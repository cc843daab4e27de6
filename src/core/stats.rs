//! 统计引擎
//!
//! 数值序列上的纯函数。空序列返回 `None`，由调用方处理 `n == 0`。

use serde::Serialize;

/// 算术平均值
pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// 总体标准差（除以 n）
pub fn population_stdev(xs: &[f64]) -> Option<f64> {
    let avg = mean(xs)?;
    let variance = xs.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / xs.len() as f64;
    Some(variance.sqrt())
}

/// 离散度百分比：总体标准差 / 平均值 × 100
///
/// `n == 1` 或平均值为0时比例无定义，固定返回0而不是NaN。
pub fn stdev_percent(xs: &[f64]) -> Option<f64> {
    let avg = mean(xs)?;
    if xs.len() == 1 || avg == 0.0 {
        return Some(0.0);
    }
    let stdev = population_stdev(xs)?;
    let pct = stdev / avg.abs() * 100.0;
    Some(if pct.is_finite() { pct } else { 0.0 })
}

/// 分布摘要（报告表格用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub mean: f64,
    pub stdev: f64,
    pub stdev_pct: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// 计算分布摘要
pub fn summarize(xs: &[f64]) -> Option<DistributionSummary> {
    let avg = mean(xs)?;

    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let median = if sorted.len() % 2 == 0 {
        let mid = sorted.len() / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };

    Some(DistributionSummary {
        mean: avg,
        stdev: population_stdev(xs)?,
        stdev_pct: stdev_percent(xs)?,
        median,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}
