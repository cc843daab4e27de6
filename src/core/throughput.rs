//! 吞吐量估算
//!
//! 在回放时长预算内，扣除转码耗时后剩余的时间用于拉取数据：
//!
//! ```text
//! fetchBudgetSec     = (playTimeMs - transcodingTimeMs) / 1000
//! requiredFetchSpeed = fileSizeBytes / fetchBudgetSec
//! ```
//!
//! 预算不为正时（转码本身已耗尽回放窗口）结果是"不可行"，
//! 这是基准的主要结论之一，以独立的枚举分支返回而不是夹取成数值。

use serde::Serialize;

/// 最低拉取带宽估算结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThroughputEstimate {
    /// 可以实时回放，需要至少 `bytes_per_sec` 的带宽
    Feasible {
        bytes_per_sec: f64,
        fetch_budget_ms: f64,
    },
    /// 当前帧率下解码太慢，无论带宽多大都无法无卡顿回放
    Infeasible {
        play_time_ms: f64,
        transcoding_time_ms: f64,
    },
}

impl ThroughputEstimate {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible { .. })
    }

    /// 可行时的带宽（字节/秒）
    pub fn bytes_per_sec(&self) -> Option<f64> {
        match self {
            Self::Feasible { bytes_per_sec, .. } => Some(*bytes_per_sec),
            Self::Infeasible { .. } => None,
        }
    }

    /// 不可行时转码超出回放窗口的毫秒数
    pub fn deficit_ms(&self) -> Option<f64> {
        match self {
            Self::Feasible { .. } => None,
            Self::Infeasible {
                play_time_ms,
                transcoding_time_ms,
            } => Some(transcoding_time_ms - play_time_ms),
        }
    }
}

/// 估算无卡顿流式回放所需的最低拉取带宽
///
/// # 参数
/// * `file_size_bytes` - 平均（串行）或总（并发）文件大小
/// * `play_time_ms` - 对应的回放时长预算
/// * `transcoding_time_ms` - 平均（串行）或总（并发）转码耗时
pub fn estimate_fetch_speed(
    file_size_bytes: f64,
    play_time_ms: f64,
    transcoding_time_ms: f64,
) -> ThroughputEstimate {
    let fetch_budget_sec = (play_time_ms - transcoding_time_ms) / 1000.0;
    let infeasible = ThroughputEstimate::Infeasible {
        play_time_ms,
        transcoding_time_ms,
    };

    // NaN 也走不可行分支
    if !(fetch_budget_sec > 0.0) || !fetch_budget_sec.is_finite() {
        return infeasible;
    }

    let bytes_per_sec = file_size_bytes / fetch_budget_sec;
    if !bytes_per_sec.is_finite() || bytes_per_sec < 0.0 {
        return infeasible;
    }

    ThroughputEstimate::Feasible {
        bytes_per_sec,
        fetch_budget_ms: fetch_budget_sec * 1000.0,
    }
}
