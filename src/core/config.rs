//! 基准配置
//!
//! 帧数与帧率由用户输入，必须在进入统计计算前完成验证：
//! 非正数或溢出值返回 [`BenchError::InvalidConfig`]，绝不静默修正。

use crate::error::{BenchResult, config_error};
use crate::tools::constants::defaults;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// 解码执行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// 逐个解码，前一个结束后才开始下一个
    #[default]
    Sequential,
    /// 全部同时启动，统一汇合
    Concurrent,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "serial" | "seq" => Ok(Self::Sequential),
            "concurrent" | "parallel" | "par" => Ok(Self::Concurrent),
            _ => Err(format!("Unknown mode: {s}")),
        }
    }
}

/// 单文件解码失败时的批次策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// 记录失败并继续其余文件
    #[default]
    BestEffort,
    /// 出现失败即将批次标记为失败（保留已完成的部分记录）
    AbortOnError,
}

/// 基准配置（已验证）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchmarkConfig {
    frame_count: u32,
    frame_rate: u32,
    mode: ExecutionMode,
    error_policy: ErrorPolicy,
}

fn positive_u32(field: &str, value: i64) -> BenchResult<u32> {
    if value <= 0 {
        return Err(config_error(format!("{field} 必须为正整数 / must be positive, got {value}")));
    }
    u32::try_from(value)
        .map_err(|_| config_error(format!("{field} 超出范围 / out of range: {value}")))
}

impl BenchmarkConfig {
    /// 从原始用户输入创建配置
    pub fn new(frame_count: i64, frame_rate: i64, mode: ExecutionMode) -> BenchResult<Self> {
        Ok(Self {
            frame_count: positive_u32("frame_count", frame_count)?,
            frame_rate: positive_u32("frame_rate", frame_rate)?,
            mode,
            error_policy: ErrorPolicy::default(),
        })
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// 更换帧数（同样经过验证）
    pub fn with_frame_count(mut self, frame_count: i64) -> BenchResult<Self> {
        self.frame_count = positive_u32("frame_count", frame_count)?;
        Ok(self)
    }

    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    #[inline]
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    #[inline]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[inline]
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// 单个文件的回放时长（毫秒）：1000 × frameCount / frameRate
    #[inline]
    pub fn play_time_ms(&self) -> f64 {
        1000.0 * self.frame_count as f64 / self.frame_rate as f64
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            frame_count: defaults::FRAME_COUNT,
            frame_rate: defaults::FRAME_RATE,
            mode: ExecutionMode::default(),
            error_policy: ErrorPolicy::default(),
        }
    }
}
