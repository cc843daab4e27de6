//! 批次统计结果
//!
//! 按执行方式区分：串行模式的单文件耗时可归因，统计平均值与离散度；
//! 并发模式只有整批墙钟时间有意义，统计总量。只使用成功解码的记录。

use super::config::{BenchmarkConfig, ExecutionMode};
use super::record::FileRecord;
use super::stats::{mean, stdev_percent};
use super::throughput::{ThroughputEstimate, estimate_fetch_speed};
use crate::error::{BenchError, BenchResult};
use serde::Serialize;

/// 批次完成后计算的统计（计算后直到下一批次开始前不变）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ComputedStats {
    Sequential {
        decoded_files: usize,
        mean_transcoding_time_ms: f64,
        transcoding_time_stdev_pct: f64,
        mean_file_size: f64,
        file_size_stdev_pct: f64,
        play_time_ms: f64,
        required_fetch_speed: ThroughputEstimate,
    },
    Concurrent {
        decoded_files: usize,
        total_transcoding_time_ms: f64,
        total_file_size_bytes: u64,
        total_play_time_ms: f64,
        required_fetch_speed: ThroughputEstimate,
    },
}

impl ComputedStats {
    /// 从一个已结束批次的记录计算统计
    ///
    /// # 参数
    /// * `records` - 批次全部记录（失败与未完成的记录被忽略）
    /// * `batch_wall_time_ms` - 从首次启动到最后完成的墙钟时间
    /// * `config` - 已验证的配置
    pub fn compute(
        records: &[FileRecord],
        batch_wall_time_ms: f64,
        config: &BenchmarkConfig,
    ) -> BenchResult<Self> {
        let decoded: Vec<&FileRecord> = records.iter().filter(|r| r.is_decoded()).collect();
        if decoded.is_empty() {
            return Err(BenchError::NoMeasurements);
        }
        let n = decoded.len();

        match config.mode() {
            ExecutionMode::Sequential => {
                let times: Vec<f64> = decoded.iter().map(|r| r.transcoding_time_ms).collect();
                let sizes: Vec<f64> = decoded.iter().map(|r| r.raw_size as f64).collect();

                let mean_transcoding_time_ms = mean(&times).ok_or(BenchError::NoMeasurements)?;
                let mean_file_size = mean(&sizes).ok_or(BenchError::NoMeasurements)?;
                let play_time_ms = config.play_time_ms();

                Ok(Self::Sequential {
                    decoded_files: n,
                    mean_transcoding_time_ms,
                    transcoding_time_stdev_pct: stdev_percent(&times).unwrap_or(0.0),
                    mean_file_size,
                    file_size_stdev_pct: stdev_percent(&sizes).unwrap_or(0.0),
                    play_time_ms,
                    required_fetch_speed: estimate_fetch_speed(
                        mean_file_size,
                        play_time_ms,
                        mean_transcoding_time_ms,
                    ),
                })
            }
            ExecutionMode::Concurrent => {
                let total_file_size_bytes = decoded
                    .iter()
                    .fold(0u64, |acc, r| acc.saturating_add(r.raw_size));
                // 所有文件首尾相接回放的总预算
                let total_play_time_ms = n as f64 * config.play_time_ms();

                Ok(Self::Concurrent {
                    decoded_files: n,
                    total_transcoding_time_ms: batch_wall_time_ms,
                    total_file_size_bytes,
                    total_play_time_ms,
                    required_fetch_speed: estimate_fetch_speed(
                        total_file_size_bytes as f64,
                        total_play_time_ms,
                        batch_wall_time_ms,
                    ),
                })
            }
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        match self {
            Self::Sequential { .. } => ExecutionMode::Sequential,
            Self::Concurrent { .. } => ExecutionMode::Concurrent,
        }
    }

    pub fn required_fetch_speed(&self) -> &ThroughputEstimate {
        match self {
            Self::Sequential {
                required_fetch_speed,
                ..
            }
            | Self::Concurrent {
                required_fetch_speed,
                ..
            } => required_fetch_speed,
        }
    }

    /// 串行为平均转码耗时，并发为整批耗时
    pub fn transcoding_time_ms(&self) -> f64 {
        match self {
            Self::Sequential {
                mean_transcoding_time_ms,
                ..
            } => *mean_transcoding_time_ms,
            Self::Concurrent {
                total_transcoding_time_ms,
                ..
            } => *total_transcoding_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::RecordStatus;

    fn record(name: &str, raw_size: u64, time_ms: f64, status: RecordStatus) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            raw_size,
            decoded_size: raw_size * 4,
            transcoding_time_ms: time_ms,
            status,
        }
    }

    #[test]
    fn test_sequential_stats() {
        let records = vec![
            record("a", 100, 10.0, RecordStatus::Decoded),
            record("b", 200, 20.0, RecordStatus::Decoded),
            record("c", 300, 30.0, RecordStatus::Decoded),
            record("d", 9999, 0.0, RecordStatus::Failed),
        ];
        let config = BenchmarkConfig::default();
        let stats = ComputedStats::compute(&records, 61.0, &config).unwrap();

        match &stats {
            ComputedStats::Sequential {
                decoded_files,
                mean_transcoding_time_ms,
                mean_file_size,
                file_size_stdev_pct,
                play_time_ms,
                required_fetch_speed,
                ..
            } => {
                assert_eq!(*decoded_files, 3);
                assert_eq!(*mean_transcoding_time_ms, 20.0);
                assert_eq!(*mean_file_size, 200.0);
                assert!((file_size_stdev_pct - 40.824829046).abs() < 1e-6);
                assert_eq!(*play_time_ms, 280.0);
                // 200字节 / 0.26秒
                let speed = required_fetch_speed.bytes_per_sec().unwrap();
                assert!((speed - 200.0 / 0.26).abs() < 1e-6);
            }
            other => panic!("应为串行统计: {other:?}"),
        }
    }

    #[test]
    fn test_sequential_infeasible() {
        let records = vec![record("slow", 500, 300.0, RecordStatus::Decoded)];
        let config = BenchmarkConfig::default();
        let stats = ComputedStats::compute(&records, 300.0, &config).unwrap();
        assert!(!stats.required_fetch_speed().is_feasible());
    }

    #[test]
    fn test_concurrent_totals() {
        let records = vec![
            record("a", 1000, 0.0, RecordStatus::Decoded),
            record("b", 3000, 0.0, RecordStatus::Decoded),
        ];
        let config = BenchmarkConfig::default().with_mode(ExecutionMode::Concurrent);
        let stats = ComputedStats::compute(&records, 60.0, &config).unwrap();
        match stats {
            ComputedStats::Concurrent {
                total_transcoding_time_ms,
                total_file_size_bytes,
                total_play_time_ms,
                required_fetch_speed,
                ..
            } => {
                assert_eq!(total_transcoding_time_ms, 60.0);
                assert_eq!(total_file_size_bytes, 4000);
                assert_eq!(total_play_time_ms, 560.0);
                let speed = required_fetch_speed.bytes_per_sec().unwrap();
                assert!((speed - 4000.0 / 0.5).abs() < 1e-6);
            }
            other => panic!("应为并发统计: {other:?}"),
        }
    }

    #[test]
    fn test_no_decoded_records() {
        let records = vec![record("x", 10, 0.0, RecordStatus::Failed)];
        assert!(matches!(
            ComputedStats::compute(&records, 1.0, &BenchmarkConfig::default()),
            Err(BenchError::NoMeasurements)
        ));
    }
}
