//! 批处理状态管理模块
//!
//! 一个批次的全部可变状态：代次号、阶段、逐文件记录、失败列表、显存样本与统计。
//! 由编排器在同一把锁内修改，每次写入前先核对代次号。

use crate::core::{ComputedStats, FileRecord, RecordStatus, SourceFile, VramEstimator};
use crate::error::{BenchError, ErrorCategory};
use serde::Serialize;
use std::collections::BTreeMap;

/// 批次阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Idle,
    Running,
    Completed,
    /// 批次失败，已完成的记录保留
    Failed,
}

/// 一次失败记录（按发生顺序保存，并归属到具体文件）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    /// 发生顺序（从0开始）
    pub occurrence: usize,
    pub index: usize,
    pub file: String,
    pub category: ErrorCategory,
    pub message: String,
}

/// 批处理统计快照
///
/// 包含成功/失败/未完成计数和错误分类统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchTally {
    pub decoded: usize,
    pub failed: usize,
    pub pending: usize,
    /// 错误分类统计（错误类型 -> 失败文件列表）
    pub error_stats: BTreeMap<ErrorCategory, Vec<String>>,
}

/// 一个批次的状态表
#[derive(Debug, Clone)]
pub struct BatchTable {
    generation: u64,
    phase: BatchPhase,
    records: Vec<FileRecord>,
    failures: Vec<FailureEntry>,
    vram: VramEstimator,
    stats: Option<ComputedStats>,
}

impl Default for BatchTable {
    fn default() -> Self {
        Self {
            generation: 0,
            phase: BatchPhase::Idle,
            records: Vec::new(),
            failures: Vec::new(),
            vram: VramEstimator::new(0),
            stats: None,
        }
    }
}

impl BatchTable {
    /// 开始新批次：整体替换，不与旧批次合并
    pub fn reset(&mut self, generation: u64, files: &[SourceFile], frame_count: u32) {
        self.generation = generation;
        self.phase = BatchPhase::Running;
        self.records = files.iter().map(FileRecord::pending).collect();
        self.failures.clear();
        self.vram = VramEstimator::new(frame_count);
        self.stats = None;
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 写入是否属于当前批次
    #[inline]
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    #[inline]
    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn failures(&self) -> &[FailureEntry] {
        &self.failures
    }

    pub fn vram(&self) -> &VramEstimator {
        &self.vram
    }

    pub fn vram_mut(&mut self) -> &mut VramEstimator {
        &mut self.vram
    }

    pub fn stats(&self) -> Option<&ComputedStats> {
        self.stats.as_ref()
    }

    /// 记录一次成功解码
    ///
    /// `transcoding_time_ms` 为 `None` 时（并发模式）不归因单文件耗时。
    pub fn inc_decoded(
        &mut self,
        index: usize,
        decoded_size: u64,
        transcoding_time_ms: Option<f64>,
    ) -> Option<&FileRecord> {
        let record = self.records.get_mut(index)?;
        record.decoded_size = decoded_size;
        record.transcoding_time_ms = transcoding_time_ms.unwrap_or(0.0);
        record.status = RecordStatus::Decoded;
        Some(&*record)
    }

    /// 记录一次失败，返回累计失败数
    pub fn inc_failed(&mut self, index: usize, error: &BenchError) -> usize {
        let file = match self.records.get_mut(index) {
            Some(record) => {
                record.status = RecordStatus::Failed;
                record.name.clone()
            }
            None => format!("#{index}"),
        };
        self.failures.push(FailureEntry {
            occurrence: self.failures.len(),
            index,
            file,
            category: ErrorCategory::from_bench_error(error),
            message: error.to_string(),
        });
        self.failures.len()
    }

    pub fn complete(&mut self, stats: ComputedStats) {
        self.stats = Some(stats);
        self.phase = BatchPhase::Completed;
    }

    pub fn fail(&mut self) {
        self.phase = BatchPhase::Failed;
    }

    /// 获取统计快照
    pub fn tally(&self) -> BatchTally {
        let mut error_stats: BTreeMap<ErrorCategory, Vec<String>> = BTreeMap::new();
        for failure in &self.failures {
            error_stats
                .entry(failure.category)
                .or_default()
                .push(failure.file.clone());
        }
        let count = |status: RecordStatus| self.records.iter().filter(|r| r.status == status).count();
        BatchTally {
            decoded: count(RecordStatus::Decoded),
            failed: count(RecordStatus::Failed),
            pending: count(RecordStatus::Pending),
            error_stats,
        }
    }
}
