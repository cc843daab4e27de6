//! 批次编排器
//!
//! 状态机 `Idle → Running → Completed`，致命错误或 abort-on-error 时 `Running → Failed`。
//!
//! ## 两种执行方式
//!
//! - **串行**：第 i 个文件解码结束（成功或失败）后才开始第 i+1 个，单文件耗时可归因。
//! - **并发**：全部文件同时启动，在rayon线程池上汇合；只有整批墙钟时间有意义。
//!
//! ## 代次号
//!
//! 每次选择新文件都会递增代次号并整体重置状态表。所有写入在状态表锁内
//! 先核对代次号，旧批次迟到的结果直接丢弃，不会混入新批次。
//!
//! 单个解码没有超时：卡住的解码会阻塞串行批次的后续文件，或阻塞并发批次的最终汇合。

use super::batch_state::{BatchPhase, BatchTable, BatchTally, FailureEntry};
use super::observer::{BatchEvent, BatchObserver};
use crate::core::{
    BenchmarkConfig, ComputedStats, ErrorPolicy, ExecutionMode, FileRecord, SourceFile,
    TimedDecode, VramSample, decode_timed,
};
use crate::error::{BenchError, BenchResult, resource_error};
use crate::texture::{DecoderProvider, DecoderSession, RendererCapabilities};
use crate::tools::constants::parallel_limits;
use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

/// 一个已完成批次的完整结果
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generation: u64,
    pub config: BenchmarkConfig,
    pub records: Vec<FileRecord>,
    pub failures: Vec<FailureEntry>,
    pub stats: ComputedStats,
    pub vram: Vec<VramSample>,
    /// 从首次启动到最后完成的墙钟时间
    pub batch_wall_time_ms: f64,
    pub tally: BatchTally,
    pub finished_at: DateTime<Local>,
}

/// 编排器与后台批次线程共享的状态
#[derive(Default)]
struct Shared {
    generation: AtomicU64,
    table: Mutex<BatchTable>,
}

/// 基准引擎
///
/// 持有解码器提供者与当前批次的状态表。克隆共享同一状态（Arc）。
pub struct Benchmark<P: DecoderProvider> {
    provider: Arc<P>,
    capabilities: RendererCapabilities,
    shared: Arc<Shared>,
    observer: Option<Arc<dyn BatchObserver>>,
}

impl<P: DecoderProvider> Clone for Benchmark<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            capabilities: self.capabilities,
            shared: Arc::clone(&self.shared),
            observer: self.observer.clone(),
        }
    }
}

/// 后台运行中的批次
pub struct BatchHandle {
    generation: u64,
    handle: thread::JoinHandle<BenchResult<BatchReport>>,
}

impl BatchHandle {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待批次结束
    pub fn join(self) -> BenchResult<BatchReport> {
        self.handle
            .join()
            .map_err(|_| BenchError::Resource("批次线程panic / batch thread panicked".to_string()))?
    }
}

/// 单文件解码的结算结果
enum Settlement {
    Decoded(TimedDecode),
    Failed(BenchError),
}

impl<P: DecoderProvider + 'static> Benchmark<P> {
    pub fn new(provider: P, capabilities: RendererCapabilities) -> Self {
        Self {
            provider: Arc::new(provider),
            capabilities,
            shared: Arc::new(Shared::default()),
            observer: None,
        }
    }

    /// 注册展示层观察者
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn capabilities(&self) -> &RendererCapabilities {
        &self.capabilities
    }

    /// 在当前线程运行一个批次（开始新批次并阻塞到结束）
    pub fn run(&self, files: Vec<SourceFile>, config: BenchmarkConfig) -> BenchResult<BatchReport> {
        let generation = self.begin(&files, &config);
        self.execute(generation, &files, &config)
    }

    /// 在后台线程运行一个批次
    ///
    /// 返回前新批次已经生效：之后查询到的记录都属于这个批次。
    pub fn spawn(&self, files: Vec<SourceFile>, config: BenchmarkConfig) -> BenchResult<BatchHandle> {
        let generation = self.begin(&files, &config);
        let engine = self.clone();
        let handle = thread::Builder::new()
            .name(format!("ktx-batch-{generation}"))
            .spawn(move || engine.execute(generation, &files, &config))
            .map_err(|e| resource_error("批次线程创建失败 / failed to spawn batch thread", e))?;
        Ok(BatchHandle { generation, handle })
    }

    /// 当前（最新）批次的代次号
    pub fn current_generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> BatchPhase {
        self.lock_table().phase()
    }

    /// 当前批次记录快照
    pub fn records(&self) -> Vec<FileRecord> {
        self.lock_table().records().to_vec()
    }

    pub fn failures(&self) -> Vec<FailureEntry> {
        self.lock_table().failures().to_vec()
    }

    /// 当前批次统计（完成前为 `None`）
    pub fn stats(&self) -> Option<ComputedStats> {
        self.lock_table().stats().cloned()
    }

    pub fn tally(&self) -> BatchTally {
        self.lock_table().tally()
    }

    pub fn vram_samples(&self) -> Vec<VramSample> {
        self.lock_table().vram().samples().to_vec()
    }

    /// 帧数变化：只重新推导等价显存，不重新解码，也不改动已计算的统计
    pub fn set_frame_count(&self, frame_count: i64) -> BenchResult<Vec<VramSample>> {
        let validated = BenchmarkConfig::default().with_frame_count(frame_count)?;
        let mut table = self.lock_table();
        table.vram_mut().set_frame_count(validated.frame_count());
        log::info!(
            "帧数更新为 {} / frame count set to {}, VRAM estimates recomputed",
            validated.frame_count(),
            validated.frame_count()
        );
        Ok(table.vram().samples().to_vec())
    }

    fn lock_table(&self) -> MutexGuard<'_, BatchTable> {
        // Mutex poison 降级：即使有线程 panic，也恢复数据继续服务
        self.shared
            .table
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    /// 开始新批次：递增代次号并整体重置状态表
    fn begin(&self, files: &[SourceFile], config: &BenchmarkConfig) -> u64 {
        let mut table = self.lock_table();
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        table.reset(generation, files, config.frame_count());
        log::info!(
            "批次 #{generation} 开始 / batch started: {} files, mode={}",
            files.len(),
            config.mode()
        );
        self.emit(BatchEvent::Started {
            generation,
            records: table.records().to_vec(),
        });
        generation
    }

    fn execute(
        &self,
        generation: u64,
        files: &[SourceFile],
        config: &BenchmarkConfig,
    ) -> BenchResult<BatchReport> {
        let outcome = match DecoderSession::open(&*self.provider, &self.capabilities) {
            Ok(session) => match config.mode() {
                ExecutionMode::Sequential => {
                    self.run_sequential(generation, files, config, &session)
                }
                ExecutionMode::Concurrent => {
                    self.run_concurrent(generation, files, config, &session)
                }
            },
            Err(e) => Err(e),
        };
        // 会话已在上面的作用域结束时释放

        match outcome {
            Ok(wall_ms) => self.complete(generation, config, wall_ms),
            Err(e) => {
                self.fail(generation, &e);
                Err(e)
            }
        }
    }

    fn run_sequential(
        &self,
        generation: u64,
        files: &[SourceFile],
        config: &BenchmarkConfig,
        session: &DecoderSession<'_, P>,
    ) -> BenchResult<f64> {
        let decoder = session.decoder();
        let start = Instant::now();

        for (index, file) in files.iter().enumerate() {
            let failed = match decode_timed(decoder, file) {
                Ok(timed) => {
                    self.settle(generation, index, Settlement::Decoded(timed), true)?;
                    false
                }
                Err(e @ BenchError::Decode { .. }) => {
                    self.settle(generation, index, Settlement::Failed(e), true)?;
                    true
                }
                Err(fatal) => return Err(fatal),
            };

            if failed && config.error_policy() == ErrorPolicy::AbortOnError {
                return Err(self.aborted());
            }
        }

        Ok(start.elapsed().as_secs_f64() * 1000.0)
    }

    fn run_concurrent(
        &self,
        generation: u64,
        files: &[SourceFile],
        config: &BenchmarkConfig,
        session: &DecoderSession<'_, P>,
    ) -> BenchResult<f64> {
        let decoder = session.decoder();
        let degree = files.len().clamp(
            parallel_limits::MIN_PARALLEL_DEGREE,
            parallel_limits::MAX_CONCURRENT_DECODES,
        );

        // 线程池创建不计入批次时间
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(degree)
            .thread_name(|i| format!("ktx-decode-{i}"))
            .build()
            .map_err(|e| resource_error("线程池创建失败 / thread pool build failed", e))?;

        let start = Instant::now();
        // collect 即汇合点：所有任务结束（成功或失败）后才返回
        let outcomes: Vec<BenchResult<bool>> = pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .map(|(index, file)| match decode_timed(decoder, file) {
                    Ok(timed) => self
                        .settle(generation, index, Settlement::Decoded(timed), false)
                        .map(|_| false),
                    Err(e @ BenchError::Decode { .. }) => self
                        .settle(generation, index, Settlement::Failed(e), false)
                        .map(|_| true),
                    Err(fatal) => Err(fatal),
                })
                .collect()
        });
        let wall_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut any_failed = false;
        let mut superseded = None;
        for outcome in outcomes {
            match outcome {
                Ok(failed) => any_failed |= failed,
                Err(e @ BenchError::Superseded { .. }) => superseded = Some(e),
                // 分配失败等致命错误优先
                Err(fatal) => return Err(fatal),
            }
        }
        if let Some(e) = superseded {
            return Err(e);
        }

        if any_failed && config.error_policy() == ErrorPolicy::AbortOnError {
            return Err(self.aborted());
        }

        Ok(wall_ms)
    }

    /// 把单文件结果写入状态表（核对代次号）
    fn settle(
        &self,
        generation: u64,
        index: usize,
        settlement: Settlement,
        attribute_time: bool,
    ) -> BenchResult<()> {
        let mut table = self.lock_table();
        if !table.is_current(generation) {
            log::warn!(
                "丢弃过期结果 / discarding stale result: batch #{generation} file #{index} (current #{})",
                table.generation()
            );
            return Err(BenchError::Superseded { generation });
        }

        match settlement {
            Settlement::Decoded(timed) => {
                let time = attribute_time.then_some(timed.elapsed_ms);
                let texture = &timed.texture;
                let record = table
                    .inc_decoded(index, texture.byte_size(), time)
                    .cloned();
                if let Some(record) = record {
                    table.vram_mut().record(
                        index,
                        &record.name,
                        texture.width,
                        texture.height,
                        texture.byte_size(),
                    );
                    self.emit(BatchEvent::RecordSettled {
                        generation,
                        index,
                        record,
                    });
                }
            }
            Settlement::Failed(error) => {
                log::warn!("文件 #{index} 解码失败 / decode failed: {error}");
                let file = table
                    .records()
                    .get(index)
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                table.inc_failed(index, &error);
                self.emit(BatchEvent::DecodeFailed {
                    generation,
                    index,
                    file,
                    message: error.to_string(),
                });
            }
        }
        Ok(())
    }

    fn aborted(&self) -> BenchError {
        let tally = self.lock_table().tally();
        BenchError::Aborted {
            decoded: tally.decoded,
            failed: tally.failed,
        }
    }

    /// 批次结束：计算一次统计并生成报告
    fn complete(
        &self,
        generation: u64,
        config: &BenchmarkConfig,
        wall_ms: f64,
    ) -> BenchResult<BatchReport> {
        let mut table = self.lock_table();
        if !table.is_current(generation) {
            return Err(BenchError::Superseded { generation });
        }

        let stats = match ComputedStats::compute(table.records(), wall_ms, config) {
            Ok(stats) => stats,
            Err(e) => {
                drop(table);
                self.fail(generation, &e);
                return Err(e);
            }
        };

        if table.vram().has_mixed_resolutions() {
            log::warn!(
                "批次包含不同分辨率的纹理，显存基线按首个纹理估算 / mixed resolutions in batch, raster baseline uses the first texture"
            );
        }

        table.complete(stats.clone());
        log::info!("批次 #{generation} 完成 / batch completed in {wall_ms:.2} ms");
        self.emit(BatchEvent::Completed {
            generation,
            stats: stats.clone(),
        });

        Ok(BatchReport {
            generation,
            config: *config,
            records: table.records().to_vec(),
            failures: table.failures().to_vec(),
            stats,
            vram: table.vram().samples().to_vec(),
            batch_wall_time_ms: wall_ms,
            tally: table.tally(),
            finished_at: Local::now(),
        })
    }

    fn fail(&self, generation: u64, error: &BenchError) {
        let mut table = self.lock_table();
        // 旧批次的失败不影响新批次
        if !table.is_current(generation) {
            return;
        }
        table.fail();
        log::warn!("批次 #{generation} 失败 / batch failed: {error}");
        self.emit(BatchEvent::Failed {
            generation,
            message: error.to_string(),
        });
    }
}
