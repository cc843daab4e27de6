//! 基准运行模块
//!
//! 命令行流程：为每种执行方式在后台线程运行一个批次，
//! 通过通道观察者把进度事件实时打印到终端。

use super::cli::AppConfig;
use crate::core::SourceFile;
use crate::error::BenchResult;
use crate::processing::{BatchEvent, BatchHandle, BatchReport, Benchmark, ChannelObserver};
use crate::texture::Ktx2DecoderProvider;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// 轮询批次线程状态的间隔
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 按命令行选择的执行方式依次运行批次
///
/// `--mode both` 时先串行后并发，两个批次使用同一组文件与同一个引擎（两个代次）。
pub fn run_benchmarks(config: &AppConfig, files: &[SourceFile]) -> BenchResult<Vec<BatchReport>> {
    let (observer, events) = ChannelObserver::unbounded();
    let bench = Benchmark::new(Ktx2DecoderProvider::new(), config.capabilities())
        .with_observer(Arc::new(observer));

    let mut reports = Vec::new();
    for mode in config.mode.modes() {
        let bench_config = config.benchmark_config(mode)?;
        if config.verbose {
            eprintln!("[PROCESSING] 执行方式 / Mode: {mode}");
        }

        let handle = bench.spawn(files.to_vec(), bench_config)?;
        follow_progress(&events, &handle, files.len(), config.verbose);
        reports.push(handle.join()?);
    }

    Ok(reports)
}

/// 打印批次进度，直到终止事件或批次线程结束
fn follow_progress(events: &Receiver<BatchEvent>, handle: &BatchHandle, total: usize, verbose: bool) {
    loop {
        match events.recv_timeout(PROGRESS_POLL_INTERVAL) {
            Ok(event) => {
                if event.generation() != handle.generation() {
                    continue;
                }
                show_progress(&event, total, verbose);
                if event.is_terminal() {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if handle.is_finished() {
                    // 线程已结束：打印残留事件后退出
                    for event in events.try_iter() {
                        if event.generation() == handle.generation() {
                            show_progress(&event, total, verbose);
                        }
                    }
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// 显示单个进度事件
pub fn show_progress(event: &BatchEvent, total: usize, verbose: bool) {
    match event {
        BatchEvent::Started { generation, .. } => {
            if verbose {
                eprintln!("[INFO] 批次 #{generation} 开始 / Batch started ({total} files)");
            }
        }
        BatchEvent::RecordSettled { index, record, .. } => {
            if verbose {
                eprintln!(
                    "   [OK] [{}/{total}] {} ({:.2} ms)",
                    index + 1,
                    record.name,
                    record.transcoding_time_ms
                );
            }
        }
        BatchEvent::DecodeFailed {
            index,
            file,
            message,
            ..
        } => {
            eprintln!("   [FAIL] [{}/{total}] {file} - {message}", index + 1);
        }
        BatchEvent::Completed { generation, stats } => {
            if verbose {
                eprintln!(
                    "[INFO] 批次 #{generation} 完成 / Batch completed ({} mode, {:.2} ms)",
                    stats.mode(),
                    stats.transcoding_time_ms()
                );
            }
        }
        BatchEvent::Failed {
            generation,
            message,
        } => {
            eprintln!("[ERROR] 批次 #{generation} 失败 / Batch failed: {message}");
        }
    }
}
