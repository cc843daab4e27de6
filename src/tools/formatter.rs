//! 输出格式化模块
//!
//! 把批次报告渲染为终端表格、Markdown或JSON。只读消费报告，不参与计算。

use super::cli::OutputFormat;
use super::utils::{format_bytes, format_rate};
use crate::core::{ComputedStats, RecordStatus, ThroughputEstimate, summarize};
use crate::processing::BatchReport;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use std::fmt::Write as _;
use std::path::Path;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 渲染全部批次报告（`--mode both` 时为两个）
pub fn render_reports(reports: &[BatchReport], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => render_json(reports),
        OutputFormat::Table => render_text(reports, UTF8_FULL, false),
        OutputFormat::Markdown => render_text(reports, ASCII_MARKDOWN, true),
    }
}

fn render_json(reports: &[BatchReport]) -> String {
    match reports {
        [single] => serde_json::to_string_pretty(single).unwrap_or_default(),
        many => serde_json::to_string_pretty(many).unwrap_or_default(),
    }
}

fn render_text(reports: &[BatchReport], preset: &str, markdown: bool) -> String {
    let mut out = String::new();
    for report in reports {
        let (h2, h3) = if markdown { ("## ", "### ") } else { ("", "") };
        let _ = writeln!(
            out,
            "{h2}转码基准报告 / Transcode Benchmark Report ({})",
            report.config.mode()
        );
        if !markdown {
            out.push_str("================================\n");
        }
        let bullet = if markdown { "- " } else { "" };
        let _ = writeln!(out, "{bullet}批次 / Batch: #{}", report.generation);
        let _ = writeln!(
            out,
            "{bullet}帧数 / Frames: {} @ {} fps",
            report.config.frame_count(),
            report.config.frame_rate()
        );
        let _ = writeln!(
            out,
            "{bullet}文件 / Files: {} decoded, {} failed",
            report.tally.decoded, report.tally.failed
        );
        let _ = writeln!(
            out,
            "{bullet}批次耗时 / Batch wall time: {:.2} ms",
            report.batch_wall_time_ms
        );
        let _ = writeln!(
            out,
            "{bullet}时间戳 / Timestamp: {}\n",
            report.finished_at.format("%Y-%m-%d %H:%M:%S")
        );

        let _ = writeln!(out, "{h3}Files / 文件\n\n{}\n", records_table(report, preset));
        let _ = writeln!(out, "{h3}Statistics / 统计\n\n{}\n", stats_table(report, preset));
        let _ = writeln!(out, "{h3}VRAM / 显存\n\n{}\n", vram_table(report, preset));
        if let Some(table) = failures_table(report, preset) {
            let _ = writeln!(out, "{h3}Failures / 失败\n\n{table}\n");
        }
    }
    let _ = writeln!(out, "生成工具 / Generated by: KTX Transcode Bench v{VERSION}");
    out
}

fn new_table(preset: &str) -> Table {
    let mut table = Table::new();
    table.load_preset(preset);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text.to_string()).set_alignment(CellAlignment::Right)
}

/// 逐文件记录表
pub fn records_table(report: &BatchReport, preset: &str) -> Table {
    let attributed = matches!(report.stats, ComputedStats::Sequential { .. });
    let mut table = new_table(preset);
    table.set_header(vec!["#", "File", "Raw size", "Decoded size", "Time (ms)", "Status"]);

    for (i, record) in report.records.iter().enumerate() {
        let (decoded, time, status) = match record.status {
            RecordStatus::Decoded => (
                format_bytes(record.decoded_size as f64),
                if attributed {
                    format!("{:.2}", record.transcoding_time_ms)
                } else {
                    "-".to_string()
                },
                "OK",
            ),
            RecordStatus::Failed => ("-".to_string(), "-".to_string(), "FAIL"),
            RecordStatus::Pending => ("-".to_string(), "-".to_string(), "PENDING"),
        };
        table.add_row(vec![
            right(i + 1),
            Cell::new(&record.name),
            right(format_bytes(record.raw_size as f64)),
            right(decoded),
            right(time),
            Cell::new(status),
        ]);
    }
    table
}

/// 带宽估算的可读形式
pub fn format_throughput(estimate: &ThroughputEstimate) -> String {
    match estimate {
        ThroughputEstimate::Feasible { bytes_per_sec, .. } => format_rate(*bytes_per_sec),
        ThroughputEstimate::Infeasible {
            play_time_ms,
            transcoding_time_ms,
        } => format!(
            "不可行 / infeasible (transcoding {transcoding_time_ms:.2} ms >= playback {play_time_ms:.2} ms)"
        ),
    }
}

/// 批次统计表
pub fn stats_table(report: &BatchReport, preset: &str) -> Table {
    let mut table = new_table(preset);
    table.set_header(vec!["Metric", "Value"]);

    let mut row = |name: &str, value: String| {
        table.add_row(vec![Cell::new(name), right(value)]);
    };

    match &report.stats {
        ComputedStats::Sequential {
            decoded_files,
            mean_transcoding_time_ms,
            transcoding_time_stdev_pct,
            mean_file_size,
            file_size_stdev_pct,
            play_time_ms,
            required_fetch_speed,
        } => {
            row("Decoded files", decoded_files.to_string());
            row(
                "Mean transcoding time",
                format!("{mean_transcoding_time_ms:.2} ms ± {transcoding_time_stdev_pct:.1}%"),
            );
            let times: Vec<f64> = report
                .records
                .iter()
                .filter(|r| r.is_decoded())
                .map(|r| r.transcoding_time_ms)
                .collect();
            if let Some(summary) = summarize(&times) {
                row(
                    "Transcoding median / min / max",
                    format!(
                        "{:.2} / {:.2} / {:.2} ms",
                        summary.median, summary.min, summary.max
                    ),
                );
            }
            row(
                "Mean file size",
                format!("{} ± {file_size_stdev_pct:.1}%", format_bytes(*mean_file_size)),
            );
            row("Play time per file", format!("{play_time_ms:.2} ms"));
            row("Required fetch speed", format_throughput(required_fetch_speed));
        }
        ComputedStats::Concurrent {
            decoded_files,
            total_transcoding_time_ms,
            total_file_size_bytes,
            total_play_time_ms,
            required_fetch_speed,
        } => {
            row("Decoded files", decoded_files.to_string());
            row(
                "Total transcoding time",
                format!("{total_transcoding_time_ms:.2} ms"),
            );
            row("Total file size", format_bytes(*total_file_size_bytes as f64));
            row("Total play time", format!("{total_play_time_ms:.2} ms"));
            row("Required fetch speed", format_throughput(required_fetch_speed));
        }
    }
    table
}

/// 显存对比表
pub fn vram_table(report: &BatchReport, preset: &str) -> Table {
    let mut table = new_table(preset);
    table.set_header(vec![
        "File".to_string(),
        "Compressed VRAM".to_string(),
        format!("Raster VRAM ({} frames)", report.config.frame_count()),
        "Saving".to_string(),
    ]);

    let ratio = |compressed: u64, raster: u64| {
        if compressed == 0 {
            "-".to_string()
        } else {
            format!("{:.1}x", raster as f64 / compressed as f64)
        }
    };

    let (mut total_compressed, mut total_raster) = (0u64, 0u64);
    for sample in &report.vram {
        total_compressed = total_compressed.saturating_add(sample.compressed_vram_bytes);
        total_raster = total_raster.saturating_add(sample.equivalent_raster_vram_bytes);
        table.add_row(vec![
            Cell::new(&sample.name),
            right(format_bytes(sample.compressed_vram_bytes as f64)),
            right(format_bytes(sample.equivalent_raster_vram_bytes as f64)),
            right(ratio(
                sample.compressed_vram_bytes,
                sample.equivalent_raster_vram_bytes,
            )),
        ]);
    }
    if report.vram.len() > 1 {
        table.add_row(vec![
            Cell::new("Total"),
            right(format_bytes(total_compressed as f64)),
            right(format_bytes(total_raster as f64)),
            right(ratio(total_compressed, total_raster)),
        ]);
    }
    table
}

/// 失败列表（无失败时为 `None`）
pub fn failures_table(report: &BatchReport, preset: &str) -> Option<Table> {
    if report.failures.is_empty() {
        return None;
    }
    let mut table = new_table(preset);
    table.set_header(vec!["#", "File", "Category", "Error"]);
    for failure in &report.failures {
        table.add_row(vec![
            right(failure.index + 1),
            Cell::new(&failure.file),
            Cell::new(failure.category.display_name()),
            Cell::new(&failure.message),
        ]);
    }
    Some(table)
}

/// 写入报告文件
pub fn write_output(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)
}
