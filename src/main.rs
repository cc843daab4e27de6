//! KTX Transcode Bench - 主程序入口
//!
//! 纯流程控制器，负责协调各个工具模块完成转码基准任务。

use anyhow::{Context, Result};
use ktx_transcode_bench::{
    error::{BenchError, ErrorCategory},
    tools::{self, AppConfig},
};
use std::process;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 配置/输入错误
    pub const CONFIG_ERROR: i32 = 2;
    /// 解码失败（含没有成功测量、按策略中止）
    pub const DECODING_ERROR: i32 = 3;
    /// 内存分配错误
    pub const ALLOCATION_ERROR: i32 = 4;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &BenchError) -> &'static str {
    match error {
        BenchError::InvalidConfig(_) => {
            "帧数与帧率必须为正整数，使用 --help 查看完整用法 / Frame count and frame rate must be positive integers, use --help to see full usage"
        }
        BenchError::NoMeasurements => {
            "所有文件都解码失败，请确认输入为有效的KTX2文件 / Every file failed to decode, make sure the inputs are valid KTX2 files"
        }
        BenchError::Aborted { .. } => {
            "去掉 --abort-on-error 可在失败后继续其余文件 / Drop --abort-on-error to continue past failed files"
        }
        BenchError::Allocation(_) => {
            "内存不足，尝试 --mode sequential 或减少输入文件 / Out of memory, try --mode sequential or fewer input files"
        }
        _ => match ErrorCategory::from_bench_error(error) {
            ErrorCategory::Io => {
                "检查文件路径是否正确，文件是否存在且可读 / Check if file path is correct, file exists and is readable"
            }
            ErrorCategory::Decoding => {
                "文件可能损坏或使用不支持的超压缩方案（如BasisLZ） / File may be corrupted or use an unsupported supercompression scheme (e.g. BasisLZ)"
            }
            ErrorCategory::Resource => {
                "资源不可用，请检查系统资源或重试 / Resource unavailable, check system resources or retry"
            }
            _ => "请检查输入文件和参数设置 / Please check input files and parameter settings",
        },
    }
}

/// 错误处理和建议
fn handle_error(error: anyhow::Error) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error:#}");

    let Some(bench_error) = error.downcast_ref::<BenchError>() else {
        process::exit(exit_codes::GENERAL_ERROR);
    };

    eprintln!(
        "[INFO] 建议 / Suggestion: {}",
        get_error_suggestion(bench_error)
    );

    let exit_code = match bench_error {
        BenchError::NoMeasurements | BenchError::Aborted { .. } => exit_codes::DECODING_ERROR,
        _ => match ErrorCategory::from_bench_error(bench_error) {
            ErrorCategory::Config => exit_codes::CONFIG_ERROR,
            ErrorCategory::Decoding => exit_codes::DECODING_ERROR,
            ErrorCategory::Allocation => exit_codes::ALLOCATION_ERROR,
            ErrorCategory::Resource => exit_codes::RESOURCE_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 初始化日志：默认 warn，--verbose 时 info，RUST_LOG 优先
fn init_logging(config: &AppConfig) {
    let default_filter = if config.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// 应用程序主逻辑（便于测试和复用）
fn run() -> Result<()> {
    // 1. 解析命令行参数
    let config = tools::parse_args();
    init_logging(&config);

    // 2. 显示启动信息
    tools::show_startup_info(&config);

    // 3. 读取输入文件
    let files = tools::scan_inputs(&config.inputs)?;
    tools::show_scan_results(&config, &files);
    if files.is_empty() {
        return Ok(());
    }

    // 4. 运行批次并输出报告
    let reports = tools::run_benchmarks(&config, &files)?;
    let rendered = tools::render_reports(&reports, config.format);

    match &config.output_path {
        Some(path) => {
            tools::write_output(path, &rendered).with_context(|| {
                format!("写入报告失败 / Failed to write report: {}", path.display())
            })?;
            eprintln!("[OK] 报告已保存 / Report saved: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    tools::show_completion_info(&config);
    Ok(())
}

fn main() {
    // 可选：CPU火焰图分析（需开启 feature: flame-prof 且设置 KTXBENCH_FLAME=1）
    #[cfg(feature = "flame-prof")]
    let _guard = {
        let enabled = std::env::var("KTXBENCH_FLAME")
            .map(|v| v == "1")
            .unwrap_or(false);
        if enabled {
            // 采样频率：每秒 250 次
            match pprof::ProfilerGuard::new(250) {
                Ok(g) => Some(g),
                Err(e) => {
                    eprintln!(
                        "[WARNING] 启用火焰图采样失败 / Failed to enable flame graph sampling: {e}"
                    );
                    None
                }
            }
        } else {
            None
        }
    };

    // 执行主逻辑，统一处理错误
    let result = run();

    // 在退出前生成火焰图（仅在启用时）
    #[cfg(feature = "flame-prof")]
    if let Some(guard) = _guard
        && let Ok(report) = guard.report().build()
    {
        use std::fs::File;
        let mut options = pprof::flamegraph::Options::default();
        let out_path =
            std::env::var("KTXBENCH_FLAME_FILE").unwrap_or_else(|_| "flamegraph.svg".to_string());
        if let Ok(file) = File::create(&out_path)
            && report.flamegraph_with_options(file, &mut options).is_ok()
        {
            eprintln!("FlameGraph generated successfully / 生成成功: {out_path}");
        }
    }

    if let Err(error) = result {
        handle_error(error);
    }
}
