//! 工具模块集合
//!
//! 包含CLI、文件扫描、格式化与基准运行等工具模块，支持main.rs的流程控制。

pub mod cli;
pub mod constants;
pub mod formatter;
pub mod processor;
pub mod scanner;
pub mod utils;

// 重新导出主要的公共接口
pub use cli::{
    AppConfig, ModeSelection, OutputFormat, parse_args, parse_args_from, show_completion_info,
    show_startup_info,
};
pub use formatter::{
    failures_table, format_throughput, records_table, render_reports, stats_table, vram_table,
    write_output,
};
pub use processor::{run_benchmarks, show_progress};
pub use scanner::{
    collect_input_paths, load_source_file, scan_inputs, scan_texture_files, show_scan_results,
};
pub use utils::{bytes, path};
