//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。
//! 帧数与帧率按原始整数接收，由 [`BenchmarkConfig::new`] 统一验证。

use crate::core::{BenchmarkConfig, ErrorPolicy, ExecutionMode};
use crate::error::BenchResult;
use crate::texture::RendererCapabilities;
use crate::tools::constants::defaults;
use clap::{Arg, ArgAction, Command, value_parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 命令行选择的执行方式（`both` 依次运行串行与并发两个批次）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeSelection {
    #[default]
    Sequential,
    Concurrent,
    Both,
}

impl ModeSelection {
    /// 需要依次运行的执行方式
    pub fn modes(&self) -> Vec<ExecutionMode> {
        match self {
            Self::Sequential => vec![ExecutionMode::Sequential],
            Self::Concurrent => vec![ExecutionMode::Concurrent],
            Self::Both => vec![ExecutionMode::Sequential, ExecutionMode::Concurrent],
        }
    }
}

impl FromStr for ModeSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("both") {
            return Ok(Self::Both);
        }
        match s.parse::<ExecutionMode>()? {
            ExecutionMode::Sequential => Ok(Self::Sequential),
            ExecutionMode::Concurrent => Ok(Self::Concurrent),
        }
    }
}

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}")),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 输入文件或目录（目录只扫描一层）
    pub inputs: Vec<PathBuf>,

    /// 原始帧数输入（未验证）
    pub frame_count: i64,

    /// 原始帧率输入（未验证）
    pub frame_rate: i64,

    pub mode: ModeSelection,

    /// 出现解码失败即中止批次
    pub abort_on_error: bool,

    /// 渲染器单边最大纹理尺寸
    pub max_texture_size: u32,

    pub format: OutputFormat,

    /// 输出文件路径（可选，默认打印到终端）
    pub output_path: Option<PathBuf>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl AppConfig {
    /// 生成指定执行方式的已验证基准配置
    pub fn benchmark_config(&self, mode: ExecutionMode) -> BenchResult<BenchmarkConfig> {
        let policy = if self.abort_on_error {
            ErrorPolicy::AbortOnError
        } else {
            ErrorPolicy::BestEffort
        };
        Ok(BenchmarkConfig::new(self.frame_count, self.frame_rate, mode)?.with_error_policy(policy))
    }

    pub fn capabilities(&self) -> RendererCapabilities {
        RendererCapabilities {
            max_texture_dimension: self.max_texture_size,
        }
    }
}

fn build_command() -> Command {
    Command::new("ktx-bench")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("MacinMeter Team")
        .arg(
            Arg::new("INPUT")
                .help("KTX2文件或目录路径，可指定多个。如果不指定，将扫描可执行文件所在目录 / KTX2 files or directories")
                .num_args(0..)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("frame-count")
                .long("frame-count")
                .short('n')
                .help("每个文件包含的帧数 / Frames per file")
                .value_name("N")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("frame-rate")
                .long("frame-rate")
                .short('r')
                .help("回放帧率 (帧/秒) / Playback frame rate (fps)")
                .value_name("FPS")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .short('m')
                .help("执行方式 / Execution mode: sequential, concurrent, both")
                .value_name("MODE")
                .value_parser(|s: &str| s.parse::<ModeSelection>())
                .default_value("sequential"),
        )
        .arg(
            Arg::new("abort-on-error")
                .long("abort-on-error")
                .help("任一文件解码失败即中止批次 / Abort the batch on the first decode failure")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-texture-size")
                .long("max-texture-size")
                .help("渲染器最大纹理尺寸 / Renderer max texture dimension")
                .value_name("PIXELS")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("输出格式 / Output format: table, markdown, json")
                .value_name("FORMAT")
                .value_parser(|s: &str| s.parse::<OutputFormat>())
                .default_value("table"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("输出结果到文件 / Write the report to a file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息 / Verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> AppConfig {
    let matches = build_command().get_matches();
    config_from_matches(&matches)
}

/// 从给定参数解析（测试与嵌入使用）
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    Ok(config_from_matches(&matches))
}

fn config_from_matches(matches: &clap::ArgMatches) -> AppConfig {
    let mut inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("INPUT")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if inputs.is_empty() {
        // 双击启动模式：使用可执行文件所在目录
        let exe_path = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        inputs.push(super::utils::get_parent_dir(&exe_path).to_path_buf());
    }

    AppConfig {
        inputs,
        frame_count: matches
            .get_one::<i64>("frame-count")
            .copied()
            .unwrap_or(i64::from(defaults::FRAME_COUNT)),
        frame_rate: matches
            .get_one::<i64>("frame-rate")
            .copied()
            .unwrap_or(i64::from(defaults::FRAME_RATE)),
        mode: matches
            .get_one::<ModeSelection>("mode")
            .copied()
            .unwrap_or_default(),
        abort_on_error: matches.get_flag("abort-on-error"),
        max_texture_size: matches
            .get_one::<u32>("max-texture-size")
            .copied()
            .unwrap_or(defaults::MAX_TEXTURE_DIMENSION),
        format: matches
            .get_one::<OutputFormat>("format")
            .copied()
            .unwrap_or_default(),
        output_path: matches.get_one::<PathBuf>("output").cloned(),
        verbose: matches.get_flag("verbose"),
    }
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    eprintln!("KTX Transcode Bench v{VERSION}");
    eprintln!("{DESCRIPTION}");
    if config.verbose {
        eprintln!(
            "帧数 / frames: {}, 帧率 / fps: {}, 最大纹理 / max texture: {}",
            config.frame_count, config.frame_rate, config.max_texture_size
        );
    }
    eprintln!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        eprintln!("[OK] 所有批次处理完成 / All batches finished");
    }
}
