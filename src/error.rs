//! 统一错误处理框架
//!
//! 基准引擎的错误分类：配置、分配、单文件解码、资源与批次生命周期。
//! 吞吐量"不可行"不是错误，见 [`crate::core::throughput::ThroughputEstimate`]。

use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// 解码器边界返回的错误（单个纹理的转码失败原因）
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// 文件标识符不是KTX2
    #[error("不是KTX2文件 / not a KTX2 container")]
    InvalidIdentifier,

    /// 头部或层级数据越界
    #[error("数据截断 / truncated data: {0}")]
    Truncated(String),

    /// 不支持的超压缩方案（如BasisLZ）
    #[error("不支持的超压缩方案 / unsupported supercompression scheme: {0}")]
    UnsupportedSupercompression(u32),

    /// 纹理尺寸超出渲染器能力
    #[error("纹理尺寸 {width}x{height} 超出上限 {limit} / texture exceeds max dimension")]
    ExceedsMaxDimension { width: u32, height: u32, limit: u32 },

    /// 超压缩数据解压失败
    #[error("Zstandard解压失败 / zstd decompression failed: {0}")]
    Zstd(#[source] io::Error),

    /// 解压后大小与层级索引不一致
    #[error("解压大小不匹配 / payload size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// 声明的解压大小超出纹理尺寸允许的上限
    #[error("声明的解压大小 {claimed} 超出上限 {limit} / claimed uncompressed length exceeds limit")]
    ImplausibleLength { claimed: u64, limit: u64 },

    /// 第三方解码器的其他错误
    #[error("{0}")]
    Other(String),
}

/// 基准引擎的统一错误类型
#[derive(Debug, Error)]
pub enum BenchError {
    /// 配置无效（帧数、帧率非正数等）
    #[error("配置无效 / Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 缓冲区复制时内存分配失败（致命，终止本批次）
    #[error("内存分配失败 / Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// 单文件解码失败（隔离，不影响同批次其他文件）
    #[error("解码失败 / Decode failed [{file}]: {cause}")]
    Decode {
        file: String,
        #[source]
        cause: TranscodeError,
    },

    /// 文件I/O错误
    #[error("文件I/O错误 / I/O error: {0}")]
    Io(#[from] io::Error),

    /// 资源访问错误（线程池、解码器初始化）
    #[error("资源访问错误 / Resource error: {0}")]
    Resource(String),

    /// 批次结束但没有任何成功的测量
    #[error("没有可统计的测量结果 / No successful measurements in batch")]
    NoMeasurements,

    /// 批次已被更新的文件选择取代，结果被丢弃
    #[error("批次 #{generation} 已被取代 / Batch #{generation} superseded by a newer selection")]
    Superseded { generation: u64 },

    /// 按 abort-on-error 策略中止
    #[error("批次因解码失败中止 / Batch aborted: {decoded} decoded, {failed} failed")]
    Aborted { decoded: usize, failed: usize },
}

/// 基准操作的标准Result类型
pub type BenchResult<T> = Result<T, BenchError>;

/// 创建配置错误的helper函数
#[inline]
pub fn config_error(msg: impl Into<String>) -> BenchError {
    BenchError::InvalidConfig(msg.into())
}

/// 创建资源错误的helper函数
#[inline]
pub fn resource_error<E: std::fmt::Display>(context: &str, err: E) -> BenchError {
    BenchError::Resource(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和退出码映射

/// 错误类别枚举
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, serde::Serialize)]
pub enum ErrorCategory {
    /// 配置相关错误
    Config,
    /// 解码相关错误
    Decoding,
    /// I/O相关错误
    Io,
    /// 内存分配错误
    Allocation,
    /// 线程池、解码器初始化等资源错误
    Resource,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从BenchError提取错误类别
    pub fn from_bench_error(e: &BenchError) -> Self {
        match e {
            BenchError::InvalidConfig(_) => Self::Config,
            BenchError::Decode { .. } => Self::Decoding,
            BenchError::Io(_) => Self::Io,
            BenchError::Allocation(_) => Self::Allocation,
            BenchError::Resource(_) => Self::Resource,
            BenchError::NoMeasurements
            | BenchError::Superseded { .. }
            | BenchError::Aborted { .. } => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Config => "配置错误 / Config",
            Self::Decoding => "解码错误 / Decoding",
            Self::Io => "I/O错误 / I/O",
            Self::Allocation => "内存错误 / Allocation",
            Self::Resource => "资源错误 / Resource",
            Self::Other => "其他错误 / Other",
        }
    }
}
