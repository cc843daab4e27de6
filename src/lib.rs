//! KTX2 Transcode Bench
//!
//! 体积视频纹理序列（KTX2容器）的转码基准引擎：测量解码耗时与离散度，
//! 估算无卡顿流式回放所需的最低拉取带宽，并对比压缩纹理与未压缩帧序列的显存占用。
//!
//! ## 核心特性
//! - 串行 / 并发两种执行方式，逐文件记录与整批墙钟时间
//! - 解码输入的防御性复制，计时只覆盖解码调用本身
//! - 单文件失败隔离，批次按代次号丢弃过期结果
//! - 吞吐量"不可行"作为显式结论返回
//! - 内置KTX2解码器（无超压缩 / Zstandard），可注入第三方实现

pub mod core;
pub mod error;
pub mod processing;
pub mod texture;
pub mod tools;

// 重新导出核心类型
pub use core::{
    BenchmarkConfig, ComputedStats, ErrorPolicy, ExecutionMode, FileRecord, RecordStatus,
    SourceFile, ThroughputEstimate, VramSample,
};
pub use error::{BenchError, BenchResult, ErrorCategory, TranscodeError};
pub use processing::{BatchEvent, BatchObserver, BatchPhase, BatchReport, Benchmark};
pub use texture::{
    DecoderProvider, DecoderSession, Ktx2Decoder, Ktx2DecoderProvider, RendererCapabilities,
    Texture, TextureDecoder,
};
