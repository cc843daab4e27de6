//! 核心算法模块
//!
//! 缓冲区隔离、计时解码、统计、带宽与显存估算。除解码驱动外均为纯计算。

pub mod computed;
pub mod config;
pub mod driver;
pub mod isolator;
pub mod record;
pub mod stats;
pub mod throughput;
pub mod vram;

// 重新导出公共接口
pub use computed::ComputedStats;
pub use config::{BenchmarkConfig, ErrorPolicy, ExecutionMode};
pub use driver::{TimedDecode, decode_timed};
pub use isolator::isolate;
pub use record::{FileRecord, RecordStatus, SourceFile};
pub use stats::{DistributionSummary, mean, population_stdev, stdev_percent, summarize};
pub use throughput::{ThroughputEstimate, estimate_fetch_speed};
pub use vram::{VramEstimator, VramSample, equivalent_raster_bytes};
