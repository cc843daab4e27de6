//! 批次处理模块
//!
//! 批次编排器、批次状态表与展示边界的事件流。

pub mod batch;
pub mod batch_state;
pub mod observer;

// 重新导出公共接口
pub use batch::{BatchHandle, BatchReport, Benchmark};
pub use batch_state::{BatchPhase, BatchTable, BatchTally, FailureEntry};
pub use observer::{BatchEvent, BatchObserver, ChannelObserver};
