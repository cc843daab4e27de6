//! 展示边界：批次事件流
//!
//! 编排器在批次状态锁内发出事件，保证已被取代的代次不会再有事件发出。
//! 观察者应当快速返回；需要慢速消费时用 [`ChannelObserver`] 转到其他线程。

use crate::core::{ComputedStats, FileRecord};
use crossbeam_channel::{Receiver, Sender};

/// 批次事件
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// 新批次开始，附带全部待测记录
    Started {
        generation: u64,
        records: Vec<FileRecord>,
    },
    /// 某个文件解码成功，记录已更新
    RecordSettled {
        generation: u64,
        index: usize,
        record: FileRecord,
    },
    /// 某个文件解码失败（批次继续）
    DecodeFailed {
        generation: u64,
        index: usize,
        file: String,
        message: String,
    },
    /// 批次完成，统计只发出一次
    Completed {
        generation: u64,
        stats: ComputedStats,
    },
    /// 批次失败（致命错误、中止策略或没有成功测量）
    Failed { generation: u64, message: String },
}

impl BatchEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Started { generation, .. }
            | Self::RecordSettled { generation, .. }
            | Self::DecodeFailed { generation, .. }
            | Self::Completed { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }

    /// 是否为批次的最后一个事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// 批次事件观察者
pub trait BatchObserver: Send + Sync {
    fn on_event(&self, event: &BatchEvent);
}

/// 通过crossbeam通道转发事件的观察者
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<BatchEvent>,
}

impl ChannelObserver {
    /// 创建无界通道观察者，返回 (观察者, 接收端)
    pub fn unbounded() -> (Self, Receiver<BatchEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }
}

impl BatchObserver for ChannelObserver {
    fn on_event(&self, event: &BatchEvent) {
        // 接收端已关闭时静默丢弃
        let _ = self.sender.send(event.clone());
    }
}
