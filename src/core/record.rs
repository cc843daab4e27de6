//! 批次数据模型：输入文件与逐文件测量记录

use serde::Serialize;
use std::sync::Arc;

/// 输入纹理文件（选择时创建，之后只读）
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    /// 不可变原始字节，可在工作线程间廉价共享
    pub raw_bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, raw_bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            raw_bytes: raw_bytes.into(),
        }
    }

    /// 原始文件大小（字节）
    #[inline]
    pub fn raw_size(&self) -> u64 {
        self.raw_bytes.len() as u64
    }
}

/// 单个文件在批次中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Decoded,
    Failed,
}

/// 逐文件测量记录
///
/// 由批次编排器独占并就地更新；`decoded_size` 与 `transcoding_time_ms`
/// 在测量完成前为0。并发模式下单文件耗时不可归因，保持为0。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub raw_size: u64,
    pub decoded_size: u64,
    pub transcoding_time_ms: f64,
    pub status: RecordStatus,
}

impl FileRecord {
    /// 为新批次创建待测记录
    pub fn pending(file: &SourceFile) -> Self {
        Self {
            name: file.name.clone(),
            raw_size: file.raw_size(),
            decoded_size: 0,
            transcoding_time_ms: 0.0,
            status: RecordStatus::Pending,
        }
    }

    #[inline]
    pub fn is_decoded(&self) -> bool {
        self.status == RecordStatus::Decoded
    }
}
