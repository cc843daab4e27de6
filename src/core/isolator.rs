//! 缓冲区隔离
//!
//! 解码器可能消费或改写输入缓冲区，每次解码前先复制一份独立存储。

use crate::error::BenchResult;

/// 复制字节缓冲区，返回与原始存储无关的副本
///
/// 分配失败映射为 [`crate::error::BenchError::Allocation`]，由调用方视为批次级致命错误。
pub fn isolate(buffer: &[u8]) -> BenchResult<Vec<u8>> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(buffer.len())?;
    copy.extend_from_slice(buffer);
    Ok(copy)
}
