//! 解码驱动
//!
//! 单次解码调用的计时包装：单调时钟时间戳紧贴解码调用前后，
//! 缓冲区复制不计入耗时；失败路径不报告耗时，也从不重试。

use super::isolator::isolate;
use super::record::SourceFile;
use crate::error::{BenchError, BenchResult};
use crate::texture::{Texture, TextureDecoder};
use std::time::Instant;

/// 一次成功解码及其耗时
#[derive(Debug, Clone)]
pub struct TimedDecode {
    pub texture: Texture,
    pub elapsed_ms: f64,
}

/// 复制输入并计时解码
///
/// 返回的错误分两类：`BenchError::Decode` 只影响当前文件，
/// `BenchError::Allocation` 来自缓冲区复制，对整个批次是致命的。
pub fn decode_timed<D>(decoder: &D, file: &SourceFile) -> BenchResult<TimedDecode>
where
    D: TextureDecoder + ?Sized,
{
    let bytes = isolate(&file.raw_bytes)?;

    let start = Instant::now();
    let result = decoder.decode(bytes);
    let elapsed = start.elapsed();

    match result {
        Ok(texture) => {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            log::debug!(
                "解码完成 / decoded {} ({}x{}, {} bytes) in {elapsed_ms:.3} ms",
                file.name,
                texture.width,
                texture.height,
                texture.byte_size()
            );
            Ok(TimedDecode {
                texture,
                elapsed_ms,
            })
        }
        Err(cause) => Err(BenchError::Decode {
            file: file.name.clone(),
            cause,
        }),
    }
}
