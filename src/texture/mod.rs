//! 纹理解码器边界
//!
//! 基准引擎只依赖这里的三个契约：解码器的初始化/释放（[`DecoderProvider`]），
//! 单次解码（[`TextureDecoder`]），以及解码产物（[`Texture`]）。
//! 内置实现见 [`ktx2`]，测试可注入任意实现。

pub mod ktx2;

use crate::error::{BenchResult, TranscodeError};
use crate::tools::constants::defaults;
use serde::Serialize;

pub use ktx2::{Ktx2Decoder, Ktx2DecoderProvider};

/// 解码后的纹理（基础层级）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// 基础mip层级的栅格数据，其长度近似显存占用
    pub payload: Vec<u8>,
}

impl Texture {
    /// 解码后负载大小（字节）
    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// 渲染器能力（解码器初始化时探测）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RendererCapabilities {
    /// 单边最大纹理尺寸
    pub max_texture_dimension: u32,
}

impl Default for RendererCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: defaults::MAX_TEXTURE_DIMENSION,
        }
    }
}

/// 纹理解码器trait
///
/// `decode` 取得缓冲区所有权：实现可以就地修改或消费输入，
/// 调用方负责在此之前做防御性复制。
pub trait TextureDecoder: Send + Sync {
    /// 获取解码器名称
    fn name(&self) -> &'static str;

    /// 解码一个完整的纹理容器
    fn decode(&self, bytes: Vec<u8>) -> Result<Texture, TranscodeError>;
}

/// 解码器提供者：负责每个批次一次的初始化与释放
pub trait DecoderProvider: Send + Sync {
    type Handle: TextureDecoder;

    /// 按渲染器能力初始化解码器（如加载转码器支持数据）
    fn init(&self, capabilities: &RendererCapabilities) -> BenchResult<Self::Handle>;

    /// 释放解码器持有的资源
    fn release(&self, handle: Self::Handle);
}

/// 解码器会话 - 作用域内持有解码器句柄，离开作用域时自动释放
///
/// 成功、失败以及提前返回路径都会经过 `Drop`，保证 `release` 恰好调用一次。
pub struct DecoderSession<'a, P: DecoderProvider> {
    provider: &'a P,
    handle: Option<P::Handle>,
}

impl<'a, P: DecoderProvider> DecoderSession<'a, P> {
    /// 初始化解码器并打开会话
    pub fn open(provider: &'a P, capabilities: &RendererCapabilities) -> BenchResult<Self> {
        let handle = provider.init(capabilities)?;
        log::debug!("解码器会话已打开 / decoder session opened: {}", handle.name());
        Ok(Self {
            provider,
            handle: Some(handle),
        })
    }

    /// 获取会话内的解码器
    pub fn decoder(&self) -> &P::Handle {
        match &self.handle {
            Some(handle) => handle,
            // 只有 Drop 会取走句柄
            None => unreachable!("decoder handle taken before drop"),
        }
    }
}

impl<P: DecoderProvider> Drop for DecoderSession<'_, P> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("解码器会话释放 / decoder session released: {}", handle.name());
            self.provider.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullDecoder;

    impl TextureDecoder for NullDecoder {
        fn name(&self) -> &'static str {
            "null"
        }

        fn decode(&self, _bytes: Vec<u8>) -> Result<Texture, TranscodeError> {
            Err(TranscodeError::Other("null".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingProvider {
        inits: AtomicUsize,
        releases: AtomicUsize,
        fail_init: bool,
    }

    impl DecoderProvider for CountingProvider {
        type Handle = NullDecoder;

        fn init(&self, _capabilities: &RendererCapabilities) -> BenchResult<NullDecoder> {
            if self.fail_init {
                return Err(BenchError::Resource("init".to_string()));
            }
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(NullDecoder)
        }

        fn release(&self, _handle: NullDecoder) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_session_releases_on_drop() {
        let provider = CountingProvider::default();
        {
            let session = DecoderSession::open(&provider, &RendererCapabilities::default())
                .expect("会话应能打开");
            assert_eq!(session.decoder().name(), "null");
            assert_eq!(provider.releases.load(Ordering::SeqCst), 0);
        }
        assert_eq!(provider.inits.load(Ordering::SeqCst), 1);
        assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_session_failed_init_releases_nothing() {
        let provider = CountingProvider {
            fail_init: true,
            ..Default::default()
        };
        assert!(DecoderSession::open(&provider, &RendererCapabilities::default()).is_err());
        assert_eq!(provider.releases.load(Ordering::SeqCst), 0);
    }
}
