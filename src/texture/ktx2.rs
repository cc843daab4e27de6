//! 内置KTX2解码器
//!
//! 解析KTX2容器头部与层级索引，取出基础mip层级：
//! - 无超压缩：直接复制层级数据
//! - Zstandard超压缩：按纹理尺寸限定 `uncompressedByteLength` 后流式解压并校验
//! - BasisLZ等需要外部转码器的方案：返回 [`TranscodeError::UnsupportedSupercompression`]

use super::{DecoderProvider, RendererCapabilities, Texture, TextureDecoder};
use crate::error::{BenchError, BenchResult, TranscodeError};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};

/// KTX2文件标识符 «KTX 20»\r\n\x1A\n
pub const KTX2_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// 标识符 + 9个u32头字段 + 索引区（4×u32 + 2×u64）
pub const HEADER_LEN: usize = 80;

/// 层级索引项：byteOffset, byteLength, uncompressedByteLength（均为u64）
pub const LEVEL_INDEX_ENTRY_LEN: usize = 24;

/// 单个纹素的最大字节数（R32G32B32A32_SFLOAT）
pub const MAX_TEXEL_BYTES: u64 = 16;

/// 超压缩方案编号
pub mod supercompression {
    pub const NONE: u32 = 0;
    pub const BASIS_LZ: u32 = 1;
    pub const ZSTD: u32 = 2;
    pub const ZLIB: u32 = 3;
}

/// KTX2头部字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ktx2Header {
    pub vk_format: u32,
    pub type_size: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub layer_count: u32,
    pub face_count: u32,
    pub level_count: u32,
    pub supercompression_scheme: u32,
}

/// 单个mip层级的位置信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelIndex {
    pub byte_offset: u64,
    pub byte_length: u64,
    pub uncompressed_byte_length: u64,
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, TranscodeError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| TranscodeError::Truncated(format!("u32 @ {offset}")))
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64, TranscodeError> {
    bytes
        .get(offset..offset + 8)
        .and_then(|s| s.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(|| TranscodeError::Truncated(format!("u64 @ {offset}")))
}

impl Ktx2Header {
    /// 解析并验证头部
    pub fn parse(bytes: &[u8]) -> Result<Self, TranscodeError> {
        if bytes.len() < KTX2_IDENTIFIER.len() {
            return Err(TranscodeError::Truncated("identifier".to_string()));
        }
        if bytes[..KTX2_IDENTIFIER.len()] != KTX2_IDENTIFIER {
            return Err(TranscodeError::InvalidIdentifier);
        }
        if bytes.len() < HEADER_LEN {
            return Err(TranscodeError::Truncated(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self {
            vk_format: read_u32(bytes, 12)?,
            type_size: read_u32(bytes, 16)?,
            pixel_width: read_u32(bytes, 20)?,
            pixel_height: read_u32(bytes, 24)?,
            pixel_depth: read_u32(bytes, 28)?,
            layer_count: read_u32(bytes, 32)?,
            face_count: read_u32(bytes, 36)?,
            level_count: read_u32(bytes, 40)?,
            supercompression_scheme: read_u32(bytes, 44)?,
        })
    }

    /// 一维纹理的 pixelHeight 为0，按1行计
    #[inline]
    pub fn effective_height(&self) -> u32 {
        self.pixel_height.max(1)
    }

    /// 基础层级解压后的最大合理字节数
    pub fn max_level_bytes(&self) -> u64 {
        [
            u64::from(self.pixel_width),
            u64::from(self.effective_height()),
            u64::from(self.pixel_depth.max(1)),
            u64::from(self.layer_count.max(1)),
            u64::from(self.face_count.max(1)),
        ]
        .into_iter()
        .try_fold(MAX_TEXEL_BYTES, u64::checked_mul)
        .unwrap_or(u64::MAX)
    }

    /// 读取指定层级的索引项（levelCount 为0时仍存在一项）
    pub fn level_index(&self, bytes: &[u8], level: u32) -> Result<LevelIndex, TranscodeError> {
        if level >= self.level_count.max(1) {
            return Err(TranscodeError::Truncated(format!("level {level} not present")));
        }
        let base = HEADER_LEN + level as usize * LEVEL_INDEX_ENTRY_LEN;
        Ok(LevelIndex {
            byte_offset: read_u64(bytes, base)?,
            byte_length: read_u64(bytes, base + 8)?,
            uncompressed_byte_length: read_u64(bytes, base + 16)?,
        })
    }
}

/// KTX2解码器（基础层级）
#[derive(Debug, Clone)]
pub struct Ktx2Decoder {
    capabilities: RendererCapabilities,
}

impl Ktx2Decoder {
    pub fn new(capabilities: RendererCapabilities) -> Self {
        Self { capabilities }
    }

    fn level_bytes<'b>(bytes: &'b [u8], level: &LevelIndex) -> Result<&'b [u8], TranscodeError> {
        let start = usize::try_from(level.byte_offset)
            .map_err(|_| TranscodeError::Truncated("level offset".to_string()))?;
        let len = usize::try_from(level.byte_length)
            .map_err(|_| TranscodeError::Truncated("level length".to_string()))?;
        start
            .checked_add(len)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| {
                TranscodeError::Truncated(format!(
                    "level data {start}+{len} exceeds file size {}",
                    bytes.len()
                ))
            })
    }

    /// 流式解压，输出按实际数据增长，最多读取 `claimed + 1` 字节
    fn inflate_zstd(data: &[u8], claimed: u64) -> Result<Vec<u8>, TranscodeError> {
        let decoder = zstd::stream::read::Decoder::new(data).map_err(TranscodeError::Zstd)?;
        let mut decoded = Vec::new();
        decoder
            .take(claimed.saturating_add(1))
            .read_to_end(&mut decoded)
            .map_err(TranscodeError::Zstd)?;

        let actual = decoded.len() as u64;
        if actual != claimed {
            return Err(TranscodeError::SizeMismatch {
                expected: claimed,
                actual,
            });
        }
        Ok(decoded)
    }
}

impl TextureDecoder for Ktx2Decoder {
    fn name(&self) -> &'static str {
        "KTX2 Decoder"
    }

    fn decode(&self, bytes: Vec<u8>) -> Result<Texture, TranscodeError> {
        let header = Ktx2Header::parse(&bytes)?;
        let width = header.pixel_width;
        let height = header.effective_height();

        let limit = self.capabilities.max_texture_dimension;
        if width > limit || height > limit {
            return Err(TranscodeError::ExceedsMaxDimension {
                width,
                height,
                limit,
            });
        }

        let level = header.level_index(&bytes, 0)?;
        let data = Self::level_bytes(&bytes, &level)?;

        let payload = match header.supercompression_scheme {
            supercompression::NONE => data.to_vec(),
            supercompression::ZSTD => {
                let claimed = level.uncompressed_byte_length;
                let limit = header.max_level_bytes();
                if claimed > limit {
                    return Err(TranscodeError::ImplausibleLength { claimed, limit });
                }
                Self::inflate_zstd(data, claimed)?
            }
            other => return Err(TranscodeError::UnsupportedSupercompression(other)),
        };

        Ok(Texture {
            width,
            height,
            payload,
        })
    }
}

/// 内置KTX2解码器的提供者，记录在用会话数
#[derive(Debug, Default)]
pub struct Ktx2DecoderProvider {
    live_sessions: AtomicUsize,
}

impl Ktx2DecoderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前未释放的解码器数量
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::Acquire)
    }
}

impl DecoderProvider for Ktx2DecoderProvider {
    type Handle = Ktx2Decoder;

    fn init(&self, capabilities: &RendererCapabilities) -> BenchResult<Ktx2Decoder> {
        if capabilities.max_texture_dimension == 0 {
            return Err(BenchError::Resource(
                "渲染器不支持任何纹理尺寸 / renderer reports max texture dimension 0".to_string(),
            ));
        }
        self.live_sessions.fetch_add(1, Ordering::AcqRel);
        Ok(Ktx2Decoder::new(*capabilities))
    }

    fn release(&self, _handle: Ktx2Decoder) {
        self.live_sessions.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_ktx2(width: u32, height: u32, scheme: u32, level: &[u8], uncompressed: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&KTX2_IDENTIFIER);
        for v in [37u32, 1, width, height, 0, 0, 1, 1, scheme] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        // dfd/kvd/sgd 全部为空
        out.extend_from_slice(&[0u8; 32]);
        let data_offset = (HEADER_LEN + LEVEL_INDEX_ENTRY_LEN) as u64;
        out.extend_from_slice(&data_offset.to_le_bytes());
        out.extend_from_slice(&(level.len() as u64).to_le_bytes());
        out.extend_from_slice(&uncompressed.to_le_bytes());
        out.extend_from_slice(level);
        out
    }

    fn decoder() -> Ktx2Decoder {
        Ktx2Decoder::new(RendererCapabilities::default())
    }

    #[test]
    fn test_decode_uncompressed_level() {
        let raster = vec![7u8; 4 * 4 * 4];
        let file = build_ktx2(4, 4, supercompression::NONE, &raster, raster.len() as u64);
        let texture = decoder().decode(file).expect("应成功解码");
        assert_eq!((texture.width, texture.height), (4, 4));
        assert_eq!(texture.payload, raster);
    }

    #[test]
    fn test_decode_zstd_level() {
        let raster: Vec<u8> = (0..256u32).map(|i| (i % 17) as u8).collect();
        let packed = zstd::bulk::compress(&raster, 3).expect("压缩失败");
        let file = build_ktx2(8, 8, supercompression::ZSTD, &packed, raster.len() as u64);
        let texture = decoder().decode(file).expect("应成功解压");
        assert_eq!(texture.byte_size(), 256);
        assert_eq!(texture.payload, raster);
    }

    #[test]
    fn test_zstd_size_mismatch_rejected() {
        let raster = vec![1u8; 64];
        let packed = zstd::bulk::compress(&raster, 3).expect("压缩失败");
        // 声明的大小大于实际内容
        let file = build_ktx2(4, 4, supercompression::ZSTD, &packed, 128);
        assert!(matches!(
            decoder().decode(file),
            Err(TranscodeError::SizeMismatch { expected: 128, actual: 64 })
        ));
    }

    /// 不含内容大小的zstd帧
    fn zstd_without_content_size(raster: &[u8]) -> Vec<u8> {
        let mut encoder = zstd::stream::Encoder::new(Vec::new(), 3).expect("创建编码器失败");
        encoder.include_contentsize(false).expect("设置参数失败");
        std::io::Write::write_all(&mut encoder, raster).expect("写入失败");
        encoder.finish().expect("压缩失败")
    }

    #[test]
    fn test_huge_claimed_length_rejected_without_allocating() {
        let packed = zstd_without_content_size(&[3u8; 64]);
        for claimed in [8u64 << 30, u64::MAX / 2] {
            let file = build_ktx2(4, 4, supercompression::ZSTD, &packed, claimed);
            assert!(matches!(
                decoder().decode(file),
                Err(TranscodeError::ImplausibleLength { limit: 256, .. })
            ));
        }
    }

    #[test]
    fn test_stream_inflate_stops_past_claimed_length() {
        // 声明值在上限内但小于实际内容
        let packed = zstd_without_content_size(&[5u8; 64]);
        let file = build_ktx2(4, 4, supercompression::ZSTD, &packed, 32);
        assert!(matches!(
            decoder().decode(file),
            Err(TranscodeError::SizeMismatch { expected: 32, actual: 33 })
        ));

        let file = build_ktx2(4, 4, supercompression::ZSTD, &packed, 64);
        let texture = decoder().decode(file).expect("应成功解压");
        assert_eq!(texture.payload, vec![5u8; 64]);
    }

    #[test]
    fn test_basis_lz_is_unsupported() {
        let file = build_ktx2(4, 4, supercompression::BASIS_LZ, &[0u8; 16], 0);
        assert!(matches!(
            decoder().decode(file),
            Err(TranscodeError::UnsupportedSupercompression(1))
        ));
    }

    #[test]
    fn test_invalid_identifier_and_truncation() {
        assert!(matches!(
            decoder().decode(b"not a texture at all".to_vec()),
            Err(TranscodeError::InvalidIdentifier)
        ));
        assert!(matches!(
            decoder().decode(KTX2_IDENTIFIER[..6].to_vec()),
            Err(TranscodeError::Truncated(_))
        ));

        let mut file = build_ktx2(4, 4, supercompression::NONE, &[0u8; 64], 64);
        file.truncate(file.len() - 10);
        assert!(matches!(
            decoder().decode(file),
            Err(TranscodeError::Truncated(_))
        ));
    }

    #[test]
    fn test_max_dimension_enforced() {
        let small = Ktx2Decoder::new(RendererCapabilities {
            max_texture_dimension: 2,
        });
        let file = build_ktx2(4, 4, supercompression::NONE, &[0u8; 64], 64);
        assert!(matches!(
            small.decode(file),
            Err(TranscodeError::ExceedsMaxDimension { limit: 2, .. })
        ));
    }

    #[test]
    fn test_provider_tracks_sessions() {
        let provider = Ktx2DecoderProvider::new();
        let handle = provider
            .init(&RendererCapabilities::default())
            .expect("初始化失败");
        assert_eq!(provider.live_sessions(), 1);
        provider.release(handle);
        assert_eq!(provider.live_sessions(), 0);

        let zero = RendererCapabilities {
            max_texture_dimension: 0,
        };
        assert!(provider.init(&zero).is_err());
        assert_eq!(provider.live_sessions(), 0);
    }
}
