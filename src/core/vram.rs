//! 显存估算
//!
//! 每个文件的压缩纹理显存 = 实测解码负载大小；
//! 等价未压缩帧序列显存 = 宽 × 高 × 帧数 × 4（RGBA8）。
//!
//! 等价值以批次中首个文件（最小文件索引）的分辨率为代表，
//! 帧数变化时只重新推导，不重新解码。混合分辨率批次的结果会有偏差，
//! 见 [`VramEstimator::has_mixed_resolutions`]。

use crate::tools::constants::vram::RGBA8_BYTES_PER_PIXEL;
use serde::Serialize;

/// 单个文件的显存样本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VramSample {
    pub name: String,
    pub compressed_vram_bytes: u64,
    pub equivalent_raster_vram_bytes: u64,
    #[serde(skip)]
    index: usize,
    #[serde(skip)]
    resolution: (u32, u32),
}

/// 未压缩RGBA8帧序列的显存占用
#[inline]
pub fn equivalent_raster_bytes(width: u32, height: u32, frame_count: u32) -> u64 {
    u64::from(width)
        .saturating_mul(u64::from(height))
        .saturating_mul(u64::from(frame_count))
        .saturating_mul(RGBA8_BYTES_PER_PIXEL)
}

/// 批次级显存估算器
#[derive(Debug, Clone)]
pub struct VramEstimator {
    frame_count: u32,
    /// 按文件索引排序
    samples: Vec<VramSample>,
}

impl VramEstimator {
    pub fn new(frame_count: u32) -> Self {
        Self {
            frame_count,
            samples: Vec::new(),
        }
    }

    /// 记录一个已解码文件（并发模式下完成顺序任意）
    pub fn record(&mut self, index: usize, name: &str, width: u32, height: u32, decoded_bytes: u64) {
        let position = self.samples.partition_point(|s| s.index < index);
        self.samples.insert(
            position,
            VramSample {
                name: name.to_string(),
                compressed_vram_bytes: decoded_bytes,
                equivalent_raster_vram_bytes: 0,
                index,
                resolution: (width, height),
            },
        );
        self.recompute();
    }

    /// 帧数变化：只重新推导等价显存
    pub fn set_frame_count(&mut self, frame_count: u32) {
        self.frame_count = frame_count;
        self.recompute();
    }

    fn recompute(&mut self) {
        let Some((width, height)) = self.representative_resolution() else {
            return;
        };
        let raster = equivalent_raster_bytes(width, height, self.frame_count);
        for sample in &mut self.samples {
            sample.equivalent_raster_vram_bytes = raster;
        }
    }

    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// 代表分辨率（批次中首个已解码文件）
    pub fn representative_resolution(&self) -> Option<(u32, u32)> {
        self.samples.first().map(|s| s.resolution)
    }

    /// 批次中是否存在与代表分辨率不同的纹理
    pub fn has_mixed_resolutions(&self) -> bool {
        match self.representative_resolution() {
            Some(rep) => self.samples.iter().any(|s| s.resolution != rep),
            None => false,
        }
    }

    pub fn samples(&self) -> &[VramSample] {
        &self.samples
    }

    /// (压缩显存总和, 等价未压缩显存总和)
    pub fn totals(&self) -> (u64, u64) {
        self.samples.iter().fold((0u64, 0u64), |(c, r), s| {
            (
                c.saturating_add(s.compressed_vram_bytes),
                r.saturating_add(s.equivalent_raster_vram_bytes),
            )
        })
    }
}
