//! 集成测试共享夹具
//!
//! - `build_ktx2`：生成最小的合法KTX2文件（单层级）
//! - `ScriptedProvider`：按输入内容决定耗时、失败与阻塞的模拟解码器

#![allow(dead_code)]

use crossbeam_channel::{Receiver, Sender};
use ktx_transcode_bench::{
    BenchResult, DecoderProvider, RendererCapabilities, SourceFile, Texture, TextureDecoder,
    TranscodeError, texture::ktx2::{HEADER_LEN, KTX2_IDENTIFIER, LEVEL_INDEX_ENTRY_LEN},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

pub fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

/// 生成单层级KTX2文件
pub fn build_ktx2(width: u32, height: u32, scheme: u32, level: &[u8], uncompressed: u64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&KTX2_IDENTIFIER);
    for v in [37u32, 1, width, height, 0, 0, 1, 1, scheme] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 32]);
    let data_offset = (HEADER_LEN + LEVEL_INDEX_ENTRY_LEN) as u64;
    out.extend_from_slice(&data_offset.to_le_bytes());
    out.extend_from_slice(&(level.len() as u64).to_le_bytes());
    out.extend_from_slice(&uncompressed.to_le_bytes());
    out.extend_from_slice(level);
    out
}

/// 无超压缩的RGBA8纹理
pub fn raw_ktx2(width: u32, height: u32) -> Vec<u8> {
    let raster = vec![0x5Au8; (width * height * 4) as usize];
    build_ktx2(width, height, 0, &raster, raster.len() as u64)
}

/// Zstandard超压缩的RGBA8纹理
pub fn zstd_ktx2(width: u32, height: u32) -> Vec<u8> {
    let raster: Vec<u8> = (0..width * height * 4).map(|i| (i % 251) as u8).collect();
    let packed = zstd::bulk::compress(&raster, 3).expect("压缩失败");
    build_ktx2(width, height, 2, &packed, raster.len() as u64)
}

/// 以 "FAIL" 开头的输入解码失败
pub const FAIL_MARKER: &[u8] = b"FAIL";

/// 以 "GATE" 开头的输入在闸门打开前阻塞
pub const GATE_MARKER: &[u8] = b"GATE";

/// 模拟纹理尺寸
pub const SCRIPTED_SIZE: u32 = 64;

#[derive(Clone)]
pub struct ScriptedDecoder {
    delay: Duration,
    decodes: Arc<AtomicUsize>,
    gate: Option<(Sender<()>, Receiver<()>)>,
}

impl TextureDecoder for ScriptedDecoder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn decode(&self, mut bytes: Vec<u8>) -> Result<Texture, TranscodeError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        if bytes.starts_with(FAIL_MARKER) {
            return Err(TranscodeError::Other("scripted failure".to_string()));
        }
        if bytes.starts_with(GATE_MARKER)
            && let Some((entered, open)) = &self.gate
        {
            let _ = entered.send(());
            let _ = open.recv();
        }
        thread::sleep(self.delay);
        // 模拟消费输入缓冲区
        bytes.fill(0);
        Ok(Texture {
            width: SCRIPTED_SIZE,
            height: SCRIPTED_SIZE,
            payload: vec![0; bytes.len() * 4],
        })
    }
}

/// 记录初始化、释放与解码次数的模拟提供者
#[derive(Default)]
pub struct ScriptedProvider {
    pub delay: Duration,
    pub inits: AtomicUsize,
    pub releases: AtomicUsize,
    pub decodes: Arc<AtomicUsize>,
    pub gate: Option<(Sender<()>, Receiver<()>)>,
}

impl ScriptedProvider {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    /// 返回 (提供者, 已进入阻塞的通知, 打开闸门的发送端)
    pub fn gated() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (open_tx, open_rx) = crossbeam_channel::unbounded();
        let provider = Self {
            gate: Some((entered_tx, open_rx)),
            ..Default::default()
        };
        (provider, entered_rx, open_tx)
    }

    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.inits.load(Ordering::SeqCst) - self.releases.load(Ordering::SeqCst)
    }
}

impl DecoderProvider for ScriptedProvider {
    type Handle = ScriptedDecoder;

    fn init(&self, _capabilities: &RendererCapabilities) -> BenchResult<ScriptedDecoder> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedDecoder {
            delay: self.delay,
            decodes: Arc::clone(&self.decodes),
            gate: self.gate.clone(),
        })
    }

    fn release(&self, _handle: ScriptedDecoder) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn source(name: &str, bytes: &[u8]) -> SourceFile {
    SourceFile::new(name, bytes.to_vec())
}

/// n个可成功解码的模拟文件，大小依次为 100, 200, ...
pub fn scripted_files(n: usize) -> Vec<SourceFile> {
    (0..n)
        .map(|i| source(&format!("clip_{i:02}.ktx2"), &vec![1u8; 100 * (i + 1)]))
        .collect()
}
