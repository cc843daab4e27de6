//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 默认配置值
pub mod defaults {
    /// 单个纹理文件包含的帧数（体积视频纹理序列）
    pub const FRAME_COUNT: u32 = 7;

    /// 回放帧率（帧/秒）
    pub const FRAME_RATE: u32 = 25;

    /// 渲染器最大纹理边长
    ///
    /// 与主流GPU的 MAX_TEXTURE_SIZE 一致
    pub const MAX_TEXTURE_DIMENSION: u32 = 16384;
}

/// 显存估算常量
pub mod vram {
    /// 未压缩基线的每像素字节数（RGBA8）
    pub const RGBA8_BYTES_PER_PIXEL: u64 = 4;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 并发模式下同时在途的最大解码数
    ///
    /// 超过此数量的文件会在线程池中排队，批次墙钟时间仍从首次启动计到最后完成
    pub const MAX_CONCURRENT_DECODES: usize = 64;
}

/// 文件扫描常量
pub mod scanning {
    /// 支持的纹理容器扩展名
    pub const SUPPORTED_EXTENSIONS: &[&str] = &["ktx2"];
}
