//! 工具函数模块
//!
//! 提供文件路径处理、字节与带宽格式化等通用工具函数。

/// 文件路径处理工具函数
pub mod path {
    use crate::tools::constants::scanning::SUPPORTED_EXTENSIONS;
    use std::path::Path;

    /// 提取文件名（返回String，用于记录和日志显示）
    #[inline]
    pub fn extract_filename_lossy(path: &Path) -> String {
        path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// 获取父目录，如果不存在则返回当前目录
    #[inline]
    pub fn get_parent_dir(path: &Path) -> &Path {
        path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// 扩展名是否为支持的纹理容器（大小写不敏感）
    pub fn has_supported_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// 字节与带宽格式化（SI单位，1 kB = 1000 B）
pub mod bytes {
    const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB"];

    /// 按三位有效数字格式化字节数，例如 `1340.0` -> `"1.34 kB"`
    pub fn format_bytes(bytes: f64) -> String {
        if !bytes.is_finite() || bytes < 0.0 {
            return "-".to_string();
        }

        let last = UNITS.len() - 1;
        let mut value = bytes;
        let mut unit = 0;
        while value >= 1000.0 && unit < last {
            value /= 1000.0;
            unit += 1;
        }

        // 舍入后可能进位到下一单位，如 999.6 kB -> 1.00 MB
        let digits = if unit == 0 { 0 } else { precision_for(value) };
        if round_to(value, digits) >= 1000.0 && unit < last {
            value /= 1000.0;
            unit += 1;
        }

        if unit == 0 {
            return format!("{value:.0} B");
        }
        let precision = precision_for(round_to(value, precision_for(value)));
        format!("{value:.precision$} {}", UNITS[unit])
    }

    /// 三位有效数字对应的小数位数
    fn precision_for(value: f64) -> usize {
        if value < 10.0 {
            2
        } else if value < 100.0 {
            1
        } else {
            0
        }
    }

    fn round_to(value: f64, precision: usize) -> f64 {
        let scale = 10f64.powi(precision as i32);
        (value * scale).round() / scale
    }

    /// 格式化带宽，例如 `"769 B/s"`
    #[inline]
    pub fn format_rate(bytes_per_sec: f64) -> String {
        format!("{}/s", format_bytes(bytes_per_sec))
    }
}

// 重新导出为平级函数
pub use bytes::{format_bytes, format_rate};
pub use path::{extract_filename_lossy, get_parent_dir, has_supported_extension};
