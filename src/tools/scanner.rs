//! 文件扫描模块
//!
//! 文件来源边界：把命令行给出的文件与目录解析为 [`SourceFile`] 列表。
//! 目录只扫描一层并按文件名排序；显式给出的文件保持给出顺序。

use super::cli::AppConfig;
use super::utils;
use crate::core::SourceFile;
use crate::error::{BenchError, BenchResult};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 扫描目录中的KTX2文件（不递归子目录）
pub fn scan_texture_files(dir_path: &Path) -> BenchResult<Vec<PathBuf>> {
    if !dir_path.is_dir() {
        return Err(BenchError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("目录不存在 / directory not found: {}", dir_path.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir_path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && utils::has_supported_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// 展开输入路径：目录替换为其中的KTX2文件，文件原样保留
pub fn collect_input_paths(inputs: &[PathBuf]) -> BenchResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(scan_texture_files(input)?);
        } else if input.is_file() {
            if !utils::has_supported_extension(input) {
                log::warn!(
                    "非KTX2扩展名，仍尝试解码 / not a .ktx2 file, decoding anyway: {}",
                    input.display()
                );
            }
            paths.push(input.clone());
        } else {
            return Err(BenchError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("路径不存在 / path not found: {}", input.display()),
            )));
        }
    }
    Ok(paths)
}

/// 读取单个文件为不可变源文件
pub fn load_source_file(path: &Path) -> BenchResult<SourceFile> {
    let bytes = std::fs::read(path)?;
    log::debug!("读取 / loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(SourceFile::new(utils::extract_filename_lossy(path), bytes))
}

/// 解析输入并读取全部文件
pub fn scan_inputs(inputs: &[PathBuf]) -> BenchResult<Vec<SourceFile>> {
    collect_input_paths(inputs)?
        .iter()
        .map(|path| load_source_file(path))
        .collect()
}

/// 显示文件扫描结果
pub fn show_scan_results(config: &AppConfig, files: &[SourceFile]) {
    if files.is_empty() {
        eprintln!("[WARNING] 没有找到KTX2文件 / No KTX2 files found in:");
        for input in &config.inputs {
            eprintln!("   {}", input.display());
        }
        return;
    }

    let total: u64 = files.iter().map(SourceFile::raw_size).sum();
    eprintln!(
        "[INFO] 找到 {} 个纹理文件 / Found {} texture files ({})",
        files.len(),
        files.len(),
        utils::format_bytes(total as f64)
    );

    if config.verbose {
        for (i, file) in files.iter().enumerate() {
            eprintln!(
                "   {}. {} ({})",
                i + 1,
                file.name,
                utils::format_bytes(file.raw_size() as f64)
            );
        }
    }
    eprintln!();
}
