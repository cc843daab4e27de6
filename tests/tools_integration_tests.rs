//! 工具模块集成测试
//!
//! 覆盖文件扫描、命令行到报告的完整流程以及三种输出格式。

mod common;

use common::{log, raw_ktx2, zstd_ktx2};
use ktx_transcode_bench::{
    BenchError, ExecutionMode,
    tools::{self, OutputFormat},
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 创建包含纹理、非纹理文件和子目录的临时目录
fn texture_dir() -> TempDir {
    let dir = TempDir::new().expect("创建临时目录失败");
    fs::write(dir.path().join("b_second.ktx2"), raw_ktx2(8, 8)).unwrap();
    fs::write(dir.path().join("a_first.KTX2"), zstd_ktx2(8, 8)).unwrap();
    fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("deep.ktx2"), raw_ktx2(8, 8)).unwrap();
    dir
}

#[test]
fn test_scan_directory_non_recursive_sorted() {
    log("目录扫描只取一层并排序", "Directory scan is shallow and sorted");

    let dir = texture_dir();
    let paths = tools::scan_texture_files(dir.path()).unwrap();
    let names: Vec<String> = paths
        .iter()
        .map(|p| tools::path::extract_filename_lossy(p))
        .collect();
    assert_eq!(names, ["a_first.KTX2", "b_second.ktx2"]);
}

#[test]
fn test_scan_inputs_keeps_explicit_order() {
    log("显式文件保持给出顺序", "Explicit files keep the given order");

    let dir = texture_dir();
    let inputs = vec![
        dir.path().join("b_second.ktx2"),
        dir.path().join("nested"),
        dir.path().join("a_first.KTX2"),
    ];
    let files = tools::scan_inputs(&inputs).unwrap();
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["b_second.ktx2", "deep.ktx2", "a_first.KTX2"]);
    assert_eq!(files[0].raw_size(), raw_ktx2(8, 8).len() as u64);
}

#[test]
fn test_scan_missing_path_is_io_error() {
    log("不存在的路径返回I/O错误", "Missing path yields I/O error");

    let missing = PathBuf::from("/definitely/not/here/clip.ktx2");
    assert!(matches!(
        tools::scan_inputs(&[missing]),
        Err(BenchError::Io(_))
    ));
}

#[test]
fn test_cli_to_reports_both_modes() {
    log("命令行到报告：两种执行方式", "CLI to reports with both modes");

    let dir = texture_dir();
    let config = tools::parse_args_from([
        "ktx-bench".into(),
        dir.path().as_os_str().to_owned(),
        "--mode".into(),
        "both".into(),
        "--frame-count".into(),
        "14".into(),
    ])
    .unwrap();

    let files = tools::scan_inputs(&config.inputs).unwrap();
    let reports = tools::run_benchmarks(&config, &files).unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].config.mode(), ExecutionMode::Sequential);
    assert_eq!(reports[1].config.mode(), ExecutionMode::Concurrent);
    assert!(reports[1].generation > reports[0].generation);
    for report in &reports {
        assert_eq!(report.tally.decoded, 2);
        // 8×8×14帧×4字节
        assert!(report.vram.iter().all(|s| s.equivalent_raster_vram_bytes == 3584));
    }
}

#[test]
fn test_render_formats() {
    log("三种输出格式", "Three output formats");

    let dir = texture_dir();
    let config = tools::parse_args_from([
        "ktx-bench".into(),
        dir.path().as_os_str().to_owned(),
    ])
    .unwrap();
    let files = tools::scan_inputs(&config.inputs).unwrap();
    let reports = tools::run_benchmarks(&config, &files).unwrap();

    let table = tools::render_reports(&reports, OutputFormat::Table);
    assert!(table.contains("Required fetch speed"));
    assert!(table.contains("a_first.KTX2"));

    let markdown = tools::render_reports(&reports, OutputFormat::Markdown);
    assert!(markdown.starts_with("## "));
    assert!(markdown.contains("| File"));

    let json = tools::render_reports(&reports, OutputFormat::Json);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["stats"]["mode"], "sequential");
    assert_eq!(value["stats"]["decoded_files"], 2);
}

#[test]
fn test_write_output_file() {
    log("报告写入文件", "Report written to file");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.md");
    tools::write_output(&path, "## report\n").unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), "## report\n");
}
