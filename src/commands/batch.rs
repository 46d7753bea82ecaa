//! # batch 命令实现
//!
//! 批量把目录中的 .vesta 文件转换为 .cell。
//!
//! ## 功能
//! - 收集匹配的 .vesta 文件
//! - 并行转换，已存在的输出默认跳过
//! - 汇总并列出失败文件
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `batch/` 收集与并行执行
//! - 使用 `utils/output.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::batch::BatchArgs;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use vesta2cell::error::{Result, Vesta2CellError};
use vesta2cell::{CellOptions, SpinMode};

/// 执行 batch 命令
pub fn execute(args: BatchArgs) -> Result<()> {
    let mode = args.format.spin;
    let options = args.format.cell_options();
    output::print_header(&format!("Batch converting to .cell (spin: {})", mode));

    if !args.input.exists() {
        return Err(Vesta2CellError::DirectoryNotFound {
            path: args.input.display().to_string(),
        });
    }

    if let Some(out) = &args.output {
        create_dir(out)?;
    }

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive)
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "No files matched '{}' under {}",
            args.pattern,
            args.input.display()
        ));
        return Ok(());
    }

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} file(s), using {} job(s)",
        files.len(),
        runner.jobs()
    ));

    let result = runner.run(&files, |path| {
        let out_dir = output_dir_for(path, &args.input, args.output.as_deref());
        convert_one(path, &out_dir, mode, &options, args.overwrite)
    })?;

    for (input, out) in &result.converted {
        output::print_conversion(input, out);
    }
    for input in &result.skipped {
        output::print_warning(&format!("{}: output exists, skipped (use --overwrite)", input));
    }
    for (path, err) in &result.failures {
        output::print_error(&format!("{}: {}", path, err));
    }

    output::print_done(&format!(
        "Converted {} file(s) ({} skipped, {} failed)",
        result.converted.len(),
        result.skipped.len(),
        result.failures.len()
    ));

    if !result.failures.is_empty() {
        return Err(Vesta2CellError::BatchFailed {
            failed: result.failures.len(),
            total: result.total(),
        });
    }

    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Vesta2CellError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })
}

/// 输出目录：未指定 `-o` 时写在输入文件旁边；
/// 指定时保留输入相对 `root` 的子目录
fn output_dir_for(input: &Path, root: &Path, output: Option<&Path>) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    match output {
        None => parent.to_path_buf(),
        Some(out) => match parent.strip_prefix(root) {
            Ok(rel) => out.join(rel),
            Err(_) => out.to_path_buf(),
        },
    }
}

/// 转换单个文件
fn convert_one(
    input: &Path,
    output_dir: &Path,
    mode: SpinMode,
    options: &CellOptions,
    overwrite: bool,
) -> ProcessResult {
    let name = input.display().to_string();

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("structure");
    let out_seed = output_dir.join(stem);
    let out_path = vesta2cell::output_path(&out_seed.to_string_lossy());

    if out_path.exists() && !overwrite {
        return ProcessResult::Skipped(name);
    }

    let (Some(seed), Some(out)) = (input.to_str(), out_seed.to_str()) else {
        return ProcessResult::Failed(name, "path is not valid UTF-8".to_string());
    };

    if let Err(e) = create_dir(output_dir) {
        return ProcessResult::Failed(name, e.to_string());
    }

    match vesta2cell::convert_with(seed, Some(out), mode, options) {
        Ok(conversion) => ProcessResult::Success(name, conversion.output.display().to_string()),
        Err(e) => ProcessResult::Failed(name, e.to_string()),
    }
}
