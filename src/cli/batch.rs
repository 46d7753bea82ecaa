//! # batch 子命令 CLI 定义
//!
//! 批量转换目录下的 .vesta 文件
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use super::FormatArgs;
use clap::Args;
use std::path::PathBuf;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input directory (or a single .vesta file)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for .cell files; subdirectories of the input are kept
    /// (defaults to writing each .cell beside its .vesta)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob pattern(s) for input files, comma separated
    #[arg(short, long, default_value = "*.vesta")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    #[command(flatten)]
    pub format: FormatArgs,
}
