//! # inspect 子命令 CLI 定义
//!
//! 打印结构文件的晶格与原子表
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/inspect.rs`

use clap::Args;
use std::path::PathBuf;

/// inspect 子命令参数
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Structure file (.vesta or .cell)
    pub file: PathBuf,

    /// Also write the atom table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
