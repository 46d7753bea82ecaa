//! # convert 子命令 CLI 定义
//!
//! 单个种子转换: <seed>.vesta -> <out>.cell
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use super::FormatArgs;
use clap::Args;

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Seed name of the input .vesta file
    #[arg(short, long)]
    pub seed: String,

    /// Seed name of the output .cell file (defaults to the input seed)
    #[arg(short, long)]
    pub out: Option<String>,

    #[command(flatten)]
    pub format: FormatArgs,
}
