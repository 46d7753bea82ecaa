//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `utils/` 以及 vesta2cell 库
//! - 子模块: convert, batch, inspect

pub mod batch;
pub mod convert;
pub mod inspect;

use crate::cli::Commands;
use vesta2cell::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Convert(args) => convert::execute(args),
        Commands::Batch(args) => batch::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
    }
}
