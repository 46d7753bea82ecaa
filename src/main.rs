//! # vesta2cell - VESTA → CASTEP .cell 转换工具
//!
//! 把 VESTA 保存的晶体结构转换为 CASTEP 的 .cell 输入文件。
//!
//! ## 子命令
//! - `convert` - 单个种子转换，可选自旋标注 (nospin / collinear / noncollinear)
//! - `batch`   - 批量并行转换目录中的 .vesta 文件
//! - `inspect` - 查看 .vesta / .cell 中的晶格与原子
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     └── vesta2cell 库 (parsers/, models/, error.rs)
//!   ├── batch/      (批量收集与并行执行)
//!   └── utils/      (工具函数)
//! ```

mod batch;
mod cli;
mod commands;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
