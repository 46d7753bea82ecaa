//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: 单个种子 .vesta -> .cell
//! - `batch`: 批量转换目录中的 .vesta
//! - `inspect`: 查看 .vesta / .cell 的结构内容
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, batch, inspect

pub mod batch;
pub mod convert;
pub mod inspect;

use clap::{Args, Parser, Subcommand};
use vesta2cell::{CellOptions, LatticeFormat, SpinMode};

/// vesta2cell - VESTA 结构转 CASTEP .cell
#[derive(Parser)]
#[command(name = "vesta2cell")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Convert VESTA structure files into CASTEP .cell input", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert <seed>.vesta into <out>.cell
    Convert(convert::ConvertArgs),

    /// Convert every matching .vesta file under a directory
    Batch(batch::BatchArgs),

    /// Show the lattice and atoms read from a .vesta or .cell file
    Inspect(inspect::InspectArgs),
}

/// .cell 输出相关的公共参数
#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    /// Treatment of spin
    #[arg(
        short = 'm',
        long,
        value_enum,
        default_value_t = SpinMode::Nospin,
        env = "VESTA2CELL_SPIN"
    )]
    pub spin: SpinMode,

    /// Style of the lattice block
    #[arg(long, value_enum, default_value_t = LatticeFormat::Cart)]
    pub lattice: LatticeFormat,

    /// Fixed decimal places for coordinates, lattice and spin values
    /// (default: shortest exact form, e.g. 0.5)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub precision: Option<u8>,
}

impl FormatArgs {
    pub fn cell_options(&self) -> CellOptions {
        CellOptions {
            lattice: self.lattice,
            precision: self.precision.map(usize::from),
        }
    }
}
