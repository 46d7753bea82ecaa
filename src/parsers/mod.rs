//! # 解析器模块
//!
//! 提供 VESTA 结构文件的解析器与 CASTEP .cell 的读写。
//!
//! ## 依赖关系
//! - 被 `lib.rs` 和 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: vesta, cell

pub mod cell;
pub mod vesta;

use crate::error::{Result, Vesta2CellError};
use crate::models::Crystal;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<Crystal> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "vesta" => vesta::parse_vesta_file(path),
        "cell" => cell::parse_cell_file(path),
        _ => Err(Vesta2CellError::UnsupportedFormat(format!(
            "Cannot determine format for: {} (expected .vesta or .cell)",
            path.display()
        ))),
    }
}
