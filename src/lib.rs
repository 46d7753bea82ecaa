//! # vesta2cell - VESTA → CASTEP .cell 转换库
//!
//! 读取 `<seed>.vesta`，写出 `<out>.cell`，可选附加自旋标注。
//! 命令行之外也可以直接调用 [`convert`]。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── parsers/   (vesta 解析, cell 读写)
//!   ├── models/    (Crystal, SpinMode)
//!   └── error.rs   (错误处理)
//! ```
//!
//! 库本身不打印任何信息，错误全部返回给调用者。

pub mod error;
pub mod models;
pub mod parsers;

pub use error::{Result, Vesta2CellError};
pub use models::{Atom, Crystal, Lattice, Spin, SpinMode};
pub use parsers::cell::{CellOptions, LatticeFormat};

use std::fs;
use std::path::{Path, PathBuf};

pub const VESTA_EXTENSION: &str = "vesta";
pub const CELL_EXTENSION: &str = "cell";

/// 一次转换的结果
#[derive(Debug, Clone)]
pub struct Conversion {
    pub input: PathBuf,
    pub output: PathBuf,
    pub crystal: Crystal,
}

/// 种子名 → 输入文件路径（种子末尾的 `.vesta` 可省略）
pub fn input_path(seed: &str) -> PathBuf {
    with_extension(seed, VESTA_EXTENSION)
}

/// 种子名 → 输出文件路径
pub fn output_path(seed: &str) -> PathBuf {
    with_extension(seed, CELL_EXTENSION)
}

fn with_extension(seed: &str, ext: &str) -> PathBuf {
    let path = Path::new(seed);
    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext));
    if has_ext {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{}.{}", seed, ext))
    }
}

/// 去掉已知扩展名后的种子名
fn seed_stem(seed: &str) -> &str {
    match Path::new(seed).extension().and_then(|e| e.to_str()) {
        Some(ext)
            if ext.eq_ignore_ascii_case(VESTA_EXTENSION)
                || ext.eq_ignore_ascii_case(CELL_EXTENSION) =>
        {
            &seed[..seed.len() - ext.len() - 1]
        }
        _ => seed,
    }
}

/// 转换 `<seed>.vesta` 为 `<output or seed>.cell`
///
/// `spin` 必须是 `nospin`, `collinear`, `noncollinear` 之一，
/// 否则在读取任何文件之前返回 [`Vesta2CellError::ConfigurationError`]。
pub fn convert(seed: &str, output: Option<&str>, spin: &str) -> Result<PathBuf> {
    let mode: SpinMode = spin.parse()?;
    convert_with(seed, output, mode, &CellOptions::default()).map(|c| c.output)
}

/// 带完整选项的转换
///
/// 先生成完整的 .cell 文本再一次性写入，失败时不会留下输出文件。
pub fn convert_with(
    seed: &str,
    output: Option<&str>,
    mode: SpinMode,
    options: &CellOptions,
) -> Result<Conversion> {
    if seed.trim().is_empty() {
        return Err(Vesta2CellError::InvalidArgument(
            "seed name must not be empty".to_string(),
        ));
    }

    let input = input_path(seed);
    let output = output_path(seed_stem(output.unwrap_or(seed)));

    let crystal = parsers::vesta::parse_vesta_file(&input)?;
    let content = parsers::cell::to_cell_string(&crystal, mode, options);

    fs::write(&output, content).map_err(|e| Vesta2CellError::FileWriteError {
        path: output.display().to_string(),
        source: e,
    })?;

    Ok(Conversion {
        input,
        output,
        crystal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_path_appends_extension() {
        assert_eq!(input_path("Fe"), PathBuf::from("Fe.vesta"));
        assert_eq!(input_path("dir/Fe.vesta"), PathBuf::from("dir/Fe.vesta"));
        assert_eq!(input_path("Fe.v2"), PathBuf::from("Fe.v2.vesta"));
    }

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(output_path("out"), PathBuf::from("out.cell"));
        assert_eq!(output_path("out.cell"), PathBuf::from("out.cell"));
    }

    #[test]
    fn test_seed_stem() {
        assert_eq!(seed_stem("Fe.vesta"), "Fe");
        assert_eq!(seed_stem("Fe.VESTA"), "Fe");
        assert_eq!(seed_stem("Fe.cell"), "Fe");
        assert_eq!(seed_stem("Fe"), "Fe");
        assert_eq!(seed_stem("xvesta"), "xvesta");
    }

    #[test]
    fn test_convert_rejects_unknown_mode_first() {
        let err = convert("does-not-exist", None, "magnetic").unwrap_err();
        assert!(matches!(err, Vesta2CellError::ConfigurationError(_)));
    }

    #[test]
    fn test_convert_rejects_empty_seed() {
        let err = convert("  ", None, "nospin").unwrap_err();
        assert!(matches!(err, Vesta2CellError::InvalidArgument(_)));
    }
}
