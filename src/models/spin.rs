//! # 自旋处理模式
//!
//! 定义 nospin / collinear / noncollinear 三种模式，
//! 以及由磁矩向量推导每个原子 SPIN 标注的规则。
//!
//! ## 依赖关系
//! - 被 `models/structure.rs`、`parsers/cell.rs` 和 `cli/` 使用

use crate::error::{Result, Vesta2CellError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 自旋处理模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum SpinMode {
    /// No spin annotation
    #[default]
    Nospin,
    /// One scalar SPIN= value per atom
    Collinear,
    /// A three-component SPIN= vector per atom
    Noncollinear,
}

/// 单个原子的自旋标注
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spin {
    Collinear(f64),
    Noncollinear([f64; 3]),
}

impl SpinMode {
    pub const ALL: [SpinMode; 3] = [SpinMode::Nospin, SpinMode::Collinear, SpinMode::Noncollinear];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpinMode::Nospin => "nospin",
            SpinMode::Collinear => "collinear",
            SpinMode::Noncollinear => "noncollinear",
        }
    }

    /// 由磁矩推导自旋标注；没有磁矩的原子取零
    pub fn resolve(&self, moment: Option<[f64; 3]>) -> Option<Spin> {
        let moment = moment.unwrap_or([0.0; 3]);
        match self {
            SpinMode::Nospin => None,
            SpinMode::Collinear => Some(Spin::Collinear(collinear_component(&moment))),
            SpinMode::Noncollinear => Some(Spin::Noncollinear(moment)),
        }
    }
}

/// 向量长度，符号取绝对值最大的分量的符号
fn collinear_component(moment: &[f64; 3]) -> f64 {
    let magnitude = super::structure::norm(moment);
    let dominant = moment
        .iter()
        .copied()
        .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if dominant < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

impl fmt::Display for SpinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SpinMode {
    type Err = Vesta2CellError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        SpinMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                Vesta2CellError::ConfigurationError(format!(
                    "unknown spin mode '{}' (expected one of: nospin, collinear, noncollinear)",
                    s
                ))
            })
    }
}
