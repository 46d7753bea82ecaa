//! # 数据模型模块
//!
//! 定义统一的晶体结构与自旋模式数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 子模块: structure, spin

pub mod spin;
pub mod structure;

pub use spin::{Spin, SpinMode};
pub use structure::{Atom, Crystal, Lattice};
