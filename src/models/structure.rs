//! # 晶体结构数据模型
//!
//! 定义统一的晶体结构表示：VESTA 解析得到，再写成 CASTEP .cell。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `commands/` 使用
//! - 使用 `models/spin.rs` 计算自旋标注

use super::spin::{Spin, SpinMode};
use serde::{Deserialize, Serialize};

/// 晶格参数表示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// 晶格向量矩阵 (3x3)，行向量表示 a, b, c
    /// [[a1, a2, a3], [b1, b2, b3], [c1, c2, c3]]
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    /// 从晶格参数 (a, b, c, alpha, beta, gamma) 创建晶格
    /// 角度单位：度。a 沿 x 轴，b 位于 xy 平面（与 VESTA 一致）
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let cos_alpha = alpha.to_radians().cos();
        let cos_beta = beta.to_radians().cos();
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let a_vec = [a, 0.0, 0.0];
        let b_vec = [b * cos_gamma, b * sin_gamma, 0.0];

        let c1 = c * cos_beta;
        let c2 = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        // 数值误差可能使根号内略小于 0
        let c3 = (c * c - c1 * c1 - c2 * c2).max(0.0).sqrt();

        Lattice {
            matrix: [a_vec, b_vec, [c1, c2, c3]],
        }
    }

    /// 从晶格向量矩阵创建
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// 获取晶格参数 (a, b, c, alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let [a_vec, b_vec, c_vec] = self.matrix;

        let a = norm(&a_vec);
        let b = norm(&b_vec);
        let c = norm(&c_vec);

        let alpha = (dot(&b_vec, &c_vec) / (b * c)).acos().to_degrees();
        let beta = (dot(&a_vec, &c_vec) / (a * c)).acos().to_degrees();
        let gamma = (dot(&a_vec, &b_vec) / (a * b)).acos().to_degrees();

        (a, b, c, alpha, beta, gamma)
    }

    /// 计算晶格体积
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;

        // 行列式计算
        a[0] * (b[1] * c[2] - b[2] * c[1]) - a[1] * (b[0] * c[2] - b[2] * c[0])
            + a[2] * (b[0] * c[1] - b[1] * c[0])
    }
}

pub(crate) fn dot(x: &[f64; 3], y: &[f64; 3]) -> f64 {
    x.iter().zip(y.iter()).map(|(p, q)| p * q).sum()
}

pub(crate) fn norm(x: &[f64; 3]) -> f64 {
    dot(x, x).sqrt()
}

/// 原子信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号（CASTEP 物种标签）
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],

    /// 可选：原子标签（VESTA 位点标签，如 Fe1）
    pub label: Option<String>,

    /// 占位率
    pub occupancy: f64,

    /// 可选：磁矩向量（来自 VESTA VECTR 块）
    pub moment: Option<[f64; 3]>,
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
            label: None,
            occupancy: 1.0,
            moment: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_moment(mut self, moment: [f64; 3]) -> Self {
        self.moment = Some(moment);
        self
    }

    /// 按自旋模式得到该原子的自旋标注
    pub fn spin(&self, mode: SpinMode) -> Option<Spin> {
        mode.resolve(self.moment)
    }
}

/// 晶体结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crystal {
    /// 结构名称（通常为种子名）
    pub name: String,

    /// 标题 (VESTA TITLE 块)
    pub title: Option<String>,

    /// 晶格
    pub lattice: Lattice,

    /// 原子列表
    pub atoms: Vec<Atom>,

    /// 对称操作数目（只计数，不展开）
    pub symmetry_operations: usize,

    /// 来源文件格式
    pub source_format: Option<String>,
}

impl Crystal {
    pub fn new(name: impl Into<String>, lattice: Lattice, atoms: Vec<Atom>) -> Self {
        Crystal {
            name: name.into(),
            title: None,
            lattice,
            atoms,
            symmetry_operations: 0,
            source_format: None,
        }
    }

    /// 计算化学式
    pub fn formula(&self) -> String {
        use std::collections::BTreeMap;
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

        for atom in &self.atoms {
            *counts.entry(atom.element.as_str()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(el, count)| {
                if count == 1 {
                    el.to_string()
                } else {
                    format!("{}{}", el, count)
                }
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 是否有任意原子带磁矩
    pub fn has_moments(&self) -> bool {
        self.atoms.iter().any(|a| a.moment.is_some())
    }

    /// 是否存在部分占位
    pub fn has_partial_occupancy(&self) -> bool {
        self.atoms.iter().any(|a| (a.occupancy - 1.0).abs() > 1e-6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lattice_from_parameters_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 5.0).abs() < 1e-6);
        assert!((b - 5.0).abs() < 1e-6);
        assert!((c - 5.0).abs() < 1e-6);
        assert!((alpha - 90.0).abs() < 1e-6);
        assert!((beta - 90.0).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);

        // 正交晶格的非对角元应为 0
        assert!(lattice.matrix[1][0].abs() < 1e-9);
        assert!(lattice.matrix[2][0].abs() < 1e-9);
        assert!(lattice.matrix[2][1].abs() < 1e-9);
    }

    #[test]
    fn test_lattice_volume_cubic() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        assert!((lattice.volume().abs() - 125.0).abs() < 1e-6);
    }

    #[test]
    fn test_lattice_hexagonal() {
        let lattice = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let (a, b, c, alpha, _, gamma) = lattice.parameters();

        assert!((a - 3.0).abs() < 0.01);
        assert!((b - 3.0).abs() < 0.01);
        assert!((c - 5.0).abs() < 0.01);
        assert!((alpha - 90.0).abs() < 0.01);
        assert!((gamma - 120.0).abs() < 0.01);
    }

    #[test]
    fn test_lattice_triclinic_parameters_survive() {
        let lattice = Lattice::from_parameters(4.1, 5.2, 6.3, 80.0, 95.0, 105.0);
        let (a, b, c, alpha, beta, gamma) = lattice.parameters();

        assert!((a - 4.1).abs() < 1e-9);
        assert!((b - 5.2).abs() < 1e-9);
        assert!((c - 6.3).abs() < 1e-9);
        assert!((alpha - 80.0).abs() < 1e-6);
        assert!((beta - 95.0).abs() < 1e-6);
        assert!((gamma - 105.0).abs() < 1e-6);
    }

    #[test]
    fn test_crystal_formula() {
        let lattice = Lattice::from_parameters(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Na", [0.0, 0.0, 0.0]),
            Atom::new("Na", [0.5, 0.5, 0.0]),
            Atom::new("Cl", [0.5, 0.0, 0.0]),
        ];
        let crystal = Crystal::new("NaCl", lattice, atoms);

        assert_eq!(crystal.formula(), "ClNa2");
    }

    #[test]
    fn test_crystal_flags() {
        let lattice = Lattice::from_parameters(2.87, 2.87, 2.87, 90.0, 90.0, 90.0);
        let mut half = Atom::new("Fe", [0.5, 0.5, 0.5]);
        half.occupancy = 0.5;
        let atoms = vec![
            Atom::new("Fe", [0.0, 0.0, 0.0]).with_moment([0.0, 0.0, 2.2]),
            half,
        ];
        let crystal = Crystal::new("Fe", lattice, atoms);

        assert!(crystal.has_moments());
        assert!(crystal.has_partial_occupancy());
    }

    #[test]
    fn test_atom_with_label() {
        let atom = Atom::new("Fe", [0.0, 0.0, 0.0]).with_label("Fe1");
        assert_eq!(atom.label, Some("Fe1".to_string()));
        assert_eq!(atom.occupancy, 1.0);
        assert!(atom.moment.is_none());
    }
}
