//! # convert 命令实现
//!
//! 把单个 <seed>.vesta 转换为 <out>.cell。
//!
//! ## 功能
//! - 解析 VESTA 晶胞、位点和磁矩
//! - 按自旋模式写出 CASTEP .cell
//! - 对对称操作、缺失磁矩、部分占位给出警告
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 vesta2cell 库的 `convert_with`
//! - 使用 `utils/output.rs`

use crate::cli::convert::ConvertArgs;
use crate::utils::output;

use vesta2cell::error::Result;
use vesta2cell::{Crystal, SpinMode};

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<()> {
    let mode = args.format.spin;
    output::print_header(&format!(
        "Converting {} to CASTEP .cell",
        vesta2cell::input_path(&args.seed).display()
    ));

    let conversion = vesta2cell::convert_with(
        &args.seed,
        args.out.as_deref(),
        mode,
        &args.format.cell_options(),
    )?;

    for warning in structure_warnings(&conversion.crystal, mode) {
        output::print_warning(&warning);
    }

    output::print_conversion(
        &conversion.input.display().to_string(),
        &conversion.output.display().to_string(),
    );
    output::print_done(&format!(
        "Wrote {} atom(s) ({}), spin treatment: {}",
        conversion.crystal.atoms.len(),
        conversion.crystal.formula(),
        mode
    ));

    Ok(())
}

/// 结构中值得提醒用户的情况
pub fn structure_warnings(crystal: &Crystal, mode: SpinMode) -> Vec<String> {
    let mut warnings = Vec::new();

    if crystal.symmetry_operations > 1 {
        warnings.push(format!(
            "{} symmetry operations found; only the {} listed site(s) are written. \
             Export the structure in P1 to include every atom.",
            crystal.symmetry_operations,
            crystal.atoms.len()
        ));
    }

    if mode != SpinMode::Nospin && !crystal.has_moments() {
        warnings.push(format!(
            "No VECTR moments in input; every atom gets a zero {} spin.",
            mode
        ));
    }

    if crystal.has_partial_occupancy() {
        warnings.push(
            "Partial occupancies are not representable in POSITIONS_FRAC and were dropped."
                .to_string(),
        );
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta2cell::{Atom, Lattice};

    fn crystal(atoms: Vec<Atom>) -> Crystal {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        Crystal::new("test", lattice, atoms)
    }

    #[test]
    fn test_no_warnings_for_plain_p1() {
        let mut c = crystal(vec![Atom::new("Si", [0.0, 0.0, 0.0])]);
        c.symmetry_operations = 1;
        assert!(structure_warnings(&c, SpinMode::Nospin).is_empty());
    }

    #[test]
    fn test_warns_on_symmetry_and_missing_moments() {
        let mut c = crystal(vec![Atom::new("Fe", [0.0, 0.0, 0.0])]);
        c.symmetry_operations = 48;

        let warnings = structure_warnings(&c, SpinMode::Collinear);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("48"));
        assert!(warnings[1].contains("collinear"));
    }

    #[test]
    fn test_warns_on_partial_occupancy() {
        let mut atom = Atom::new("O", [0.0, 0.0, 0.0]).with_moment([0.0, 0.0, 1.0]);
        atom.occupancy = 0.25;
        let warnings = structure_warnings(&crystal(vec![atom]), SpinMode::Noncollinear);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Partial"));
    }
}
