//! # inspect 命令实现
//!
//! 打印 .vesta / .cell 文件中读到的晶格与原子，可导出 CSV。
//!
//! ## 依赖关系
//! - 使用 `cli/inspect.rs` 定义的参数
//! - 使用 vesta2cell 库的 `parsers::parse_structure_file`
//! - 使用 `tabled` 生成终端表格, `csv` 导出

use crate::cli::inspect::InspectArgs;
use crate::utils::output;

use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};
use vesta2cell::error::{Result, Vesta2CellError};
use vesta2cell::parsers;
use vesta2cell::Crystal;

/// 原子表中的一行
#[derive(Debug, Clone, Tabled, Serialize)]
struct AtomRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Element")]
    element: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "x")]
    x: String,
    #[tabled(rename = "y")]
    y: String,
    #[tabled(rename = "z")]
    z: String,
    #[tabled(rename = "Occ")]
    occupancy: String,
    #[tabled(rename = "Moment")]
    moment: String,
}

/// 执行 inspect 命令
pub fn execute(args: InspectArgs) -> Result<()> {
    let crystal = parsers::parse_structure_file(&args.file)?;

    output::print_header(&format!("Structure: {}", args.file.display()));

    if let Some(title) = &crystal.title {
        output::print_info(&format!("Title: {}", title));
    }
    for line in summary_lines(&crystal) {
        output::print_info(&line);
    }

    let rows = atom_rows(&crystal);
    println!("\n{}\n", Table::new(&rows));

    if let Some(csv_path) = &args.csv {
        write_csv(&rows, csv_path)?;
        output::print_done(&format!("Atom table written to {}", csv_path.display()));
    }

    Ok(())
}

fn summary_lines(crystal: &Crystal) -> Vec<String> {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
    let mut lines = vec![
        format!("Formula: {} ({} atoms)", crystal.formula(), crystal.atoms.len()),
        format!("a, b, c (Å): {:.6} {:.6} {:.6}", a, b, c),
        format!("α, β, γ (°): {:.4} {:.4} {:.4}", alpha, beta, gamma),
        format!("Volume (Å³): {:.4}", crystal.lattice.volume().abs()),
    ];
    if crystal.symmetry_operations > 0 {
        lines.push(format!(
            "Symmetry operations: {}",
            crystal.symmetry_operations
        ));
    }
    lines
}

fn atom_rows(crystal: &Crystal) -> Vec<AtomRow> {
    crystal
        .atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| AtomRow {
            index: i + 1,
            element: atom.element.clone(),
            label: atom.label.clone().unwrap_or_else(|| "-".to_string()),
            x: format!("{:.6}", atom.position[0]),
            y: format!("{:.6}", atom.position[1]),
            z: format!("{:.6}", atom.position[2]),
            occupancy: format!("{:.4}", atom.occupancy),
            moment: atom
                .moment
                .map(|m| format!("{:.4} {:.4} {:.4}", m[0], m[1], m[2]))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect()
}

fn write_csv(rows: &[AtomRow], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| Vesta2CellError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta2cell::{Atom, Lattice};

    fn sample() -> Crystal {
        let lattice = Lattice::from_parameters(2.87, 2.87, 2.87, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Fe", [0.0, 0.0, 0.0])
                .with_label("Fe1")
                .with_moment([0.0, 0.0, 2.2]),
            Atom::new("Fe", [0.5, 0.5, 0.5]),
        ];
        Crystal::new("Fe", lattice, atoms)
    }

    #[test]
    fn test_atom_rows() {
        let rows = atom_rows(&sample());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Fe1");
        assert_eq!(rows[0].moment, "0.0000 0.0000 2.2000");
        assert_eq!(rows[1].label, "-");
        assert_eq!(rows[1].x, "0.500000");
    }

    #[test]
    fn test_summary_lines() {
        let lines = summary_lines(&sample());
        assert!(lines[0].contains("Fe2"));
        assert!(lines.iter().any(|l| l.starts_with("Volume")));
        assert!(!lines.iter().any(|l| l.starts_with("Symmetry")));
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atoms.csv");
        write_csv(&atom_rows(&sample()), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "index,element,label,x,y,z,occupancy,moment"
        );
        assert_eq!(lines.count(), 2);
    }
}
