//! # CASTEP .cell 格式读写
//!
//! 把 Crystal 写成 CASTEP .cell 输入，并能读回生成的文件（用于查看与校验）。
//!
//! ## .cell 格式说明
//! ```text
//! %BLOCK LATTICE_CART
//! ang
//! a1 a2 a3
//! b1 b2 b3
//! c1 c2 c3
//! %ENDBLOCK LATTICE_CART
//!
//! %BLOCK POSITIONS_FRAC
//! Element x y z [SPIN=s | SPIN= sx sy sz]
//! ...
//! %ENDBLOCK POSITIONS_FRAC
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`、`lib.rs` 和 `commands/` 使用
//! - 使用 `models/structure.rs`, `models/spin.rs`

use crate::error::{Result, Vesta2CellError};
use crate::models::{Atom, Crystal, Lattice, Spin, SpinMode};
use clap::ValueEnum;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const BOHR_TO_ANG: f64 = 0.529_177_210_903;

/// 晶格块的写法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LatticeFormat {
    /// %BLOCK LATTICE_CART (three cartesian vectors)
    #[default]
    Cart,
    /// %BLOCK LATTICE_ABC (lengths and angles)
    Abc,
}

/// .cell 输出选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellOptions {
    pub lattice: LatticeFormat,
    /// 小数位数；None 时写最短的往返表示 (0.5 写作 `0.5`)
    pub precision: Option<usize>,
}

impl CellOptions {
    /// 列对齐的数值
    fn column(&self, x: f64) -> String {
        match self.precision {
            Some(p) => format!("{:w$.p$}", x, w = p + 6, p = p),
            None => format!("{}", x),
        }
    }

    /// 紧凑数值 (SPIN 字段)
    fn value(&self, x: f64) -> String {
        match self.precision {
            Some(p) => format!("{:.p$}", x, p = p),
            None => format!("{}", x),
        }
    }

    fn row(&self, values: [f64; 3]) -> String {
        values
            .iter()
            .map(|&x| self.column(x))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ─────────────────────────────────────────────────────────────
// 写出
// ─────────────────────────────────────────────────────────────

/// 将 Crystal 转换为 .cell 格式字符串
pub fn to_cell_string(crystal: &Crystal, mode: SpinMode, options: &CellOptions) -> String {
    let mut result = String::new();

    let _ = writeln!(result, "! {} generated by vesta2cell", crystal.name);
    if let Some(title) = &crystal.title {
        let _ = writeln!(result, "! {}", title);
    }
    result.push('\n');

    match options.lattice {
        LatticeFormat::Cart => {
            result.push_str("%BLOCK LATTICE_CART\nang\n");
            for row in &crystal.lattice.matrix {
                let _ = writeln!(result, "{}", options.row(*row));
            }
            result.push_str("%ENDBLOCK LATTICE_CART\n\n");
        }
        LatticeFormat::Abc => {
            let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
            result.push_str("%BLOCK LATTICE_ABC\nang\n");
            let _ = writeln!(result, "{}", options.row([a, b, c]));
            let _ = writeln!(result, "{}", options.row([alpha, beta, gamma]));
            result.push_str("%ENDBLOCK LATTICE_ABC\n\n");
        }
    }

    result.push_str("%BLOCK POSITIONS_FRAC\n");
    for atom in &crystal.atoms {
        match options.precision {
            Some(_) => {
                let _ = write!(result, "{:4} {}", atom.element, options.row(atom.position));
            }
            None => {
                let _ = write!(result, "{} {}", atom.element, options.row(atom.position));
            }
        }
        match atom.spin(mode) {
            None => {}
            Some(Spin::Collinear(s)) => {
                let _ = write!(result, " SPIN={}", options.value(s));
            }
            Some(Spin::Noncollinear(v)) => {
                let _ = write!(
                    result,
                    " SPIN= {} {} {}",
                    options.value(v[0]),
                    options.value(v[1]),
                    options.value(v[2])
                );
            }
        }
        result.push('\n');
    }
    result.push_str("%ENDBLOCK POSITIONS_FRAC\n");

    result
}

// ─────────────────────────────────────────────────────────────
// 读取
// ─────────────────────────────────────────────────────────────

/// 解析 .cell 文件
pub fn parse_cell_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            Vesta2CellError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Vesta2CellError::FileReadError {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;

    parse_cell_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 .cell 格式
pub fn parse_cell_content(content: &str, name: &str) -> Result<Crystal> {
    let path = format!("{}.cell", name);
    let lines: Vec<&str> = content.lines().collect();

    let lattice = if let Some(start) = find_block_start(&lines, "LATTICE_CART") {
        parse_lattice_cart(&path, &lines, start)?
    } else if let Some(start) = find_block_start(&lines, "LATTICE_ABC") {
        parse_lattice_abc(&path, &lines, start)?
    } else {
        return Err(Vesta2CellError::parse(
            path,
            "LATTICE",
            None,
            "missing LATTICE_CART or LATTICE_ABC block",
        ));
    };

    let atoms = if let Some(start) = find_block_start(&lines, "POSITIONS_FRAC") {
        parse_positions(&path, &lines, start, "POSITIONS_FRAC")?
    } else if let Some(start) = find_block_start(&lines, "POSITIONS_ABS") {
        let atoms = parse_positions(&path, &lines, start, "POSITIONS_ABS")?;
        convert_abs_to_frac(&path, atoms, &lattice)?
    } else {
        return Err(Vesta2CellError::parse(
            path,
            "POSITIONS",
            None,
            "missing POSITIONS_FRAC or POSITIONS_ABS block",
        ));
    };

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.source_format = Some("cell".to_string());

    Ok(crystal)
}

/// 查找 %BLOCK XXX 的起始行号
fn find_block_start(lines: &[&str], block_name: &str) -> Option<usize> {
    lines.iter().position(|line| {
        let mut parts = line.split_whitespace();
        matches!(
            (parts.next(), parts.next()),
            (Some(tag), Some(name))
                if tag.eq_ignore_ascii_case("%BLOCK") && name.eq_ignore_ascii_case(block_name)
        )
    })
}

/// 块内有效行：(行号, 内容)，跳过注释与空行，在 %ENDBLOCK 处停止
fn block_rows<'l, 'a>(
    lines: &'l [&'a str],
    start: usize,
) -> impl Iterator<Item = (usize, &'a str)> + 'l {
    lines
        .iter()
        .copied()
        .enumerate()
        .skip(start + 1)
        .map(|(i, line)| (i + 1, line.trim()))
        .take_while(|(_, line)| !line.to_uppercase().starts_with("%ENDBLOCK"))
        .filter(|(_, line)| !(line.is_empty() || line.starts_with('#') || line.starts_with('!')))
}

/// 单位行返回换算系数
fn unit_scale(line: &str) -> Option<f64> {
    match line.to_ascii_lowercase().as_str() {
        "ang" => Some(1.0),
        "bohr" | "a0" => Some(BOHR_TO_ANG),
        "nm" => Some(10.0),
        _ => None,
    }
}

fn parse_numbers(path: &str, section: &str, line_no: usize, tokens: &[&str]) -> Result<Vec<f64>> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    Vesta2CellError::parse(path, section, Some(line_no), format!("invalid number '{}'", t))
                })
        })
        .collect()
}

/// 解析 LATTICE_CART 块
fn parse_lattice_cart(path: &str, lines: &[&str], start: usize) -> Result<Lattice> {
    let mut scale = 1.0;
    let mut rows: Vec<[f64; 3]> = Vec::with_capacity(3);

    for (line_no, line) in block_rows(lines, start) {
        if let Some(s) = unit_scale(line) {
            scale = s;
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().take(3).collect();
        if tokens.len() < 3 {
            return Err(Vesta2CellError::parse(
                path,
                "LATTICE_CART",
                Some(line_no),
                "expected three components",
            ));
        }
        let v = parse_numbers(path, "LATTICE_CART", line_no, &tokens)?;
        rows.push([v[0] * scale, v[1] * scale, v[2] * scale]);
    }

    match rows.as_slice() {
        [a, b, c] => Ok(Lattice::from_vectors([*a, *b, *c])),
        _ => Err(Vesta2CellError::parse(
            path,
            "LATTICE_CART",
            None,
            format!("expected 3 lattice vectors, found {}", rows.len()),
        )),
    }
}

/// 解析 LATTICE_ABC 块
fn parse_lattice_abc(path: &str, lines: &[&str], start: usize) -> Result<Lattice> {
    let mut scale = 1.0;
    let mut params: Vec<f64> = Vec::with_capacity(6);

    for (line_no, line) in block_rows(lines, start) {
        if let Some(s) = unit_scale(line) {
            scale = s;
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        params.extend(parse_numbers(path, "LATTICE_ABC", line_no, &tokens)?);
    }

    if params.len() != 6 {
        return Err(Vesta2CellError::parse(
            path,
            "LATTICE_ABC",
            None,
            "need a b c alpha beta gamma",
        ));
    }

    Ok(Lattice::from_parameters(
        params[0] * scale,
        params[1] * scale,
        params[2] * scale,
        params[3],
        params[4],
        params[5],
    ))
}

/// 解析原子位置块（含 SPIN 标注）
fn parse_positions(path: &str, lines: &[&str], start: usize, section: &str) -> Result<Vec<Atom>> {
    let mut atoms = Vec::new();

    for (line_no, line) in block_rows(lines, start) {
        if unit_scale(line).is_some() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(Vesta2CellError::parse(
                path,
                section,
                Some(line_no),
                "expected 'Element x y z'",
            ));
        }

        let xyz = parse_numbers(path, section, line_no, &parts[1..4])?;
        let mut atom = Atom::new(parts[0], [xyz[0], xyz[1], xyz[2]]);
        atom.moment = parse_spin(path, section, line_no, &parts[4..])?;
        atoms.push(atom);
    }

    Ok(atoms)
}

/// 解析 SPIN=s 或 SPIN= sx sy sz，标量记为沿 z 的磁矩
fn parse_spin(path: &str, section: &str, line_no: usize, rest: &[&str]) -> Result<Option<[f64; 3]>> {
    let Some(pos) = rest
        .iter()
        .position(|t| t.to_ascii_uppercase().starts_with("SPIN"))
    else {
        return Ok(None);
    };

    let joined = rest[pos..].join(" ");
    let values: Vec<&str> = joined[4..]
        .split(|c: char| c.is_whitespace() || c == '=' || c == '(' || c == ')')
        .filter(|t| !t.is_empty())
        .collect();

    let v = parse_numbers(path, section, line_no, &values)?;
    match v.as_slice() {
        [s] => Ok(Some([0.0, 0.0, *s])),
        [x, y, z] => Ok(Some([*x, *y, *z])),
        _ => Err(Vesta2CellError::parse(
            path,
            section,
            Some(line_no),
            "SPIN needs one or three values",
        )),
    }
}

/// 将绝对坐标转换为分数坐标
fn convert_abs_to_frac(path: &str, atoms: Vec<Atom>, lattice: &Lattice) -> Result<Vec<Atom>> {
    let m = lattice.matrix;
    let det = lattice.volume();

    if det.abs() < 1e-10 {
        return Err(Vesta2CellError::parse(
            path,
            "POSITIONS_ABS",
            None,
            "singular lattice, cannot convert to fractional coordinates",
        ));
    }

    // 行向量晶格: r = f · M，故 f = r · M⁻¹
    let inv = [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ];

    Ok(atoms
        .into_iter()
        .map(|mut atom| {
            let r = atom.position;
            atom.position = [
                r[0] * inv[0][0] + r[1] * inv[1][0] + r[2] * inv[2][0],
                r[0] * inv[0][1] + r[1] * inv[1][1] + r[2] * inv[2][1],
                r[0] * inv[0][2] + r[1] * inv[1][2] + r[2] * inv[2][2],
            ];
            atom
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_si() -> Crystal {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        Crystal::new("Si", lattice, vec![Atom::new("Si", [0.5, 0.5, 0.5])])
    }

    fn magnetic_fe() -> Crystal {
        let lattice = Lattice::from_parameters(2.87, 2.87, 2.87, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Fe", [0.0, 0.0, 0.0]).with_moment([0.0, 0.0, 2.2]),
            Atom::new("Fe", [0.5, 0.5, 0.5]).with_moment([0.0, 0.0, -2.2]),
            Atom::new("C", [0.5, 0.0, 0.0]),
        ];
        Crystal::new("FeC", lattice, atoms)
    }

    /// POSITIONS_FRAC 块中的行
    fn position_lines(text: &str) -> Vec<&str> {
        text.lines()
            .skip_while(|l| !l.starts_with("%BLOCK POSITIONS_FRAC"))
            .skip(1)
            .take_while(|l| !l.starts_with("%ENDBLOCK"))
            .collect()
    }

    fn spin_fields(line: &str) -> Vec<&str> {
        match line.find("SPIN=") {
            Some(i) => line[i + 5..].split_whitespace().collect(),
            None => Vec::new(),
        }
    }

    #[test]
    fn test_nospin_cubic_si() {
        let text = to_cell_string(&cubic_si(), SpinMode::Nospin, &CellOptions::default());
        let lines = position_lines(&text);

        assert_eq!(lines.len(), 1);
        let parts: Vec<&str> = lines[0].split_whitespace().collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "Si");
        for value in &parts[1..] {
            assert_eq!(value.parse::<f64>().unwrap(), 0.5);
        }
        assert!(!text.to_uppercase().contains("SPIN"));
    }

    #[test]
    fn test_collinear_one_scalar_per_atom() {
        let text = to_cell_string(&magnetic_fe(), SpinMode::Collinear, &CellOptions::default());
        let lines = position_lines(&text);

        assert_eq!(lines.len(), 3);
        let spins: Vec<f64> = lines
            .iter()
            .map(|line| {
                let fields = spin_fields(line);
                assert_eq!(fields.len(), 1, "line: {}", line);
                fields[0].parse().unwrap()
            })
            .collect();
        assert!((spins[0] - 2.2).abs() < 1e-9);
        assert!((spins[1] + 2.2).abs() < 1e-9);
        assert_eq!(spins[2], 0.0);
    }

    #[test]
    fn test_noncollinear_three_components_per_atom() {
        let text = to_cell_string(&magnetic_fe(), SpinMode::Noncollinear, &CellOptions::default());
        for line in position_lines(&text) {
            assert_eq!(spin_fields(line).len(), 3, "line: {}", line);
        }
    }

    #[test]
    fn test_lattice_cart_round_trip() {
        let original = Lattice::from_parameters(4.1, 5.2, 6.3, 80.0, 95.0, 105.0);
        let crystal = Crystal::new("tri", original.clone(), vec![Atom::new("O", [0.1, 0.2, 0.3])]);

        let text = to_cell_string(&crystal, SpinMode::Nospin, &CellOptions::default());
        let parsed = parse_cell_content(&text, "tri").unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert!((parsed.lattice.matrix[i][j] - original.matrix[i][j]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_lattice_abc_round_trip() {
        let original = Lattice::from_parameters(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        let crystal = Crystal::new("hex", original.clone(), vec![Atom::new("Zn", [0.0, 0.0, 0.0])]);
        let options = CellOptions {
            lattice: LatticeFormat::Abc,
            ..CellOptions::default()
        };

        let text = to_cell_string(&crystal, SpinMode::Nospin, &options);
        assert!(text.contains("%BLOCK LATTICE_ABC"));
        let parsed = parse_cell_content(&text, "hex").unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert!((parsed.lattice.matrix[i][j] - original.matrix[i][j]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_spin_round_trip() {
        let text = to_cell_string(&magnetic_fe(), SpinMode::Noncollinear, &CellOptions::default());
        let parsed = parse_cell_content(&text, "FeC").unwrap();

        assert_eq!(parsed.atoms.len(), 3);
        assert_eq!(parsed.atoms[0].moment, Some([0.0, 0.0, 2.2]));
        assert_eq!(parsed.atoms[2].moment, Some([0.0, 0.0, 0.0]));

        let text = to_cell_string(&magnetic_fe(), SpinMode::Collinear, &CellOptions::default());
        let parsed = parse_cell_content(&text, "FeC").unwrap();
        assert_eq!(parsed.atoms[1].moment, Some([0.0, 0.0, -2.2]));
    }

    #[test]
    fn test_precision_option() {
        let options = CellOptions {
            precision: Some(4),
            ..CellOptions::default()
        };
        let text = to_cell_string(&cubic_si(), SpinMode::Nospin, &options);
        assert!(position_lines(&text)[0].contains("0.5000"));
        assert!(!position_lines(&text)[0].contains("0.50000"));
    }

    #[test]
    fn test_default_writes_shortest_numbers() {
        let text = to_cell_string(&cubic_si(), SpinMode::Nospin, &CellOptions::default());
        assert_eq!(position_lines(&text), vec!["Si 0.5 0.5 0.5"]);
        assert!(text.lines().any(|l| l == "5 0 0"));
    }

    #[test]
    fn test_title_written_as_comment() {
        let mut crystal = cubic_si();
        crystal.title = Some("diamond Si".to_string());
        let text = to_cell_string(&crystal, SpinMode::Nospin, &CellOptions::default());
        assert!(text.lines().any(|l| l == "! diamond Si"));
    }

    #[test]
    fn test_parse_cell_with_comments_and_bohr() {
        let content = r#"
# This is a comment
%block lattice_cart
bohr
10.0 0.0 0.0
0.0 10.0 0.0
0.0 0.0 10.0
%endblock lattice_cart

%BLOCK POSITIONS_FRAC
! Fe at origin
Fe 0.0 0.0 0.0 SPIN=3.0
%ENDBLOCK POSITIONS_FRAC
"#;
        let crystal = parse_cell_content(content, "Fe").unwrap();
        assert_eq!(crystal.atoms.len(), 1);
        assert_eq!(crystal.atoms[0].element, "Fe");
        assert_eq!(crystal.atoms[0].moment, Some([0.0, 0.0, 3.0]));
        assert!((crystal.lattice.matrix[0][0] - 10.0 * BOHR_TO_ANG).abs() < 1e-9);
    }

    #[test]
    fn test_parse_cell_positions_abs() {
        let content = r#"
%BLOCK LATTICE_CART
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0
%ENDBLOCK LATTICE_CART
%BLOCK POSITIONS_ABS
O 2.0 1.0 3.0
%ENDBLOCK POSITIONS_ABS
"#;
        let crystal = parse_cell_content(content, "O").unwrap();
        let p = crystal.atoms[0].position;
        assert!((p[0] - 0.5).abs() < 1e-9);
        assert!((p[1] - 0.25).abs() < 1e-9);
        assert!((p[2] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_cell_incomplete_lattice() {
        let content = "%BLOCK LATTICE_CART\n1 0 0\n0 1 0\n%ENDBLOCK LATTICE_CART\n";
        assert!(matches!(
            parse_cell_content(content, "bad"),
            Err(Vesta2CellError::ParseError { .. })
        ));
    }

    #[test]
    fn test_parse_cell_rejects_non_finite() {
        for token in ["nan", "inf", "-infinity"] {
            let content = format!(
                "%BLOCK LATTICE_CART\n{} 0 0\n0 1 0\n0 0 1\n%ENDBLOCK LATTICE_CART\n",
                token
            );
            match parse_cell_content(&content, "bad") {
                Err(Vesta2CellError::ParseError { section, reason, .. }) => {
                    assert_eq!(section, "LATTICE_CART");
                    assert!(reason.contains(token), "{}", reason);
                }
                other => panic!("{}: unexpected {:?}", token, other),
            }
        }
    }
}
