//! # VESTA .vesta 格式解析器
//!
//! 解析 VESTA 保存的结构文件，提取晶胞参数、原子位点和磁矩向量。
//!
//! ## .vesta 格式说明
//! ```text
//! TITLE
//! bcc Fe
//! SYMOP
//!  0.000000  0.000000  0.000000  1  0  0   0  1  0   0  0  1   1
//!  -1.0 -1.0 -1.0  0 0 0  0 0 0  0 0 0
//! CELLP
//!   2.870000   2.870000   2.870000  90.000000  90.000000  90.000000
//!   0.000000   0.000000   0.000000   0.000000   0.000000   0.000000
//! STRUC
//!   1 Fe        Fe1  1.0000   0.000000   0.000000   0.000000    1a       1
//!                             0.000000   0.000000   0.000000  0.00
//!   0 0 0 0 0 0 0
//! VECTR
//!    1    0.00000    0.00000    2.20000 0
//!     1   0    0    0    0
//!  0 0 0 0 0
//!  0 0 0 0 0
//! ```
//!
//! 关键字行由大写字母开头，其余行归属于最近的关键字块。
//! SYMOP 只计数，不展开对称操作。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 和 `lib.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `regex` 识别关键字行

use crate::error::{Result, Vesta2CellError};
use crate::models::{Atom, Crystal, Lattice};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

/// 解析 .vesta 文件
pub fn parse_vesta_file(path: &Path) -> Result<Crystal> {
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

    parse_vesta_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 .vesta 格式
pub fn parse_vesta_content(content: &str, name: &str) -> Result<Crystal> {
    let blocks = split_blocks(content);
    let ctx = Context { name };

    let title = find_block(&blocks, "TITLE")
        .and_then(|b| b.rows.first())
        .map(|(_, row)| row.trim().to_string())
        .filter(|t| !t.is_empty());

    let cellp = find_block(&blocks, "CELLP")
        .ok_or_else(|| ctx.error("CELLP", None, "missing CELLP block"))?;
    let lattice = parse_cellp(&ctx, cellp)?;

    let struc = find_block(&blocks, "STRUC")
        .ok_or_else(|| ctx.error("STRUC", None, "missing STRUC block"))?;
    let (mut atoms, sites) = parse_struc(&ctx, struc)?;

    if let Some(vectr) = find_block(&blocks, "VECTR") {
        parse_vectr(&ctx, vectr, &sites, &mut atoms)?;
    }

    let symmetry_operations = find_block(&blocks, "SYMOP")
        .map(count_symops)
        .unwrap_or(0);

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.title = title;
    crystal.symmetry_operations = symmetry_operations;
    crystal.source_format = Some("vesta".to_string());

    Ok(crystal)
}

/// 错误上下文（文件名）
struct Context<'a> {
    name: &'a str,
}

impl Context<'_> {
    fn error(&self, section: &str, line: Option<usize>, reason: impl Into<String>) -> Vesta2CellError {
        Vesta2CellError::parse(format!("{}.vesta", self.name), section, line, reason)
    }

    fn number(&self, section: &str, line: usize, token: &str) -> Result<f64> {
        token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.error(section, Some(line), format!("invalid number '{}'", token)))
    }
}

/// 一个关键字块：关键字、所在行号、块内各行 (行号从 1 开始)
#[derive(Debug)]
struct Block<'a> {
    keyword: &'a str,
    rows: Vec<(usize, &'a str)>,
}

fn keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z][A-Z0-9_]*)(?:\s.*)?$").expect("valid keyword pattern"))
}

/// 按关键字行切分文件
fn split_blocks(content: &str) -> Vec<Block<'_>> {
    let re = keyword_regex();
    let mut blocks: Vec<Block> = Vec::new();
    // TITLE 之后的第一行是标题本身，即使全大写也不是关键字
    let mut expect_title = false;

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if expect_title {
            expect_title = false;
            if let Some(block) = blocks.last_mut() {
                block.rows.push((line_no, line));
                continue;
            }
        }

        if let Some(caps) = re.captures(line) {
            if let Some(keyword) = caps.get(1) {
                expect_title = keyword.as_str() == "TITLE";
                blocks.push(Block {
                    keyword: keyword.as_str(),
                    rows: Vec::new(),
                });
                continue;
            }
        }

        // 第一个关键字之前的行（如 #VESTA_FORMAT_VERSION）被忽略
        if let Some(block) = blocks.last_mut() {
            block.rows.push((line_no, line));
        }
    }

    blocks
}

fn find_block<'b, 'a>(blocks: &'b [Block<'a>], keyword: &str) -> Option<&'b Block<'a>> {
    blocks.iter().find(|b| b.keyword == keyword)
}

/// 解析 CELLP 块: a b c alpha beta gamma
fn parse_cellp(ctx: &Context, block: &Block) -> Result<Lattice> {
    let (line_no, row) = block
        .rows
        .first()
        .ok_or_else(|| ctx.error("CELLP", None, "empty CELLP block"))?;

    let tokens: Vec<&str> = row.split_whitespace().collect();
    if tokens.len() < 6 {
        return Err(ctx.error(
            "CELLP",
            Some(*line_no),
            format!(
                "expected 'a b c alpha beta gamma', found {} field(s)",
                tokens.len()
            ),
        ));
    }

    let mut params = [0.0; 6];
    for (slot, token) in params.iter_mut().zip(tokens.iter()) {
        *slot = ctx.number("CELLP", *line_no, token)?;
    }

    let [a, b, c, alpha, beta, gamma] = params;
    if a <= 0.0 || b <= 0.0 || c <= 0.0 {
        return Err(ctx.error(
            "CELLP",
            Some(*line_no),
            "cell lengths must be positive",
        ));
    }

    Ok(Lattice::from_parameters(a, b, c, alpha, beta, gamma))
}

/// 解析 STRUC 块，返回原子列表及 VESTA 位点编号到原子下标的映射
fn parse_struc(ctx: &Context, block: &Block) -> Result<(Vec<Atom>, HashMap<usize, usize>)> {
    let mut atoms = Vec::new();
    let mut sites = HashMap::new();

    for (line_no, row) in &block.rows {
        let tokens: Vec<&str> = row.split_whitespace().collect();

        // 续行（不确定度）以小数开头，不是整数
        let index = match tokens[0].parse::<usize>() {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => continue,
        };

        if tokens.len() < 7 {
            return Err(ctx.error(
                "STRUC",
                Some(*line_no),
                "expected 'index element label occupancy x y z'",
            ));
        }

        let occupancy = ctx.number("STRUC", *line_no, tokens[3])?;
        let x = ctx.number("STRUC", *line_no, tokens[4])?;
        let y = ctx.number("STRUC", *line_no, tokens[5])?;
        let z = ctx.number("STRUC", *line_no, tokens[6])?;

        let mut atom = Atom::new(tokens[1], [x, y, z]).with_label(tokens[2]);
        atom.occupancy = occupancy;

        sites.insert(index, atoms.len());
        atoms.push(atom);
    }

    if atoms.is_empty() {
        return Err(ctx.error("STRUC", None, "STRUC block contains no atoms"));
    }

    Ok((atoms, sites))
}

/// 解析 VECTR 块并把磁矩赋给对应位点
fn parse_vectr(
    ctx: &Context,
    block: &Block,
    sites: &HashMap<usize, usize>,
    atoms: &mut [Atom],
) -> Result<()> {
    let mut current: Option<[f64; 3]> = None;

    for (line_no, row) in &block.rows {
        let tokens: Vec<&str> = row.split_whitespace().collect();
        let index = tokens[0].parse::<usize>().map_err(|_| {
            ctx.error(
                "VECTR",
                Some(*line_no),
                format!("expected an integer index, found '{}'", tokens[0]),
            )
        })?;

        match current {
            None => {
                if index == 0 {
                    break;
                }
                if tokens.len() < 4 {
                    return Err(ctx.error("VECTR", Some(*line_no), "expected 'index x y z'"));
                }
                current = Some([
                    ctx.number("VECTR", *line_no, tokens[1])?,
                    ctx.number("VECTR", *line_no, tokens[2])?,
                    ctx.number("VECTR", *line_no, tokens[3])?,
                ]);
            }
            Some(vector) => {
                if index == 0 {
                    current = None;
                    continue;
                }
                let atom_idx = sites.get(&index).ok_or_else(|| {
                    ctx.error(
                        "VECTR",
                        Some(*line_no),
                        format!("vector refers to unknown site {}", index),
                    )
                })?;
                atoms[*atom_idx].moment = Some(vector);
            }
        }
    }

    Ok(())
}

/// 统计 SYMOP 块中的对称操作数目
fn count_symops(block: &Block) -> usize {
    block
        .rows
        .iter()
        .map(|(_, row)| row.split_whitespace().collect::<Vec<_>>())
        .take_while(|tokens| !tokens[0].starts_with("-1"))
        .filter(|tokens| tokens.len() >= 12 && tokens[..12].iter().all(|t| t.parse::<f64>().is_ok()))
        .count()
}
