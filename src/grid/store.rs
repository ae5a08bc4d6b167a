use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::LoadError;
use crate::grid::axes::GridAxes;
use crate::grid::polynomial::Polynomial;
use crate::predictor::Variable;

/// 係数列の「該当なし」表記
const NOT_APPLICABLE: &str = "NA";

/// direction, height, variable の3列 + 係数1列以上
const MIN_FIELDS: usize = 4;

/// 回帰テーブルの1行
#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub line: usize,
    pub direction: f64,
    pub height: f64,
    /// 外部テーブルの変数名（未検証）
    pub variable: String,
    pub polynomial: Polynomial,
}

impl GridRow {
    /// `direction, height, variableName, coeff0..coeffN` をパースする
    pub fn parse(line: usize, text: &str, delimiter: char) -> Result<Self, LoadError> {
        let fields: Vec<&str> = text.split(delimiter).map(str::trim).collect();
        if fields.len() < MIN_FIELDS {
            return Err(LoadError::MissingField {
                line,
                expected: MIN_FIELDS,
                got: fields.len(),
            });
        }

        let direction = parse_number(line, 1, fields[0])?;
        let height = parse_number(line, 2, fields[1])?;
        let variable = fields[2].to_string();

        let mut coefficients = Vec::with_capacity(fields.len() - 3);
        for (i, field) in fields[3..].iter().enumerate() {
            if field.is_empty() || *field == NOT_APPLICABLE {
                coefficients.push(None);
            } else {
                coefficients.push(Some(parse_number(line, i + 4, field)?));
            }
        }

        Ok(Self {
            line,
            direction,
            height,
            variable,
            polynomial: Polynomial::new(coefficients),
        })
    }
}

/// 1列目が数値でない行をヘッダとみなす（先頭行のみ）
pub(crate) fn is_header(text: &str, delimiter: char) -> bool {
    text.split(delimiter)
        .next()
        .map(|first| first.trim().eq_ignore_ascii_case("direction"))
        .unwrap_or(false)
}

/// 空行・コメント行・ヘッダ行を除いたデータ行を (行番号, 内容) で返す
pub(crate) fn data_lines(text: &str, delimiter: char) -> impl Iterator<Item = (usize, &str)> {
    let mut seen_data = false;
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(move |(_, l)| {
            if l.is_empty() || l.starts_with('#') {
                return false;
            }
            if !seen_data && is_header(l, delimiter) {
                seen_data = true;
                return false;
            }
            seen_data = true;
            true
        })
}

pub(crate) fn parse_number(line: usize, column: usize, field: &str) -> Result<f64, LoadError> {
    field.parse::<f64>().map_err(|_| LoadError::Parse {
        line,
        column,
        value: field.to_string(),
    })
}

/// (direction, height) のキー。f64 をビット列で比較する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey(u64, u64);

impl NodeKey {
    fn new(direction: f64, height: f64) -> Self {
        // -0.0 と 0.0 を同一視
        Self((direction + 0.0).to_bits(), (height + 0.0).to_bits())
    }
}

/// 1つの (方向, 高さ) 格子点。変数ごとに多項式を1つ持つ
#[derive(Debug, Clone, PartialEq)]
pub struct GridNode {
    pub direction: f64,
    pub height: f64,
    polynomials: HashMap<Variable, Polynomial>,
}

impl GridNode {
    pub fn new(direction: f64, height: f64) -> Self {
        Self {
            direction,
            height,
            polynomials: HashMap::new(),
        }
    }

    pub fn polynomial(&self, variable: Variable) -> Option<&Polynomial> {
        self.polynomials.get(&variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.polynomials.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.polynomials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polynomials.is_empty()
    }
}

/// 読み込み済みの回帰グリッド。構築後は不変
#[derive(Debug, Clone)]
pub struct GridStore {
    nodes: HashMap<NodeKey, GridNode>,
    axes: GridAxes,
}

impl GridStore {
    /// 行を (方向, 高さ) ごとに集約し、軸を導出する
    pub fn from_rows<I>(rows: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = GridRow>,
    {
        let mut nodes: HashMap<NodeKey, GridNode> = HashMap::new();
        let mut skipped = 0usize;

        for row in rows {
            let Some(variable) = Variable::from_name(&row.variable) else {
                warn!(
                    line = row.line,
                    variable = %row.variable,
                    "unknown variable name in grid table, row skipped"
                );
                skipped += 1;
                continue;
            };

            // 係数が全て NA の多項式は 0 を返してしまうので読み込み時に拒否する
            if row.polynomial.is_empty() {
                return Err(LoadError::EmptyPolynomial {
                    line: row.line,
                    variable,
                });
            }

            let node = nodes
                .entry(NodeKey::new(row.direction, row.height))
                .or_insert_with(|| GridNode::new(row.direction, row.height));

            match node.polynomials.entry(variable) {
                Entry::Occupied(_) => {
                    return Err(LoadError::DuplicateVariable {
                        line: row.line,
                        variable,
                        direction: row.direction,
                        height: row.height,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(row.polynomial);
                }
            }
        }

        let axes = GridAxes::derive(nodes.values().map(|n| (n.direction, n.height)))?;

        info!(
            nodes = nodes.len(),
            directions = axes.directions().len(),
            heights = axes.heights().len(),
            skipped,
            "regression grid loaded"
        );

        Ok(Self { nodes, axes })
    }

    /// 区切り文字付きテキストから構築する
    pub fn parse(text: &str, delimiter: char) -> Result<Self, LoadError> {
        let rows = data_lines(text, delimiter)
            .map(|(line, l)| GridRow::parse(line, l, delimiter))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }

    pub fn load<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, delimiter)
    }

    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    pub fn node(&self, direction: f64, height: f64) -> Option<&GridNode> {
        self.nodes.get(&NodeKey::new(direction, height))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GridNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
