//! Multi-block ASCII outputs: one blank-line separated block per saved time.
//!
//! Each block starts with a comment carrying the step and time, followed by
//! unordered rows of a rectangular grid. The grid shape is recovered from how
//! often each sort key repeats its smallest value.

use super::scalar::strip_comment;
use crate::domain::{PaddiError, PaddiResult};
use crate::parameters::{HeaderLayout, ParameterSet};
use crate::schema::{Schema, parse_float};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};
use regex::Regex;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const PROFILE_COMMENT_PATTERN: &str = "#Step=(.*),Time=(.*)";

const PROFILE_COLUMNS: [&str; 17] = [
    "z1", "u1", "u2", "u3", "vort1", "vort2", "vort3", "Temp", "Chem", "u1_avg", "u2_avg",
    "u3_avg", "vort1_avg", "vort2_avg", "vort3_avg", "Temp_avg", "Chem_avg",
];

/// Column layout of vertical profile files (`ZPROF*`).
pub fn default_profile_format() -> Schema {
    Schema::floats(&PROFILE_COLUMNS)
}

/// How to read a multi-block file. Defaults to the profile layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockReaderConfig {
    pub format: Schema,
    pub sort_keys: Vec<String>,
    pub comment_pattern: String,
    pub block_limit: Option<usize>,
    pub header: Option<HeaderLayout>,
}

impl Default for BlockReaderConfig {
    fn default() -> Self {
        Self {
            format: default_profile_format(),
            sort_keys: vec!["z1".to_string()],
            comment_pattern: PROFILE_COMMENT_PATTERN.to_string(),
            block_limit: None,
            header: Some(HeaderLayout::default()),
        }
    }
}

impl BlockReaderConfig {
    pub fn with_format(mut self, format: Schema) -> Self {
        self.format = format;
        self
    }

    pub fn with_sort_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_comment_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.comment_pattern = pattern.into();
        self
    }

    /// Keep only the non-empty block with this global 0-based index.
    pub fn with_block_limit(mut self, block_limit: Option<usize>) -> Self {
        self.block_limit = block_limit;
        self
    }

    /// `None` for files without a parameter header.
    pub fn with_header(mut self, header: Option<HeaderLayout>) -> Self {
        self.header = header;
        self
    }

    fn compile_pattern(&self) -> PaddiResult<Regex> {
        let pattern = Regex::new(&self.comment_pattern).map_err(|error| {
            PaddiError::invalid_schema(format!(
                "comment pattern '{}' does not compile: {error}",
                self.comment_pattern
            ))
        })?;
        if pattern.captures_len() != 3 {
            return Err(PaddiError::invalid_schema(format!(
                "comment pattern '{}' must capture exactly step and time",
                self.comment_pattern
            )));
        }
        Ok(pattern)
    }

    fn key_positions(&self) -> PaddiResult<Vec<usize>> {
        self.sort_keys
            .iter()
            .map(|key| {
                self.format.position(key).ok_or_else(|| {
                    PaddiError::invalid_schema(format!("sort key '{key}' is not a column"))
                })
            })
            .collect()
    }
}

/// Snapshots of an N-dimensional grid stacked along a leading time axis.
#[derive(Debug, Clone)]
pub struct BlockSeries {
    format: Schema,
    shape: Vec<usize>,
    fields: Vec<ArrayD<f64>>,
    steps: Vec<i64>,
    times: Vec<f64>,
    parameters: Option<ParameterSet>,
}

struct RawBlock {
    lines: Vec<(usize, String)>,
}

struct ShapedBlock {
    line: usize,
    shape: Vec<usize>,
    rows: Vec<Vec<f64>>,
    step: i64,
    time: f64,
}

impl BlockSeries {
    pub fn load<P: AsRef<Path>>(files: &[P], config: &BlockReaderConfig) -> PaddiResult<Self> {
        let pattern = config.compile_pattern()?;
        let keys = config.key_positions()?;
        let order = sort_order(&keys, config.format.len());

        let parameters = match (&config.header, files.first()) {
            (Some(layout), Some(first)) => Some(layout.read(first)?),
            _ => None,
        };

        let mut blocks: Vec<ShapedBlock> = Vec::new();
        let mut next_index = 0;
        'files: for path in files {
            let path = path.as_ref();
            for raw in read_blocks(path)? {
                let rows = parse_rows(path, &raw, &config.format)?;
                if rows.is_empty() {
                    continue;
                }

                let index = next_index;
                next_index += 1;
                if config.block_limit.is_some_and(|limit| limit != index) {
                    continue;
                }

                let block = shape_block(path, &raw, rows, &keys, &order, &pattern)?;
                if let Some(first) = blocks.first().filter(|first| first.shape != block.shape) {
                    return Err(PaddiError::format(
                        path,
                        block.line,
                        format!(
                            "block shape {:?} differs from first block shape {:?}",
                            block.shape, first.shape
                        ),
                    ));
                }
                tracing::debug!(
                    path = %path.display(),
                    line = block.line,
                    step = block.step,
                    shape = ?block.shape,
                    "read block"
                );
                blocks.push(block);

                if config.block_limit.is_some() {
                    break 'files;
                }
            }
        }

        Self::assemble(config.format.clone(), blocks, parameters)
    }

    fn assemble(
        format: Schema,
        blocks: Vec<ShapedBlock>,
        parameters: Option<ParameterSet>,
    ) -> PaddiResult<Self> {
        let shape = blocks
            .first()
            .map(|block| block.shape.clone())
            .unwrap_or_default();
        let mut full_shape = vec![blocks.len()];
        full_shape.extend(&shape);
        let cells = full_shape.iter().product::<usize>();

        let mut columns = (0..format.len())
            .map(|_| Vec::with_capacity(cells))
            .collect::<Vec<Vec<f64>>>();
        let mut steps = Vec::with_capacity(blocks.len());
        let mut times = Vec::with_capacity(blocks.len());
        for block in blocks {
            for row in &block.rows {
                for (column, value) in columns.iter_mut().zip(row) {
                    column.push(*value);
                }
            }
            steps.push(block.step);
            times.push(block.time);
        }

        let fields = columns
            .into_iter()
            .map(|column| {
                ArrayD::from_shape_vec(IxDyn(&full_shape), column)
                    .map_err(|error| PaddiError::invalid_schema(error.to_string()))
            })
            .collect::<PaddiResult<Vec<_>>>()?;

        Ok(Self {
            format,
            shape,
            fields,
            steps,
            times,
            parameters,
        })
    }

    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Spatial shape shared by every snapshot.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn format(&self) -> &Schema {
        &self.format
    }

    /// All snapshots of one column, shaped `[time, ...spatial]`.
    pub fn field(&self, name: &str) -> PaddiResult<ArrayViewD<'_, f64>> {
        self.format
            .position(name)
            .map(|index| self.fields[index].view())
            .ok_or_else(|| PaddiError::KeyNotFound {
                name: name.to_string(),
            })
    }

    pub fn snapshot(&self, name: &str, t: usize) -> PaddiResult<ArrayViewD<'_, f64>> {
        let field = self.field(name)?;
        if t >= self.len() {
            return Err(PaddiError::KeyNotFound {
                name: format!("{name}[{t}]"),
            });
        }
        Ok(field.index_axis_move(Axis(0), t))
    }

    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn parameters(&self) -> Option<&ParameterSet> {
        self.parameters.as_ref()
    }
}

fn read_blocks(path: &Path) -> PaddiResult<Vec<RawBlock>> {
    let file = File::open(path).map_err(|source| PaddiError::io(path, source))?;
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| PaddiError::io(path, source))?;
        if line.trim().is_empty() {
            blocks.push(RawBlock {
                lines: std::mem::take(&mut current),
            });
        } else {
            current.push((index + 1, line));
        }
    }
    blocks.push(RawBlock { lines: current });
    Ok(blocks)
}

fn parse_rows(path: &Path, raw: &RawBlock, format: &Schema) -> PaddiResult<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (line_number, line) in &raw.lines {
        let content = strip_comment(line);
        if content.trim().is_empty() {
            continue;
        }
        let record = format
            .parse_record(content)
            .map_err(|reason| PaddiError::format(path, *line_number, reason))?;
        let row = record
            .iter()
            .map(|value| {
                value.as_f64().ok_or_else(|| {
                    PaddiError::format(path, *line_number, format!("non-numeric value {value}"))
                })
            })
            .collect::<PaddiResult<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Column priority for ordering rows: sort keys last to first, then the
/// remaining columns in schema order.
fn sort_order(keys: &[usize], width: usize) -> Vec<usize> {
    let mut order = keys.iter().rev().copied().collect::<Vec<_>>();
    order.dedup();
    order.extend((0..width).filter(|column| !keys.contains(column)));
    order
}

fn compare_rows(left: &[f64], right: &[f64], order: &[usize]) -> Ordering {
    order
        .iter()
        .map(|column| left[*column].total_cmp(&right[*column]))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Infer the grid shape of a non-empty block, order its rows and decode
/// its comment line.
fn shape_block(
    path: &Path,
    raw: &RawBlock,
    mut rows: Vec<Vec<f64>>,
    keys: &[usize],
    order: &[usize],
    pattern: &Regex,
) -> PaddiResult<ShapedBlock> {
    let (first_line, comment_line) = match raw.lines.first() {
        Some((line, text)) => (*line, text.as_str()),
        None => return Err(PaddiError::format(path, 0, "empty block")),
    };
    let total = rows.len();
    let mut shape = Vec::with_capacity(keys.len());
    for key in keys {
        let minimum = rows
            .iter()
            .map(|row| row[*key])
            .min_by(|left, right| left.total_cmp(right))
            .unwrap_or_default();
        let run = rows.iter().filter(|row| row[*key] == minimum).count();
        if run == total {
            shape.push(1);
            continue;
        }
        if run == 0 || total % run != 0 {
            return Err(PaddiError::format(
                path,
                first_line,
                format!("{total} rows do not split into runs of {run} along a sort key"),
            ));
        }
        shape.push(total / run);
    }
    shape.reverse();

    let cells = shape.iter().product::<usize>();
    if cells != total {
        return Err(PaddiError::format(
            path,
            first_line,
            format!("block of {total} rows is not a rectangular {shape:?} grid"),
        ));
    }

    rows.sort_by(|left, right| compare_rows(left, right, order));

    let comment = comment_line.replace(' ', "");
    let captures = pattern.captures(&comment).ok_or_else(|| {
        PaddiError::format(
            path,
            first_line,
            format!("comment '{comment}' does not match '{}'", pattern.as_str()),
        )
    })?;
    let step_text = captures.get(1).map_or("", |found| found.as_str());
    let time_text = captures.get(2).map_or("", |found| found.as_str());
    let step = step_text.trim().parse::<i64>().map_err(|_| {
        PaddiError::format(path, first_line, format!("step '{step_text}' is not an integer"))
    })?;
    let time = parse_float(time_text).ok_or_else(|| {
        PaddiError::format(path, first_line, format!("time '{time_text}' is not a number"))
    })?;

    Ok(ShapedBlock {
        line: first_line,
        shape,
        rows,
        step,
        time,
    })
}
