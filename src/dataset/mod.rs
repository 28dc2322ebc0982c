//! Synthetic dataset generation for order-dependency discovery benchmarks.
//!
//! Columns are generated with a chosen ordering character (noisy-monotonic,
//! constant, range-partitioned, uniform-random) and a single row permutation
//! is applied identically across all columns before writing, so the planted
//! cross-column structure survives the shuffle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Error;

pub const DEFAULT_MIN_VALUE: i64 = -(1 << 30);
pub const DEFAULT_MAX_VALUE: i64 = 1 << 30;

/// Bound on the per-step increment of a noisy-monotonic walk.
const MAX_ORDERED_STEP: i64 = 100;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Statistical ordering character of a generated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Ordered,
    Constant,
    RangePartitioned,
    Random,
}

/// One generated column: `values.len()` equals the requested length and is
/// never mutated after the row permutation has been applied.
#[derive(Debug, Clone)]
pub struct GeneratedColumn {
    pub kind: ColumnKind,
    pub values: Vec<i64>,
}

/// A set of equal-length columns sharing one row permutation.
#[derive(Debug, Clone)]
pub struct DatasetMatrix {
    columns: Vec<GeneratedColumn>,
}

impl DatasetMatrix {
    pub fn new(columns: Vec<GeneratedColumn>) -> Self {
        debug_assert!(columns.windows(2).all(|w| w[0].values.len() == w[1].values.len()));
        Self { columns }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[GeneratedColumn] {
        &self.columns
    }

    /// Values of row `index` across all columns, in column order.
    pub fn row(&self, index: usize) -> Vec<i64> {
        self.columns.iter().map(|c| c.values[index]).collect()
    }
}

/// Shape and value bounds of a dataset to generate.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub rows: usize,
    pub columns: usize,
    pub min_value: i64,
    pub max_value: i64,
    pub add_header: bool,
    pub separator: String,
}

impl DatasetSpec {
    /// Inverted bounds are swapped rather than rejected; zero rows or columns
    /// indicate a malformed run configuration and fail immediately.
    pub fn new(
        rows: usize,
        columns: usize,
        min_value: i64,
        max_value: i64,
        add_header: bool,
        separator: impl Into<String>,
    ) -> Result<Self, Error> {
        if rows == 0 {
            return Err(Error::InvalidSpec("number of rows must be greater than zero".into()));
        }
        if columns == 0 {
            return Err(Error::InvalidSpec("number of columns must be greater than zero".into()));
        }

        let (min_value, max_value) = if max_value < min_value {
            (max_value, min_value)
        } else {
            (min_value, max_value)
        };

        Ok(Self {
            rows,
            columns,
            min_value,
            max_value,
            add_header,
            separator: separator.into(),
        })
    }
}

/// Column and dataset generator. Carries its own RNG so test fixtures can be
/// made deterministic by passing an explicit seed.
pub struct DatasetGenerator {
    spec: DatasetSpec,
    rng: StdRng,
}

impl DatasetGenerator {
    pub fn new(spec: DatasetSpec, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { spec, rng }
    }

    pub fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn start_value(&mut self) -> i64 {
        self.rng.gen_range(self.spec.min_value..=self.spec.max_value)
    }

    fn next_value(&mut self, prev: i64, step_sign: i64) -> i64 {
        let next = prev + self.rng.gen_range(0..=MAX_ORDERED_STEP) * step_sign;
        next.clamp(self.spec.min_value, self.spec.max_value)
    }

    /// Noisy but directionally-biased walk: each value is the previous one
    /// plus a bounded random step with a sign fixed for the whole column,
    /// clamped into the spec bounds. Deliberately not a strict sort.
    pub fn generate_ordered(&mut self, length: usize) -> Result<GeneratedColumn, Error> {
        if length == 0 {
            return Err(Error::EmptyColumn);
        }

        let start = self.start_value();
        let step_sign = if start % 2 == 0 { 1 } else { -1 };

        let mut values = Vec::with_capacity(length);
        values.push(start);

        let mut prev = start;
        for _ in 1..length {
            let curr = self.next_value(prev, step_sign);
            values.push(curr);
            prev = curr;
        }

        Ok(GeneratedColumn { kind: ColumnKind::Ordered, values })
    }

    /// One value repeated; builds the equivalence classes that order
    /// dependencies are mined over.
    pub fn generate_constant(&mut self, length: usize) -> Result<GeneratedColumn, Error> {
        if length == 0 {
            return Err(Error::EmptyColumn);
        }

        let value = self.start_value();
        Ok(GeneratedColumn { kind: ColumnKind::Constant, values: vec![value; length] })
    }

    /// `partitions` equal-size constant runs (integer division), with any
    /// remainder rows absorbed into one additional constant run so the total
    /// length is exactly preserved.
    pub fn generate_range_partitioned(
        &mut self,
        length: usize,
        partitions: usize,
    ) -> Result<GeneratedColumn, Error> {
        if length == 0 {
            return Err(Error::EmptyColumn);
        }
        if partitions > length {
            return Err(Error::TooManyPartitions { partitions, length });
        }

        let run_size = length / partitions;
        let mut values = Vec::with_capacity(length);

        for _ in 0..partitions {
            let run = self.generate_constant(run_size)?;
            values.extend_from_slice(&run.values);
        }

        if values.len() != length {
            let run = self.generate_constant(length - values.len())?;
            values.extend_from_slice(&run.values);
        }

        Ok(GeneratedColumn { kind: ColumnKind::RangePartitioned, values })
    }

    pub fn generate_random(&mut self, length: usize) -> Result<GeneratedColumn, Error> {
        if length == 0 {
            return Err(Error::EmptyColumn);
        }

        let values = (0..length)
            .map(|_| self.rng.gen_range(self.spec.min_value..=self.spec.max_value))
            .collect();
        Ok(GeneratedColumn { kind: ColumnKind::Random, values })
    }

    /// Single-pass shuffle: for each row index draw a uniform swap partner
    /// and exchange the two rows in every column, so one shared permutation
    /// is applied to the whole matrix. Not a uniform-random permutation
    /// guarantee, but it keeps per-row cross-column correspondence intact.
    pub fn mix_rows(&mut self, matrix: &mut DatasetMatrix) {
        let rows = matrix.row_count();

        for i in 0..rows {
            let swap_index = self.rng.gen_range(0..rows);
            if swap_index == i {
                continue;
            }
            for column in &mut matrix.columns {
                column.values.swap(i, swap_index);
            }
        }
    }

    /// Number of planted (non-random) columns: a uniform draw in
    /// [1, columns] when unspecified, clamped to the column count otherwise.
    fn planted_column_count(&mut self, requested: Option<usize>) -> usize {
        match requested {
            None => self.rng.gen_range(1..=self.spec.columns),
            Some(n) => n.min(self.spec.columns),
        }
    }

    /// Matrix with `ordered_columns` noisy-monotonic columns and random
    /// columns for the remainder, row-mixed.
    pub fn build_ordered_matrix(
        &mut self,
        ordered_columns: Option<usize>,
    ) -> Result<DatasetMatrix, Error> {
        let planted = self.planted_column_count(ordered_columns);
        let rows = self.spec.rows;

        let mut columns = Vec::with_capacity(self.spec.columns);
        for _ in 0..planted {
            columns.push(self.generate_ordered(rows)?);
        }
        for _ in planted..self.spec.columns {
            columns.push(self.generate_random(rows)?);
        }

        let mut matrix = DatasetMatrix::new(columns);
        self.mix_rows(&mut matrix);
        Ok(matrix)
    }

    /// Matrix with `range_columns` range-partitioned columns (about 200 rows
    /// per partition, at least 2 partitions) and random columns for the
    /// remainder, row-mixed.
    pub fn build_range_matrix(
        &mut self,
        range_columns: Option<usize>,
    ) -> Result<DatasetMatrix, Error> {
        let planted = self.planted_column_count(range_columns);
        let rows = self.spec.rows;
        let partitions = (rows / 200).max(2);

        let mut columns = Vec::with_capacity(self.spec.columns);
        for _ in 0..planted {
            columns.push(self.generate_range_partitioned(rows, partitions)?);
        }
        for _ in planted..self.spec.columns {
            columns.push(self.generate_random(rows)?);
        }

        let mut matrix = DatasetMatrix::new(columns);
        self.mix_rows(&mut matrix);
        Ok(matrix)
    }

    /// Matrix of independent uniform draws; no planted structure, no mixing.
    pub fn build_chaotic_matrix(&mut self) -> Result<DatasetMatrix, Error> {
        let rows = self.spec.rows;
        let columns = (0..self.spec.columns)
            .map(|_| self.generate_random(rows))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DatasetMatrix::new(columns))
    }

    /// Serializes the matrix to `output`: optional `c1..cN` header, one
    /// delimiter-joined line per row, platform line terminator.
    pub fn write_matrix(&self, matrix: &DatasetMatrix, output: &Path) -> Result<(), Error> {
        let file = File::create(output)?;
        let mut writer = BufWriter::new(file);
        let separator = self.spec.separator.as_str();

        if self.spec.add_header {
            let header: Vec<String> = (1..=self.spec.columns).map(|i| format!("c{}", i)).collect();
            write!(writer, "{}{}", header.join(separator), LINE_ENDING)?;
        }

        for i in 0..matrix.row_count() {
            let row: Vec<String> = matrix.row(i).iter().map(|v| v.to_string()).collect();
            write!(writer, "{}{}", row.join(separator), LINE_ENDING)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Shape and on-disk size of an existing dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub name: String,
    pub columns: usize,
    pub rows: usize,
    pub size_bytes: u64,
}

impl DatasetInfo {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Reads a dataset back and reports its name, column count (separator count
/// in the first line plus one), row count and file size. An empty file
/// reports zero rows and columns.
pub fn analyze_dataset(path: &Path, separator: &str, has_header: bool) -> Result<DatasetInfo, Error> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;
    let size_bytes = std::fs::metadata(path)?.len();

    let mut lines = content.lines();
    let Some(first_line) = lines.next() else {
        return Ok(DatasetInfo { name, columns: 0, rows: 0, size_bytes });
    };

    let columns = first_line.matches(separator).count() + 1;
    let data_lines = lines.count() + 1;
    let rows = if has_header { data_lines - 1 } else { data_lines };

    Ok(DatasetInfo { name, columns, rows, size_bytes })
}
