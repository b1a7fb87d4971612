use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;
use tracing::info;

use crate::dataset::{field, Dataset};
use crate::error::Result;

/// Label used for the null bucket under [`NullPolicy::Keep`].
pub const MISSING_LABEL: &str = "(missing)";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullPolicy {
    #[default]
    Drop,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Per-category counts for one column, highest count first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationResult {
    pub column: String,
    pub entries: Vec<CategoryCount>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn get(&self, category: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.count)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|e| (e.category.as_str(), e.count))
    }
}

/// Dense co-occurrence counts; `cells[r][c]` pairs `rows[r]` with `columns[c]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab {
    pub row_column: String,
    pub col_column: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn get(&self, row: &str, column: &str) -> Option<u64> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|v| v == column)?;
        Some(self.cells[r][c])
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Counts for one column category across every row category.
    pub fn column_series(&self, c: usize) -> Vec<u64> {
        self.cells.iter().map(|row| row[c]).collect()
    }
}

pub fn row_count(dataset: &Dataset) -> usize {
    dataset.len()
}

pub fn distinct_count(dataset: &Dataset, column: &str) -> Result<usize> {
    let distinct: HashSet<&str> = dataset.values(column)?.flatten().collect();
    Ok(distinct.len())
}

pub fn frequency_count(
    dataset: &Dataset,
    column: &str,
    top_n: Option<usize>,
) -> Result<AggregationResult> {
    frequency_count_with(dataset, column, top_n, NullPolicy::Drop)
}

pub fn frequency_count_with(
    dataset: &Dataset,
    column: &str,
    top_n: Option<usize>,
    nulls: NullPolicy,
) -> Result<AggregationResult> {
    let start_time = Instant::now();
    let idx = dataset.column_index(column)?;

    // value -> (count, first row index)
    let batch_counts: Vec<HashMap<&str, (u64, usize)>> = dataset
        .rows()
        .par_iter()
        .enumerate()
        .fold(HashMap::new, |mut acc, (row_idx, row)| {
            let key = match (field(row, idx), nulls) {
                (Some(value), _) => value,
                (None, NullPolicy::Keep) => MISSING_LABEL,
                (None, NullPolicy::Drop) => return acc,
            };
            acc.entry(key).or_insert((0, row_idx)).0 += 1;
            acc
        })
        .collect();

    let mut merged: HashMap<&str, (u64, usize)> = HashMap::new();
    for batch in batch_counts {
        for (key, (count, first)) in batch {
            let entry = merged.entry(key).or_insert((0, first));
            entry.0 += count;
            entry.1 = entry.1.min(first);
        }
    }

    let mut sorted: Vec<(&str, u64, usize)> = merged
        .into_iter()
        .map(|(key, (count, first))| (key, count, first))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    if let Some(n) = top_n {
        sorted.truncate(n);
    }

    let result = AggregationResult {
        column: column.to_string(),
        entries: sorted
            .into_iter()
            .map(|(category, count, _)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect(),
    };

    info!(
        action = "complete",
        component = "frequency_count",
        column,
        top_n = ?top_n,
        category_count = result.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Frequency count completed"
    );
    Ok(result)
}

pub fn cross_tabulate(dataset: &Dataset, row_column: &str, col_column: &str) -> Result<CrossTab> {
    let start_time = Instant::now();
    let r_idx = dataset.column_index(row_column)?;
    let c_idx = dataset.column_index(col_column)?;

    let batch_counts: Vec<HashMap<(&str, &str), u64>> = dataset
        .rows()
        .par_iter()
        .fold(HashMap::new, |mut acc, row| {
            if let (Some(r), Some(c)) = (field(row, r_idx), field(row, c_idx)) {
                *acc.entry((r, c)).or_insert(0) += 1;
            }
            acc
        })
        .collect();

    let mut pair_counts: HashMap<(&str, &str), u64> = HashMap::new();
    for batch in batch_counts {
        for (pair, count) in batch {
            *pair_counts.entry(pair).or_insert(0) += count;
        }
    }

    let rows: BTreeSet<&str> = pair_counts.keys().map(|(r, _)| *r).collect();
    let columns: BTreeSet<&str> = pair_counts.keys().map(|(_, c)| *c).collect();

    let cells: Vec<Vec<u64>> = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| pair_counts.get(&(*r, *c)).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    let table = CrossTab {
        row_column: row_column.to_string(),
        col_column: col_column.to_string(),
        rows: rows.into_iter().map(str::to_string).collect(),
        columns: columns.into_iter().map(str::to_string).collect(),
        cells,
    };

    info!(
        action = "complete",
        component = "cross_tabulate",
        row_column,
        col_column,
        row_categories = table.rows.len(),
        col_categories = table.columns.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Cross tabulation completed"
    );
    Ok(table)
}
