//! Inner-join alignment of resampled series onto one calendar index.

use chrono::NaiveDate;
use s2f_core::{Error, ResampledSeries, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Result of aligning several series: the common index plus one value
/// column per input, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedColumns {
    /// Calendar grid points present in every input.
    pub index: Vec<NaiveDate>,
    /// One value column per input series.
    pub columns: Vec<Vec<f64>>,
}

/// Inner-join N resampled series on their calendar grids.
///
/// Rows missing from any input are dropped entirely, never null-filled.
/// Fails with `EmptyIntersection` when no grid point is shared by all
/// inputs.
pub fn align(inputs: &[&ResampledSeries]) -> Result<AlignedColumns> {
    let first = inputs.first().ok_or(Error::EmptyIntersection)?;

    let mut index: Vec<NaiveDate> = first.grid().to_vec();
    for series in &inputs[1..] {
        let dates: HashSet<NaiveDate> = series.grid().iter().copied().collect();
        index.retain(|d| dates.contains(d));
    }
    if index.is_empty() {
        return Err(Error::EmptyIntersection);
    }

    let mut columns = Vec::with_capacity(inputs.len());
    for series in inputs {
        let by_date: HashMap<NaiveDate, f64> = series
            .grid()
            .iter()
            .copied()
            .zip(series.values().iter().copied())
            .collect();
        let mut column = Vec::with_capacity(index.len());
        for date in &index {
            let value = by_date.get(date).copied().ok_or_else(|| {
                Error::data(format!(
                    "series {:?}: aligned date {} missing",
                    series.name(),
                    date
                ))
            })?;
            column.push(value);
        }
        columns.push(column);
    }

    Ok(AlignedColumns { index, columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn make_resampled(name: &str, points: &[(NaiveDate, f64)]) -> ResampledSeries {
        let (grid, values) = points.iter().copied().unzip();
        ResampledSeries::new(name, grid, values, 0).unwrap()
    }

    #[test]
    fn test_identical_grids_pass_through() {
        let a = make_resampled("A", &[(d(2021, 1, 4), 1.0), (d(2021, 1, 11), 2.0)]);
        let b = make_resampled("B", &[(d(2021, 1, 4), 10.0), (d(2021, 1, 11), 20.0)]);

        let aligned = align(&[&a, &b]).unwrap();
        assert_eq!(aligned.index, vec![d(2021, 1, 4), d(2021, 1, 11)]);
        assert_eq!(aligned.columns[0], vec![1.0, 2.0]);
        assert_eq!(aligned.columns[1], vec![10.0, 20.0]);
    }

    #[test]
    fn test_inner_join_drops_unshared_rows() {
        let a = make_resampled(
            "A",
            &[
                (d(2021, 1, 4), 1.0),
                (d(2021, 1, 11), 2.0),
                (d(2021, 1, 18), 3.0),
            ],
        );
        let b = make_resampled("B", &[(d(2021, 1, 11), 20.0), (d(2021, 1, 18), 30.0)]);

        let aligned = align(&[&a, &b]).unwrap();

        // Row count bounded by the smallest input.
        assert!(aligned.index.len() <= a.len().min(b.len()));
        assert_eq!(aligned.index, vec![d(2021, 1, 11), d(2021, 1, 18)]);
        assert_eq!(aligned.columns[0], vec![2.0, 3.0]);
        assert_eq!(aligned.columns[1], vec![20.0, 30.0]);

        // Every output row exists in every input.
        for date in &aligned.index {
            assert!(a.grid().contains(date));
            assert!(b.grid().contains(date));
        }
    }

    #[test]
    fn test_disjoint_grids_fail() {
        let a = make_resampled("A", &[(d(2021, 1, 4), 1.0)]);
        let b = make_resampled("B", &[(d(2021, 1, 11), 2.0)]);

        let result = align(&[&a, &b]);
        assert!(matches!(result, Err(Error::EmptyIntersection)));
    }

    #[test]
    fn test_no_inputs_fail() {
        assert!(matches!(align(&[]), Err(Error::EmptyIntersection)));
    }
}
