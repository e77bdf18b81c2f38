//! Calendar resampling onto a fixed-period grid.
//!
//! Buckets irregular observations into weekly or monthly periods,
//! aggregates each bucket with a configurable policy, and linearly
//! interpolates unoccupied interior grid points.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use s2f_core::{AggregationPolicy, Error, ResamplePeriod, ResampledSeries, Result, TimeSeries};
use std::collections::BTreeMap;
use tracing::debug;

/// Resamples time series onto a fixed-period calendar grid.
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    period: ResamplePeriod,
}

/// Observations accumulated for one grid label.
#[derive(Debug, Clone, Default)]
struct Bucket {
    sum: f64,
    count: u32,
    last: f64,
}

impl Bucket {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.last = value;
    }

    fn aggregate(&self, policy: AggregationPolicy) -> f64 {
        match policy {
            AggregationPolicy::Mean => self.sum / self.count as f64,
            AggregationPolicy::Last => self.last,
        }
    }
}

impl Resampler {
    /// Create a resampler for the given period specification.
    pub fn new(period: ResamplePeriod) -> Self {
        Self { period }
    }

    /// The period this resampler buckets into.
    #[inline]
    pub fn period(&self) -> ResamplePeriod {
        self.period
    }

    /// Grid label of the period a date falls within.
    ///
    /// Weekly periods are labeled by the first anchor weekday on or after
    /// the date; monthly periods by the month's last day. A label always
    /// maps to itself, which makes resampling idempotent.
    pub fn label(&self, date: NaiveDate) -> NaiveDate {
        match self.period {
            ResamplePeriod::Weekly { anchor } => weekday_on_or_after(date, anchor),
            ResamplePeriod::Monthly => month_end(date),
        }
    }

    /// Nominal length in days of the period ending at `label`: 7 for
    /// weekly grids, the month length for monthly grids.
    pub fn period_days(&self, label: NaiveDate) -> f64 {
        match self.period {
            ResamplePeriod::Weekly { .. } => 7.0,
            ResamplePeriod::Monthly => month_end(label).day() as f64,
        }
    }

    /// Label of the period immediately after `label`.
    fn next_label(&self, label: NaiveDate) -> NaiveDate {
        match self.period {
            ResamplePeriod::Weekly { .. } => label + Duration::days(7),
            ResamplePeriod::Monthly => month_end(label + Duration::days(1)),
        }
    }

    /// Resample a series onto the grid.
    ///
    /// Every grid point between the first and last occupied label gets a
    /// value; gaps are filled by linear interpolation between the nearest
    /// occupied grid points.
    pub fn resample(
        &self,
        series: &TimeSeries,
        policy: AggregationPolicy,
    ) -> Result<ResampledSeries> {
        if series.is_empty() {
            return Err(Error::insufficient_data(format!(
                "series {:?} has no observations to resample",
                series.name()
            )));
        }

        let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        for (date, value) in series.dates().iter().zip(series.values()) {
            buckets.entry(self.label(*date)).or_default().add(*value);
        }

        let first = buckets
            .keys()
            .next()
            .copied()
            .ok_or_else(|| Error::insufficient_data("no occupied buckets"))?;
        let last = buckets
            .keys()
            .next_back()
            .copied()
            .ok_or_else(|| Error::insufficient_data("no occupied buckets"))?;

        let mut grid = Vec::new();
        let mut raw: Vec<Option<f64>> = Vec::new();
        let mut label = first;
        loop {
            grid.push(label);
            raw.push(buckets.get(&label).map(|b| b.aggregate(policy)));
            if label >= last {
                break;
            }
            label = self.next_label(label);
        }

        let values = interpolate_gaps(&raw);
        let last_observation = series
            .last_date()
            .ok_or_else(|| Error::insufficient_data("series has no last date"))?;
        let days_remaining = (last - last_observation).num_days();

        debug!(
            series = %series.name(),
            grid_points = grid.len(),
            days_remaining,
            "resampled onto calendar grid"
        );
        ResampledSeries::new(series.name(), grid, values, days_remaining)
    }
}

/// Fill interior `None` runs by linear interpolation between the nearest
/// occupied entries. The first and last entries are occupied by construction.
fn interpolate_gaps(raw: &[Option<f64>]) -> Vec<f64> {
    let mut out = vec![0.0; raw.len()];
    let mut prev_known: Option<usize> = None;

    for (k, entry) in raw.iter().enumerate() {
        if let Some(value) = entry {
            out[k] = *value;
            if let Some(p) = prev_known {
                let gap = k - p;
                if gap > 1 {
                    let start = out[p];
                    let step = (value - start) / gap as f64;
                    for j in 1..gap {
                        out[p + j] = start + step * j as f64;
                    }
                }
            }
            prev_known = Some(k);
        }
    }
    out
}

/// First `anchor` weekday on or after `date`.
fn weekday_on_or_after(date: NaiveDate, anchor: Weekday) -> NaiveDate {
    let ahead = (anchor.num_days_from_monday() as i64 + 7
        - date.weekday().num_days_from_monday() as i64)
        % 7;
    date + Duration::days(ahead)
}

/// Last day of the month containing `date`.
fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first_of_next) => first_of_next - Duration::days(1),
        // Unreachable for in-range dates.
        None => date,
    }
}
