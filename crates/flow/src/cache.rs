//! Caller-owned cache of the derived table.
//!
//! Repeated invocations within one process (e.g. one chart per month-end)
//! can reuse the table as long as the source files are unchanged. Purely a
//! performance optimization: rebuilding always yields identical results.

use s2f_core::{DerivedTable, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use crate::pipeline::{Pipeline, SourcePaths};

/// Identity of one source file at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    path: PathBuf,
    modified: SystemTime,
    len: u64,
}

impl SourceFingerprint {
    /// Capture a fingerprint; fails with `NotFound` for a missing path.
    pub fn capture(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let meta = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    market_cap: SourceFingerprint,
    stock: SourceFingerprint,
}

impl CacheKey {
    fn capture(sources: &SourcePaths) -> Result<Self> {
        Ok(Self {
            market_cap: SourceFingerprint::capture(&sources.market_cap)?,
            stock: SourceFingerprint::capture(&sources.stock)?,
        })
    }
}

/// Cache of the most recent derived table, keyed by source identity.
#[derive(Debug, Default)]
pub struct TableCache {
    entry: Option<(CacheKey, DerivedTable)>,
}

impl TableCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// Return the cached table if the sources are unchanged, otherwise
    /// rebuild through the pipeline and cache the result.
    pub fn get_or_build(
        &mut self,
        pipeline: &Pipeline,
        sources: &SourcePaths,
    ) -> Result<&DerivedTable> {
        let key = CacheKey::capture(sources)?;
        let fresh = matches!(&self.entry, Some((cached, _)) if *cached == key);
        if fresh {
            debug!("derived table cache hit");
        } else {
            let table = pipeline.build(sources)?;
            self.entry = Some((key, table));
        }
        match &self.entry {
            Some((_, table)) => Ok(table),
            None => Err(Error::data("cache entry missing after rebuild")),
        }
    }

    /// Drop the cached table.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Whether a table is currently cached.
    pub fn is_populated(&self) -> bool {
        self.entry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use s2f_core::PipelineConfig;
    use std::io::Write;

    fn write_sources(dir: &Path, days: usize) -> SourcePaths {
        let start = NaiveDate::from_ymd_opt(2021, 1, 5).unwrap();
        let stock_path = dir.join("stock.csv");
        let cap_path = dir.join("market-cap.csv");

        let mut stock = std::fs::File::create(&stock_path).unwrap();
        writeln!(stock, "Timestamp,Stock").unwrap();
        let mut cap = std::fs::File::create(&cap_path).unwrap();
        writeln!(cap, "Timestamp,Market Cap").unwrap();
        for i in 0..days {
            let date = start + Duration::days(i as i64);
            writeln!(stock, "{},{}", date, 100 + i).unwrap();
            writeln!(cap, "{},{}", date, 1000 * (i + 1)).unwrap();
        }
        SourcePaths::new(cap_path, stock_path)
    }

    #[test]
    fn test_cache_reuses_until_sources_change() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 14);
        let pipeline = Pipeline::new(PipelineConfig::default());
        let mut cache = TableCache::new();

        let rows = cache.get_or_build(&pipeline, &sources).unwrap().len();
        assert!(cache.is_populated());
        assert_eq!(cache.get_or_build(&pipeline, &sources).unwrap().len(), rows);

        // Extending the sources changes the fingerprints and forces a
        // rebuild with more rows.
        let sources = write_sources(dir.path(), 28);
        let rebuilt = cache.get_or_build(&pipeline, &sources).unwrap().len();
        assert!(rebuilt > rows);
    }

    #[test]
    fn test_invalidate_clears_entry() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path(), 14);
        let pipeline = Pipeline::new(PipelineConfig::default());
        let mut cache = TableCache::new();

        cache.get_or_build(&pipeline, &sources).unwrap();
        cache.invalidate();
        assert!(!cache.is_populated());
    }

    #[test]
    fn test_missing_source_surfaces_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let sources = SourcePaths::new(dir.path().join("a.csv"), dir.path().join("b.csv"));
        let pipeline = Pipeline::new(PipelineConfig::default());
        let mut cache = TableCache::new();

        let result = cache.get_or_build(&pipeline, &sources);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
