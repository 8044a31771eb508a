use std::collections::TryReserveError;
use thiserror::Error;
use tracing::{debug, trace};
use crate::config::{CacheConfig, ConfigError};
use crate::stats::Statistics;

/// The kind of memory access, which decides the dirty bit policy
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operation {
    /// A read. Never dirties a line
    Load,
    /// A write. Always leaves the accessed line dirty (write-back, write-allocate)
    Store,
}

/// What happened to the cache on a single access
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessOutcome {
    Hit,
    /// A miss filled an empty line
    Miss,
    /// A miss in a full set replaced the least recently used line
    MissEviction {
        /// Whether the evicted line had to be written back
        dirty: bool,
    },
}

impl AccessOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, AccessOutcome::Hit)
    }

    pub fn is_eviction(&self) -> bool {
        matches!(self, AccessOutcome::MissEviction { .. })
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum CacheError {
    #[error("invalid cache geometry: {0}")]
    Config(#[from] ConfigError),
    #[error("couldn't allocate {lines} cache lines")]
    Allocation { lines: usize },
}

/// One simulated cache block. Only the metadata is modelled, the data itself is never stored
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Line {
    valid: bool,
    dirty: bool,
    tag: u64,
    // Larger is more recent. Every line starts at 0
    recency: u64,
}

impl Line {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn recency(&self) -> u64 {
        self.recency
    }
}

/// A fixed number of lines sharing a set index
#[derive(Debug, Clone)]
pub struct CacheSet {
    lines: Box<[Line]>,
}

impl CacheSet {
    fn new(lines_per_set: usize) -> Result<Self, TryReserveError> {
        let mut lines = Vec::new();
        lines.try_reserve_exact(lines_per_set)?;
        lines.resize(lines_per_set, Line::default());
        Ok(Self {
            lines: lines.into_boxed_slice(),
        })
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Finds the eviction candidate and the newest recency stamp in one pass
    ///
    /// The candidate is the first line holding the smallest stamp, so among lines that have never
    /// been touched (all stamped 0) the lowest index goes first
    ///
    /// returns: (victim index, max recency)
    fn scan_recency(&self) -> (usize, u64) {
        let mut victim = 0;
        let mut min_recency = u64::MAX;
        let mut max_recency = 0;
        for (index, line) in self.lines.iter().enumerate() {
            if line.recency < min_recency {
                min_recency = line.recency;
                victim = index;
            }
            max_recency = max_recency.max(line.recency);
        }
        (victim, max_recency)
    }

    fn access(&mut self, operation: Operation, tag: u64, stats: &mut Statistics) -> AccessOutcome {
        let (victim, max_recency) = self.scan_recency();
        let stamp = max_recency + 1;
        let is_store = operation == Operation::Store;

        if let Some(line) = self.lines.iter_mut().find(|line| line.valid && line.tag == tag) {
            stats.record_hit();
            line.recency = stamp;
            if is_store && !line.dirty {
                line.dirty = true;
                stats.record_dirty();
            }
            return AccessOutcome::Hit;
        }

        stats.record_miss();
        if let Some(line) = self.lines.iter_mut().find(|line| !line.valid) {
            *line = Line {
                valid: true,
                dirty: is_store,
                tag,
                recency: stamp,
            };
            if is_store {
                stats.record_dirty();
            }
            return AccessOutcome::Miss;
        }

        // Every line is valid, replace the least recently used one
        let line = &mut self.lines[victim];
        let evicted_dirty = line.dirty;
        trace!(evicted_tag = line.tag, tag, evicted_dirty, "evicting line {victim}");
        stats.record_eviction(evicted_dirty);
        line.tag = tag;
        line.recency = stamp;
        line.dirty = is_store;
        if is_store {
            stats.record_dirty();
        }
        AccessOutcome::MissEviction { dirty: evicted_dirty }
    }
}

/// A set-associative, write-back, write-allocate cache with least recently used replacement
///
/// The cache owns its sets and each set owns its lines, nothing else holds on to either. All state
/// changes happen through [`Cache::access`], which records what happened into a [`Statistics`]
/// owned by the caller
///
/// Recency is tracked per set: each touched line is stamped one past the newest stamp in its set,
/// which keeps the stamps of a set strictly ordered once the lines have been used
#[derive(Debug, Clone)]
pub struct Cache {
    sets: Vec<CacheSet>,
    lines_per_set: usize,
}

impl Cache {
    /// Builds an empty cache, every line invalid and clean
    ///
    /// Geometries above [`MAX_LINES`](crate::config::MAX_LINES) are rejected by validation, and
    /// the remaining allocation is fallible, so an impossibly large cache is reported before any
    /// of the trace is simulated
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Self::with_geometry(config.num_sets()?, config.lines_per_set)
    }

    fn with_geometry(num_sets: usize, lines_per_set: usize) -> Result<Self, CacheError> {
        let allocation_error = |_: TryReserveError| CacheError::Allocation {
            lines: num_sets.checked_mul(lines_per_set).unwrap_or(usize::MAX),
        };
        let mut sets = Vec::new();
        sets.try_reserve_exact(num_sets).map_err(allocation_error)?;
        for _ in 0..num_sets {
            sets.push(CacheSet::new(lines_per_set).map_err(allocation_error)?);
        }
        debug!(num_sets, lines_per_set, "built cache");
        Ok(Self { sets, lines_per_set })
    }

    /// Simulates a single access to the line holding `tag` in set `set_index`
    ///
    /// On a hit the line becomes the most recently used. On a miss the first invalid line is
    /// filled, or if the set is full the least recently used line is evicted. A store always
    /// leaves the line dirty, a load never dirties it. Evicting a dirty line counts it as a dirty
    /// eviction and removes it from the resident dirty count
    ///
    /// `set_index` is assumed to come from an [`AddressDecoder`](crate::address::AddressDecoder)
    /// built from the same configuration, and will panic if out of range
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::cache::{AccessOutcome, Cache, Operation};
    /// use cachelib::config::CacheConfig;
    /// use cachelib::stats::Statistics;
    /// let mut cache = Cache::new(&CacheConfig::new(0, 1, 0)).unwrap();
    /// let mut stats = Statistics::default();
    /// assert_eq!(cache.access(Operation::Store, 0, 0, &mut stats), AccessOutcome::Miss);
    /// assert_eq!(cache.access(Operation::Load, 1, 0, &mut stats), AccessOutcome::MissEviction { dirty: true });
    /// assert_eq!(stats.dirty_evictions, 1);
    /// ```
    pub fn access(&mut self, operation: Operation, tag: u64, set_index: usize, stats: &mut Statistics) -> AccessOutcome {
        self.sets[set_index].access(operation, tag, stats)
    }

    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// The set at `index`, panics if out of range
    pub fn set(&self, index: usize) -> &CacheSet {
        &self.sets[index]
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn lines_per_set(&self) -> usize {
        self.lines_per_set
    }

    fn lines(&self) -> impl Iterator<Item = &Line> {
        self.sets.iter().flat_map(|set| set.lines.iter())
    }

    /// Number of lines currently marked dirty, which always matches `Statistics::dirty_bytes`
    pub fn dirty_line_count(&self) -> usize {
        self.lines().filter(|line| line.dirty).count()
    }

    /// Number of lines holding a block. Useful for analysing cache occupancy or debugging
    pub fn valid_line_count(&self) -> usize {
        self.lines().filter(|line| line.valid).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_allocation_reports_the_whole_cache() {
        // Too many bytes for a single set, rejected without touching the allocator
        let lines_per_set = usize::MAX / 2;
        let err = Cache::with_geometry(2, lines_per_set).unwrap_err();
        assert_eq!(err, CacheError::Allocation { lines: lines_per_set * 2 });
        assert_eq!(
            Cache::with_geometry(4, lines_per_set).unwrap_err(),
            CacheError::Allocation { lines: usize::MAX }
        );
    }

    #[test]
    fn set_accessor_matches_sets() {
        let mut cache = Cache::new(&CacheConfig::new(2, 2, 0)).unwrap();
        let mut stats = Statistics::default();
        cache.access(Operation::Store, 9, 3, &mut stats);
        assert_eq!(cache.set(3).lines()[0].tag(), 9);
        assert!(cache.set(3).lines()[0].is_dirty());
        assert!(!cache.set(2).lines()[0].is_valid());
        assert_eq!(cache.set(1).lines(), cache.sets()[1].lines());
    }
}
