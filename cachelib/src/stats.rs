use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};

/// Running counters for a simulation, in cache lines rather than bytes
///
/// Only [`Cache::access`](crate::cache::Cache::access) mutates these. `dirty_bytes` is the number
/// of lines currently dirty in the cache, `dirty_evictions` the number of dirty lines evicted;
/// [`Statistics::scale`] turns both into byte counts
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Statistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub dirty_bytes: u64,
    pub dirty_evictions: u64,
}

impl Statistics {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// A line became dirty while resident
    pub fn record_dirty(&mut self) {
        self.dirty_bytes += 1;
    }

    /// A valid line was replaced. A dirty victim leaves the resident dirty count and counts as a
    /// dirty eviction
    pub fn record_eviction(&mut self, dirty: bool) {
        self.evictions += 1;
        if dirty {
            debug_assert!(self.dirty_bytes > 0);
            self.dirty_bytes -= 1;
            self.dirty_evictions += 1;
        }
    }

    /// Number of accesses seen so far
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Converts the dirty line counts into bytes for a given block size
    ///
    /// ```
    /// use cachelib::stats::Statistics;
    /// let stats = Statistics { hits: 1, misses: 2, evictions: 1, dirty_bytes: 3, dirty_evictions: 1 };
    /// let summary = stats.scale(16);
    /// assert_eq!((summary.dirty_bytes, summary.dirty_evictions), (48, 16));
    /// ```
    pub fn scale(&self, block_size: u64) -> Summary {
        Summary {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            dirty_bytes: self.dirty_bytes.saturating_mul(block_size),
            dirty_evictions: self.dirty_evictions.saturating_mul(block_size),
        }
    }
}

/// The result of a simulation with dirty counts in bytes. Can be serialised to JSON, and displays
/// in the classic single line format
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Summary {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub dirty_bytes: u64,
    pub dirty_evictions: u64,
}

impl Summary {
    /// Writes the five counters, space separated, to a results file
    pub fn write_results(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(
            path,
            format!(
                "{} {} {} {} {}\n",
                self.hits, self.misses, self.evictions, self.dirty_bytes, self.dirty_evictions
            ),
        )
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits:{} misses:{} evictions:{} dirty_bytes_in_cache:{} dirty_bytes_evicted:{}",
            self.hits, self.misses, self.evictions, self.dirty_bytes, self.dirty_evictions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_eviction_moves_a_line_out_of_the_resident_count() {
        let mut stats = Statistics::default();
        stats.record_miss();
        stats.record_dirty();
        stats.record_eviction(false);
        assert_eq!((stats.evictions, stats.dirty_bytes, stats.dirty_evictions), (1, 1, 0));
        stats.record_eviction(true);
        stats.record_hit();
        assert_eq!(stats, Statistics { hits: 1, misses: 1, evictions: 2, dirty_bytes: 0, dirty_evictions: 1 });
    }
}
