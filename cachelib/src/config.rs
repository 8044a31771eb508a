use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the simulated address, in bits
pub const ADDRESS_BITS: u32 = u64::BITS;

/// Largest number of lines a simulated cache may have, 2^28
pub const MAX_LINES: usize = 1 << 28;

/// The geometry of a single set-associative cache
///
/// Can be read from JSON, using either the long field names or the classic single letter flags:
///
/// ```
/// use cachelib::config::CacheConfig;
/// let config: CacheConfig = serde_json::from_str(r#"{"s": 4, "E": 2, "b": 4}"#).unwrap();
/// assert_eq!(config, CacheConfig::new(4, 2, 4));
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Number of set index bits, the cache has 2^s sets
    #[serde(alias = "s")]
    pub set_bits: u32,
    /// Number of lines in each set (associativity)
    #[serde(alias = "E")]
    pub lines_per_set: usize,
    /// Number of block offset bits, each line holds 2^b bytes
    #[serde(alias = "b")]
    pub block_bits: u32,
}

/// Reasons a cache geometry can't be simulated
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("the number of lines per set (E) must be at least 1")]
    NoLines,
    #[error("set bits ({set_bits}) plus block bits ({block_bits}) exceed the 64 bit address")]
    AddressTooWide { set_bits: u32, block_bits: u32 },
    #[error("2^{0} sets can't be addressed on this platform")]
    TooManySets(u32),
    #[error("{num_sets} sets of {lines_per_set} lines can't be addressed on this platform")]
    TooManyLines { num_sets: usize, lines_per_set: usize },
    #[error("{lines} lines is more than the {max} a simulated cache may have")]
    TooLarge { lines: usize, max: usize },
}

impl CacheConfig {
    pub fn new(set_bits: u32, lines_per_set: usize, block_bits: u32) -> Self {
        Self {
            set_bits,
            lines_per_set,
            block_bits,
        }
    }

    /// Checks the geometry can be built, so the cache itself can assume `S >= 1` and `E >= 1`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lines_per_set == 0 {
            return Err(ConfigError::NoLines);
        }
        // b == 64 would leave a block size which doesn't fit in a u64
        let field_bits = self.set_bits as u64 + self.block_bits as u64;
        if field_bits > ADDRESS_BITS as u64 || self.block_bits >= ADDRESS_BITS {
            return Err(ConfigError::AddressTooWide {
                set_bits: self.set_bits,
                block_bits: self.block_bits,
            });
        }
        let lines = self.total_lines()?;
        if lines > MAX_LINES {
            return Err(ConfigError::TooLarge { lines, max: MAX_LINES });
        }
        Ok(())
    }

    /// The number of sets, 2^s
    pub fn num_sets(&self) -> Result<usize, ConfigError> {
        1usize
            .checked_shl(self.set_bits)
            .ok_or(ConfigError::TooManySets(self.set_bits))
    }

    /// The total number of lines, S * E
    pub fn total_lines(&self) -> Result<usize, ConfigError> {
        let num_sets = self.num_sets()?;
        num_sets
            .checked_mul(self.lines_per_set)
            .ok_or(ConfigError::TooManyLines {
                num_sets,
                lines_per_set: self.lines_per_set,
            })
    }

    /// The block size in bytes, 2^b. Only meaningful for a validated configuration
    pub fn block_size(&self) -> u64 {
        1u64.checked_shl(self.block_bits).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_sets() {
        assert_eq!(CacheConfig::new(2, 0, 2).validate(), Err(ConfigError::NoLines));
    }

    #[test]
    fn rejects_fields_wider_than_the_address() {
        assert_eq!(CacheConfig::new(24, 4, 36).validate(), Ok(()));
        assert_eq!(
            CacheConfig::new(32, 1, 33).validate(),
            Err(ConfigError::AddressTooWide { set_bits: 32, block_bits: 33 })
        );
        assert!(matches!(
            CacheConfig::new(0, 1, 64).validate(),
            Err(ConfigError::AddressTooWide { .. })
        ));
    }

    #[test]
    fn rejects_unaddressable_caches() {
        assert!(matches!(
            CacheConfig::new(usize::BITS, 1, 0).validate(),
            Err(ConfigError::TooManySets(_))
        ));
        assert!(matches!(
            CacheConfig::new(usize::BITS - 1, 4, 0).validate(),
            Err(ConfigError::TooManyLines { .. })
        ));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn rejects_caches_too_large_to_simulate() {
        assert_eq!(
            CacheConfig::new(32, 1, 0).validate(),
            Err(ConfigError::TooLarge { lines: 1 << 32, max: MAX_LINES })
        );
        assert_eq!(
            CacheConfig::new(20, 512, 6).validate(),
            Err(ConfigError::TooLarge { lines: 1 << 29, max: MAX_LINES })
        );
        assert_eq!(CacheConfig::new(20, 256, 6).validate(), Ok(()));
    }

    #[test]
    fn geometry_helpers() {
        let config = CacheConfig::new(4, 2, 5);
        assert_eq!(config.num_sets(), Ok(16));
        assert_eq!(config.total_lines(), Ok(32));
        assert_eq!(config.block_size(), 32);
        assert_eq!(CacheConfig::new(0, 1, 0).num_sets(), Ok(1));
    }

    #[test]
    fn reads_long_field_names() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"set_bits": 1, "lines_per_set": 8, "block_bits": 6}"#).unwrap();
        assert_eq!(config, CacheConfig::new(1, 8, 6));
    }
}
