//! # CacheLib
//!
//! Cachelib simulates a set-associative, write-back, write-allocate cache with least recently used
//! replacement against a trace of loads and stores
//!
//! It counts hits, misses and evictions, and keeps track of how many bytes are dirty in the cache
//! and how many dirty bytes were evicted. The simulation is sequential and deterministic: the same
//! geometry and trace always give the same result
//!
//! ```
//! use cachelib::config::CacheConfig;
//! use cachelib::simulator::Simulator;
//! let mut simulator = Simulator::new(&CacheConfig::new(0, 1, 0)).unwrap();
//! let summary = simulator.simulate("S 0,1\nS 0,1\n".as_bytes()).unwrap();
//! assert_eq!(summary.to_string(), "hits:1 misses:1 evictions:0 dirty_bytes_in_cache:1 dirty_bytes_evicted:0");
//! ```

/// Splits addresses into tag, set index and block offset
pub mod address;

/// Contains the cache itself: sets of lines, LRU replacement and dirty line bookkeeping
pub mod cache;

/// Contains the cache geometry, which can also be read from JSON
pub mod config;

/// Opening trace files for reading
pub mod io;

/// Contains the simulator used to run a trace against a cache
pub mod simulator;

/// Hit, miss, eviction and dirty counters, and the summary reported at the end of a run
pub mod stats;

/// Parsing of the `<op> <address>,<size>` trace format
pub mod trace;


/// Contains utilities for running tests and benchmarks.
pub mod util;
