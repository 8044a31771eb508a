use std::io::BufRead;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use crate::address::AddressDecoder;
use crate::cache::{AccessOutcome, Cache, CacheError};
use crate::config::CacheConfig;
use crate::stats::{Statistics, Summary};
use crate::trace::{TraceError, TraceReader, TraceRecord};

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("invalid trace: {0}")]
    Trace(#[from] TraceError),
}

/// The simulator decodes trace records, feeds them to the cache, and collects the results.
///
/// It supports calling simulate multiple times, the statistics and the time taken accumulate
/// across calls
#[derive(Debug)]
pub struct Simulator {
    config: CacheConfig,
    decoder: AddressDecoder,
    cache: Cache,
    stats: Statistics,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator with an empty cache for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: The cache geometry, usually from the command line or a JSON file
    ///
    /// returns: Result<Simulator, SimulatorError>
    pub fn new(config: &CacheConfig) -> Result<Self, SimulatorError> {
        let cache = Cache::new(config)?;
        debug!(?config, block_size = config.block_size(), "created simulator");
        Ok(Self {
            config: *config,
            decoder: AddressDecoder::new(config),
            cache,
            stats: Statistics::default(),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Simulates a single record. The access size is ignored, every access touches exactly one
    /// block
    pub fn step(&mut self, record: &TraceRecord) -> AccessOutcome {
        let decoded = self.decoder.decode(record.address);
        self.cache.access(record.operation, decoded.tag, decoded.set_index, &mut self.stats)
    }

    /// Simulates a whole trace and returns the summary so far
    ///
    /// Stops at the first malformed line; the accesses before it are kept in the statistics
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::config::CacheConfig;
    /// use cachelib::simulator::Simulator;
    /// let mut simulator = Simulator::new(&CacheConfig::new(0, 1, 0)).unwrap();
    /// let summary = simulator.simulate("L 0,1\nL 1,1\nL 0,1\n".as_bytes()).unwrap();
    /// assert_eq!((summary.hits, summary.misses, summary.evictions), (0, 3, 2));
    /// ```
    pub fn simulate<R: BufRead>(&mut self, reader: R) -> Result<Summary, SimulatorError> {
        self.simulate_with(reader, |_, _| {})
    }

    /// Like [`Simulator::simulate`], calling `observer` with every record and what it did to the
    /// cache
    pub fn simulate_with<R, F>(&mut self, reader: R, mut observer: F) -> Result<Summary, SimulatorError>
    where
        R: BufRead,
        F: FnMut(&TraceRecord, AccessOutcome),
    {
        let start = Instant::now();
        let before = self.stats.accesses();
        let mut result = Ok(());
        for record in TraceReader::new(reader) {
            match record {
                Ok(record) => {
                    let outcome = self.step(&record);
                    observer(&record, outcome);
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.simulation_time += start.elapsed();
        let simulated = self.stats.accesses() - before;
        if simulated == 0 {
            warn!("trace contained no accesses");
        }
        debug!(simulated, stats = ?self.stats, "simulated trace");
        result?;
        Ok(self.summary())
    }

    /// The raw counters, with dirty counts in lines
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// The counters with dirty counts scaled to bytes
    pub fn summary(&self) -> Summary {
        self.stats.scale(self.config.block_size())
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }
}
