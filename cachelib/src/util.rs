use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use crate::config::CacheConfig;

/// Directory of the golden traces shipped with the library
pub const TRACE_FILES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/traces");
/// Directory of the expected results for the golden traces
pub const EXPECTED_OUTPUTS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/traces/expected");

/// A trace, the geometry to run it with, and the file holding the expected summary
#[derive(Debug)]
pub struct TestCasePaths {
    pub config: CacheConfig,
    pub trace: PathBuf,
    pub output: PathBuf,
}

/// Collects every expected output named `<trace>-s<S>-E<E>-b<B>.json`, sorted by file name
pub fn get_configs() -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    get_configs_in(Path::new(TRACE_FILES_PATH), Path::new(EXPECTED_OUTPUTS_PATH))
}

/// As [`get_configs`], for arbitrary trace and expected output directories
pub fn get_configs_in(trace_dir: &Path, output_dir: &Path) -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let output_pattern = Regex::new(r"^(?P<trace>[0-9a-zA-Z_]+)-s(?P<s>[0-9]+)-E(?P<e>[0-9]+)-b(?P<b>[0-9]+)\.json$")?;
    let mut files = fs::read_dir(output_dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter_map(|name| name.into_string().ok())
        .filter(|name| output_pattern.is_match(name))
        .collect::<Vec<_>>();
    files.sort();
    let mut out = Vec::new();
    for file_name in files {
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name")?;
        let config = CacheConfig::new(tokens["s"].parse()?, tokens["e"].parse()?, tokens["b"].parse()?);
        out.push(TestCasePaths {
            config,
            trace: trace_dir.join(format!("{}.trace", &tokens["trace"])),
            output: output_dir.join(&file_name),
        })
    }
    Ok(out)
}
