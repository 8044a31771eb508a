use std::io::BufRead;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
pub use crate::cache::Operation;

lazy_static! {
    // " L 7ff000388,4", with an optional 0x prefix and optional leading whitespace
    static ref TRACE_LINE: Regex =
        Regex::new(r"^\s*(?P<op>[A-Za-z])\s+(?:0[xX])?(?P<address>[0-9a-fA-F]+)\s*,\s*(?P<size>[0-9]+)\s*$").unwrap();
}

/// A single decoded line of a trace file
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TraceRecord {
    pub operation: Operation,
    pub address: u64,
    /// Size of the access in bytes. Parsed for completeness, the cache works at block granularity
    pub size: u32,
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("line {line}: couldn't parse {text:?}, expected \"<L|S> <hex address>,<size>\"")]
    Malformed { line: usize, text: String },
    #[error("line {line}: unknown operation '{op}', expected L or S")]
    UnknownOperation { line: usize, op: String },
    #[error("line {line}: {field} {text:?} is out of range")]
    OutOfRange { line: usize, field: &'static str, text: String },
    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),
}

impl Operation {
    /// The single letter used for the operation in trace files
    pub fn as_char(&self) -> char {
        match self {
            Operation::Load => 'L',
            Operation::Store => 'S',
        }
    }
}

/// Parses one line of a trace, returning `None` for blank lines
///
/// `line_number` is only used for error messages
///
/// # Examples
///
/// ```
/// use cachelib::trace::{parse_line, Operation, TraceRecord};
/// let record = parse_line(" S 7ff000388,8", 1).unwrap();
/// assert_eq!(record, Some(TraceRecord { operation: Operation::Store, address: 0x7ff000388, size: 8 }));
/// assert_eq!(parse_line("   ", 2).unwrap(), None);
/// ```
pub fn parse_line(text: &str, line_number: usize) -> Result<Option<TraceRecord>, TraceError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let captures = TRACE_LINE.captures(text).ok_or_else(|| TraceError::Malformed {
        line: line_number,
        text: text.to_string(),
    })?;
    let operation = match &captures["op"] {
        "L" => Operation::Load,
        "S" => Operation::Store,
        op => {
            return Err(TraceError::UnknownOperation {
                line: line_number,
                op: op.to_string(),
            })
        }
    };
    let address = u64::from_str_radix(&captures["address"], 16).map_err(|_| TraceError::OutOfRange {
        line: line_number,
        field: "address",
        text: captures["address"].to_string(),
    })?;
    let size = captures["size"].parse::<u32>().map_err(|_| TraceError::OutOfRange {
        line: line_number,
        field: "size",
        text: captures["size"].to_string(),
    })?;
    Ok(Some(TraceRecord { operation, address, size }))
}

/// Iterates over the records of a trace, skipping blank lines
///
/// Reads are strictly sequential, so this works well on top of a memory mapped file
pub struct TraceReader<R: BufRead> {
    reader: R,
    buffer: String,
    line_number: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_number += 1;
            match parse_line(&self.buffer, self.line_number) {
                Ok(None) => continue,
                Ok(Some(record)) => return Some(Ok(record)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_and_padded_lines() {
        let record = parse_line("\tL 0x10 , 4\r\n", 3).unwrap().unwrap();
        assert_eq!(record, TraceRecord { operation: Operation::Load, address: 0x10, size: 4 });
        let record = parse_line("S ffffffffffffffff,1", 1).unwrap().unwrap();
        assert_eq!(record.address, u64::MAX);
    }

    #[test]
    fn reports_bad_lines_with_their_number() {
        assert!(matches!(parse_line("M 10,1", 7), Err(TraceError::UnknownOperation { line: 7, .. })));
        assert!(matches!(parse_line("L 10", 2), Err(TraceError::Malformed { line: 2, .. })));
        assert!(matches!(parse_line("L zz,1", 2), Err(TraceError::Malformed { .. })));
        assert!(matches!(
            parse_line("L 1ffffffffffffffff,1", 4),
            Err(TraceError::OutOfRange { field: "address", .. })
        ));
    }

    #[test]
    fn reader_skips_blank_lines_and_counts_from_one() {
        let input = "L 0,1\n\n  \nS 8,4\nbogus\n";
        let mut reader = TraceReader::new(input.as_bytes());
        assert_eq!(reader.next().unwrap().unwrap().address, 0);
        assert_eq!(reader.next().unwrap().unwrap().operation, Operation::Store);
        assert!(matches!(reader.next(), Some(Err(TraceError::Malformed { line: 5, .. }))));
        assert!(reader.next().is_none());
    }
}
