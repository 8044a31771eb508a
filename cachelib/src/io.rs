use std::fs::File;
use std::io::BufRead;

/// Opens a trace for sequential, line by line reading
pub fn get_reader(file: File) -> Result<impl BufRead, String> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        // Trace lines are short, read a few filesystem blocks at a time
        const BUFFER_SIZE: usize = 16 * 4096;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file on unix systems, the trace is only ever read front to back
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // An empty file can't be mapped, but it is still a valid (empty) trace
        if file.metadata().map_err(|e| format!("Couldn't read the trace file metadata: {e}"))?.len() == 0 {
            return Ok(Cursor::new(TraceBytes::Empty));
        }
        // Safety: the map is read only, a trace being truncated underneath us is outside what we support
        unsafe {
            let m = Mmap::map(&file).map_err(|e| format!("Couldn't memory map the file: {e}"))?;
            m.advise(Advice::Sequential).map_err(|e| format!("Failed to provide access advice to the OS, {e}"))?;
            Ok(Cursor::new(TraceBytes::Mapped(m)))
        }
    }
}

#[cfg(unix)]
enum TraceBytes {
    Empty,
    Mapped(memmap2::Mmap),
}

#[cfg(unix)]
impl AsRef<[u8]> for TraceBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            TraceBytes::Empty => &[],
            TraceBytes::Mapped(m) => &m[..],
        }
    }
}
