//! Windowed sequence access
//!
//! A `SeqWindow` is a repositionable view over one named sequence. The indel
//! shifter probes bases just outside the current window, so the trait keeps
//! fetching explicit and lets implementations clamp to the real sequence
//! bounds.

use crate::error::VarmapError;
use crate::provider::SequenceSource;
use crate::Result;

/// A movable window onto a named sequence. `start`/`end` are 0-based
/// half-open coordinates on the underlying sequence.
pub trait SeqWindow {
    /// Name of the sequence currently in the window
    fn seq_name(&self) -> &str;
    /// Window start on the underlying sequence
    fn start(&self) -> u32;
    /// Window end (exclusive)
    fn end(&self) -> u32;
    /// Bases currently held, uppercase
    fn seq(&self) -> &[u8];

    /// Reposition the window. Implementations clamp the range to the
    /// sequence bounds; requesting a region wholly outside the sequence is
    /// an error.
    fn fetch(&mut self, name: &str, start: u32, end: u32) -> Result<()>;

    /// Grow the window if needed so that `[start, end)` is covered,
    /// as far as the sequence bounds allow.
    fn ensure(&mut self, start: u32, end: u32) -> Result<()> {
        if start >= self.start() && end <= self.end() {
            return Ok(());
        }
        let new_start = self.start().min(start);
        let new_end = self.end().max(end);
        let name = self.seq_name().to_string();
        self.fetch(&name, new_start, new_end)
    }

    /// Copy `len` bases starting at `start`, growing the window if needed.
    fn copy(&mut self, start: u32, len: u32) -> Result<Vec<u8>> {
        self.ensure(start, start + len)?;
        if start < self.start() || start + len > self.end() {
            return Err(VarmapError::SequenceNotAvailable {
                name: self.seq_name().to_string(),
                start,
                end: start + len,
            });
        }
        let off = (start - self.start()) as usize;
        Ok(self.seq()[off..off + len as usize].to_vec())
    }

    /// Single base at `pos`, or None past the sequence bounds.
    fn base_at(&mut self, pos: u32) -> Option<u8> {
        if self.ensure(pos, pos + 1).is_err() {
            return None;
        }
        if pos < self.start() || pos >= self.end() {
            return None;
        }
        Some(self.seq()[(pos - self.start()) as usize])
    }
}

/// A window over a sequence held entirely in memory.
pub struct MemSeqWindow {
    name: String,
    full: Vec<u8>,
    start: u32,
    end: u32,
}

impl MemSeqWindow {
    /// Wrap a whole in-memory sequence; the initial window covers all of it.
    pub fn new(name: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        let mut full: Vec<u8> = seq.into();
        full.make_ascii_uppercase();
        let end = full.len() as u32;
        Self {
            name: name.into(),
            full,
            start: 0,
            end,
        }
    }

    /// Length of the underlying sequence
    pub fn full_len(&self) -> u32 {
        self.full.len() as u32
    }
}

impl SeqWindow for MemSeqWindow {
    fn seq_name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> u32 {
        self.start
    }

    fn end(&self) -> u32 {
        self.end
    }

    fn seq(&self) -> &[u8] {
        &self.full[self.start as usize..self.end as usize]
    }

    fn fetch(&mut self, name: &str, start: u32, end: u32) -> Result<()> {
        if name != self.name {
            return Err(VarmapError::ReferenceNotFound {
                id: name.to_string(),
            });
        }
        let len = self.full.len() as u32;
        let start = start.min(len);
        let end = end.min(len);
        if start >= end && len > 0 && start >= len {
            return Err(VarmapError::SequenceNotAvailable {
                name: name.to_string(),
                start,
                end,
            });
        }
        self.start = start;
        self.end = end.max(start);
        Ok(())
    }
}

/// A window that fetches through a [`SequenceSource`] collaborator.
pub struct SourceSeqWindow<'a, S: SequenceSource + ?Sized> {
    source: &'a S,
    name: String,
    buf: Vec<u8>,
    start: u32,
    end: u32,
}

impl<'a, S: SequenceSource + ?Sized> SourceSeqWindow<'a, S> {
    /// Open a window on `name` covering `[start, end)` (clamped).
    pub fn new(source: &'a S, name: &str, start: u32, end: u32) -> Result<Self> {
        let mut win = Self {
            source,
            name: String::new(),
            buf: Vec::new(),
            start: 0,
            end: 0,
        };
        win.fetch(name, start, end)?;
        Ok(win)
    }
}

impl<S: SequenceSource + ?Sized> SeqWindow for SourceSeqWindow<'_, S> {
    fn seq_name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> u32 {
        self.start
    }

    fn end(&self) -> u32 {
        self.end
    }

    fn seq(&self) -> &[u8] {
        &self.buf
    }

    fn fetch(&mut self, name: &str, start: u32, end: u32) -> Result<()> {
        let len = self
            .source
            .sequence_len(name)
            .ok_or_else(|| VarmapError::ReferenceNotFound {
                id: name.to_string(),
            })?;
        let start = start.min(len);
        let end = end.min(len).max(start);
        let mut buf = self.source.fetch(name, start, end)?;
        buf.make_ascii_uppercase();
        self.name = name.to_string();
        self.buf = buf;
        self.start = start;
        self.end = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_window_copy() {
        let mut win = MemSeqWindow::new("tx", b"acgtacgt".to_vec());
        assert_eq!(win.copy(0, 4).unwrap(), b"ACGT");
        assert_eq!(win.copy(4, 4).unwrap(), b"ACGT");
        assert!(win.copy(6, 4).is_err());
    }

    #[test]
    fn test_mem_window_base_at() {
        let mut win = MemSeqWindow::new("tx", b"ACGT".to_vec());
        assert_eq!(win.base_at(0), Some(b'A'));
        assert_eq!(win.base_at(3), Some(b'T'));
        assert_eq!(win.base_at(4), None);
    }

    #[test]
    fn test_mem_window_refetch() {
        let mut win = MemSeqWindow::new("tx", b"ACGTACGT".to_vec());
        win.fetch("tx", 2, 6).unwrap();
        assert_eq!(win.seq(), b"GTAC");
        // ensure grows back out
        assert_eq!(win.copy(0, 2).unwrap(), b"AC");
    }

    #[test]
    fn test_mem_window_wrong_name() {
        let mut win = MemSeqWindow::new("tx", b"ACGT".to_vec());
        assert!(win.fetch("other", 0, 4).is_err());
    }

    #[test]
    fn test_fetch_clamps() {
        let mut win = MemSeqWindow::new("tx", b"ACGT".to_vec());
        win.fetch("tx", 2, 100).unwrap();
        assert_eq!(win.end(), 4);
        assert_eq!(win.seq(), b"GT");
    }
}
