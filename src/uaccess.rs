//! Buffers supplied by the caller of a read or write. Copies through them may fault, in which
//! case the device operation fails without side effects.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bad address in caller buffer")]
pub struct Fault;

/// Destination of a read.
pub trait UserWriter {
    /// Number of bytes that can still be written.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies all of `data` out to the caller. `data` must fit in [`UserWriter::len`].
    fn write_slice(&mut self, data: &[u8]) -> Result<(), Fault>;
}

/// Source of a write.
pub trait UserReader {
    /// Number of bytes left to be read.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills all of `out` from the caller's buffer.
    fn read_slice(&mut self, out: &mut [u8]) -> Result<(), Fault>;
}

pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn written(&self) -> usize {
        self.pos
    }
}

impl UserWriter for SliceWriter<'_> {
    fn len(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn write_slice(&mut self, data: &[u8]) -> Result<(), Fault> {
        let dst = self
            .buf
            .get_mut(self.pos..self.pos + data.len())
            .ok_or(Fault)?;
        dst.copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }
}

pub struct SliceReader<'a> {
    buf: &'a [u8],
}

impl<'a> SliceReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl UserReader for SliceReader<'_> {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn read_slice(&mut self, out: &mut [u8]) -> Result<(), Fault> {
        if out.len() > self.buf.len() {
            return Err(Fault);
        }
        let (head, rest) = self.buf.split_at(out.len());
        out.copy_from_slice(head);
        self.buf = rest;
        Ok(())
    }
}
