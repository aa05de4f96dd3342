//! Bounded, position-tracking reads over an in-memory byte buffer.
//!
//! All three file formats are sequences of little-endian fixed-width fields,
//! raw byte blocks, and length-prefixed strings. [`Cursor`] is the single
//! primitive everything else is built on: it never reads past the end of the
//! buffer and reports the failing position instead.

use std::fmt;

/// A read failure without positional context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// Not enough bytes remained to satisfy the read
    Eof,
}

impl std::error::Error for ReadError {}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReadError::Eof => write!(f, "unexpected end of file"),
        }
    }
}

impl ReadError {
    #[inline]
    #[must_use]
    pub fn at(self, position: usize) -> CursorError {
        CursorError {
            position,
            kind: self,
        }
    }
}

/// A read failure annotated with the byte offset it occurred at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorError {
    position: usize,
    kind: ReadError,
}

impl CursorError {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn kind(&self) -> &ReadError {
        &self.kind
    }
}

impl std::error::Error for CursorError {}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ReadError::Eof => write!(f, "not enough data to read at {}", self.position),
        }
    }
}

/// A monotonically advancing reader over a byte slice.
///
/// Reads fail with a typed error on insufficient remaining bytes and do not
/// advance the position, so a failed read can double as a legitimate "format
/// ends here" signal (the map decoder's early-EOF path relies on this).
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    /// Starts a cursor at an absolute offset into the buffer.
    ///
    /// Used for the map format's trailer sections, which are located by
    /// arithmetic from the end of the file rather than by the forward pass.
    #[inline]
    pub fn at_offset(data: &'a [u8], offset: usize) -> Self {
        Cursor {
            data,
            pos: offset.min(data.len()),
        }
    }

    /// Current absolute offset into the buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The entire underlying buffer, independent of position
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        match self.data.get(self.pos..self.pos + N) {
            Some(head) => {
                let mut out = [0u8; N];
                out.copy_from_slice(head);
                self.pos += N;
                Ok(out)
            }
            None => Err(ReadError::Eof.at(self.pos)),
        }
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        self.take::<1>().map(|[x]| x)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        self.take::<2>().map(u16::from_le_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        self.take::<4>().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        self.take::<4>().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, CursorError> {
        self.take::<4>().map(f32::from_le_bytes)
    }

    /// Reads a fixed-size block, borrowing from the underlying buffer
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        match self.data.get(self.pos..self.pos + len) {
            Some(block) => {
                self.pos += len;
                Ok(block)
            }
            None => Err(ReadError::Eof.at(self.pos)),
        }
    }

    /// Reads a `u32` length prefix followed by that many raw bytes.
    ///
    /// The payload is not necessarily NUL-terminated text; it is decoded as
    /// UTF-8 on a best-effort basis. A bogus length larger than the remaining
    /// buffer fails before any allocation happens.
    pub fn read_var_string(&mut self) -> Result<String, CursorError> {
        let start = self.pos;
        let len = self.read_u32()? as usize;
        match self.read_bytes(len) {
            Ok(raw) => Ok(String::from_utf8_lossy(raw).into_owned()),
            Err(err) => {
                self.pos = start;
                Err(err)
            }
        }
    }

    /// Moves the position forward or backward by `delta` bytes
    pub fn seek_relative(&mut self, delta: i64) -> Result<(), CursorError> {
        let target = self.pos as i64 + delta;
        if target < 0 || target > self.data.len() as i64 {
            return Err(ReadError::Eof.at(self.pos));
        }
        self.pos = target as usize;
        Ok(())
    }
}
