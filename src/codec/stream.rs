//! Primitive codec: little-endian reads and writes with a rolling checksum.
//!
//! Every byte that passes through a reader or writer updates an Adler-32
//! accumulator while checksumming is enabled. The section framer relies on
//! this to validate payload integrity without a second pass.

use adler32::Adler32;
use byteorder::{ByteOrder, LittleEndian};
use glam::Mat4;

use super::types::{ColorRgb, ColorRgba, ObjectIndex};
use crate::util::{Error, Result};

/// Reader over an in-memory byte buffer.
pub struct M3gReader<'a> {
    buf: &'a [u8],
    pos: usize,
    sum: Adler32,
    summing: bool,
}

impl<'a> M3gReader<'a> {
    /// Create a reader with checksumming enabled.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            sum: Adler32::new(),
            summing: true,
        }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left in the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once the whole buffer has been consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Enable or disable checksum accumulation.
    pub fn set_checksum_enabled(&mut self, enabled: bool) {
        self.summing = enabled;
    }

    /// Restart the checksum accumulator.
    pub fn reset_checksum(&mut self) {
        self.sum.reset();
    }

    /// Checksum of every byte read while accumulation was enabled.
    pub fn checksum(&self) -> u32 {
        self.sum.finish()
    }

    /// Consume exactly `n` bytes.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::UnexpectedEndOfStream);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        if self.summing {
            self.sum.update(out);
        }
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.bytes(1)?[0] as i8)
    }

    /// Read a byte as a boolean; any nonzero value is true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.bytes(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.bytes(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.bytes(4)?))
    }

    /// Read a NUL-terminated UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::UnexpectedEndOfStream)?;
        let bytes = self.bytes(len + 1)?;
        Ok(String::from_utf8(bytes[..len].to_vec())?)
    }

    pub fn read_rgb(&mut self) -> Result<ColorRgb> {
        let b = self.bytes(3)?;
        Ok(ColorRgb::new(b[0], b[1], b[2]))
    }

    pub fn read_rgba(&mut self) -> Result<ColorRgba> {
        let b = self.bytes(4)?;
        Ok(ColorRgba::new(b[0], b[1], b[2], b[3]))
    }

    /// Read a 4x4 matrix stored as 16 floats in row-major order.
    pub fn read_matrix(&mut self) -> Result<Mat4> {
        let mut rows = [0.0f32; 16];
        LittleEndian::read_f32_into(self.bytes(64)?, &mut rows);
        // glam is column-major; the wire layout is row-major.
        Ok(Mat4::from_cols_array(&rows).transpose())
    }

    pub fn read_index(&mut self) -> Result<ObjectIndex> {
        Ok(ObjectIndex(self.read_u32()?))
    }

    /// Read a u32 element count for an array whose elements occupy at least
    /// `min_elem_size` bytes each. Counts that cannot fit in the remaining
    /// input are rejected before any allocation happens.
    pub fn read_array_count(&mut self, min_elem_size: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_elem_size) > self.remaining() {
            return Err(Error::UnexpectedEndOfStream);
        }
        Ok(count)
    }

    /// Bulk-read `count` signed 16-bit values.
    pub fn read_i16_values(&mut self, count: usize) -> Result<Vec<i16>> {
        let mut out = vec![0i16; count];
        LittleEndian::read_i16_into(self.bytes(count * 2)?, &mut out);
        Ok(out)
    }

    /// Bulk-read `count` signed 8-bit values.
    pub fn read_i8_values(&mut self, count: usize) -> Result<Vec<i8>> {
        Ok(self.bytes(count)?.iter().map(|&b| b as i8).collect())
    }
}

/// Writer into an owned byte buffer.
#[derive(Default)]
pub struct M3gWriter {
    buf: Vec<u8>,
    sum: Adler32,
    summing: bool,
}

impl M3gWriter {
    /// Create a writer with checksumming enabled.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            sum: Adler32::new(),
            summing: true,
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Enable or disable checksum accumulation.
    pub fn set_checksum_enabled(&mut self, enabled: bool) {
        self.summing = enabled;
    }

    /// Restart the checksum accumulator.
    pub fn reset_checksum(&mut self) {
        self.sum.reset();
    }

    /// Checksum of every byte written while accumulation was enabled.
    pub fn checksum(&self) -> u32 {
        self.sum.finish()
    }

    /// Take the accumulated bytes out of the writer.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Append raw bytes.
    pub fn put(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        if self.summing {
            self.sum.update(data);
        }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.put(&[v as u8]);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, v);
        self.put(&b);
    }

    pub fn write_i16(&mut self, v: i16) {
        let mut b = [0u8; 2];
        LittleEndian::write_i16(&mut b, v);
        self.put(&b);
    }

    pub fn write_u32(&mut self, v: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, v);
        self.put(&b);
    }

    pub fn write_i32(&mut self, v: i32) {
        let mut b = [0u8; 4];
        LittleEndian::write_i32(&mut b, v);
        self.put(&b);
    }

    pub fn write_f32(&mut self, v: f32) {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, v);
        self.put(&b);
    }

    /// Write a NUL-terminated UTF-8 string. Interior NULs are rejected.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        if s.as_bytes().contains(&0) {
            return Err(Error::invalid("string contains interior NUL"));
        }
        self.put(s.as_bytes());
        self.write_u8(0);
        Ok(())
    }

    pub fn write_rgb(&mut self, c: ColorRgb) {
        self.put(&[c.r, c.g, c.b]);
    }

    pub fn write_rgba(&mut self, c: ColorRgba) {
        self.put(&[c.r, c.g, c.b, c.a]);
    }

    /// Write a 4x4 matrix as 16 floats in row-major order.
    pub fn write_matrix(&mut self, m: &Mat4) {
        let rows = m.transpose().to_cols_array();
        let mut b = [0u8; 64];
        LittleEndian::write_f32_into(&rows, &mut b);
        self.put(&b);
    }

    pub fn write_index(&mut self, idx: ObjectIndex) {
        self.write_u32(idx.0);
    }

    /// Bulk-write signed 16-bit values.
    pub fn write_i16_values(&mut self, values: &[i16]) {
        let mut b = vec![0u8; values.len() * 2];
        LittleEndian::write_i16_into(values, &mut b);
        self.put(&b);
    }

    /// Bulk-write signed 8-bit values.
    pub fn write_i8_values(&mut self, values: &[i8]) {
        let bytes: Vec<u8> = values.iter().map(|&v| v as u8).collect();
        self.put(&bytes);
    }
}
