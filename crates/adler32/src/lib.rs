//! Adler-32 rolling checksum.
//!
//! Original algorithm by Mark Adler, as specified in RFC 1950. This is a
//! Rust implementation aiming to match zlib's `adler32()` exactly, including
//! the deferred-modulo optimization.

/// Largest prime smaller than 2^16.
const MOD_ADLER: u32 = 65_521;

/// Largest n such that 255*n*(n+1)/2 + (n+1)*(MOD_ADLER-1) fits in u32.
/// Same bound zlib uses to defer the modulo reduction.
const NMAX: usize = 5552;

/// Incremental Adler-32 accumulator.
///
/// The empty checksum is 1, per RFC 1950.
#[derive(Clone, Copy, Debug)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Adler32 {
    /// Create a fresh accumulator (value 1).
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Reset to the initial state.
    pub fn reset(&mut self) {
        self.a = 1;
        self.b = 0;
    }

    /// Feed bytes into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        for chunk in data.chunks(NMAX) {
            for &byte in chunk {
                self.a += byte as u32;
                self.b += self.a;
            }
            self.a %= MOD_ADLER;
            self.b %= MOD_ADLER;
        }
    }

    /// Current checksum value.
    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

/// One-shot Adler-32 of a byte slice.
pub fn adler32(data: &[u8]) -> u32 {
    let mut sum = Adler32::new();
    sum.update(data);
    sum.finish()
}
