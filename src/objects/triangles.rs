//! TriangleStripArray: triangle strip index storage.

use crate::codec::{M3gReader, M3gWriter};
use crate::objects::ObjectBase;
use crate::table::{EncodeContext, ObjectTable};
use crate::util::{Error, Result};

/// Index storage: either a run of consecutive indices starting at a given
/// value, or an explicit index list.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexData {
    Implicit { first: u32 },
    Explicit(Vec<u32>),
}

impl Default for IndexData {
    fn default() -> Self {
        Self::Explicit(Vec::new())
    }
}

/// A set of triangle strips over one index stream.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TriangleStripArray {
    pub base: ObjectBase,
    pub indices: IndexData,
    pub strip_lengths: Vec<u32>,
}

impl TriangleStripArray {
    /// Explicit strip array; validates strip lengths against the index count.
    pub fn with_explicit_indices(indices: Vec<u32>, strip_lengths: Vec<u32>) -> Result<Self> {
        let out = Self {
            base: ObjectBase::default(),
            indices: IndexData::Explicit(indices),
            strip_lengths,
        };
        out.validate()?;
        Ok(out)
    }

    /// Consecutive indices starting at `first`.
    pub fn with_implicit_indices(first: u32, strip_lengths: Vec<u32>) -> Result<Self> {
        let out = Self {
            base: ObjectBase::default(),
            indices: IndexData::Implicit { first },
            strip_lengths,
        };
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        if self.strip_lengths.is_empty() {
            return Err(Error::invalid("strip array without strips"));
        }
        let mut total = 0usize;
        for &len in &self.strip_lengths {
            if len < 3 {
                return Err(Error::invalid(format!("strip length {len} is below 3")));
            }
            total += len as usize;
        }
        match &self.indices {
            IndexData::Explicit(indices) => {
                if indices.len() != total {
                    return Err(Error::invalid(format!(
                        "strip lengths sum to {} but {} indices are stored",
                        total,
                        indices.len()
                    )));
                }
            }
            IndexData::Implicit { first } => {
                // The run ends at first + total - 1; it must stay in u32.
                if *first as u64 + total as u64 - 1 > u32::MAX as u64 {
                    return Err(Error::invalid(format!(
                        "implicit index run starting at {first} with {total} indices leaves u32 range"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of indices across all strips.
    pub fn index_count(&self) -> usize {
        self.strip_lengths.iter().map(|&l| l as usize).sum()
    }

    /// The index stream with implicit runs expanded.
    pub fn flat_indices(&self) -> Vec<u32> {
        match &self.indices {
            IndexData::Explicit(indices) => indices.clone(),
            IndexData::Implicit { first } => {
                (0..self.index_count() as u32).map(|i| first + i).collect()
            }
        }
    }

    /// Iterate the non-degenerate triangles of every strip, winding
    /// alternated so each triangle comes out front-face consistent.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let indices = self.flat_indices();
        let mut out = Vec::new();
        let mut offset = 0usize;
        for &len in &self.strip_lengths {
            let strip = &indices[offset..offset + len as usize];
            for k in 0..strip.len() - 2 {
                let (a, b, c) = if k & 1 == 0 {
                    (strip[k], strip[k + 1], strip[k + 2])
                } else {
                    (strip[k + 1], strip[k], strip[k + 2])
                };
                if a != b && b != c && a != c {
                    out.push([a, b, c]);
                }
            }
            offset += len as usize;
        }
        out
    }

    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let encoding = r.read_u8()?;
        let indices = match encoding {
            0 => IndexData::Implicit { first: r.read_u32()? },
            1 => IndexData::Implicit {
                first: r.read_u8()? as u32,
            },
            2 => IndexData::Implicit {
                first: r.read_u16()? as u32,
            },
            128 => {
                let count = r.read_array_count(4)?;
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_u32()?);
                }
                IndexData::Explicit(v)
            }
            129 => {
                let count = r.read_array_count(1)?;
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_u8()? as u32);
                }
                IndexData::Explicit(v)
            }
            130 => {
                let count = r.read_array_count(2)?;
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_u16()? as u32);
                }
                IndexData::Explicit(v)
            }
            other => return Err(Error::bad_enum("indexBuffer.encoding", other)),
        };
        let length_count = r.read_array_count(4)?;
        let mut strip_lengths = Vec::with_capacity(length_count);
        for _ in 0..length_count {
            strip_lengths.push(r.read_u32()?);
        }
        let out = Self {
            base,
            indices,
            strip_lengths,
        };
        out.validate()?;
        Ok(out)
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.validate()?;
        self.base.encode(w, ctx)?;
        match &self.indices {
            IndexData::Implicit { first } => {
                let mut body = M3gWriter::new();
                if *first <= u8::MAX as u32 {
                    body.write_u8(1);
                    body.write_u8(*first as u8);
                } else if *first <= u16::MAX as u32 {
                    body.write_u8(2);
                    body.write_u16(*first as u16);
                } else {
                    body.write_u8(0);
                    body.write_u32(*first);
                }
                crate::encode::strip::write_strip_lengths(&mut body, &self.strip_lengths);
                w.put(&body.into_inner());
            }
            IndexData::Explicit(indices) => {
                let best = crate::encode::strip::encode(indices, &self.strip_lengths)?;
                w.put(&best);
            }
        }
        Ok(())
    }
}
