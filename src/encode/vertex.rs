//! Width and delta selection for vertex array payloads.

use byteorder::{ByteOrder, LittleEndian};

use super::deflated_len;
use crate::objects::VertexValues;
use crate::util::Result;

/// The chosen wire form of one vertex array.
pub(crate) struct VertexEncoding {
    pub component_size: u8,
    /// 0 absolute, 1 delta.
    pub encoding: u8,
    pub payload: Vec<u8>,
}

/// Decide width and encoding for `values`.
///
/// Narrowing 16-bit data to 8 bits happens first and unconditionally when
/// every value fits a signed byte. Absolute and per-component delta forms of
/// the narrowed data are then trial-deflated and the shorter one wins, ties
/// keeping absolute.
pub(crate) fn plan(values: &VertexValues, component_count: usize) -> Result<VertexEncoding> {
    let narrowed;
    let values = match values {
        VertexValues::Short(v) if fits_i8(v) => {
            narrowed = VertexValues::Byte(v.iter().map(|&x| x as i8).collect());
            &narrowed
        }
        other => other,
    };
    let (component_size, absolute, delta) = match values {
        VertexValues::Byte(v) => (1, bytes_i8(v), bytes_i8(&delta_i8(v, component_count))),
        VertexValues::Short(v) => (2, bytes_i16(v), bytes_i16(&delta_i16(v, component_count))),
    };
    if deflated_len(&delta)? < deflated_len(&absolute)? {
        Ok(VertexEncoding {
            component_size,
            encoding: 1,
            payload: delta,
        })
    } else {
        Ok(VertexEncoding {
            component_size,
            encoding: 0,
            payload: absolute,
        })
    }
}

fn fits_i8(values: &[i16]) -> bool {
    values
        .iter()
        .all(|&v| v >= i8::MIN as i16 && v <= i8::MAX as i16)
}

/// Per-component difference from the previous vertex, first vertex kept
/// as-is. Wrapping, matching the decoder's wrapping running sum.
pub(crate) fn delta_i16(values: &[i16], component_count: usize) -> Vec<i16> {
    let mut out = values.to_vec();
    for i in (component_count..values.len()).rev() {
        out[i] = values[i].wrapping_sub(values[i - component_count]);
    }
    out
}

pub(crate) fn delta_i8(values: &[i8], component_count: usize) -> Vec<i8> {
    let mut out = values.to_vec();
    for i in (component_count..values.len()).rev() {
        out[i] = values[i].wrapping_sub(values[i - component_count]);
    }
    out
}

fn bytes_i8(values: &[i8]) -> Vec<u8> {
    values.iter().map(|&v| v as u8).collect()
}

fn bytes_i16(values: &[i16]) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * 2];
    LittleEndian::write_i16_into(values, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::vertex::{undelta_i16, undelta_i8};

    #[test]
    fn test_narrowing_applies_when_values_fit() {
        let plan = plan(&VertexValues::Short(vec![0, 1, -2, 127, -128, 3]), 3).unwrap();
        assert_eq!(plan.component_size, 1);
    }

    #[test]
    fn test_narrowing_blocked_by_overflow() {
        // 300 overflows a signed byte, so the array stays 16-bit and the
        // third vertex's delta is [299, 0, 0].
        let values = vec![0, 0, 0, 1, 0, 0, 300, 0, 0];
        let plan = plan(&VertexValues::Short(values.clone()), 3).unwrap();
        assert_eq!(plan.component_size, 2);
        assert_eq!(delta_i16(&values, 3)[6..9], [299, 0, 0]);
    }

    #[test]
    fn test_delta_is_lossless() {
        let values: Vec<i16> = vec![100, -32768, 5, 32767, 12000, -1];
        let mut back = delta_i16(&values, 2);
        undelta_i16(&mut back, 2);
        assert_eq!(back, values);

        let values: Vec<i8> = vec![100, -128, 27, 127];
        let mut back = delta_i8(&values, 1);
        undelta_i8(&mut back, 1);
        assert_eq!(back, values);
    }

    #[test]
    fn test_delta_wins_for_smooth_data() {
        // A long ramp is constant after differencing, which deflate loves.
        let values: Vec<i16> = (0..3000).map(|i| i * 7).collect();
        let plan = plan(&VertexValues::Short(values), 3).unwrap();
        assert_eq!(plan.encoding, 1);
    }
}
