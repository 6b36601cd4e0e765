//! Encoding-choice heuristics for the compressible payloads.
//!
//! Sections are deflated once, at the framing layer. The helpers here never
//! emit compressed bytes; they deflate candidate encodings purely to measure
//! which raw representation will compress best later, then hand back the
//! winning raw bytes.

pub(crate) mod strip;
pub(crate) mod vertex;

use crate::codec::deflate;
use crate::util::Result;

/// Deflated size of one candidate. The compressed bytes are discarded.
pub(crate) fn deflated_len(candidate: &[u8]) -> Result<usize> {
    Ok(deflate(candidate)?.len())
}

/// Pick the candidate with the smallest deflated size. Ties keep the
/// earliest candidate, so callers list the incumbent encoding first.
pub(crate) fn choose_smallest(candidates: Vec<Vec<u8>>) -> Result<Vec<u8>> {
    let mut best: Option<(usize, Vec<u8>)> = None;
    for candidate in candidates {
        let len = deflated_len(&candidate)?;
        match &best {
            Some((best_len, _)) if *best_len <= len => {}
            _ => best = Some((len, candidate)),
        }
    }
    Ok(best.map(|(_, bytes)| bytes).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflated_len_orders_by_redundancy() {
        let uniform = vec![7u8; 4096];
        let noisy: Vec<u8> = (0..4096u32).map(|i| (i.wrapping_mul(2654435761) >> 13) as u8).collect();
        assert!(deflated_len(&uniform).unwrap() < deflated_len(&noisy).unwrap());
    }

    #[test]
    fn test_ties_keep_first() {
        let a = vec![1u8; 100];
        let b = vec![1u8; 100];
        assert_eq!(choose_smallest(vec![a.clone(), b]).unwrap(), a);
    }
}
