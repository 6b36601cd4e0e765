//! Greedy triangle stripifier and explicit index buffer re-encoding.
//!
//! An explicit `TriangleStripArray` is not required to keep the strips it was
//! built with: any partition of the same triangles into strips decodes
//! identically. Re-encoding therefore flattens the stored strips back into a
//! triangle list, re-strips it under a range of configurations and keeps
//! whichever serialized form deflates smallest.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::{choose_smallest, deflated_len};
use crate::codec::M3gWriter;
use crate::util::Result;

/// One stripifier configuration.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StripConfig {
    /// Strips with fewer triangles than this are broken back into single
    /// triangles.
    pub min_strip_length: usize,
    /// Concatenate all strips into one with degenerate bridges.
    pub stitch: bool,
}

/// Re-encode an explicit index buffer.
///
/// Tries the stored strips first, then every (min length 1..=10, stitch
/// off/on) stripification of the same triangles, and returns the candidate
/// whose serialized bytes deflate smallest; ties keep the stored form.
pub(crate) fn encode(indices: &[u32], strip_lengths: &[u32]) -> Result<Vec<u8>> {
    let current = serialize(indices, strip_lengths);
    let triangles = flatten(indices, strip_lengths);
    if triangles.is_empty() {
        return Ok(current);
    }
    let mut candidates = Vec::with_capacity(21);
    candidates.push(current);
    for min_strip_length in 1..=10 {
        for stitch in [false, true] {
            let (indices, lengths) = stripify(
                &triangles,
                StripConfig {
                    min_strip_length,
                    stitch,
                },
            );
            candidates.push(serialize(&indices, &lengths));
        }
    }
    choose_smallest(candidates)
}

/// Serialize explicit indices at the narrowest width that fits, followed by
/// the strip length table.
pub(crate) fn serialize(indices: &[u32], strip_lengths: &[u32]) -> Vec<u8> {
    let mut w = M3gWriter::new();
    let max = indices.iter().copied().max().unwrap_or(0);
    if max <= u8::MAX as u32 {
        w.write_u8(129);
        w.write_u32(indices.len() as u32);
        for &i in indices {
            w.write_u8(i as u8);
        }
    } else if max <= u16::MAX as u32 {
        w.write_u8(130);
        w.write_u32(indices.len() as u32);
        for &i in indices {
            w.write_u16(i as u16);
        }
    } else {
        w.write_u8(128);
        w.write_u32(indices.len() as u32);
        for &i in indices {
            w.write_u32(i);
        }
    }
    write_strip_lengths(&mut w, strip_lengths);
    w.into_inner()
}

pub(crate) fn write_strip_lengths(w: &mut M3gWriter, strip_lengths: &[u32]) {
    w.write_u32(strip_lengths.len() as u32);
    for &len in strip_lengths {
        w.write_u32(len);
    }
}

/// Expand strips into their non-degenerate triangles, winding alternated.
fn flatten(indices: &[u32], strip_lengths: &[u32]) -> Vec<[u32; 3]> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    for &len in strip_lengths {
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

/// Strip a triangle list under one configuration. Returns the index stream
/// and the strip length table.
pub(crate) fn stripify(triangles: &[[u32; 3]], config: StripConfig) -> (Vec<u32>, Vec<u32>) {
    let edges = edge_map(triangles);
    let mut used = vec![false; triangles.len()];
    let mut strips: Vec<Vec<u32>> = Vec::new();
    let mut loose: Vec<[u32; 3]> = Vec::new();

    for seed in 0..triangles.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let [a, b, c] = triangles[seed];
        let mut strip = vec![a, b, c];
        let mut faces = vec![seed];
        grow(&mut strip, &mut faces, &mut used, &edges, triangles, false);
        // Backward pass: reverse, grow from what was the front, restore.
        strip.reverse();
        grow(&mut strip, &mut faces, &mut used, &edges, triangles, true);
        strip.reverse();

        if faces.len() < config.min_strip_length {
            loose.extend(faces.iter().map(|&f| triangles[f]));
        } else {
            strips.push(strip);
        }
    }
    for tri in loose {
        strips.push(tri.to_vec());
    }

    if config.stitch && strips.len() > 1 {
        let stitched = stitch(strips);
        let len = stitched.len() as u32;
        (stitched, vec![len])
    } else {
        let lengths = strips.iter().map(|s| s.len() as u32).collect();
        (strips.concat(), lengths)
    }
}

type EdgeMap = HashMap<(u32, u32), SmallVec<[usize; 2]>>;

/// Undirected edge → incident faces, capped at two per edge.
fn edge_map(triangles: &[[u32; 3]]) -> EdgeMap {
    let mut map = EdgeMap::new();
    for (f, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            let faces = map.entry(edge_key(tri[k], tri[(k + 1) % 3])).or_default();
            if faces.len() < 2 {
                faces.push(f);
            }
        }
    }
    map
}

fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Does `tri`'s winding traverse the directed edge (a, b)?
fn has_directed_edge(tri: [u32; 3], a: u32, b: u32) -> bool {
    (0..3).any(|k| tri[k] == a && tri[(k + 1) % 3] == b)
}

fn third_vertex(tri: [u32; 3], a: u32, b: u32) -> u32 {
    for &v in &tri {
        if v != a && v != b {
            return v;
        }
    }
    // Degenerates never enter the triangle list.
    tri[2]
}

/// Extend `strip` across its trailing edge while an unused neighbor exists.
///
/// The triangle about to be emitted is `(x, y, c)` for an even triangle
/// ordinal and `(y, x, c)` for an odd one, where `(x, y)` are the last two
/// strip indices. A neighbor whose winding only matches the swapped edge
/// direction is still reachable: two repeated indices bridge across it,
/// costing two degenerate triangles but keeping every real winding intact.
///
/// `unique_check` is the backward pass's extra rejection: a candidate all of
/// whose vertices already occur in the strip is skipped.
fn grow(
    strip: &mut Vec<u32>,
    faces: &mut Vec<usize>,
    used: &mut [bool],
    edges: &EdgeMap,
    triangles: &[[u32; 3]],
    unique_check: bool,
) {
    'outer: loop {
        let n = strip.len();
        let (x, y) = (strip[n - 2], strip[n - 1]);
        if x == y {
            return;
        }
        let Some(incident) = edges.get(&edge_key(x, y)) else {
            return;
        };
        for &f in incident {
            if used[f] {
                continue;
            }
            let tri = triangles[f];
            if unique_check && tri.iter().all(|v| strip.contains(v)) {
                continue;
            }
            let c = third_vertex(tri, x, y);
            let ordinal = strip.len() - 2;
            let (fwd_a, fwd_b) = if ordinal % 2 == 0 { (x, y) } else { (y, x) };
            if has_directed_edge(tri, fwd_a, fwd_b) {
                strip.push(c);
            } else {
                // Two bridge indices swap the trailing edge at equal parity,
                // exposing the reversed orientation.
                strip.push(y);
                strip.push(x);
                strip.push(c);
            }
            used[f] = true;
            faces.push(f);
            continue 'outer;
        }
        return;
    }
}

/// Concatenate strips into one, inserting two bridge indices between
/// neighbors and one more to fix parity when needed, so every real triangle
/// keeps its winding.
fn stitch(strips: Vec<Vec<u32>>) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::new();
    for strip in strips {
        if out.is_empty() {
            out.extend(strip);
            continue;
        }
        let last = out[out.len() - 1];
        out.push(last);
        out.push(strip[0]);
        if out.len() % 2 == 1 {
            out.push(strip[0]);
        }
        out.extend(strip);
    }
    out
}
