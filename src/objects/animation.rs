//! Animation objects: controllers, tracks and keyframe sequences.

use crate::codec::{M3gReader, M3gWriter, ObjectIndex};
use crate::objects::{ObjectBase, ObjectType};
use crate::table::{EncodeContext, Expect, ObjectTable};
use crate::util::{Error, Result};

/// Playback state shared by a set of animation tracks.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationController {
    pub base: ObjectBase,
    pub speed: f32,
    pub weight: f32,
    pub active_interval_start: i32,
    pub active_interval_end: i32,
    pub reference_sequence_time: f32,
    pub reference_world_time: i32,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            speed: 1.0,
            weight: 1.0,
            active_interval_start: 0,
            active_interval_end: 0,
            reference_sequence_time: 0.0,
            reference_world_time: 0,
        }
    }
}

impl AnimationController {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        Ok(Self {
            base: ObjectBase::decode(r, table)?,
            speed: r.read_f32()?,
            weight: r.read_f32()?,
            active_interval_start: r.read_i32()?,
            active_interval_end: r.read_i32()?,
            reference_sequence_time: r.read_f32()?,
            reference_world_time: r.read_i32()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_f32(self.speed);
        w.write_f32(self.weight);
        w.write_i32(self.active_interval_start);
        w.write_i32(self.active_interval_end);
        w.write_f32(self.reference_sequence_time);
        w.write_i32(self.reference_world_time);
        Ok(())
    }
}

/// Smallest animatable property id (alpha).
pub const PROPERTY_ALPHA: u32 = 256;
/// Largest animatable property id (visibility).
pub const PROPERTY_VISIBILITY: u32 = 276;

/// Binds one keyframe sequence to one animatable property of its owner.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationTrack {
    pub base: ObjectBase,
    pub keyframe_sequence: ObjectIndex,
    pub controller: ObjectIndex,
    /// Animatable property id, 256..=276.
    pub property_id: u32,
}

impl AnimationTrack {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let keyframe_sequence = table.require_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::KeyframeSequence),
            "keyframeSequence",
        )?;
        let controller = table.optional_ref(
            r.read_index()?,
            Expect::Kind(ObjectType::AnimationController),
            "controller",
        )?;
        let property_id = r.read_u32()?;
        if !(PROPERTY_ALPHA..=PROPERTY_VISIBILITY).contains(&property_id) {
            return Err(Error::bad_enum("propertyID", property_id));
        }
        Ok(Self {
            base,
            keyframe_sequence,
            controller,
            property_id,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        ctx.check_required(
            self.keyframe_sequence,
            Expect::Kind(ObjectType::KeyframeSequence),
            "keyframeSequence",
        )?;
        w.write_index(self.keyframe_sequence);
        ctx.check_optional(
            self.controller,
            Expect::Kind(ObjectType::AnimationController),
            "controller",
        )?;
        w.write_index(self.controller);
        if !(PROPERTY_ALPHA..=PROPERTY_VISIBILITY).contains(&self.property_id) {
            return Err(Error::bad_enum("propertyID", self.property_id));
        }
        w.write_u32(self.property_id);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum Interpolation {
    #[default]
    Linear = 176,
    Slerp = 177,
    Spline = 178,
    Squad = 179,
    Step = 180,
}

impl Interpolation {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            176 => Some(Self::Linear),
            177 => Some(Self::Slerp),
            178 => Some(Self::Spline),
            179 => Some(Self::Squad),
            180 => Some(Self::Step),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum RepeatMode {
    #[default]
    Constant = 192,
    Loop = 193,
}

impl RepeatMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            192 => Some(Self::Constant),
            193 => Some(Self::Loop),
            _ => None,
        }
    }
}

/// One keyframe: sequence time plus one value per component.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub time: i32,
    pub value: Vec<f32>,
}

/// Timed value curve sampled by animation tracks.
///
/// Quantized on-wire encodings (byte and short) are dequantized while
/// reading; the encoder always emits the float form, which is lossless in
/// value space.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeSequence {
    pub base: ObjectBase,
    pub interpolation: Interpolation,
    pub repeat_mode: RepeatMode,
    pub duration: u32,
    pub valid_range_first: u32,
    pub valid_range_last: u32,
    pub component_count: u32,
    pub keyframes: Vec<Keyframe>,
}

impl Default for KeyframeSequence {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            interpolation: Interpolation::Linear,
            repeat_mode: RepeatMode::Constant,
            duration: 0,
            valid_range_first: 0,
            valid_range_last: 0,
            component_count: 1,
            keyframes: Vec::new(),
        }
    }
}

impl KeyframeSequence {
    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let i = r.read_u8()?;
        let interpolation =
            Interpolation::from_u8(i).ok_or_else(|| Error::bad_enum("interpolation", i))?;
        let m = r.read_u8()?;
        let repeat_mode = RepeatMode::from_u8(m).ok_or_else(|| Error::bad_enum("repeatMode", m))?;
        let encoding = r.read_u8()?;
        let duration = r.read_u32()?;
        let valid_range_first = r.read_u32()?;
        let valid_range_last = r.read_u32()?;
        let component_count = r.read_u32()?;
        if component_count == 0 {
            return Err(Error::invalid("keyframe sequence with zero components"));
        }
        let cc = component_count as usize;
        let keyframe_count = r.read_array_count(4 + cc)?;
        if keyframe_count > 0
            && (valid_range_first as usize >= keyframe_count
                || valid_range_last as usize >= keyframe_count)
        {
            return Err(Error::invalid("keyframe valid range outside sequence"));
        }

        let mut keyframes = Vec::with_capacity(keyframe_count);
        match encoding {
            0 => {
                for _ in 0..keyframe_count {
                    let time = r.read_i32()?;
                    let mut value = Vec::with_capacity(cc);
                    for _ in 0..cc {
                        value.push(r.read_f32()?);
                    }
                    keyframes.push(Keyframe { time, value });
                }
            }
            1 | 2 => {
                let max_q = if encoding == 1 { 255.0 } else { 65535.0 };
                let mut bias = Vec::with_capacity(cc);
                let mut scale = Vec::with_capacity(cc);
                for _ in 0..cc {
                    bias.push(r.read_f32()?);
                }
                for _ in 0..cc {
                    scale.push(r.read_f32()?);
                }
                for _ in 0..keyframe_count {
                    let time = r.read_i32()?;
                    let mut value = Vec::with_capacity(cc);
                    for c in 0..cc {
                        let q = if encoding == 1 {
                            r.read_u8()? as f32
                        } else {
                            r.read_u16()? as f32
                        };
                        value.push(bias[c] + scale[c] * q / max_q);
                    }
                    keyframes.push(Keyframe { time, value });
                }
            }
            other => return Err(Error::bad_enum("keyframeEncoding", other)),
        }
        Ok(Self {
            base,
            interpolation,
            repeat_mode,
            duration,
            valid_range_first,
            valid_range_last,
            component_count,
            keyframes,
        })
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.base.encode(w, ctx)?;
        w.write_u8(self.interpolation as u8);
        w.write_u8(self.repeat_mode as u8);
        w.write_u8(0); // float encoding
        w.write_u32(self.duration);
        w.write_u32(self.valid_range_first);
        w.write_u32(self.valid_range_last);
        w.write_u32(self.component_count);
        w.write_u32(self.keyframes.len() as u32);
        for kf in &self.keyframes {
            if kf.value.len() != self.component_count as usize {
                return Err(Error::invalid(format!(
                    "keyframe holds {} components, sequence declares {}",
                    kf.value.len(),
                    self.component_count
                )));
            }
            w.write_i32(kf.time);
            for &v in &kf.value {
                w.write_f32(v);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_seq(seq: &KeyframeSequence) -> KeyframeSequence {
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        seq.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        let back = KeyframeSequence::decode(&mut r, &mut table).unwrap();
        assert!(r.at_end());
        back
    }

    #[test]
    fn test_float_keyframes_roundtrip() {
        let seq = KeyframeSequence {
            interpolation: Interpolation::Spline,
            repeat_mode: RepeatMode::Loop,
            duration: 2000,
            valid_range_first: 0,
            valid_range_last: 2,
            component_count: 3,
            keyframes: vec![
                Keyframe {
                    time: 0,
                    value: vec![0.0, 1.0, 2.0],
                },
                Keyframe {
                    time: 500,
                    value: vec![1.5, -1.0, 0.0],
                },
                Keyframe {
                    time: 2000,
                    value: vec![0.0, 0.0, 0.0],
                },
            ],
            ..KeyframeSequence::default()
        };
        assert_eq!(roundtrip_seq(&seq), seq);
    }

    #[test]
    fn test_byte_quantized_decoding() {
        let mut w = M3gWriter::new();
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        ObjectBase::default().encode(&mut w, &ctx).unwrap();
        w.write_u8(Interpolation::Linear as u8);
        w.write_u8(RepeatMode::Constant as u8);
        w.write_u8(1); // byte-quantized
        w.write_u32(100);
        w.write_u32(0);
        w.write_u32(1);
        w.write_u32(1); // one component
        w.write_u32(2); // two keyframes
        w.write_f32(10.0); // bias
        w.write_f32(510.0); // scale
        w.write_i32(0);
        w.write_u8(0);
        w.write_i32(100);
        w.write_u8(255);
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        let seq = KeyframeSequence::decode(&mut r, &mut table).unwrap();
        assert_eq!(seq.keyframes[0].value, vec![10.0]);
        assert_eq!(seq.keyframes[1].value, vec![520.0]);
    }

    #[test]
    fn test_controller_roundtrip() {
        let ctl = AnimationController {
            speed: 2.0,
            weight: 0.5,
            active_interval_start: -100,
            active_interval_end: 400,
            reference_sequence_time: 0.25,
            reference_world_time: 42,
            ..AnimationController::default()
        };
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        ctl.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        assert_eq!(AnimationController::decode(&mut r, &mut table).unwrap(), ctl);
    }

    #[test]
    fn test_track_property_range_checked() {
        let mut table = ObjectTable::new();
        let seq = table.append(crate::objects::SceneObject::KeyframeSequence(
            KeyframeSequence::default(),
        ));
        let track = AnimationTrack {
            base: ObjectBase::default(),
            keyframe_sequence: seq,
            controller: ObjectIndex::NULL,
            property_id: 300, // outside 256..=276
        };
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(2),
        };
        let mut w = M3gWriter::new();
        assert!(matches!(
            track.encode(&mut w, &ctx),
            Err(Error::InvalidEnumValue { field: "propertyID", .. })
        ));
    }
}
