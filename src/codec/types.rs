//! Wire-level value types shared by the primitive codec and the schemas.

/// Index of an object in the object table.
///
/// Index 0 is the null reference; real objects start at 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct ObjectIndex(pub u32);

impl ObjectIndex {
    /// The null reference.
    pub const NULL: ObjectIndex = ObjectIndex(0);

    /// True for the null reference.
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ObjectIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque RGB color, stored as three bytes on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ColorRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed 0xAARRGGBB value, ignoring the alpha byte.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Packed 0x00RRGGBB value.
    pub const fn argb(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Opaque RGBA color, stored as four bytes on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ColorRgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorRgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build from a packed 0xAARRGGBB value.
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
            a: (argb >> 24) as u8,
        }
    }

    /// Packed 0xAARRGGBB value.
    pub const fn argb(self) -> u32 {
        ((self.a as u32) << 24) | ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argb_packing() {
        let c = ColorRgba::from_argb(0xFFCCBBAA);
        assert_eq!((c.a, c.r, c.g, c.b), (0xFF, 0xCC, 0xBB, 0xAA));
        assert_eq!(c.argb(), 0xFFCCBBAA);

        let c = ColorRgb::from_argb(0x00333333);
        assert_eq!((c.r, c.g, c.b), (0x33, 0x33, 0x33));
        assert_eq!(c.argb(), 0x00333333);
    }

    #[test]
    fn test_null_index() {
        assert!(ObjectIndex::NULL.is_null());
        assert!(!ObjectIndex(3).is_null());
        assert_eq!(ObjectIndex::default(), ObjectIndex::NULL);
    }
}
