//! Common types used across blendshape
//!
//! Vectors serialize with upper-case component names (`X`, `Y`, `Z`) so
//! decoded output lines up with the engine's own text dumps.

use serde::{Deserialize, Serialize};

/// 3D float vector (position or tangent offset)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Component-wise equality on the raw bit patterns
    pub fn bits_eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// 3D integer vector used by fixed-point (quantized) data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntVector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl IntVector {
    pub const ZERO: Self = Self { x: 0, y: 0, z: 0 };

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise add with two's-complement wrap-around
    pub fn wrapping_add(self, other: Self) -> Self {
        Self {
            x: self.x.wrapping_add(other.x),
            y: self.y.wrapping_add(other.y),
            z: self.z.wrapping_add(other.z),
        }
    }

    /// Scale every component by a float factor
    pub fn scaled(self, factor: f32) -> Vec3 {
        Vec3::new(
            self.x as f32 * factor,
            self.y as f32 * factor,
            self.z as f32 * factor,
        )
    }
}

impl From<[i32; 3]> for IntVector {
    fn from(v: [i32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Packed normal from old engine versions: four unsigned bytes mapped to
/// `[-1, 1]`, the fourth carrying the binormal sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PackedNormal(pub u32);

impl PackedNormal {
    const SCALE: f32 = 1.0 / 127.5;

    /// Unpack all four components
    pub fn unpack(&self) -> [f32; 4] {
        let bytes = self.0.to_le_bytes();
        bytes.map(|b| b as f32 * Self::SCALE - 1.0)
    }

    /// Pack from components in `[-1, 1]`, rounding to the nearest step
    pub fn pack(x: f32, y: f32, z: f32, w: f32) -> Self {
        let quantize = |v: f32| ((v + 1.0) * 127.5).round().clamp(0.0, 255.0) as u8;
        Self(u32::from_le_bytes([quantize(x), quantize(y), quantize(z), quantize(w)]))
    }
}

impl From<PackedNormal> for Vec3 {
    fn from(normal: PackedNormal) -> Self {
        let [x, y, z, _] = normal.unpack();
        Vec3::new(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_length() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert!((v.length() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_bits_eq_distinguishes_signed_zero() {
        assert!(Vec3::ZERO.bits_eq(&Vec3::ZERO));
        assert!(!Vec3::ZERO.bits_eq(&Vec3::new(-0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_int_vector_wrapping_add() {
        let a = IntVector::new(i32::MAX, 1, -5);
        let b = IntVector::new(1, 2, 5);
        assert_eq!(a.wrapping_add(b), IntVector::new(i32::MIN, 3, 0));
    }

    #[test]
    fn test_packed_normal_extremes() {
        let v: Vec3 = PackedNormal(0x0000_FF00).into();
        assert_eq!(v.x, -1.0);
        assert!((v.y - 1.0).abs() < 1e-6);
        assert_eq!(v.z, -1.0);
    }

    #[test]
    fn test_packed_normal_pack_unpack() {
        let packed = PackedNormal::pack(0.0, 0.5, -0.5, 1.0);
        let [x, y, z, w] = packed.unpack();
        let step = 1.0 / 127.5;
        assert!(x.abs() <= step);
        assert!((y - 0.5).abs() <= step);
        assert!((z + 0.5).abs() <= step);
        assert!((w - 1.0).abs() <= step);
    }
}
