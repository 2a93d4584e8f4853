use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB colour with components nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0.0, 0.0, 0.0]);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self([r, g, b])
    }

    /// Grey with all three channels set to `v`.
    pub const fn splat(v: f32) -> Self {
        Self([v, v, v])
    }

    /// Decode a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self([r, g, b])
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb::from(Vec3::from(self).lerp(Vec3::from(other), t))
    }

    /// Pad to a `vec4` for uniform upload, with `w` in the last lane.
    pub fn extend(self, w: f32) -> [f32; 4] {
        [self.0[0], self.0[1], self.0[2], w]
    }
}

impl From<Rgb> for Vec3 {
    fn from(c: Rgb) -> Self {
        Vec3::from_array(c.0)
    }
}

impl From<Vec3> for Rgb {
    fn from(v: Vec3) -> Self {
        Rgb(v.to_array())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_decoding() {
        let c = Rgb::from_hex(0xffa24a);
        assert_eq!(c.0[0], 1.0);
        assert!((c.0[1] - 162.0 / 255.0).abs() < 1e-6);
        assert!((c.0[2] - 74.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Rgb::new(1.0, 0.45, 0.08);
        let b = Rgb::new(1.0, 0.88, 0.45);
        let close = |x: Rgb, y: Rgb| x.0.iter().zip(y.0).all(|(p, q)| (p - q).abs() < 1e-6);
        assert!(close(a.lerp(b, 0.0), a));
        assert!(close(a.lerp(b, 1.0), b));
    }
}
