//! Gradient and value noise, evaluated exactly as the fire shaders do.
//!
//! `simplex3` is the classic Ashima Arts / Stefan Gustavson 3D simplex noise
//! (MIT licensed, github.com/ashima/webgl-noise). Output lies in `[-1, 1]`
//! up to a few percent of overshoot. `value2` is bilinear-smoothstep value
//! noise over a sine hash; its output lies in `[0, 1]`.
//!
//! All functions are pure. Arithmetic is `f32` to track the GPU.

use glam::{Vec2, Vec3, Vec4};

/// GLSL `fract`: always in `[0, 1)`, also for negative inputs.
pub fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// GLSL `step(edge, x)`.
fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

fn map4(v: Vec4, f: impl Fn(f32) -> f32) -> Vec4 {
    Vec4::from_array(v.to_array().map(f))
}

fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_7 * r
}

/// 3D simplex noise.
pub fn simplex3(v: Vec3) -> f32 {
    const C_X: f32 = 1.0 / 6.0;
    const C_Y: f32 = 1.0 / 3.0;

    // Skew into simplex space and find the containing cell.
    let i = (v + Vec3::splat(v.dot(Vec3::splat(C_Y)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(C_X)));

    // Rank the offsets to pick the middle two corners.
    let g = Vec3::new(step(x0.y, x0.x), step(x0.z, x0.y), step(x0.x, x0.z));
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let x1 = x0 - i1 + Vec3::splat(C_X);
    let x2 = x0 - i2 + Vec3::splat(C_Y);
    let x3 = x0 - Vec3::splat(0.5);

    let i = Vec3::new(mod289(i.x), mod289(i.y), mod289(i.z));
    let corner = |axis: f32, a1: f32, a2: f32| Vec4::new(axis, axis + a1, axis + a2, axis + 1.0);
    let p = map4(corner(i.z, i1.z, i2.z), permute);
    let p = map4(p + corner(i.y, i1.y, i2.y), permute);
    let p = map4(p + corner(i.x, i1.x, i2.x), permute);

    // Gradients: 7x7 points over a square, mapped onto an octahedron.
    let n_ = 0.142_857_14_f32;
    let ns = Vec3::new(n_ * 2.0, n_ * 0.5 - 1.0, n_);

    let j = p - 49.0 * (p * ns.z * ns.z).floor();
    let x_ = (j * ns.z).floor();
    let y_ = (j - 7.0 * x_).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + Vec4::ONE;
    let s1 = b1.floor() * 2.0 + Vec4::ONE;
    let sh = -map4(h, |hv| step(hv, 0.0));

    let a0 = Vec4::new(b0.x, b0.z, b0.y, b0.w)
        + Vec4::new(s0.x, s0.z, s0.y, s0.w) * Vec4::new(sh.x, sh.x, sh.y, sh.y);
    let a1 = Vec4::new(b1.x, b1.z, b1.y, b1.w)
        + Vec4::new(s1.x, s1.z, s1.y, s1.w) * Vec4::new(sh.z, sh.z, sh.w, sh.w);

    let p0 = Vec3::new(a0.x, a0.y, h.x);
    let p1 = Vec3::new(a0.z, a0.w, h.y);
    let p2 = Vec3::new(a1.x, a1.y, h.z);
    let p3 = Vec3::new(a1.z, a1.w, h.w);

    let norm = map4(
        Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)),
        taylor_inv_sqrt,
    );
    let (p0, p1, p2, p3) = (p0 * norm.x, p1 * norm.y, p2 * norm.z, p3 * norm.w);

    // Mix the four corner contributions.
    let m = (Vec4::splat(0.6) - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
        .max(Vec4::ZERO);
    let m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Simplex noise remapped from `[-1, 1]` into `[0, 1]` (clamped).
pub fn simplex3_unit(v: Vec3) -> f32 {
    (simplex3(v) * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// Sine hash of a lattice point, in `[0, 1)`.
pub fn hash2(p: Vec2) -> f32 {
    fract(p.dot(Vec2::new(127.1, 311.7)).sin() * 43_758.547)
}

/// 2D value noise with smoothstep interpolation, in `[0, 1]`.
pub fn value2(p: Vec2) -> f32 {
    let i = p.floor();
    let f = p - i;
    let a = hash2(i);
    let b = hash2(i + Vec2::X);
    let c = hash2(i + Vec2::Y);
    let d = hash2(i + Vec2::ONE);
    let u = f * f * (Vec2::splat(3.0) - 2.0 * f);
    a + (b - a) * u.x + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y
}
