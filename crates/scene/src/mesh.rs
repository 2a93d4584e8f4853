//! Procedural mesh builders.
//!
//! Every builder returns a self-contained [`Mesh`] with flat per-face normals
//! and 16-bit indices. [`Mesh::combine`] merges several meshes into one buffer
//! set, re-basing the indices of each part by the vertices that precede it.

use std::f32::consts::TAU;

/// Errors from mesh construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has {0} vertices, more than a u16 index buffer can address")]
    IndexOverflow(usize),
    #[error("ring and cylinder meshes need at least 3 segments, got {0}")]
    TooFewSegments(u32),
}

/// Static vertex and index buffers for one primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Append one quad (`a b c d` in winding order) as two triangles.
    fn push_quad(&mut self, corners: [[f32; 3]; 4], normals: [[f32; 3]; 4], uvs: [[f32; 2]; 4]) {
        let base = self.positions.len() as u16;
        self.positions.extend_from_slice(&corners);
        self.normals.extend_from_slice(&normals);
        self.uvs.extend_from_slice(&uvs);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Concatenate meshes into a single buffer set.
    pub fn combine(meshes: &[Mesh]) -> Result<Mesh, MeshError> {
        let vertex_total: usize = meshes.iter().map(Mesh::vertex_count).sum();
        if vertex_total > u16::MAX as usize + 1 {
            return Err(MeshError::IndexOverflow(vertex_total));
        }

        let mut out = Mesh {
            positions: Vec::with_capacity(vertex_total),
            normals: Vec::with_capacity(vertex_total),
            uvs: Vec::with_capacity(vertex_total),
            indices: Vec::with_capacity(meshes.iter().map(|m| m.indices.len()).sum()),
        };
        for mesh in meshes {
            let offset = out.positions.len() as u16;
            out.positions.extend_from_slice(&mesh.positions);
            out.normals.extend_from_slice(&mesh.normals);
            out.uvs.extend_from_slice(&mesh.uvs);
            out.indices.extend(mesh.indices.iter().map(|i| i + offset));
        }
        Ok(out)
    }
}

/// Square plane of side `size` in the XZ plane, facing +Y.
pub fn plane(size: f32) -> Mesh {
    let h = size / 2.0;
    let up = [0.0, 1.0, 0.0];
    let mut mesh = Mesh::default();
    mesh.push_quad(
        [[-h, 0.0, h], [h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]],
        [up; 4],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
    );
    mesh
}

/// Axis-aligned box centred on the origin with 24 vertices (4 per face).
pub fn cuboid(width: f32, height: f32, depth: f32) -> Mesh {
    let (w, h, d) = (width / 2.0, height / 2.0, depth / 2.0);
    let uv = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    #[rustfmt::skip]
    let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
        ([[-w, -h,  d], [ w, -h,  d], [ w,  h,  d], [-w,  h,  d]], [ 0.0,  0.0,  1.0]),
        ([[-w, -h, -d], [-w,  h, -d], [ w,  h, -d], [ w, -h, -d]], [ 0.0,  0.0, -1.0]),
        ([[-w,  h, -d], [-w,  h,  d], [ w,  h,  d], [ w,  h, -d]], [ 0.0,  1.0,  0.0]),
        ([[-w, -h, -d], [ w, -h, -d], [ w, -h,  d], [-w, -h,  d]], [ 0.0, -1.0,  0.0]),
        ([[ w, -h, -d], [ w,  h, -d], [ w,  h,  d], [ w, -h,  d]], [ 1.0,  0.0,  0.0]),
        ([[-w, -h, -d], [-w, -h,  d], [-w,  h,  d], [-w,  h, -d]], [-1.0,  0.0,  0.0]),
    ];
    let mut mesh = Mesh::default();
    for (corners, normal) in faces {
        mesh.push_quad(corners, [normal; 4], uv);
    }
    mesh
}

fn check_segments(segments: u32) -> Result<(), MeshError> {
    if segments < 3 {
        return Err(MeshError::TooFewSegments(segments));
    }
    // 4 vertices per segment.
    let vertices = segments as usize * 4;
    if vertices > u16::MAX as usize + 1 {
        return Err(MeshError::IndexOverflow(vertices));
    }
    Ok(())
}

fn unit_circle(i: u32, segments: u32) -> (f32, f32) {
    let angle = i as f32 / segments as f32 * TAU;
    (angle.cos(), angle.sin())
}

/// Flat annulus at height `y`, facing +Y.
pub fn ring_floor(inner: f32, outer: f32, y: f32, segments: u32) -> Result<Mesh, MeshError> {
    check_segments(segments)?;
    let up = [0.0, 1.0, 0.0];
    let mut mesh = Mesh::default();
    for i in 0..segments {
        let (c0, s0) = unit_circle(i, segments);
        let (c1, s1) = unit_circle(i + 1, segments);
        let u0 = i as f32 / segments as f32;
        let u1 = (i + 1) as f32 / segments as f32;
        mesh.push_quad(
            [
                [c0 * outer, y, s0 * outer],
                [c0 * inner, y, s0 * inner],
                [c1 * inner, y, s1 * inner],
                [c1 * outer, y, s1 * outer],
            ],
            [up; 4],
            [[u0, 1.0], [u0, 0.0], [u1, 0.0], [u1, 1.0]],
        );
    }
    Ok(mesh)
}

/// Vertical cylindrical band between `y_bottom` and `y_top`.
///
/// Normals point toward the axis when `inward` is set, away from it otherwise.
pub fn ring_wall(
    radius: f32,
    y_bottom: f32,
    y_top: f32,
    segments: u32,
    inward: bool,
) -> Result<Mesh, MeshError> {
    check_segments(segments)?;
    let sign = if inward { -1.0 } else { 1.0 };
    let mut mesh = Mesh::default();
    for i in 0..segments {
        let (c0, s0) = unit_circle(i, segments);
        let (c1, s1) = unit_circle(i + 1, segments);
        let n0 = [c0 * sign, 0.0, s0 * sign];
        let n1 = [c1 * sign, 0.0, s1 * sign];
        let u0 = i as f32 / segments as f32;
        let u1 = (i + 1) as f32 / segments as f32;
        let mut corners = [
            [c0 * radius, y_bottom, s0 * radius],
            [c0 * radius, y_top, s0 * radius],
            [c1 * radius, y_top, s1 * radius],
            [c1 * radius, y_bottom, s1 * radius],
        ];
        let mut normals = [n0, n0, n1, n1];
        let mut uvs = [[u0, 0.0], [u0, 1.0], [u1, 1.0], [u1, 0.0]];
        // Front faces wind counter-clockwise as seen from the normal side.
        if inward {
            corners.reverse();
            normals.reverse();
            uvs.reverse();
        }
        mesh.push_quad(corners, normals, uvs);
    }
    Ok(mesh)
}

/// Open-ended truncated cone centred on the origin, `height` tall.
///
/// `v` runs from 0 at the bottom rim to 1 at the top rim; `u` wraps once
/// around the axis. Used as the shell for the volumetric fire variant.
pub fn open_cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
) -> Result<Mesh, MeshError> {
    check_segments(segments)?;
    let half = height / 2.0;
    // Slope of the side wall folds into the normal's Y component.
    let slope = (radius_bottom - radius_top) / height;
    let mut mesh = Mesh::default();
    for i in 0..segments {
        let (c0, s0) = unit_circle(i, segments);
        let (c1, s1) = unit_circle(i + 1, segments);
        let n = |c: f32, s: f32| {
            let len = (1.0 + slope * slope).sqrt();
            [c / len, slope / len, s / len]
        };
        let u0 = i as f32 / segments as f32;
        let u1 = (i + 1) as f32 / segments as f32;
        mesh.push_quad(
            [
                [c0 * radius_bottom, -half, s0 * radius_bottom],
                [c0 * radius_top, half, s0 * radius_top],
                [c1 * radius_top, half, s1 * radius_top],
                [c1 * radius_bottom, -half, s1 * radius_bottom],
            ],
            [n(c0, s0), n(c0, s0), n(c1, s1), n(c1, s1)],
            [[u0, 0.0], [u0, 1.0], [u1, 1.0], [u1, 0.0]],
        );
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(mesh: &Mesh) {
        assert_eq!(mesh.positions.len(), mesh.normals.len());
        assert_eq!(mesh.positions.len(), mesh.uvs.len());
        assert_eq!(mesh.indices.len() % 3, 0);
        let n = mesh.vertex_count() as u16;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    /// Every triangle winds counter-clockwise seen from its vertex normals.
    fn assert_front_faces_follow_normals(mesh: &Mesh) {
        let sub = |a: [f32; 3], b: [f32; 3]| [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
        for tri in mesh.indices.chunks(3) {
            let [p0, p1, p2] = [0, 1, 2].map(|k| mesh.positions[tri[k] as usize]);
            let (e1, e2) = (sub(p1, p0), sub(p2, p0));
            let face = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            for &i in tri {
                let n = mesh.normals[i as usize];
                let facing = face[0] * n[0] + face[1] * n[1] + face[2] * n[2];
                assert!(facing > 0.0, "triangle {tri:?} faces away from its normal");
            }
        }
    }

    #[test]
    fn winding_matches_normals() {
        assert_front_faces_follow_normals(&plane(30.0));
        assert_front_faces_follow_normals(&cuboid(1.2, 6.0, 1.2));
        assert_front_faces_follow_normals(&ring_floor(0.55, 0.9, -0.05, 96).unwrap());
        assert_front_faces_follow_normals(&ring_wall(0.55, -0.05, 0.04, 96, true).unwrap());
        assert_front_faces_follow_normals(&ring_wall(0.9, -0.05, 0.04, 96, false).unwrap());
        assert_front_faces_follow_normals(&open_cylinder(0.4, 0.65, 1.6, 32).unwrap());
    }

    #[test]
    fn ground_faces_the_camera() {
        let m = plane(30.0);
        let (p0, p1, p2) = (m.positions[0], m.positions[1], m.positions[2]);
        // y component of (p1 - p0) x (p2 - p0)
        let up = (p1[2] - p0[2]) * (p2[0] - p0[0]) - (p1[0] - p0[0]) * (p2[2] - p0[2]);
        assert!(up > 0.0);
    }

    #[test]
    fn plane_is_one_quad() {
        let m = plane(30.0);
        assert_consistent(&m);
        assert_eq!(m.vertex_count(), 4);
        assert_eq!(m.index_count(), 6);
        assert!(m.positions.iter().all(|p| p[0].abs() == 15.0 && p[1] == 0.0));
    }

    #[test]
    fn cuboid_has_six_faces() {
        let m = cuboid(1.2, 6.0, 1.2);
        assert_consistent(&m);
        assert_eq!(m.vertex_count(), 24);
        assert_eq!(m.index_count(), 36);
        let max_y = m.positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert_eq!(max_y, 3.0);
        // Each face's vertices lie on the plane its normal describes.
        for (p, n) in m.positions.iter().zip(&m.normals) {
            let along = p[0] * n[0] + p[1] * n[1] + p[2] * n[2];
            let half = [0.6, 3.0, 0.6]
                .iter()
                .zip(n)
                .map(|(h, c)| h * c.abs())
                .sum::<f32>();
            assert!((along - half).abs() < 1e-6);
        }
    }

    #[test]
    fn ring_floor_spans_radii() {
        let m = ring_floor(0.55, 0.9, -0.05, 96).unwrap();
        assert_consistent(&m);
        assert_eq!(m.vertex_count(), 96 * 4);
        for p in &m.positions {
            let r = (p[0] * p[0] + p[2] * p[2]).sqrt();
            assert!((r - 0.55).abs() < 1e-5 || (r - 0.9).abs() < 1e-5);
            assert_eq!(p[1], -0.05);
        }
    }

    #[test]
    fn ring_wall_normals_follow_direction() {
        let inner = ring_wall(0.55, -0.05, 0.04, 16, true).unwrap();
        let outer = ring_wall(0.9, -0.05, 0.04, 16, false).unwrap();
        for (p, n) in inner.positions.iter().zip(&inner.normals) {
            assert!(p[0] * n[0] + p[2] * n[2] < 0.0);
        }
        for (p, n) in outer.positions.iter().zip(&outer.normals) {
            assert!(p[0] * n[0] + p[2] * n[2] > 0.0);
        }
    }

    #[test]
    fn combine_rebases_indices() {
        let a = plane(1.0);
        let b = cuboid(1.0, 1.0, 1.0);
        let m = Mesh::combine(&[a.clone(), b.clone()]).unwrap();
        assert_consistent(&m);
        assert_eq!(m.vertex_count(), a.vertex_count() + b.vertex_count());
        assert_eq!(&m.indices[..6], &a.indices[..]);
        let offset = a.vertex_count() as u16;
        for (combined, original) in m.indices[6..].iter().zip(&b.indices) {
            assert_eq!(*combined, original + offset);
        }
    }

    #[test]
    fn combine_empty_is_empty() {
        assert_eq!(Mesh::combine(&[]).unwrap(), Mesh::default());
    }

    #[test]
    fn combine_rejects_overflow() {
        let big = ring_floor(1.0, 2.0, 0.0, 16_000).unwrap();
        let err = Mesh::combine(&[big.clone(), big]).unwrap_err();
        assert!(matches!(err, MeshError::IndexOverflow(128_000)));
    }

    #[test]
    fn segment_limits() {
        assert_eq!(
            ring_floor(0.5, 1.0, 0.0, 2).unwrap_err(),
            MeshError::TooFewSegments(2)
        );
        assert!(matches!(
            open_cylinder(0.4, 0.65, 1.6, 20_000),
            Err(MeshError::IndexOverflow(80_000))
        ));
    }

    #[test]
    fn open_cylinder_uv_runs_bottom_to_top() {
        let m = open_cylinder(0.4, 0.65, 1.6, 32).unwrap();
        assert_consistent(&m);
        for (p, uv) in m.positions.iter().zip(&m.uvs) {
            if uv[1] == 0.0 {
                assert!((p[1] + 0.8).abs() < 1e-6);
            } else {
                assert!((p[1] - 0.8).abs() < 1e-6);
            }
        }
        // Narrower at the top: normals tilt upward.
        assert!(m.normals.iter().all(|n| n[1] > 0.0));
    }
}
