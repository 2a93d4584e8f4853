use crate::camera::{Camera, ModelTransform};
use crate::mesh::{self, Mesh, MeshError};
use glam::Vec3;
use vigil_common::Rgb;

/// Surface parameters for the opaque Blinn-Phong pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub emissive: Rgb,
    pub shininess: f32,
}

/// One opaque object: mesh, placement and material.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub name: &'static str,
    pub mesh: Mesh,
    pub transform: ModelTransform,
    pub material: Material,
}

/// Warm point light that sits in the fire and flickers with time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireLight {
    pub position: Vec3,
    pub color: Rgb,
    pub range: f32,
    pub decay: f32,
}

impl Default for FireLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.9, 0.0),
            color: Rgb::from_hex(0xffa24a),
            range: 8.0,
            decay: 2.1,
        }
    }
}

impl FireLight {
    /// Flicker intensity at `elapsed` seconds; always within `[0.95, 1.55]`.
    pub fn intensity(&self, elapsed: f32) -> f32 {
        1.25 + (elapsed * 6.4).sin() * 0.2 + (elapsed * 11.2).cos() * 0.1
    }
}

/// Directional light, fog and background shared by every opaque object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Direction the light travels in (pointing from the light toward the scene).
    pub light_dir: Vec3,
    pub fog_color: Rgb,
    pub fog_near: f32,
    pub fog_far: f32,
    pub fire_light: FireLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            light_dir: -Vec3::new(0.3, 1.0, 0.2).normalize(),
            fog_color: Rgb::new(0.86, 0.86, 0.88),
            fog_near: 8.0,
            fog_far: 32.0,
            fire_light: FireLight::default(),
        }
    }
}

impl Lighting {
    /// The frame is cleared to the fog colour so distant geometry melts into it.
    pub fn clear_color(&self) -> Rgb {
        self.fog_color
    }
}

/// The complete static scene: camera, lighting and the opaque renderables.
#[derive(Debug, Clone)]
pub struct MemorialScene {
    pub camera: Camera,
    pub lighting: Lighting,
    pub renderables: Vec<Renderable>,
}

const STONE_GLOW: Rgb = Rgb::splat(0.02);
const BENCH_GLOW: Rgb = Rgb::splat(0.01);

impl MemorialScene {
    /// Build the ground, ring groove, obelisk and bench.
    pub fn build() -> Result<Self, MeshError> {
        let ring_groove = Mesh::combine(&[
            mesh::ring_floor(0.55, 0.9, -0.05, 96)?,
            mesh::ring_wall(0.55, -0.05, 0.04, 96, true)?,
            mesh::ring_wall(0.9, -0.05, 0.04, 96, false)?,
        ])?;
        let bench_leg = mesh::cuboid(0.5, 0.7, 0.9);
        let leg_material = Material {
            color: Rgb::new(0.18, 0.18, 0.2),
            emissive: BENCH_GLOW,
            shininess: 18.0,
        };

        let renderables = vec![
            Renderable {
                name: "ground",
                mesh: mesh::plane(30.0),
                transform: ModelTransform::at(0.0, -0.04, 0.0),
                material: Material {
                    color: Rgb::new(0.82, 0.82, 0.8),
                    emissive: STONE_GLOW,
                    shininess: 4.0,
                },
            },
            Renderable {
                name: "ring_groove",
                mesh: ring_groove,
                transform: ModelTransform::at(0.0, 0.04, 0.0),
                material: Material {
                    color: Rgb::new(0.32, 0.32, 0.34),
                    emissive: STONE_GLOW,
                    shininess: 18.0,
                },
            },
            Renderable {
                name: "obelisk",
                mesh: mesh::cuboid(1.2, 6.0, 1.2),
                transform: ModelTransform::at(0.0, 3.0, 0.0).with_rotation_y(0.2),
                material: Material {
                    color: Rgb::new(0.05, 0.05, 0.06),
                    emissive: Rgb::BLACK,
                    shininess: 64.0,
                },
            },
            Renderable {
                name: "bench_seat",
                mesh: mesh::cuboid(4.2, 0.45, 1.2),
                transform: ModelTransform::at(0.0, 0.55, 2.3),
                material: Material {
                    color: Rgb::new(0.2, 0.2, 0.22),
                    emissive: BENCH_GLOW,
                    shininess: 22.0,
                },
            },
            Renderable {
                name: "bench_leg_left",
                mesh: bench_leg.clone(),
                transform: ModelTransform::at(-1.6, 0.35, 2.3),
                material: leg_material,
            },
            Renderable {
                name: "bench_leg_right",
                mesh: bench_leg,
                transform: ModelTransform::at(1.6, 0.35, 2.3),
                material: leg_material,
            },
        ];

        tracing::debug!(
            renderables = renderables.len(),
            vertices = renderables.iter().map(|r| r.mesh.vertex_count()).sum::<usize>(),
            "memorial scene built"
        );

        Ok(Self {
            camera: Camera::default(),
            lighting: Lighting::default(),
            renderables,
        })
    }

    pub fn renderable(&self, name: &str) -> Option<&Renderable> {
        self.renderables.iter().find(|r| r.name == name)
    }
}
