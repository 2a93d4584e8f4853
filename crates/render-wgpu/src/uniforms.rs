//! Host-side uniform blocks, laid out to match the WGSL structs.

use bytemuck::{Pod, Zeroable};
use vigil_fire::shading::POINT_SCALE;
use vigil_fire::{FirePalette, ShellParams};
use vigil_scene::{Camera, MemorialScene, ModelTransform, Renderable, Viewport};

/// Per-frame data shared by every opaque object (group 0).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub light_direction: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_params: [f32; 4],
    pub fire_light: [f32; 4],
    pub fire_light_color: [f32; 4],
    pub fire_light_falloff: [f32; 4],
}

impl FrameUniforms {
    pub fn new(scene: &MemorialScene, aspect: f32, elapsed: f32) -> Self {
        let camera = &scene.camera;
        let lighting = &scene.lighting;
        let light = &lighting.fire_light;
        Self {
            projection: camera.projection_matrix(aspect).to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            camera_position: camera.eye.extend(1.0).to_array(),
            light_direction: lighting.light_dir.extend(0.0).to_array(),
            fog_color: lighting.fog_color.extend(1.0),
            fog_params: [lighting.fog_near, lighting.fog_far, 0.0, 0.0],
            fire_light: light.position.extend(light.intensity(elapsed)).to_array(),
            fire_light_color: light.color.extend(1.0),
            fire_light_falloff: [light.range, light.decay, 0.0, 0.0],
        }
    }
}

/// Per-object transform and material (group 1).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
}

impl ObjectUniforms {
    pub fn new(renderable: &Renderable) -> Self {
        let material = &renderable.material;
        Self {
            model: renderable.transform.matrix().to_cols_array_2d(),
            color: material.color.extend(material.shininess),
            emissive: material.emissive.extend(0.0),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FirePointUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub core_color: [f32; 4],
    pub tip_color: [f32; 4],
    pub time: f32,
    pub point_scale: f32,
    pub viewport: [f32; 2],
}

impl FirePointUniforms {
    pub fn new(camera: &Camera, viewport: Viewport, palette: &FirePalette, time: f32) -> Self {
        Self {
            projection: camera.projection_matrix(viewport.aspect()).to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            core_color: palette.core.extend(palette.gain),
            tip_color: palette.tip.extend(1.0),
            time,
            point_scale: POINT_SCALE,
            viewport: viewport.size(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FireShellUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub color3: [f32; 4],
    pub time: f32,
    pub noise_scale: f32,
    pub distortion: f32,
    pub padding: f32,
}

impl FireShellUniforms {
    pub fn new(
        camera: &Camera,
        viewport: Viewport,
        transform: &ModelTransform,
        params: &ShellParams,
        time: f32,
    ) -> Self {
        Self {
            projection: camera.projection_matrix(viewport.aspect()).to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            model: transform.matrix().to_cols_array_2d(),
            color1: params.color1.extend(1.0),
            color2: params.color2.extend(1.0),
            color3: params.color3.extend(1.0),
            time,
            noise_scale: params.noise_scale,
            distortion: params.distortion,
            padding: 0.0,
        }
    }
}

// Uniform block sizes must be multiples of 16 bytes.
const _: () = {
    assert!(size_of::<FrameUniforms>() % 16 == 0);
    assert!(size_of::<ObjectUniforms>() % 16 == 0);
    assert!(size_of::<FirePointUniforms>() % 16 == 0);
    assert!(size_of::<FireShellUniforms>() % 16 == 0);
};

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn block_sizes() {
        assert_eq!(size_of::<FrameUniforms>(), 240);
        assert_eq!(size_of::<ObjectUniforms>(), 96);
        assert_eq!(size_of::<FirePointUniforms>(), 176);
        assert_eq!(size_of::<FireShellUniforms>(), 256);
    }

    #[test]
    fn projection_follows_aspect_only() {
        let scene = MemorialScene::build().unwrap();
        let wide = FrameUniforms::new(&scene, 2.0, 0.0);
        let narrow = FrameUniforms::new(&scene, 1.0, 0.0);
        // X scale halves when the aspect doubles; Y scale is untouched.
        assert!((wide.projection[0][0] * 2.0 - narrow.projection[0][0]).abs() < 1e-5);
        assert_eq!(wide.projection[1][1], narrow.projection[1][1]);
        // Elapsed time moves only the flicker lane.
        let later = FrameUniforms::new(&scene, 2.0, 3.7);
        assert_eq!(later.projection, wide.projection);
        assert_eq!(later.view, wide.view);
        assert_ne!(later.fire_light[3], wide.fire_light[3]);
    }

    #[test]
    fn object_packs_shininess_in_w() {
        let scene = MemorialScene::build().unwrap();
        let obelisk = scene.renderable("obelisk").unwrap();
        let u = ObjectUniforms::new(obelisk);
        assert_eq!(u.color[3], 64.0);
        assert_ne!(u.model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn fire_uniforms_carry_viewport_in_pixels() {
        let camera = Camera::default();
        let viewport = Viewport {
            width: 1600,
            height: 900,
        };
        let u = FirePointUniforms::new(&camera, viewport, &FirePalette::default(), 1.5);
        assert_eq!(u.viewport, [1600.0, 900.0]);
        assert_eq!(u.point_scale, 280.0);
        assert_eq!(u.core_color[3], 1.35);
        assert_eq!(u.time, 1.5);
    }
}
