//! Parse-time reflection of WGSL programs.
//!
//! Every program is parsed and validated with naga before any pipeline is
//! created, and the uniform members and vertex attributes the renderer relies
//! on are looked up by name. A missing name is a setup error, not a silently
//! unbound slot.

use crate::error::SetupError;
use crate::shaders::ProgramSpec;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, ShaderStage, TypeInner};
use std::collections::BTreeMap;

/// Location of one named uniform inside a bound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
    /// Byte offset within the buffer (0 for the block itself).
    pub offset: u32,
    pub size: u32,
}

/// Uniform and vertex-input layout of one validated program.
#[derive(Debug, Clone)]
pub struct ProgramLayout {
    label: String,
    uniforms: BTreeMap<String, UniformSlot>,
    attributes: BTreeMap<String, u32>,
}

impl ProgramLayout {
    /// Parse and validate `source`, then collect its uniforms and attributes.
    pub fn reflect(label: &str, source: &str) -> Result<Self, SetupError> {
        let compile_error = |log: String| SetupError::ShaderCompile {
            label: label.to_owned(),
            log,
        };
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| compile_error(e.emit_to_string(source)))?;
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| compile_error(e.emit_to_string(source)))?;

        let layout = Self {
            label: label.to_owned(),
            uniforms: collect_uniforms(&module),
            attributes: collect_attributes(&module),
        };
        tracing::debug!(
            program = label,
            uniforms = layout.uniforms.len(),
            attributes = layout.attributes.len(),
            "shader reflected"
        );
        Ok(layout)
    }

    /// Reflect a program and check every name it declares as required.
    pub fn check(program: &ProgramSpec) -> Result<Self, SetupError> {
        let layout = Self::reflect(program.label, program.source)?;
        for name in program.uniforms {
            layout.require_uniform(name)?;
        }
        for name in program.attributes {
            layout.require_attribute(name)?;
        }
        Ok(layout)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformSlot)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn require_uniform(&self, name: &str) -> Result<UniformSlot, SetupError> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| SetupError::MissingUniform {
                program: self.label.clone(),
                name: name.to_owned(),
            })
    }

    /// Shader location of a vertex input.
    pub fn require_attribute(&self, name: &str) -> Result<u32, SetupError> {
        self.attributes
            .get(name)
            .copied()
            .ok_or_else(|| SetupError::MissingAttribute {
                program: self.label.clone(),
                name: name.to_owned(),
            })
    }
}

fn collect_uniforms(module: &Module) -> BTreeMap<String, UniformSlot> {
    let mut out = BTreeMap::new();
    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let Some(binding) = &var.binding else {
            continue;
        };
        let ty = &module.types[var.ty];
        if let Some(name) = &var.name {
            out.insert(
                name.clone(),
                UniformSlot {
                    group: binding.group,
                    binding: binding.binding,
                    offset: 0,
                    size: ty.inner.size(module.to_ctx()),
                },
            );
        }
        if let TypeInner::Struct { members, .. } = &ty.inner {
            for member in members {
                let Some(name) = &member.name else { continue };
                out.insert(
                    name.clone(),
                    UniformSlot {
                        group: binding.group,
                        binding: binding.binding,
                        offset: member.offset,
                        size: module.types[member.ty].inner.size(module.to_ctx()),
                    },
                );
            }
        }
    }
    out
}

fn collect_attributes(module: &Module) -> BTreeMap<String, u32> {
    let mut out = BTreeMap::new();
    let vertex_entries = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == ShaderStage::Vertex);
    for entry in vertex_entries {
        for arg in &entry.function.arguments {
            match (&arg.binding, &arg.name) {
                (Some(Binding::Location { location, .. }), Some(name)) => {
                    out.insert(name.clone(), *location);
                }
                (None, _) => {
                    if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                        for member in members {
                            if let (Some(Binding::Location { location, .. }), Some(name)) =
                                (&member.binding, &member.name)
                            {
                                out.insert(name.clone(), *location);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{FIRE_POINT_PROGRAM, FIRE_SHELL_PROGRAM, PROGRAMS, SCENE_PROGRAM};
    use crate::uniforms::{FirePointUniforms, FireShellUniforms, FrameUniforms, ObjectUniforms};
    use std::mem::{offset_of, size_of};

    #[test]
    fn every_program_validates_and_exposes_its_names() {
        for program in &PROGRAMS {
            let layout = ProgramLayout::check(program)
                .unwrap_or_else(|e| panic!("program {} failed: {e}", program.label));
            assert_eq!(layout.label(), program.label);
        }
    }

    #[test]
    fn vertex_locations_match_buffer_layouts() {
        let scene = ProgramLayout::check(&SCENE_PROGRAM).unwrap();
        assert_eq!(scene.require_attribute("position").unwrap(), 0);
        assert_eq!(scene.require_attribute("normal").unwrap(), 1);

        let fire = ProgramLayout::check(&FIRE_POINT_PROGRAM).unwrap();
        assert_eq!(fire.require_attribute("position").unwrap(), 0);
        assert_eq!(fire.require_attribute("size").unwrap(), 1);
        assert_eq!(fire.require_attribute("seed").unwrap(), 2);

        let shell = ProgramLayout::check(&FIRE_SHELL_PROGRAM).unwrap();
        assert_eq!(shell.require_attribute("uv").unwrap(), 2);
    }

    #[test]
    fn scene_uniform_offsets_match_host_structs() {
        let layout = ProgramLayout::check(&SCENE_PROGRAM).unwrap();
        let offset = |name: &str| layout.require_uniform(name).unwrap().offset as usize;

        let frame = layout.require_uniform("frame").unwrap();
        assert_eq!((frame.group, frame.binding), (0, 0));
        assert_eq!(frame.size as usize, size_of::<FrameUniforms>());
        assert_eq!(offset("camera_position"), offset_of!(FrameUniforms, camera_position));
        assert_eq!(offset("fog_params"), offset_of!(FrameUniforms, fog_params));
        assert_eq!(offset("fire_light_falloff"), offset_of!(FrameUniforms, fire_light_falloff));

        let object = layout.require_uniform("object").unwrap();
        assert_eq!((object.group, object.binding), (1, 0));
        assert_eq!(object.size as usize, size_of::<ObjectUniforms>());
        assert_eq!(offset("emissive"), offset_of!(ObjectUniforms, emissive));
    }

    #[test]
    fn fire_uniform_offsets_match_host_structs() {
        let point = ProgramLayout::check(&FIRE_POINT_PROGRAM).unwrap();
        let block = point.require_uniform("fire").unwrap();
        assert_eq!(block.size as usize, size_of::<FirePointUniforms>());
        for (name, offset) in [
            ("tip_color", offset_of!(FirePointUniforms, tip_color)),
            ("time", offset_of!(FirePointUniforms, time)),
            ("point_scale", offset_of!(FirePointUniforms, point_scale)),
            ("viewport", offset_of!(FirePointUniforms, viewport)),
        ] {
            assert_eq!(point.require_uniform(name).unwrap().offset as usize, offset, "{name}");
        }

        let shell = ProgramLayout::check(&FIRE_SHELL_PROGRAM).unwrap();
        let block = shell.require_uniform("shell").unwrap();
        assert_eq!(block.size as usize, size_of::<FireShellUniforms>());
        for (name, offset) in [
            ("model", offset_of!(FireShellUniforms, model)),
            ("color3", offset_of!(FireShellUniforms, color3)),
            ("time", offset_of!(FireShellUniforms, time)),
            ("distortion", offset_of!(FireShellUniforms, distortion)),
        ] {
            assert_eq!(shell.require_uniform(name).unwrap().offset as usize, offset, "{name}");
        }
    }

    #[test]
    fn missing_names_are_reported() {
        let layout = ProgramLayout::check(&FIRE_POINT_PROGRAM).unwrap();
        match layout.require_uniform("projectionMatrix") {
            Err(SetupError::MissingUniform { program, name }) => {
                assert_eq!(program, "fire_point");
                assert_eq!(name, "projectionMatrix");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            layout.require_attribute("normal"),
            Err(SetupError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn broken_source_reports_diagnostics() {
        let err = ProgramLayout::reflect("broken", "fn main( { }").unwrap_err();
        match err {
            SetupError::ShaderCompile { label, log } => {
                assert_eq!(label, "broken");
                assert!(!log.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn type_errors_fail_validation() {
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f32 = 1.0;
    return x;
}
"#;
        assert!(matches!(
            ProgramLayout::reflect("mistyped", src),
            Err(SetupError::ShaderCompile { .. })
        ));
    }
}
