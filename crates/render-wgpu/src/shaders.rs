//! WGSL sources and the names each program must expose.

/// A shader program plus the uniform members and vertex attributes the
/// renderer binds by name.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSpec {
    pub label: &'static str,
    pub source: &'static str,
    pub uniforms: &'static [&'static str],
    pub attributes: &'static [&'static str],
}

pub const SCENE_PROGRAM: ProgramSpec = ProgramSpec {
    label: "scene",
    source: SCENE_SHADER,
    uniforms: &[
        "projection",
        "view",
        "camera_position",
        "light_direction",
        "fog_color",
        "fog_params",
        "fire_light",
        "fire_light_color",
        "fire_light_falloff",
        "model",
        "color",
        "emissive",
    ],
    attributes: &["position", "normal"],
};

pub const FIRE_POINT_PROGRAM: ProgramSpec = ProgramSpec {
    label: "fire_point",
    source: FIRE_POINT_SHADER,
    uniforms: &[
        "projection",
        "view",
        "core_color",
        "tip_color",
        "time",
        "point_scale",
        "viewport",
    ],
    attributes: &["position", "size", "seed"],
};

pub const FIRE_SHELL_PROGRAM: ProgramSpec = ProgramSpec {
    label: "fire_shell",
    source: FIRE_SHELL_SHADER,
    uniforms: &[
        "projection",
        "view",
        "model",
        "color1",
        "color2",
        "color3",
        "time",
        "noise_scale",
        "distortion",
    ],
    attributes: &["position", "uv"],
};

pub const PROGRAMS: [ProgramSpec; 3] = [SCENE_PROGRAM, FIRE_POINT_PROGRAM, FIRE_SHELL_PROGRAM];

/// Blinn-Phong with linear fog and the flickering fire point light.
pub const SCENE_SHADER: &str = r#"
struct Frame {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    camera_position: vec4<f32>,
    // Direction the light travels in.
    light_direction: vec4<f32>,
    fog_color: vec4<f32>,
    // x: near, y: far
    fog_params: vec4<f32>,
    // xyz: position, w: intensity
    fire_light: vec4<f32>,
    fire_light_color: vec4<f32>,
    // x: range, y: decay
    fire_light_falloff: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    // w: shininess
    color: vec4<f32>,
    emissive: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

@group(1) @binding(0)
var<uniform> object: Object;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) view_depth: f32,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);
    let view_pos = frame.view * world;

    var out: VertexOutput;
    out.clip_position = frame.projection * view_pos;
    out.world_position = world.xyz;
    out.world_normal = normalize((object.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.view_depth = -view_pos.z;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let light_dir = normalize(frame.light_direction.xyz);
    let view_dir = normalize(frame.camera_position.xyz - in.world_position);

    let diffuse = max(dot(n, -light_dir), 0.0);
    let half_dir = normalize(view_dir - light_dir);
    let specular = vec3<f32>(0.07) * pow(max(dot(n, half_dir), 0.0), object.color.w);

    let to_fire = frame.fire_light.xyz - in.world_position;
    let fire_distance = length(to_fire);
    let falloff = pow(saturate(1.0 - fire_distance / frame.fire_light_falloff.x), frame.fire_light_falloff.y);
    let fire_diffuse = max(dot(n, to_fire / max(fire_distance, 0.0001)), 0.0);
    let fire = frame.fire_light_color.rgb * (frame.fire_light.w * falloff * fire_diffuse);

    var color = object.color.rgb * (vec3<f32>(0.35 + 0.65 * diffuse) + fire)
        + object.emissive.rgb
        + specular;

    let fog = saturate((in.view_depth - frame.fog_params.x) / (frame.fog_params.y - frame.fog_params.x));
    color = mix(color, frame.fog_color.rgb, fog);
    return vec4<f32>(color, 1.0);
}
"#;

/// 3D simplex noise (Ashima Arts / Stefan Gustavson, MIT).
macro_rules! simplex_wgsl {
    () => {
        r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4((x * 34.0 + 1.0) * x);
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn snoise(v: vec3<f32>) -> f32 {
    let c = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let d = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, c.yyy));
    let x0 = v - i + dot(i, c.xxx);

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + c.xxx;
    let x2 = x0 - i2 + c.yyy;
    let x3 = x0 - d.yyy;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
        + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
        + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 0.142857142857;
    let ns = n_ * d.wyz - d.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);
    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);
    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 = p0 * norm.x;
    p1 = p1 * norm.y;
    p2 = p2 * norm.z;
    p3 = p3 * norm.w;

    var m = max(0.6 - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}
"#
    };
}

/// Billboard fire: one instanced quad per sample, additive.
pub const FIRE_POINT_SHADER: &str = concat!(
    simplex_wgsl!(),
    r#"
struct Fire {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    // w: output gain
    core_color: vec4<f32>,
    tip_color: vec4<f32>,
    time: f32,
    point_scale: f32,
    viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> fire: Fire;

struct SampleInput {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) seed: f32,
};

struct SpriteOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) sprite_coord: vec2<f32>,
    @location(2) seed: f32,
};

@vertex
fn vs_fire(@builtin(vertex_index) corner_index: u32, input: SampleInput) -> SpriteOutput {
    var p = input.position;
    p.y = p.y + sin(fire.time * 1.4 + input.seed * 6.0) * 0.02;

    let view_pos = fire.view * vec4<f32>(p, 1.0);
    let size_px = input.size * (fire.point_scale / max(-view_pos.z, 1.0));
    let clip = fire.projection * view_pos;

    let corner = vec2<f32>(f32(corner_index & 1u), f32((corner_index >> 1u) & 1u));
    let offset = (corner * 2.0 - 1.0) * size_px / fire.viewport;

    var out: SpriteOutput;
    out.clip_position = vec4<f32>(clip.xy + offset * clip.w, clip.zw);
    out.world_position = p;
    out.sprite_coord = vec2<f32>(corner.x, 1.0 - corner.y);
    out.seed = input.seed;
    return out;
}

@fragment
fn fs_fire(in: SpriteOutput) -> @location(0) vec4<f32> {
    let dist = distance(in.sprite_coord, vec2<f32>(0.5));
    let base = 1.0 - smoothstep(0.1, 0.52, dist);

    let q = in.world_position;
    let n = clamp(snoise(vec3<f32>(q.x * 2.2, q.y * 3.2 + fire.time * 0.8, q.z * 2.2 + in.seed)) * 0.5 + 0.5, 0.0, 1.0);
    let flicker = 0.65 + 0.35 * n;
    let height_glow = clamp(q.y * 2.6, 0.0, 1.0);
    let intensity = base * flicker * (0.6 + height_glow);

    let color = mix(fire.core_color.rgb, fire.tip_color.rgb, height_glow) * intensity * fire.core_color.w;
    return vec4<f32>(color, intensity);
}
"#
);

/// Cone fire: value noise over the mesh UVs. Colour is left unmodulated;
/// the additive blend applies alpha once.
pub const FIRE_SHELL_SHADER: &str = r#"
struct Shell {
    projection: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    color1: vec4<f32>,
    color2: vec4<f32>,
    color3: vec4<f32>,
    time: f32,
    noise_scale: f32,
    distortion: f32,
    padding: f32,
};

@group(0) @binding(0)
var<uniform> shell: Shell;

struct ShellInput {
    @location(0) position: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct ShellOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_shell(input: ShellInput) -> ShellOutput {
    var out: ShellOutput;
    out.clip_position = shell.projection * shell.view * shell.model * vec4<f32>(input.position, 1.0);
    out.uv = input.uv;
    return out;
}

fn hash2(p: vec2<f32>) -> f32 {
    return fract(sin(dot(p, vec2<f32>(127.1, 311.7))) * 43758.5453);
}

fn value_noise(p: vec2<f32>) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let a = hash2(i);
    let b = hash2(i + vec2<f32>(1.0, 0.0));
    let c = hash2(i + vec2<f32>(0.0, 1.0));
    let d = hash2(i + vec2<f32>(1.0, 1.0));
    let u = f * f * (3.0 - 2.0 * f);
    return mix(a, b, u.x) + (c - a) * u.y * (1.0 - u.x) + (d - b) * u.x * u.y;
}

@fragment
fn fs_shell(in: ShellOutput) -> @location(0) vec4<f32> {
    let t = shell.time;
    let height = clamp(in.uv.y, 0.0, 1.0);
    let swirl = vec2<f32>(in.uv.x * 3.0, in.uv.y * 4.0 + t * 1.8);
    let n = value_noise(swirl * shell.noise_scale + vec2<f32>(t * 0.4, -t * 0.7));

    let flicker = smoothstep(0.2, 1.0, n + height * 0.4);
    let shape = smoothstep(0.0, 0.6, height) * (1.0 - smoothstep(0.75, 1.0, height));
    let edge = 1.0 - smoothstep(0.4, 0.8, abs(in.uv.x - 0.5) + n * shell.distortion);

    var base = mix(shell.color3.rgb, shell.color2.rgb, height);
    base = mix(base, shell.color1.rgb, pow(height, 1.4));
    let alpha = flicker * shape * edge;
    return vec4<f32>(base, alpha);
}
"#;
