//! WGSL sources for the renderers

/// Points (instanced screen-space squares) and line lists sharing one uniform
pub const SCENE_SHADER: &str = r#"
struct SceneUniform {
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    point_size: f32,
    linearize: f32,
};

@group(0) @binding(0) var<uniform> scene: SceneUniform;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_point(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );

    let center = scene.view_proj * vec4<f32>(position, 1.0);
    let offset = corners[vertex_index] * scene.point_size / scene.viewport;

    var out: VertexOutput;
    out.clip_position = center + vec4<f32>(offset * center.w, 0.0, 0.0);
    out.color = color;
    return out;
}

@vertex
fn vs_line(
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = scene.view_proj * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = select(in.color, pow(in.color, vec3<f32>(2.2)), scene.linearize > 0.5);
    return vec4<f32>(color, 1.0);
}
"#;

/// Full-window textured triangle
pub const IMAGE_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;
    let x = f32((vertex_index & 1u) << 2u);
    let y = f32((vertex_index & 2u) << 1u);
    out.clip_position = vec4<f32>(x - 1.0, y - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(x * 0.5, 1.0 - y * 0.5);
    return out;
}

@group(0) @binding(0) var t_image: texture_2d<f32>;
@group(0) @binding(1) var s_image: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(t_image, s_image, in.uv);
}
"#;
