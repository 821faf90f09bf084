//! WGSL sources for the GPU backend.
//!
//! `STAR_SHADER` carries the device copy of the stereographic projection and
//! twinkle in `sky_core::projector` and `sky_core::star`; keep them in step.

/// Instanced star quads. Projection and twinkle run per vertex.
pub const STAR_SHADER: &str = r#"
struct Sky {
    // ra, dec, scale, time (seconds)
    view: vec4<f32>,
    // width, height, horizon epsilon, twinkle floor
    viewport: vec4<f32>,
};

struct Star {
    // ra, dec, radius (px), base opacity
    coord: vec4<f32>,
    // rgb, twinkle speed
    color: vec4<f32>,
    // twinkle phase, tier, unused, unused
    extra: vec4<f32>,
};

@group(0) @binding(0) var<uniform> sky: Sky;
@group(0) @binding(1) var<storage, read> stars: array<Star>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) color: vec4<f32>,
};

// Quad extent in units of the star radius; leaves room for the halo.
const HALO_EXTENT: f32 = 2.5;

fn celestial_to_unit(ra: f32, dec: f32) -> vec3<f32> {
    let cd = cos(dec);
    return vec3<f32>(cd * cos(ra), cd * sin(ra), sin(dec));
}

// About Z by -ra, then about Y by -dec.
fn rotate_to_view(v: vec3<f32>, ra: f32, dec: f32) -> vec3<f32> {
    let sr = sin(ra);
    let cr = cos(ra);
    let x1 = v.x * cr + v.y * sr;
    let y1 = -v.x * sr + v.y * cr;
    let sd = sin(dec);
    let cd = cos(dec);
    let x2 = x1 * cd + v.z * sd;
    let z2 = -x1 * sd + v.z * cd;
    return vec3<f32>(x2, y1, z2);
}

fn quad_corner(vid: u32) -> vec2<f32> {
    var corner = 0u;
    switch vid % 6u {
        case 0u: { corner = 0u; }
        case 1u, 4u: { corner = 1u; }
        case 2u, 3u: { corner = 2u; }
        default: { corner = 3u; }
    }
    return vec2<f32>(f32(corner & 1u) * 2.0 - 1.0, f32(corner >> 1u) * 2.0 - 1.0);
}

@vertex
fn vs_star(@builtin(vertex_index) vid: u32, @builtin(instance_index) iid: u32) -> VertexOutput {
    let star = stars[iid];
    var out: VertexOutput;

    let p = rotate_to_view(celestial_to_unit(star.coord.x, star.coord.y), sky.view.x, sky.view.y);
    if p.x <= sky.viewport.z {
        // Behind the horizon: park the vertex outside the clip volume.
        out.position = vec4<f32>(2.0, 2.0, 2.0, 1.0);
        out.local = vec2<f32>(0.0, 0.0);
        out.color = vec4<f32>(0.0, 0.0, 0.0, 0.0);
        return out;
    }

    let denom = 1.0 + p.x;
    let offset = vec2<f32>(2.0 * p.y / denom, -2.0 * p.z / denom) * sky.view.z;

    let wave = 0.5 + 0.5 * sin(sky.view.w * star.color.w + star.extra.x);
    let dim = sky.viewport.w;
    let opacity = star.coord.w * (dim + (1.0 - dim) * wave);

    let local = quad_corner(vid) * HALO_EXTENT;
    let pixel = sky.viewport.xy * 0.5 + offset + local * star.coord.z;
    let ndc = vec2<f32>(pixel.x / sky.viewport.x * 2.0 - 1.0, 1.0 - pixel.y / sky.viewport.y * 2.0);

    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.local = local;
    out.color = vec4<f32>(star.color.rgb, opacity);
    return out;
}

@fragment
fn fs_star(in: VertexOutput) -> @location(0) vec4<f32> {
    let r = length(in.local);
    let core = 1.0 - smoothstep(0.6, 1.0, r);
    let halo = exp(-r * r * 0.9) * 0.35;
    let a = clamp(core + halo, 0.0, 1.0) * in.color.a;
    if a < 0.002 {
        discard;
    }
    return vec4<f32>(in.color.rgb * a, a);
}
"#;

/// Constellation lines as host-built pixel-space quads.
pub const LINE_SHADER: &str = r#"
struct Sky {
    view: vec4<f32>,
    viewport: vec4<f32>,
};

@group(0) @binding(0) var<uniform> sky: Sky;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) across: f32,
};

@vertex
fn vs_line(
    @location(0) pixel: vec2<f32>,
    @location(1) across: f32,
    @location(2) color: vec4<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    let ndc = vec2<f32>(pixel.x / sky.viewport.x * 2.0 - 1.0, 1.0 - pixel.y / sky.viewport.y * 2.0);
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.color = color;
    out.across = across;
    return out;
}

@fragment
fn fs_line(in: VertexOutput) -> @location(0) vec4<f32> {
    let edge = 1.0 - smoothstep(0.5, 1.0, abs(in.across));
    let a = in.color.a * edge;
    return vec4<f32>(in.color.rgb * a, a);
}
"#;

/// Nebula lobes and galaxies, drawn into the cached background layer.
pub const GLOW_SHADER: &str = r#"
struct Sky {
    view: vec4<f32>,
    viewport: vec4<f32>,
};

struct Glow {
    // center x, center y, radius x, radius y (px)
    placement: vec4<f32>,
    // rgb, opacity
    color: vec4<f32>,
    // rotation, kind (0 lobe, 1 elliptical, 2 spiral), arms, unused
    shape: vec4<f32>,
};

@group(0) @binding(0) var<uniform> sky: Sky;
@group(0) @binding(1) var<storage, read> glows: array<Glow>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) shape: vec4<f32>,
};

fn quad_corner(vid: u32) -> vec2<f32> {
    var corner = 0u;
    switch vid % 6u {
        case 0u: { corner = 0u; }
        case 1u, 4u: { corner = 1u; }
        case 2u, 3u: { corner = 2u; }
        default: { corner = 3u; }
    }
    return vec2<f32>(f32(corner & 1u) * 2.0 - 1.0, f32(corner >> 1u) * 2.0 - 1.0);
}

@vertex
fn vs_glow(@builtin(vertex_index) vid: u32, @builtin(instance_index) iid: u32) -> VertexOutput {
    let glow = glows[iid];
    let local = quad_corner(vid);
    let c = cos(glow.shape.x);
    let s = sin(glow.shape.x);
    let scaled = local * glow.placement.zw;
    let rotated = vec2<f32>(scaled.x * c - scaled.y * s, scaled.x * s + scaled.y * c);
    let pixel = glow.placement.xy + rotated;
    let ndc = vec2<f32>(pixel.x / sky.viewport.x * 2.0 - 1.0, 1.0 - pixel.y / sky.viewport.y * 2.0);

    var out: VertexOutput;
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.local = local;
    out.color = glow.color;
    out.shape = glow.shape;
    return out;
}

fn lobe(r: f32) -> f32 {
    let t = 1.0 - smoothstep(0.0, 1.0, r);
    return t * t;
}

fn elliptical(r: f32) -> f32 {
    return exp(-r * r * 9.0) + 0.35 * lobe(r);
}

fn spiral(local: vec2<f32>, r: f32, arms: f32) -> f32 {
    let angle = atan2(local.y, local.x);
    let wind = angle - 3.2 * log(r + 0.08);
    let band = pow(0.5 + 0.5 * cos(arms * wind), 3.0);
    return exp(-r * r * 14.0) + band * lobe(r) * 0.8;
}

@fragment
fn fs_glow(in: VertexOutput) -> @location(0) vec4<f32> {
    let r = length(in.local);
    if r >= 1.0 {
        discard;
    }
    var intensity = 0.0;
    let kind = u32(in.shape.y + 0.5);
    switch kind {
        case 1u: { intensity = elliptical(r); }
        case 2u: { intensity = spiral(in.local, r, in.shape.z); }
        default: { intensity = lobe(r); }
    }
    let a = clamp(intensity * in.color.a, 0.0, 1.0);
    return vec4<f32>(in.color.rgb * a, a);
}
"#;

/// Fullscreen textured triangle: background layer and CPU frame presentation.
pub const COMPOSITE_SHADER: &str = r#"
@group(0) @binding(0) var layer: texture_2d<f32>;
@group(0) @binding(1) var layer_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_composite(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let corner = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    let ndc = corner * 2.0 - 1.0;
    var out: VertexOutput;
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

@fragment
fn fs_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(layer, layer_sampler, in.uv);
}
"#;

/// Every built-in shader, by label.
pub const ALL: &[(&str, &str)] = &[
    ("sky-star-shader", STAR_SHADER),
    ("sky-line-shader", LINE_SHADER),
    ("sky-glow-shader", GLOW_SHADER),
    ("sky-composite-shader", COMPOSITE_SHADER),
];
