// WGSL shader source code for the cell compute pass and the blit pass.

/// One invocation per grid cell: resolves the cell's glyph through the mapping
/// image and paints its `px * py` block of the output image.
pub const COMPUTE_SHADER: &str = r#"
struct Params {
    glyph_size_chars: vec4<i32>,
    cursor_pos: vec4<i32>,
    cursor_color_style: vec4<i32>,
    select_rect: vec4<i32>,
    select_state: vec4<i32>,
    flags: vec4<i32>,
    ul_metrics: array<vec4<f32>, 4>,
};

struct Cell {
    codepoint: u32,
    attrs: u32,
    fg: u32,
    bg: u32,
};

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var out_image: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var atlas: texture_2d_array<f32>;
@group(0) @binding(3) var atlas_map: texture_2d<u32>;
@group(0) @binding(4) var dw_atlas: texture_2d_array<f32>;
@group(0) @binding(5) var dw_atlas_map: texture_2d<u32>;
@group(0) @binding(6) var<storage, read> cells: array<Cell>;

const ATTR_BOLD: u32 = 0x01u;
const ATTR_ITALIC: u32 = 0x02u;
const ATTR_UNDERLINE: u32 = 0x04u;
const ATTR_INVERSE: u32 = 0x08u;
const ATTR_WRAP: u32 = 0x10u;
const ATTR_DOUBLE_WIDTH: u32 = 0x20u;
const ATTR_DOUBLE_WIDTH_CONT: u32 = 0x40u;
const ATTR_DIRTY: u32 = 0x80u;

const CURSOR_HIDDEN: i32 = 0;
const CURSOR_FILLED_BLOCK: i32 = 1;
const CURSOR_HOLLOW_BLOCK: i32 = 2;
const CURSOR_UNDERLINE: i32 = 3;
const CURSOR_BEAM: i32 = 4;

fn unpack_rgb(c: u32) -> vec3<f32> {
    return vec3<f32>(
        f32((c >> 16u) & 0xffu),
        f32((c >> 8u) & 0xffu),
        f32(c & 0xffu),
    ) / 255.0;
}

fn is_selected(pos: vec2<i32>, cols: i32) -> bool {
    let tl = params.select_rect.xy;
    let br = params.select_rect.zw;
    if (all(tl == br)) {
        return false;
    }
    if (params.select_state.z != 0) {
        return pos.x >= tl.x && pos.x < br.x && pos.y >= tl.y && pos.y <= br.y;
    }
    let idx = pos.y * cols + pos.x;
    return idx >= tl.y * cols + tl.x && idx < br.y * cols + br.x;
}

fn ul_metric(index: i32) -> vec2<f32> {
    let row = params.ul_metrics[index / 2];
    return select(row.xy, row.zw, index % 2 == 1);
}

fn cursor_covers(cursor_style: i32, x: i32, y: i32, glyph: vec2<i32>) -> bool {
    if (cursor_style == CURSOR_HOLLOW_BLOCK) {
        return x == 0 || y == 0 || x == glyph.x - 1 || y == glyph.y - 1;
    }
    if (cursor_style == CURSOR_UNDERLINE) {
        return y >= glyph.y - max(1, glyph.y / 8);
    }
    if (cursor_style == CURSOR_BEAM) {
        return x < max(1, glyph.x / 8);
    }
    return false;
}

@compute @workgroup_size(1)
fn cs_main(@builtin(global_invocation_id) id: vec3<u32>) {
    let glyph = params.glyph_size_chars.xy;
    let chars = params.glyph_size_chars.zw;
    let pos = vec2<i32>(id.xy);
    if (pos.x >= chars.x || pos.y >= chars.y) {
        return;
    }

    let idx = pos.y * chars.x + pos.x;
    let cell = cells[idx];

    let at_cursor = all(pos == params.cursor_pos.xy);
    let was_cursor = all(pos == params.cursor_pos.zw);
    let damaged = idx >= params.select_state.x && idx < params.select_state.y;
    if (params.select_state.w != 0 && (cell.attrs & ATTR_DIRTY) == 0u
        && !at_cursor && !was_cursor && !damaged) {
        return;
    }

    var fg = unpack_rgb(cell.fg);
    var bg = unpack_rgb(cell.bg);
    if ((cell.attrs & ATTR_INVERSE) != 0u) {
        let t = fg;
        fg = bg;
        bg = t;
    }
    if (is_selected(pos, chars.x)) {
        let t = fg;
        fg = bg;
        bg = t;
    }

    let cursor_style = params.cursor_color_style.w;
    let cursor_color = vec3<f32>(params.cursor_color_style.xyz) / 255.0;
    let show_cursor = at_cursor && cursor_style != CURSOR_HIDDEN;
    if (show_cursor && cursor_style == CURSOR_FILLED_BLOCK) {
        fg = bg;
        bg = cursor_color;
    }

    var font_layer = 0;
    if ((cell.attrs & ATTR_BOLD) != 0u) {
        font_layer += 1;
    }
    if ((cell.attrs & ATTR_ITALIC) != 0u) {
        font_layer += 2;
    }

    let cp = cell.codepoint & 0xffffu;
    let map_coord = vec2<i32>(i32(cp & 0xffu), i32(cp >> 8u));
    let wide = params.flags.y != 0
        && (cell.attrs & (ATTR_DOUBLE_WIDTH | ATTR_DOUBLE_WIDTH_CONT)) != 0u;

    var atlas_pos: vec2<i32>;
    var x_shift = 0;
    var ul = ul_metric(font_layer);
    if (wide) {
        atlas_pos = vec2<i32>(textureLoad(dw_atlas_map, map_coord, 0).xy);
        if ((cell.attrs & ATTR_DOUBLE_WIDTH_CONT) != 0u) {
            x_shift = glyph.x;
        }
        ul = ul_metric(font_layer + 4);
    } else {
        atlas_pos = vec2<i32>(textureLoad(atlas_map, map_coord, 0).xy);
    }

    let ul_top = floor(ul.x);
    let ul_bottom = ul_top + max(1.0, round(ul.y));
    let underline = (cell.attrs & ATTR_UNDERLINE) != 0u;
    let wrap_mark = params.flags.x != 0 && (cell.attrs & ATTR_WRAP) != 0u;
    let origin = pos * glyph;

    for (var y = 0; y < glyph.y; y++) {
        for (var x = 0; x < glyph.x; x++) {
            var a: f32;
            if (wide) {
                let slot = atlas_pos * vec2<i32>(glyph.x * 2, glyph.y);
                a = textureLoad(dw_atlas, slot + vec2<i32>(x + x_shift, y), 0, 0).r;
            } else {
                let slot = atlas_pos * glyph;
                a = textureLoad(atlas, slot + vec2<i32>(x, y), font_layer, 0).r;
            }

            let fy = f32(y);
            if (underline && fy >= ul_top && fy < ul_bottom) {
                a = 1.0;
            }

            var color = mix(bg, fg, a);
            if (wrap_mark && x == glyph.x - 1 && y >= glyph.y / 2) {
                color = mix(color, fg, 0.5);
            }
            if (show_cursor && cursor_covers(cursor_style, x, y, glyph)) {
                color = cursor_color;
            }
            textureStore(out_image, origin + vec2<i32>(x, y), vec4<f32>(color, 1.0));
        }
    }
}
"#;

/// Blits the compute output image 1:1 onto the border-inset viewport.
pub const DRAW_SHADER: &str = r#"
struct DrawParams {
    view_pixels: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: DrawParams;
@group(0) @binding(1) var frame_image: texture_2d<f32>;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) texcoord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texcoord: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 0.0, 1.0);
    out.texcoord = in.texcoord;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = vec2<i32>(floor(in.texcoord * params.view_pixels));
    return textureLoad(frame_image, texel, 0);
}
"#;
