//! Benchmarks: atlas packing, glyph blitting and mapping image encoding.
//!
//! Run with: cargo bench --package tessera-font

use std::collections::HashMap;
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tessera_font::{
    encode_atlas_mapping, AtlasGeometry, AtlasPos, FaceMetrics, FixedSize, Font, FontError,
    Glyph, GlyphFace, LoadMode, PixelMode,
};

// ── Synthetic face ──

/// Scalable face that renders every codepoint as the same filled box.
struct BoxFace {
    codepoints: Vec<u32>,
}

impl BoxFace {
    fn new(count: u32) -> Self {
        let codepoints = (0x20..0x20 + count)
            .filter(|&c| char::from_u32(c).is_some())
            .collect();
        Self { codepoints }
    }
}

impl GlyphFace for BoxFace {
    fn describe(&self) -> String {
        format!("box face, {} glyphs", self.codepoints.len())
    }

    fn codepoints(&self) -> Vec<u32> {
        self.codepoints.clone()
    }

    fn fixed_sizes(&self) -> Vec<FixedSize> {
        Vec::new()
    }

    fn metrics(&self) -> FaceMetrics {
        FaceMetrics {
            units_per_em: 2048,
            ascender: 1638.0,
            descender: -410.0,
            max_advance: 1229.0,
            underline_position: -200.0,
            underline_thickness: 100.0,
        }
    }

    fn rasterize(&mut self, _codepoint: u32, ppem: f32) -> Result<Glyph, FontError> {
        let side = (ppem * 0.5) as u32;
        Ok(Glyph {
            width: side,
            rows: side,
            pitch: side as usize,
            left: 1,
            top: side as i32,
            mode: PixelMode::Gray,
            buffer: vec![0xff; (side * side) as usize],
        })
    }
}

// ── Geometry ──

fn bench_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("atlas_geometry");
    for &n in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| AtlasGeometry::compute(black_box(n), 8, 16));
        });
    }
    group.finish();
}

// ── Atlas build ──

fn bench_font_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("font_build");
    for &(count, label) in &[(256u32, "256"), (4_096, "4K"), (30_000, "30K")] {
        let face = BoxFace::new(count);
        group.throughput(Throughput::Elements(face.codepoints.len() as u64));
        group.bench_with_input(BenchmarkId::new("primary", label), &count, |b, &count| {
            b.iter(|| {
                let mut face = BoxFace::new(count);
                Font::from_face(&mut face, Path::new("box.ttf"), LoadMode::Primary, 16)
            });
        });
    }
    group.finish();
}

// ── Mapping image ──

fn bench_mapping(c: &mut Criterion) {
    let map: HashMap<u16, AtlasPos> = (0u16..20_000)
        .map(|c| (c, AtlasPos::new((c % 200) as u8, (c / 200) as u8)))
        .collect();
    c.bench_function("encode_atlas_mapping/20K", |b| {
        b.iter(|| encode_atlas_mapping(black_box(&map)));
    });
}

criterion_group!(benches, bench_geometry, bench_font_build, bench_mapping);
criterion_main!(benches);
