use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, ImageFormat, RgbImage};
use lazy_palette::color::{ColorCluster, DominantColor, PaletteSlice, RangeColorPalette};
use lazy_palette::engine::{resize, Picture};
use lazy_palette::ops::{ResampleFilter, ResizeOptions};
use lazy_palette::{extract_palette, SupportedProfiles};
use std::hint::black_box;
use std::io::Cursor;

fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        // Quantized gradient: a few hundred distinct colors
        image::Rgb([(x / 16 * 16) as u8, (y / 16 * 16) as u8, 128])
    }))
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    for size in [64u32, 256, 1024] {
        let img = create_test_image(size, size);
        group.bench_with_input(BenchmarkId::new("dominant", size), &img, |b, img| {
            b.iter(|| {
                let cluster = ColorCluster::new(black_box(img));
                DominantColor::new(&cluster).palette_data_as_hex().unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("top_10", size), &img, |b, img| {
            b.iter(|| {
                let cluster = ColorCluster::new(black_box(img));
                RangeColorPalette::new(&cluster)
                    .palette_data_as_hex(PaletteSlice::to(10))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_extract_palette(c: &mut Criterion) {
    let mut png = Vec::new();
    create_test_image(512, 512)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let supported = SupportedProfiles::default();

    c.bench_function("extract_palette_png_512", |b| {
        b.iter(|| extract_palette(black_box(&png), &supported, PaletteSlice::to(5)).unwrap())
    });
    c.bench_function("decode_png_512", |b| {
        b.iter(|| Picture::decode(black_box(&png)).unwrap())
    });
}

fn bench_resize(c: &mut Criterion) {
    let img = create_test_image(2048, 1536);
    let mut group = c.benchmark_group("resize_2048_to_256");
    for (name, options) in [
        ("lanczos", ResizeOptions::new(256, 256).resample(ResampleFilter::Lanczos)),
        (
            "lanczos_reducing_gap",
            ResizeOptions::new(256, 256)
                .resample(ResampleFilter::Lanczos)
                .reducing_gap(3.0),
        ),
        ("bicubic", ResizeOptions::new(256, 256)),
    ] {
        group.bench_function(name, |b| b.iter(|| resize(black_box(&img), &options).unwrap()));
    }
    group.finish();
}

criterion_group!(benches, bench_clustering, bench_extract_palette, bench_resize);
criterion_main!(benches);
