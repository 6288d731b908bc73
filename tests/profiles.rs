// tests/profiles.rs
//
// Profile classification and re-encoding into the best native format.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use lazy_palette::engine::{encode_webp, ContainerFormat, Frame, Picture, PixelMode};
use lazy_palette::ops::{OutputFormat, SaveOptionsTable};
use lazy_palette::profile::{Category, ImageCategory, ProfileKind, SupportedProfiles};

fn rgba(alpha: u8) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(8, 8, |x, y| {
        Rgba([(x * 30) as u8, (y * 30) as u8, 90, alpha])
    }))
}

fn picture(format: ContainerFormat, mode: PixelMode, frames: Vec<DynamicImage>, marker: bool) -> Picture {
    let frames = frames
        .into_iter()
        .map(|image| Frame {
            image,
            delay_ms: 80,
        })
        .collect();
    Picture::new(Some(format), mode, frames, marker).unwrap()
}

fn optimize(picture: &Picture) -> (Option<OutputFormat>, Vec<u8>) {
    let supported = SupportedProfiles::default();
    let mut profile = ImageCategory::new(picture, &supported)
        .require_profile()
        .unwrap();
    let mut out = Vec::new();
    let written = profile
        .optimize(&mut out, &SaveOptionsTable::default())
        .unwrap();
    (written, out)
}

fn profile_of(bytes: &[u8]) -> ProfileKind {
    let picture = Picture::decode(bytes).unwrap();
    let supported = SupportedProfiles::default();
    let kind = ImageCategory::new(&picture, &supported)
        .require_profile()
        .unwrap()
        .kind();
    kind
}

#[test]
fn test_opaque_webp_rgba_goes_to_jpeg() {
    let pic = picture(ContainerFormat::WebP, PixelMode::Rgba, vec![rgba(255)], false);
    let (written, bytes) = optimize(&pic);
    assert_eq!(written, Some(OutputFormat::Jpeg));
    assert_eq!(profile_of(&bytes), ProfileKind::JpegRgb);
}

#[test]
fn test_translucent_webp_rgba_goes_to_png() {
    let bytes = encode_webp(&rgba(128), 90).unwrap();
    assert_eq!(profile_of(&bytes), ProfileKind::WebpRgba);

    let pic = Picture::decode(&bytes).unwrap();
    let (written, out) = optimize(&pic);
    assert_eq!(written, Some(OutputFormat::Png));
    let png = Picture::decode(&out).unwrap();
    assert_eq!(png.format(), Some(ContainerFormat::Png));
    assert_eq!(png.dimensions(), (8, 8));
}

#[test]
fn test_png_rgba_optimized_only_with_translucency() {
    let supported = SupportedProfiles::default();

    let translucent = picture(ContainerFormat::Png, PixelMode::Rgba, vec![rgba(10)], false);
    let profile = ImageCategory::new(&translucent, &supported)
        .require_profile()
        .unwrap();
    assert_eq!(profile.kind(), ProfileKind::PngRgba);
    assert!(profile.is_optimized());

    let opaque = picture(ContainerFormat::Png, PixelMode::Rgba, vec![rgba(255)], false);
    let (written, bytes) = optimize(&opaque);
    assert_eq!(written, Some(OutputFormat::Jpeg));
    assert_eq!(profile_of(&bytes), ProfileKind::JpegRgb);
}

#[test]
fn test_single_frame_gif_falls_back_by_transparency_marker() {
    let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 6, Rgb([200, 10, 10])));

    let plain = picture(ContainerFormat::Gif, PixelMode::P, vec![frame.clone()], false);
    let category = ImageCategory::new(&plain, &SupportedProfiles::default()).category();
    assert_eq!(category, Category::Animated);
    let (written, bytes) = optimize(&plain);
    assert_eq!(written, Some(OutputFormat::Jpeg));
    assert_eq!(profile_of(&bytes), ProfileKind::JpegRgb);

    let marked = picture(ContainerFormat::Gif, PixelMode::P, vec![frame], true);
    let (written, bytes) = optimize(&marked);
    assert_eq!(written, Some(OutputFormat::Png));
    let png = Picture::decode(&bytes).unwrap();
    assert_eq!(png.format(), Some(ContainerFormat::Png));
    assert!(!png.is_animated());
}

#[test]
fn test_multi_frame_gif_is_already_optimized() {
    let frames = vec![rgba(255), rgba(255)];
    let pic = picture(ContainerFormat::Gif, PixelMode::P, frames, false);
    let supported = SupportedProfiles::default();
    let profile = ImageCategory::new(&pic, &supported).require_profile().unwrap();
    assert_eq!(profile.kind(), ProfileKind::GifP);
    assert!(profile.is_optimized());
}

#[test]
fn test_animated_webp_goes_to_gif() {
    let pic = picture(
        ContainerFormat::WebP,
        PixelMode::Rgb,
        vec![rgba(255).to_rgb8().into(), rgba(255).to_rgb8().into()],
        false,
    );
    let (written, bytes) = optimize(&pic);
    assert_eq!(written, Some(OutputFormat::Gif));

    let decoded = Picture::decode(&bytes).unwrap();
    assert_eq!(decoded.frame_count(), 2);
    assert_eq!(profile_of(&bytes), ProfileKind::GifP);
}

#[test]
fn test_jpeg_has_no_fallback() {
    let pic = picture(
        ContainerFormat::Jpeg,
        PixelMode::Rgb,
        vec![DynamicImage::ImageRgb8(RgbImage::new(4, 4))],
        false,
    );
    let (written, bytes) = optimize(&pic);
    assert_eq!(written, None);
    assert!(bytes.is_empty());
}

#[test]
fn test_narrowed_registry_rejects_unregistered_profiles() {
    let mut supported = SupportedProfiles::empty();
    supported.register(ProfileKind::JpegRgb);

    let pic = picture(ContainerFormat::Png, PixelMode::Rgb, vec![rgba(255).to_rgb8().into()], false);
    let category = ImageCategory::new(&pic, &supported);
    assert!(!category.is_supported());
    assert!(category.require_profile().is_err());
}
