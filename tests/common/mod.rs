#![allow(dead_code)]

use std::path::Path;

use cocorecord::Annotation;
use cocorecord::store::image_file_name;
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Write a small RGB JPEG named after `image_id` into `dir`.
pub fn write_rgb_jpeg(dir: &Path, image_id: i64, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 20) as u8, (y * 20) as u8, (image_id * 30) as u8])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&img)
        .unwrap();
    std::fs::write(dir.join(image_file_name(image_id)), buf).unwrap();
}

/// Write a single-channel JPEG named after `image_id` into `dir`.
pub fn write_gray_jpeg(dir: &Path, image_id: i64, width: u32, height: u32) {
    let img = GrayImage::from_pixel(width, height, Luma([77]));
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&img)
        .unwrap();
    std::fs::write(dir.join(image_file_name(image_id)), buf).unwrap();
}

/// `count` annotations cycling over image ids `1..=images`.
pub fn synthetic_annotations(count: usize, images: i64) -> Vec<Annotation> {
    (0..count)
        .map(|i| {
            let i = i as i64;
            Annotation {
                area: 100.25 + i as f64 * 0.5,
                bbox: vec![i as f64 * 0.1, 2.5, 30.75, 40.125],
                category_id: 1 + i % 90,
                id: 1_000_000 + i,
                image_id: 1 + i % images,
            }
        })
        .collect()
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
