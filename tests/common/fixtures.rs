//! Test images, encoded in memory.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Encode an RGB grid in the given format
pub fn encode(grid: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(grid)
        .write_to(&mut buffer, format)
        .expect("Failed to encode test image");
    buffer.into_inner()
}

/// 2x2 image: red, red / blue, green
pub fn red_red_blue_green() -> RgbImage {
    let mut grid = RgbImage::new(2, 2);
    grid.put_pixel(0, 0, Rgb(RED));
    grid.put_pixel(1, 0, Rgb(RED));
    grid.put_pixel(0, 1, Rgb(BLUE));
    grid.put_pixel(1, 1, Rgb(GREEN));
    grid
}

pub fn red_red_blue_green_png() -> Vec<u8> {
    encode(red_red_blue_green(), ImageFormat::Png)
}

/// 1x1 pure white
pub fn white_pixel_png() -> Vec<u8> {
    encode(RgbImage::from_pixel(1, 1, Rgb(WHITE)), ImageFormat::Png)
}

/// Solid image in a lossless format
pub fn solid(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    encode(RgbImage::from_pixel(width, height, Rgb(color)), format)
}
