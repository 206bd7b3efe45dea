#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use multiview_preparation::{CameraMetas, ImageArray, MultiViewSample};
use ndarray::Array3;

/// Number of cameras on the test rig
pub const NUM_VIEWS: usize = 6;

/// Creates camera images with unique markers in the red channel
/// - Position (0,0): view index
/// - Position (width-1,0): inverse of view index
pub fn create_camera_images(height: u32, width: u32) -> Vec<DynamicImage> {
    (0..NUM_VIEWS)
        .map(|i| {
            let mut img = RgbImage::from_pixel(width, height, Rgb([40, 80, 120]));
            img.put_pixel(0, 0, Rgb([i as u8, 0, 0]));
            img.put_pixel(width - 1, 0, Rgb([255 - i as u8, 0, 0]));
            DynamicImage::ImageRgb8(img)
        })
        .collect()
}

/// Builds a sample of smooth BGR gradients, distinct per view.
pub fn gradient_sample(height: usize, width: usize) -> MultiViewSample {
    let views: Vec<ImageArray> = (0..NUM_VIEWS)
        .map(|v| {
            Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
                ((y * 3 + x * 2 + c * 40 + v * 10) % 256) as f32
            })
        })
        .collect();
    MultiViewSample::new(views)
}

/// Pinhole intrinsics with the given horizontal focal lengths.
pub fn camera_metas(focals: &[f32]) -> CameraMetas {
    let mut k = Array3::<f32>::zeros((focals.len(), 3, 3));
    for (i, &f) in focals.iter().enumerate() {
        k[[i, 0, 0]] = f;
        k[[i, 1, 1]] = f;
        k[[i, 0, 2]] = 800.0;
        k[[i, 1, 2]] = 450.0;
        k[[i, 2, 2]] = 1.0;
    }
    CameraMetas::new(k)
}
