use crate::sample::{ImageArray, MultiViewSample};
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array3;
use rand::RngCore;

/// Channel order of an [`ImageArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Bgr,
    Rgb,
}

// ============================================================================
// LoadMultiViewImages
// ============================================================================

/// Converts decoded camera images into a [`MultiViewSample`].
///
/// Each view becomes an `H x W x 3` `f32` array in **BGR** order with values in
/// `[0, 255]`, which is the layout every multi-view transform expects.
///
/// Channel Handling
/// | Input Format  | Output           |
/// |---------------|------------------|
/// | RGB           | `[H, W, 3]` BGR  |
/// | Other         | converted to RGB, then `[H, W, 3]` BGR |
///
/// # Example
/// ```ignore
/// let sample = LoadMultiViewImages.apply(camera_images, &mut rng)?;
/// assert_eq!(sample.num_views(), 6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LoadMultiViewImages;

impl LoadMultiViewImages {
    /// Converts a single image to a BGR `f32` array.
    pub fn to_bgr_array(img: &DynamicImage) -> Result<ImageArray> {
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        ensure!(
            width > 0 && height > 0,
            "Image dimensions must be positive (got {}x{})",
            width,
            height
        );

        let mut arr = Array3::<f32>::zeros((height, width, 3));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            arr[[y, x, 0]] = pixel[2] as f32;
            arr[[y, x, 1]] = pixel[1] as f32;
            arr[[y, x, 2]] = pixel[0] as f32;
        }
        Ok(arr)
    }
}

impl Transform<Vec<DynamicImage>, MultiViewSample> for LoadMultiViewImages {
    fn apply(&self, views: Vec<DynamicImage>, _rng: &mut dyn RngCore) -> Result<MultiViewSample> {
        ensure!(!views.is_empty(), "At least one camera view is required");
        let img = views
            .iter()
            .map(Self::to_bgr_array)
            .collect::<Result<Vec<_>>>()?;
        Ok(MultiViewSample::new(img))
    }
}

/// Converts an array back into an 8-bit RGB image, clamping values to `[0, 255]`.
///
/// Useful for inspecting what an augmentation did to a view; normalized arrays must be
/// denormalized first.
pub fn to_rgb8(img: &ImageArray, order: ChannelOrder) -> Result<RgbImage> {
    let (height, width, channels) = img.dim();
    ensure!(
        channels == 3,
        "Expected a 3-channel HWC image, got shape {:?}",
        img.shape()
    );

    let quantize = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let (c0, c1, c2) = (img[[y, x, 0]], img[[y, x, 1]], img[[y, x, 2]]);
        match order {
            ChannelOrder::Bgr => Rgb([quantize(c2), quantize(c1), quantize(c0)]),
            ChannelOrder::Rgb => Rgb([quantize(c0), quantize(c1), quantize(c2)]),
        }
    }))
}
