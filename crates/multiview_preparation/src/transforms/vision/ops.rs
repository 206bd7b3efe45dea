//! Array-level image primitives shared by the multi-view transforms.
//!
//! Every function operates on a single `H x W x C` [`ImageArray`] and returns a new array;
//! the transforms in this module's siblings map them over all views of a sample.

use crate::sample::ImageArray;
use anyhow::{ensure, Result};
use ndarray::{s, Array3, Axis};

/// Pads `img` on the bottom and right to `shape = (height, width)` with `pad_val`.
pub fn impad(img: &ImageArray, shape: (usize, usize), pad_val: f32) -> Result<ImageArray> {
    let (height, width, channels) = img.dim();
    let (target_h, target_w) = shape;
    ensure!(
        target_h >= height && target_w >= width,
        "Pad target {}x{} is smaller than the image ({}x{})",
        target_h,
        target_w,
        height,
        width
    );

    let mut padded = Array3::from_elem((target_h, target_w, channels), pad_val);
    padded.slice_mut(s![..height, ..width, ..]).assign(img);
    Ok(padded)
}

/// Pads `img` so both spatial dimensions become the smallest multiple of `divisor`.
pub fn impad_to_multiple(img: &ImageArray, divisor: usize, pad_val: f32) -> Result<ImageArray> {
    ensure!(divisor > 0, "Pad divisor must be positive");
    let (height, width, _) = img.dim();
    let pad_h = height.div_ceil(divisor) * divisor;
    let pad_w = width.div_ceil(divisor) * divisor;
    impad(img, (pad_h, pad_w), pad_val)
}

/// Normalizes `img` with `(x - mean) / std` per channel.
///
/// When `to_rgb` is set the channels are reversed (BGR → RGB) *before* the statistics
/// are applied, so `mean` and `std` are given in RGB order.
pub fn imnormalize(
    img: &ImageArray,
    mean: &[f32; 3],
    std: &[f32; 3],
    to_rgb: bool,
) -> Result<ImageArray> {
    ensure_three_channels(img)?;
    let mut out = if to_rgb { bgr2rgb(img)? } else { img.clone() };
    for (c, mut channel) in out.axis_iter_mut(Axis(2)).enumerate() {
        let (mean_c, stdinv_c) = (mean[c], 1.0 / std[c]);
        channel.mapv_inplace(|v| (v - mean_c) * stdinv_c);
    }
    Ok(out)
}

/// Undoes [`imnormalize`]: `x * std + mean`, optionally reversing the channels back to BGR.
pub fn imdenormalize(
    img: &ImageArray,
    mean: &[f32; 3],
    std: &[f32; 3],
    to_bgr: bool,
) -> Result<ImageArray> {
    ensure_three_channels(img)?;
    let mut out = img.clone();
    for (c, mut channel) in out.axis_iter_mut(Axis(2)).enumerate() {
        let (mean_c, std_c) = (mean[c], std[c]);
        channel.mapv_inplace(|v| v * std_c + mean_c);
    }
    if to_bgr {
        bgr2rgb(&out)
    } else {
        Ok(out)
    }
}

/// Mirrors `img` left-right.
pub fn imflip(img: &ImageArray) -> ImageArray {
    img.slice(s![.., ..;-1, ..]).to_owned()
}

/// Resizes `img` to `size = (width, height)` with bilinear interpolation.
///
/// Sampling uses pixel-center alignment (`src = (dst + 0.5) * scale - 0.5`) and clamps at
/// the borders, so a constant image stays constant at every output size.
pub fn imresize(img: &ImageArray, size: (usize, usize)) -> Result<ImageArray> {
    let (height, width, channels) = img.dim();
    let (target_w, target_h) = size;
    ensure!(
        height > 0 && width > 0,
        "Cannot resize an empty image ({}x{})",
        height,
        width
    );
    ensure!(
        target_w > 0 && target_h > 0,
        "Image dimensions must be positive after resizing (got {}x{})",
        target_w,
        target_h
    );

    if (target_h, target_w) == (height, width) {
        return Ok(img.clone());
    }

    let ys = linear_taps(height, target_h);
    let xs = linear_taps(width, target_w);
    let mut out = Array3::<f32>::zeros((target_h, target_w, channels));

    for (oy, &(y0, y1, fy)) in ys.iter().enumerate() {
        for (ox, &(x0, x1, fx)) in xs.iter().enumerate() {
            for c in 0..channels {
                let top = img[[y0, x0, c]] * (1.0 - fx) + img[[y0, x1, c]] * fx;
                let bottom = img[[y1, x0, c]] * (1.0 - fx) + img[[y1, x1, c]] * fx;
                out[[oy, ox, c]] = top * (1.0 - fy) + bottom * fy;
            }
        }
    }

    Ok(out)
}

/// For every destination index: the two source indices and the weight of the second one.
fn linear_taps(src: usize, dst: usize) -> Vec<(usize, usize, f32)> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let pos = ((d as f64 + 0.5) * scale - 0.5).max(0.0);
            let i0 = (pos.floor() as usize).min(src - 1);
            let i1 = (i0 + 1).min(src - 1);
            let frac = if i1 == i0 { 0.0 } else { (pos - i0 as f64) as f32 };
            (i0, i1, frac)
        })
        .collect()
}

/// Converts a BGR image to HSV.
///
/// Output channels: hue in degrees `[0, 360)`, saturation `diff / |v|`, value equal to the
/// largest input channel (so the value keeps the input's range, e.g. `[0, 255]`).
///
/// Saturation is in `[0, 1]` for non-negative input. Pixels pushed below zero (e.g. by a
/// brightness shift) get a larger saturation and still convert back exactly; only a
/// pixel whose largest channel is exactly zero collapses to gray.
pub fn bgr2hsv(img: &ImageArray) -> Result<ImageArray> {
    ensure_three_channels(img)?;
    let mut out = img.clone();
    for mut px in out.rows_mut() {
        let (b, g, r) = (px[0], px[1], px[2]);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);
        let s = if v != 0.0 { diff / v.abs() } else { 0.0 };

        let mut h = if diff == 0.0 {
            0.0
        } else if v == r {
            60.0 * (g - b) / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };
        if h < 0.0 {
            h += 360.0;
        }

        px[0] = h;
        px[1] = s;
        px[2] = v;
    }
    Ok(out)
}

/// Converts an HSV image (as produced by [`bgr2hsv`]) back to BGR.
pub fn hsv2bgr(img: &ImageArray) -> Result<ImageArray> {
    ensure_three_channels(img)?;
    let mut out = img.clone();
    for mut px in out.rows_mut() {
        let (h, s, v) = (px[0], px[1], px[2]);

        let mut h = (h / 60.0).rem_euclid(6.0);
        if h >= 6.0 {
            h = 0.0;
        }
        let sector = h.floor();
        let f = h - sector;
        let chroma = s * v.abs();
        let p = v - chroma;
        let q = v - chroma * f;
        let t = v - chroma * (1.0 - f);

        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        px[0] = b;
        px[1] = g;
        px[2] = r;
    }
    Ok(out)
}

/// Reverses the channel order (BGR ↔ RGB).
pub fn bgr2rgb(img: &ImageArray) -> Result<ImageArray> {
    permute_channels(img, [2, 1, 0])
}

/// Reorders the channels so that output channel `i` is input channel `order[i]`.
pub fn permute_channels(img: &ImageArray, order: [usize; 3]) -> Result<ImageArray> {
    ensure_three_channels(img)?;
    Ok(img.select(Axis(2), &order))
}

fn ensure_three_channels(img: &ImageArray) -> Result<()> {
    ensure!(
        img.dim().2 == 3,
        "Expected a 3-channel HWC image, got shape {:?}",
        img.shape()
    );
    Ok(())
}
