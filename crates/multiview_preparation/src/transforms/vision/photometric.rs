use crate::sample::{ImageArray, ImgNormConfig, MultiViewSample};
use crate::transforms::vision::ops::{bgr2hsv, hsv2bgr, imnormalize, permute_channels};
use crate::transforms::Transform;
use anyhow::{ensure, Context, Result};
use ndarray::s;
use rand::{seq::SliceRandom, Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// ============================================================================
// NormalizeMultiView
// ============================================================================

/// Normalizes every camera view using channel-wise statistics.
///
/// # Arguments:
/// - `mean`: per-channel means
/// - `std`: per-channel standard deviation
/// - `to_rgb`: reverse BGR input to RGB before normalizing
///
/// # Mathematical Operation:
/// ```text
/// output[h, w, c] = (input[h, w, c] - mean[c]) / std[c]
/// ```
///
/// The applied parameters are recorded in `img_norm_cfg`.
///
/// # Example
/// ```ignore
/// let norm = NormalizeMultiView::imagenet();
/// let normalized = norm.apply(sample, &mut rng)?;
/// ```
#[derive(Debug, Clone)]
pub struct NormalizeMultiView {
    cfg: ImgNormConfig,
}

impl NormalizeMultiView {
    /// Creates new normalization parameters.
    pub fn new(cfg: ImgNormConfig) -> Result<Self> {
        ensure!(
            cfg.std.iter().all(|s| s.is_finite() && *s > 0.0),
            "Normalization std must be positive (got {:?})",
            cfg.std
        );
        ensure!(
            cfg.mean.iter().all(|m| m.is_finite()),
            "Normalization mean must be finite (got {:?})",
            cfg.mean
        );
        Ok(Self { cfg })
    }

    /// ImageNet statistics on a `[0, 255]` scale, converting BGR input to RGB.
    pub fn imagenet() -> Self {
        Self {
            cfg: ImgNormConfig {
                mean: [123.675, 116.28, 103.53],
                std: [58.395, 57.12, 57.375],
                to_rgb: true,
            },
        }
    }

    pub fn config(&self) -> &ImgNormConfig {
        &self.cfg
    }
}

impl Transform<MultiViewSample, MultiViewSample> for NormalizeMultiView {
    fn apply(&self, mut sample: MultiViewSample, _rng: &mut dyn RngCore) -> Result<MultiViewSample> {
        sample.ensure_three_channel_views()?;
        debug!(cfg = ?self.cfg, views = sample.num_views(), "normalizing views");

        sample.img = sample
            .img
            .iter()
            .map(|img| imnormalize(img, &self.cfg.mean, &self.cfg.std, self.cfg.to_rgb))
            .collect::<Result<Vec<_>>>()
            .context("Failed to normalize views")?;
        sample.img_norm_cfg = Some(self.cfg.clone());
        Ok(sample)
    }
}

// ============================================================================
// PhotoMetricDistortionMultiView
// ============================================================================

/// Parameters of [`PhotoMetricDistortionMultiView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoMetricDistortionConfig {
    pub brightness_delta: f32,
    pub contrast_range: (f32, f32),
    pub saturation_range: (f32, f32),
    pub hue_delta: f32,
    pub use_swap_channel: bool,
}

impl Default for PhotoMetricDistortionConfig {
    fn default() -> Self {
        Self {
            brightness_delta: 32.0,
            contrast_range: (0.8, 1.2),
            saturation_range: (0.8, 1.2),
            hue_delta: 18.0,
            use_swap_channel: true,
        }
    }
}

/// Applies photometric distortion to every view, each step with probability 0.5.
///
/// The steps, in order:
/// 1. random brightness
/// 2. random contrast (mode 1)
/// 3. convert color from BGR to HSV
/// 4. random saturation
/// 5. random hue
/// 6. convert color from HSV to BGR
/// 7. random contrast (mode 0)
/// 8. randomly swap channels
///
/// The mode decides whether contrast is applied second or second to last. Every view
/// draws its own decisions and factors, so the views of one sample are distorted
/// differently.
#[derive(Debug, Clone)]
pub struct PhotoMetricDistortionMultiView {
    brightness_delta: f32,
    contrast_lower: f32,
    contrast_upper: f32,
    saturation_lower: f32,
    saturation_upper: f32,
    hue_delta: f32,
    use_swap_channel: bool,
}

impl PhotoMetricDistortionMultiView {
    pub fn new(config: PhotoMetricDistortionConfig) -> Result<Self> {
        let (contrast_lower, contrast_upper) = config.contrast_range;
        let (saturation_lower, saturation_upper) = config.saturation_range;
        ensure!(
            config.brightness_delta >= 0.0 && config.brightness_delta.is_finite(),
            "Brightness delta must be non-negative (got {})",
            config.brightness_delta
        );
        ensure!(
            config.hue_delta >= 0.0 && config.hue_delta.is_finite(),
            "Hue delta must be non-negative (got {})",
            config.hue_delta
        );
        ensure!(
            0.0 <= contrast_lower && contrast_lower <= contrast_upper && contrast_upper.is_finite(),
            "Contrast range must satisfy 0 <= lower <= upper (got {:?})",
            config.contrast_range
        );
        ensure!(
            0.0 <= saturation_lower
                && saturation_lower <= saturation_upper
                && saturation_upper.is_finite(),
            "Saturation range must satisfy 0 <= lower <= upper (got {:?})",
            config.saturation_range
        );

        Ok(Self::from_validated(config))
    }

    fn from_validated(config: PhotoMetricDistortionConfig) -> Self {
        Self {
            brightness_delta: config.brightness_delta,
            contrast_lower: config.contrast_range.0,
            contrast_upper: config.contrast_range.1,
            saturation_lower: config.saturation_range.0,
            saturation_upper: config.saturation_range.1,
            hue_delta: config.hue_delta,
            use_swap_channel: config.use_swap_channel,
        }
    }

    fn coin(rng: &mut dyn RngCore) -> bool {
        rng.random_bool(0.5)
    }

    fn random_contrast(&self, img: &mut ImageArray, rng: &mut dyn RngCore) {
        if Self::coin(rng) {
            let alpha = rng.random_range(self.contrast_lower..=self.contrast_upper);
            trace!(alpha, "contrast");
            img.mapv_inplace(|v| v * alpha);
        }
    }

    fn distort(&self, img: &ImageArray, rng: &mut dyn RngCore) -> Result<ImageArray> {
        let mut img = img.clone();

        if Self::coin(rng) {
            let delta = rng.random_range(-self.brightness_delta..=self.brightness_delta);
            trace!(delta, "brightness");
            img.mapv_inplace(|v| v + delta);
        }

        // mode == 1 --> contrast first, mode == 0 --> contrast last
        let contrast_first = Self::coin(rng);
        if contrast_first {
            self.random_contrast(&mut img, rng);
        }

        let mut hsv = bgr2hsv(&img)?;

        if Self::coin(rng) {
            let factor = rng.random_range(self.saturation_lower..=self.saturation_upper);
            trace!(factor, "saturation");
            hsv.slice_mut(s![.., .., 1]).mapv_inplace(|v| v * factor);
        }

        if Self::coin(rng) {
            let shift = rng.random_range(-self.hue_delta..=self.hue_delta);
            trace!(shift, "hue");
            hsv.slice_mut(s![.., .., 0]).mapv_inplace(|h| wrap_hue(h + shift));
        }

        let mut img = hsv2bgr(&hsv)?;

        if !contrast_first {
            self.random_contrast(&mut img, rng);
        }

        if Self::coin(rng) && self.use_swap_channel {
            let mut order = [0usize, 1, 2];
            order.shuffle(rng);
            trace!(?order, "channel swap");
            img = permute_channels(&img, order)?;
        }

        Ok(img)
    }
}

impl Default for PhotoMetricDistortionMultiView {
    fn default() -> Self {
        Self::from_validated(PhotoMetricDistortionConfig::default())
    }
}

/// Wraps a hue in degrees into `[0, 360)`.
fn wrap_hue(h: f32) -> f32 {
    let wrapped = h.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

impl Transform<MultiViewSample, MultiViewSample> for PhotoMetricDistortionMultiView {
    fn apply(&self, mut sample: MultiViewSample, rng: &mut dyn RngCore) -> Result<MultiViewSample> {
        sample.ensure_three_channel_views()?;
        debug!(views = sample.num_views(), "photometric distortion");

        sample.img = sample
            .img
            .iter()
            .enumerate()
            .map(|(idx, img)| {
                self.distort(img, &mut *rng)
                    .with_context(|| format!("Failed to distort view {}", idx))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(sample)
    }
}
