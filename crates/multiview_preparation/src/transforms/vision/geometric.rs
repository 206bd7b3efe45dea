use crate::sample::{ImageArray, MultiViewSample};
use crate::transforms::vision::ops::{impad, impad_to_multiple, imresize};
use crate::transforms::Transform;
use anyhow::{anyhow, bail, ensure, Context, Result};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// PadMultiView
// ============================================================================

/// Parameters of [`PadMultiView`]. Exactly one of `size` and `size_divisor` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PadConfig {
    /// Fixed target shape as `(height, width)`.
    #[serde(default)]
    pub size: Option<(usize, usize)>,
    #[serde(default)]
    pub size_divisor: Option<usize>,
    #[serde(default)]
    pub pad_val: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PadMode {
    Fixed { height: usize, width: usize },
    Divisor(usize),
}

/// Pads every camera view on the bottom and right.
///
/// There are two padding modes:
/// 1. pad to a fixed `(height, width)`;
/// 2. pad to the smallest size whose height and width are multiples of a divisor.
///
/// `extra_img` and `ori_img` are padded the same way when present. The chosen mode's
/// parameter is written to `pad_fixed_size` / `pad_size_divisor`; the other is cleared.
///
/// # Example
/// ```ignore
/// let pad = PadMultiView::fixed(900, 1600)?;
/// let sample = pad.apply(sample, &mut rng)?; // every view is now 900x1600
/// ```
#[derive(Debug, Clone)]
pub struct PadMultiView {
    mode: PadMode,
    pad_val: f32,
}

impl PadMultiView {
    pub fn new(config: PadConfig) -> Result<Self> {
        let mode = match (config.size, config.size_divisor) {
            (Some((height, width)), None) => {
                ensure!(
                    height > 0 && width > 0,
                    "Pad size must be positive (got {}x{})",
                    height,
                    width
                );
                PadMode::Fixed { height, width }
            }
            (None, Some(divisor)) => {
                ensure!(divisor > 0, "Pad size divisor must be positive");
                PadMode::Divisor(divisor)
            }
            (Some(_), Some(_)) => bail!("Only one of `size` and `size_divisor` may be set"),
            (None, None) => bail!("One of `size` and `size_divisor` must be set"),
        };
        Ok(Self {
            mode,
            pad_val: config.pad_val,
        })
    }

    /// Pads to a fixed `height x width` with zeros.
    pub fn fixed(height: usize, width: usize) -> Result<Self> {
        Self::new(PadConfig {
            size: Some((height, width)),
            ..Default::default()
        })
    }

    /// Pads up to multiples of `divisor` with zeros.
    pub fn divisor(divisor: usize) -> Result<Self> {
        Self::new(PadConfig {
            size_divisor: Some(divisor),
            ..Default::default()
        })
    }

    pub fn with_pad_val(mut self, pad_val: f32) -> Self {
        self.pad_val = pad_val;
        self
    }

    fn pad_all(&self, imgs: &[ImageArray]) -> Result<Vec<ImageArray>> {
        imgs.iter()
            .map(|img| match self.mode {
                PadMode::Fixed { height, width } => impad(img, (height, width), self.pad_val),
                PadMode::Divisor(divisor) => impad_to_multiple(img, divisor, self.pad_val),
            })
            .collect()
    }
}

impl Transform<MultiViewSample, MultiViewSample> for PadMultiView {
    fn apply(&self, mut sample: MultiViewSample, _rng: &mut dyn RngCore) -> Result<MultiViewSample> {
        debug!(mode = ?self.mode, pad_val = self.pad_val, views = sample.num_views(), "padding views");

        sample.img = self.pad_all(&sample.img).context("Failed to pad `img`")?;
        if let Some(extra) = sample.extra_img.take() {
            sample.extra_img = Some(self.pad_all(&extra).context("Failed to pad `extra_img`")?);
        }
        if let Some(ori) = sample.ori_img.take() {
            sample.ori_img = Some(self.pad_all(&ori).context("Failed to pad `ori_img`")?);
        }

        let (fixed_size, divisor) = match self.mode {
            PadMode::Fixed { height, width } => (Some((height, width)), None),
            PadMode::Divisor(divisor) => (None, Some(divisor)),
        };
        sample.pad_fixed_size = fixed_size;
        sample.pad_size_divisor = divisor;
        Ok(sample)
    }
}

// ============================================================================
// RandomScaleMultiView
// ============================================================================

/// Parameters of [`RandomScaleMultiView`].
///
/// `scales` must hold exactly one value. At most one of `random_scale` and
/// `ref_focal_len` may be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomScaleConfig {
    pub scales: Vec<f64>,
    /// `[low, high]` range of an extra per-view ratio.
    #[serde(default)]
    pub random_scale: Option<[f64; 2]>,
    /// Reference focal length; each view is scaled by `ref_focal_len / focal_len`.
    #[serde(default)]
    pub ref_focal_len: Option<f64>,
    /// `[rate_y, rate_x]` dividing the final scale into `focal_ratios_y` / `focal_ratios_x`.
    /// Defaults to `[scales[0], scales[0]]`.
    #[serde(default)]
    pub pad_scale_rate: Option<[f64; 2]>,
}

impl RandomScaleConfig {
    pub fn fixed(scale: f64) -> Self {
        Self {
            scales: vec![scale],
            random_scale: None,
            ref_focal_len: None,
            pad_scale_rate: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RatioSource {
    None,
    Random { low: f64, high: f64 },
    FocalLength(f64),
}

/// Rescales every camera view by a per-view factor.
///
/// The factor of view `i` is `scale * ratio_i`, where `ratio_i` is
/// - `1` when no ratio source is configured,
/// - drawn uniformly from `[low, high)` independently for each view (`random_scale`),
/// - `ref_focal_len / intrinsic[i][0][0]` (`ref_focal_len`).
///
/// Each view is resized to `(round(w * factor), round(h * factor))`.
/// `focal_ratios` receives the `ratio_i` of the random and focal modes, while
/// `focal_ratios_x` / `focal_ratios_y` receive `factor / pad_scale_rate` per axis for the
/// consumers that adjust camera intrinsics.
#[derive(Debug, Clone)]
pub struct RandomScaleMultiView {
    scale: f64,
    source: RatioSource,
    pad_scale_rate: [f64; 2],
}

impl RandomScaleMultiView {
    pub fn new(config: RandomScaleConfig) -> Result<Self> {
        ensure!(
            config.scales.len() == 1,
            "Exactly one scale is supported (got {:?})",
            config.scales
        );
        let scale = config.scales[0];
        ensure!(
            scale.is_finite() && scale > 0.0,
            "Scale must be positive (got {})",
            scale
        );

        let source = match (config.random_scale, config.ref_focal_len) {
            (None, None) => RatioSource::None,
            (Some([low, high]), None) => {
                ensure!(
                    low.is_finite() && high.is_finite() && 0.0 < low && low <= high,
                    "Random scale range must satisfy 0 < low <= high (got [{}, {}])",
                    low,
                    high
                );
                RatioSource::Random { low, high }
            }
            (None, Some(focal)) => {
                ensure!(
                    focal.is_finite() && focal > 0.0,
                    "Reference focal length must be positive (got {})",
                    focal
                );
                RatioSource::FocalLength(focal)
            }
            (Some(_), Some(_)) => {
                bail!("Only one of `random_scale` and `ref_focal_len` may be set")
            }
        };

        let pad_scale_rate = config.pad_scale_rate.unwrap_or([scale, scale]);
        ensure!(
            pad_scale_rate.iter().all(|r| r.is_finite() && *r > 0.0),
            "Pad scale rate must be positive (got {:?})",
            pad_scale_rate
        );

        Ok(Self {
            scale,
            source,
            pad_scale_rate,
        })
    }

    /// Scales every view by the same fixed factor.
    pub fn fixed(scale: f64) -> Result<Self> {
        Self::new(RandomScaleConfig::fixed(scale))
    }

    /// Returns the per-view ratios, or `None` when no ratio source is configured.
    fn ratios(&self, sample: &MultiViewSample, rng: &mut dyn RngCore) -> Result<Option<Vec<f64>>> {
        let num_views = sample.num_views();
        match self.source {
            RatioSource::None => Ok(None),
            RatioSource::Random { low, high } => Ok(Some(
                (0..num_views)
                    .map(|_| rng.random::<f64>() * (high - low) + low)
                    .collect(),
            )),
            RatioSource::FocalLength(ref_focal) => {
                let metas = sample
                    .metas
                    .as_ref()
                    .ok_or_else(|| anyhow!("Focal-length rescaling requires camera `metas`"))?;
                let focal_lens = metas.focal_lengths()?;
                ensure!(
                    focal_lens.len() == num_views,
                    "Got {} intrinsics for {} views",
                    focal_lens.len(),
                    num_views
                );
                focal_lens
                    .into_iter()
                    .map(|focal| {
                        ensure!(focal > 0.0, "Focal length must be positive (got {})", focal);
                        Ok(ref_focal / focal as f64)
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Some)
            }
        }
    }
}

impl Transform<MultiViewSample, MultiViewSample> for RandomScaleMultiView {
    fn apply(&self, mut sample: MultiViewSample, rng: &mut dyn RngCore) -> Result<MultiViewSample> {
        let ratios = self.ratios(&sample, rng)?;
        let scales: Vec<f64> = match &ratios {
            Some(ratios) => ratios.iter().map(|r| self.scale * r).collect(),
            None => vec![self.scale; sample.num_views()],
        };
        debug!(?scales, "rescaling views");

        let [rate_y, rate_x] = self.pad_scale_rate;
        sample.focal_ratios_x = Some(scales.iter().map(|s| s / rate_x).collect());
        sample.focal_ratios_y = Some(scales.iter().map(|s| s / rate_y).collect());
        if ratios.is_some() {
            sample.focal_ratios = ratios;
        }

        sample.img = sample
            .img
            .iter()
            .zip(&scales)
            .enumerate()
            .map(|(idx, (img, scale))| {
                let (height, width, _) = img.dim();
                let new_w = (width as f64 * scale).round() as usize;
                let new_h = (height as f64 * scale).round() as usize;
                imresize(img, (new_w, new_h))
                    .with_context(|| format!("Failed to rescale view {} by {}", idx, scale))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(sample)
    }
}
