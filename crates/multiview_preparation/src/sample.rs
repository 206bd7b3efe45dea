use anyhow::{anyhow, ensure, Result};
use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

/// A single camera view stored as an `H x W x C` array of `f32` (HWC layout).
///
/// Images enter the pipeline in BGR channel order, matching the layout produced by
/// [`LoadMultiViewImages`](crate::transforms::vision::LoadMultiViewImages).
pub type ImageArray = Array3<f32>;

/// Per-channel normalization parameters applied by
/// [`NormalizeMultiView`](crate::transforms::vision::NormalizeMultiView).
///
/// `mean` and `std` are expressed in the channel order of the *output* image,
/// i.e. RGB when `to_rgb` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImgNormConfig {
    pub mean: [f32; 3],
    pub std: [f32; 3],
    #[serde(default = "default_to_rgb")]
    pub to_rgb: bool,
}

fn default_to_rgb() -> bool {
    true
}

/// Camera calibration carried alongside the images.
///
/// `intrinsic` has shape `[num_views, K, K]` with `K` = 3 or 4; the horizontal focal
/// length of view `i` is `intrinsic[[i, 0, 0]]`.
#[derive(Debug, Clone)]
pub struct CameraMetas {
    pub intrinsic: Array3<f32>,
}

impl CameraMetas {
    pub fn new(intrinsic: Array3<f32>) -> Self {
        Self { intrinsic }
    }

    /// Horizontal focal length of every view.
    pub fn focal_lengths(&self) -> Result<Vec<f32>> {
        self.intrinsic
            .outer_iter()
            .enumerate()
            .map(|(idx, k)| {
                k.get([0, 0]).copied().ok_or_else(|| {
                    anyhow!("Intrinsic of view {} is empty (shape {:?})", idx, k.shape())
                })
            })
            .collect()
    }
}

/// The `MultiViewSample` struct represents one sample of a multi-camera rig
/// as it moves through the preprocessing pipeline.
///
/// `img` holds one array per camera view. The remaining fields are filled in by the
/// transforms that own them, so a downstream consumer can tell which steps ran:
/// - `pad_fixed_size` / `pad_size_divisor`: written by `PadMultiView`
/// - `img_norm_cfg`: written by `NormalizeMultiView`
/// - `flip`: written by `RandomFlipMultiView`
/// - `focal_ratios*`: written by `RandomScaleMultiView`
///
/// `extra_img` and `ori_img` are optional side-channel image lists that follow `img`
/// through padding.
#[derive(Debug, Clone, Default)]
pub struct MultiViewSample {
    pub img: Vec<ImageArray>,
    pub extra_img: Option<Vec<ImageArray>>,
    pub ori_img: Option<Vec<ImageArray>>,
    pub metas: Option<CameraMetas>,
    pub pad_fixed_size: Option<(usize, usize)>,
    pub pad_size_divisor: Option<usize>,
    pub img_norm_cfg: Option<ImgNormConfig>,
    pub flip: Option<bool>,
    pub focal_ratios: Option<Vec<f64>>,
    pub focal_ratios_x: Option<Vec<f64>>,
    pub focal_ratios_y: Option<Vec<f64>>,
}

impl MultiViewSample {
    /// Creates a sample from the per-view images. All derived fields start empty.
    pub fn new(img: Vec<ImageArray>) -> Self {
        Self {
            img,
            ..Default::default()
        }
    }

    /// Attaches an auxiliary image list that is padded together with `img`.
    pub fn with_extra_img(mut self, extra_img: Vec<ImageArray>) -> Self {
        self.extra_img = Some(extra_img);
        self
    }

    /// Attaches the un-augmented copies of the views.
    pub fn with_ori_img(mut self, ori_img: Vec<ImageArray>) -> Self {
        self.ori_img = Some(ori_img);
        self
    }

    pub fn with_metas(mut self, metas: CameraMetas) -> Self {
        self.metas = Some(metas);
        self
    }

    pub fn num_views(&self) -> usize {
        self.img.len()
    }

    /// Returns `(height, width, channels)` of every view.
    pub fn shapes(&self) -> Vec<(usize, usize, usize)> {
        self.img.iter().map(|img| img.dim()).collect()
    }

    /// Returns a view of the `idx`-th camera image.
    pub fn view(&self, idx: usize) -> Result<ArrayView3<'_, f32>> {
        self.img
            .get(idx)
            .map(|img| img.view())
            .ok_or_else(|| anyhow!("View {} not found (sample has {} views)", idx, self.img.len()))
    }

    /// Fails unless the sample carries at least one view with three channels.
    pub(crate) fn ensure_three_channel_views(&self) -> Result<()> {
        ensure!(!self.img.is_empty(), "Sample has no image views");
        for (idx, img) in self.img.iter().enumerate() {
            ensure!(
                img.dim().2 == 3,
                "View {} must have 3 channels (got shape {:?})",
                idx,
                img.shape()
            );
        }
        Ok(())
    }
}
