//! src/config.rs
//!
//! Declarative description of a multi-view preprocessing pipeline.
//!
//! A `PipelineConfig` lists the transforms in the order they run. Each entry is tagged
//! with its `type` and carries the same parameters as the transform's constructor, so a
//! training recipe can keep its preprocessing in a JSON file next to the model settings.
//!
//! Example:
//! ```ignore
//! let config = PipelineConfig::from_json(r#"{
//!     "seed": 7,
//!     "transforms": [
//!         { "type": "photo_metric_distortion" },
//!         { "type": "random_scale", "scales": [0.5] },
//!         { "type": "normalize", "mean": [123.675, 116.28, 103.53],
//!           "std": [58.395, 57.12, 57.375] },
//!         { "type": "pad", "size_divisor": 32 }
//!     ]
//! }"#)?;
//! let pipeline = config.build()?;
//! let sample = pipeline.apply(sample, &mut config.rng())?;
//! ```
//!
//! Every constructor validates its parameters, so `build()` fails on the first
//! inconsistent entry (e.g. a pad with both `size` and `size_divisor`).

use crate::sample::{ImgNormConfig, MultiViewSample};
use crate::transforms::vision::{
    NormalizeMultiView, PadConfig, PadMultiView, PhotoMetricDistortionConfig,
    PhotoMetricDistortionMultiView, RandomFlipConfig, RandomFlipMultiView, RandomScaleConfig,
    RandomScaleMultiView,
};
use crate::transforms::{Compose, Transform};
use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One pipeline step, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformConfig {
    Pad(PadConfig),
    Normalize(ImgNormConfig),
    RandomFlip(RandomFlipConfig),
    PhotoMetricDistortion(PhotoMetricDistortionConfig),
    RandomScale(RandomScaleConfig),
}

impl TransformConfig {
    /// Constructs the transform, running its parameter validation.
    pub fn build(&self) -> Result<Box<dyn Transform<MultiViewSample, MultiViewSample>>> {
        let transform: Box<dyn Transform<MultiViewSample, MultiViewSample>> = match self {
            Self::Pad(cfg) => Box::new(PadMultiView::new(cfg.clone())?),
            Self::Normalize(cfg) => Box::new(NormalizeMultiView::new(cfg.clone())?),
            Self::RandomFlip(cfg) => Box::new(RandomFlipMultiView::new(cfg.prob)?),
            Self::PhotoMetricDistortion(cfg) => {
                Box::new(PhotoMetricDistortionMultiView::new(cfg.clone())?)
            }
            Self::RandomScale(cfg) => Box::new(RandomScaleMultiView::new(cfg.clone())?),
        };
        Ok(transform)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Pad(_) => "pad",
            Self::Normalize(_) => "normalize",
            Self::RandomFlip(_) => "random_flip",
            Self::PhotoMetricDistortion(_) => "photo_metric_distortion",
            Self::RandomScale(_) => "random_scale",
        }
    }
}

/// Configuration for a multi-view preprocessing pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Transforms in application order
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
    /// Random seed for reproducible augmentation (OS entropy when unset)
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PipelineConfig {
    /// Parses a pipeline description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid pipeline configuration")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline configuration")
    }

    pub fn with_transform(mut self, transform: TransformConfig) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Instantiates every transform in order.
    pub fn build(&self) -> Result<Compose<MultiViewSample>> {
        let transforms = self
            .transforms
            .iter()
            .enumerate()
            .map(|(idx, cfg)| {
                cfg.build()
                    .with_context(|| format!("Invalid `{}` transform at index {}", cfg.name(), idx))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(steps = transforms.len(), "built preprocessing pipeline");
        Ok(Compose::new(transforms))
    }

    /// Returns the RNG the pipeline should be driven with.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
