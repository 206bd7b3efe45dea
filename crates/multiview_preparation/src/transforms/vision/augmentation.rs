use crate::sample::MultiViewSample;
use crate::transforms::vision::ops::imflip;
use crate::transforms::Transform;
use anyhow::{ensure, Result};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// RandomFlipMultiView
// ============================================================================

/// Parameters of [`RandomFlipMultiView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomFlipConfig {
    #[serde(default = "default_flip_prob")]
    pub prob: f64,
}

fn default_flip_prob() -> f64 {
    0.5
}

impl Default for RandomFlipConfig {
    fn default() -> Self {
        Self {
            prob: default_flip_prob(),
        }
    }
}

/// Randomly flips all camera views horizontally.
///
/// One decision is drawn per call and shared by every view, so the rig stays
/// consistent. The decision is recorded in `flip`.
///
/// # Example
/// ```ignore
/// let flip = RandomFlipMultiView::new(0.5)?; // 50% flip chance
/// let augmented = flip.apply(sample, &mut rng)?;
/// ```
#[derive(Debug, Clone)]
pub struct RandomFlipMultiView {
    prob: f64,
}

impl RandomFlipMultiView {
    pub fn new(prob: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&prob),
            "Probability must be in [0.0, 1.0] range (got {})",
            prob
        );
        Ok(Self { prob })
    }
}

impl Default for RandomFlipMultiView {
    fn default() -> Self {
        Self {
            prob: default_flip_prob(),
        }
    }
}

impl Transform<MultiViewSample, MultiViewSample> for RandomFlipMultiView {
    fn apply(&self, mut sample: MultiViewSample, rng: &mut dyn RngCore) -> Result<MultiViewSample> {
        let flip = match self.prob {
            // Fast paths skip the draw
            p if p <= 0.0 => false,
            p if p >= 1.0 => true,
            p => rng.random_bool(p),
        };
        debug!(flip, views = sample.num_views(), "random flip");

        if flip {
            sample.img = sample.img.iter().map(imflip).collect();
        }
        sample.flip = Some(flip);
        Ok(sample)
    }
}
