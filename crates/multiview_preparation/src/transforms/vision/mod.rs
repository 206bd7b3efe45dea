//! src/transforms/vision/mod.rs
//!
//! Vision transforms for multi-view camera preprocessing and augmentation.
//!
//! # Module Organization
//!
//! ```text
//! transforms/vision/
//! ├── ops.rs           → Array primitives (pad, normalize, flip, resize, HSV)
//! ├── geometric.rs     → Spatial transformations (pad, rescale)
//! ├── photometric.rs   → Color and appearance (normalize, photometric distortion)
//! ├── augmentation.rs  → Pure data augmentation (flip)
//! └── conversion.rs    → Format conversions (image → sample)
//! ```
//!
//! # Quick Start
//!
//! All transforms are re-exported at the module level for convenient access:
//!
//! ```ignore
//! use crate::transforms::Transform;
//! use crate::transforms::vision::*;
//!
//! let pipeline = LoadMultiViewImages
//!     .then(PhotoMetricDistortionMultiView::default())
//!     .then(RandomScaleMultiView::fixed(0.5)?)
//!     .then(NormalizeMultiView::imagenet())
//!     .then(PadMultiView::divisor(32)?);
//! let sample = pipeline.apply(camera_images, &mut rng)?;
//! ```

pub mod augmentation;
pub mod conversion;
pub mod geometric;
pub mod ops;
pub mod photometric;

pub use augmentation::{RandomFlipConfig, RandomFlipMultiView};
pub use conversion::{to_rgb8, ChannelOrder, LoadMultiViewImages};
pub use geometric::{PadConfig, PadMultiView, RandomScaleConfig, RandomScaleMultiView};
pub use photometric::{
    NormalizeMultiView, PhotoMetricDistortionConfig, PhotoMetricDistortionMultiView,
};
