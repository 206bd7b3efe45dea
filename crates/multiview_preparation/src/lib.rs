pub mod config;
pub mod sample;
pub mod transforms;

pub use config::{PipelineConfig, TransformConfig};
pub use sample::{CameraMetas, ImageArray, ImgNormConfig, MultiViewSample};
pub use transforms::{Compose, Transform};
