//! End-to-end tests of the multi-view preprocessing transforms.
//!
//! Tests cover:
//! - Loading camera images and running a full augmentation pipeline
//! - Padding contract on the `img`, `extra_img` and `ori_img` lists
//! - Focal-length driven rescaling followed by padding to a fixed size
//! - Error propagation through chained transforms

mod common;
use common::{camera_metas, create_camera_images, gradient_sample, NUM_VIEWS};

use multiview_preparation::{
    sample::MultiViewSample,
    transforms::{
        vision::{
            ops::imdenormalize, to_rgb8, ChannelOrder, LoadMultiViewImages, NormalizeMultiView,
            PadMultiView, PhotoMetricDistortionMultiView, RandomFlipMultiView, RandomScaleConfig,
            RandomScaleMultiView,
        },
        Transform,
    },
};

use anyhow::Result;
use ndarray::{s, Array3};
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn test_full_pipeline_shapes_and_metadata() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let pipeline = LoadMultiViewImages
        .then(PhotoMetricDistortionMultiView::default())
        .then(RandomScaleMultiView::fixed(0.5)?)
        .then(RandomFlipMultiView::new(0.5)?)
        .then(NormalizeMultiView::imagenet())
        .then(PadMultiView::divisor(32)?);

    let sample = pipeline.apply(create_camera_images(90, 160), &mut rng)?;

    assert_eq!(sample.num_views(), NUM_VIEWS);
    assert_eq!(sample.shapes(), vec![(64, 96, 3); NUM_VIEWS]);
    assert!(sample.flip.is_some());
    assert_eq!(sample.pad_size_divisor, Some(32));
    assert_eq!(sample.pad_fixed_size, None);
    assert_eq!(
        sample.img_norm_cfg.as_ref().map(|cfg| cfg.to_rgb),
        Some(true)
    );
    assert_eq!(sample.focal_ratios_x, Some(vec![1.0; NUM_VIEWS]));
    assert_eq!(sample.focal_ratios_y, Some(vec![1.0; NUM_VIEWS]));
    Ok(())
}

#[test]
fn test_flip_marker_moves_to_right_edge() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let pipeline = LoadMultiViewImages.then(RandomFlipMultiView::new(1.0)?);
    let sample = pipeline.apply(create_camera_images(4, 4), &mut rng)?;

    for (i, view) in sample.img.iter().enumerate() {
        // Red lives in channel 2 of a BGR array.
        assert_eq!(view[[0, 3, 2]], i as f32);
        assert_eq!(view[[0, 0, 2]], (255 - i) as f32);
    }
    Ok(())
}

#[test]
fn test_pad_fixed_size_on_camera_batch() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let sample = gradient_sample(886, 1600)
        .with_extra_img(vec![Array3::ones((886, 1600, 3))])
        .with_ori_img(vec![Array3::ones((886, 1600, 3))]);

    let sample = PadMultiView::fixed(900, 1600)?.apply(sample, &mut rng)?;

    assert_eq!(sample.shapes(), vec![(900, 1600, 3); NUM_VIEWS]);
    for img in sample
        .img
        .iter()
        .chain(sample.extra_img.iter().flatten())
        .chain(sample.ori_img.iter().flatten())
    {
        assert_eq!(img.dim(), (900, 1600, 3));
        assert!(img.slice(s![886.., .., ..]).iter().all(|&v| v == 0.0));
    }
    assert_eq!(sample.pad_fixed_size, Some((900, 1600)));
    Ok(())
}

#[test]
fn test_focal_rescale_then_pad_to_fixed_size() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let focals = [1266.4, 1260.8, 1272.6, 809.2, 1256.7, 1259.5];
    let pipeline = RandomScaleMultiView::new(RandomScaleConfig {
        ref_focal_len: Some(1260.0),
        ..RandomScaleConfig::fixed(0.5)
    })?
    .then(PadMultiView::fixed(480, 800)?);

    let sample = gradient_sample(450, 800).with_metas(camera_metas(&focals));
    let sample = pipeline.apply(sample, &mut rng)?;

    assert_eq!(sample.shapes(), vec![(480, 800, 3); NUM_VIEWS]);
    let ratios = sample.focal_ratios.expect("focal ratios recorded");
    for (ratio, focal) in ratios.iter().zip(focals) {
        assert!((ratio - 1260.0 / focal as f64).abs() < 1e-9);
    }
    Ok(())
}

#[test]
fn test_focal_rescale_error_propagates_through_chain() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    // The long-focal camera scales 1260/809 ≈ 1.56x and no longer fits the fixed pad.
    let pipeline = RandomScaleMultiView::new(RandomScaleConfig {
        ref_focal_len: Some(1260.0),
        ..RandomScaleConfig::fixed(1.0)
    })?
    .then(PadMultiView::fixed(450, 800)?);

    let sample = gradient_sample(450, 800)
        .with_metas(camera_metas(&[1260.0, 1260.0, 1260.0, 809.2, 1260.0, 1260.0]));
    let err = pipeline.apply(sample, &mut rng).unwrap_err();
    assert!(err.to_string().contains("Transform chain failed"));
    assert!(format!("{:#}", err).contains("smaller than the image"));
    Ok(())
}

#[test]
fn test_normalized_views_can_be_inspected() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0);
    let images = create_camera_images(8, 8);
    let pipeline = LoadMultiViewImages.then(NormalizeMultiView::imagenet());
    let sample: MultiViewSample = pipeline.apply(images.clone(), &mut rng)?;
    let cfg = sample.img_norm_cfg.clone().expect("config recorded");

    for (view, original) in sample.img.iter().zip(&images) {
        // Undo the normalization (still RGB) and compare with the decoded image.
        let restored = imdenormalize(view, &cfg.mean, &cfg.std, false)?;
        assert_eq!(to_rgb8(&restored, ChannelOrder::Rgb)?, original.to_rgb8());
    }
    Ok(())
}
