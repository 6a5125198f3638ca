#[cfg(feature = "e2e")]
#[macro_use]
mod common;

#[cfg(feature = "e2e")]
use anyhow::Result;
#[cfg(feature = "e2e")]
use common::*;
#[cfg(feature = "e2e")]
use vapoursynth::prelude::Environment;
#[cfg(feature = "e2e")]
use vapoursynth_datamosh::{DatamoshMode, DatamoshParams, run};

#[cfg(feature = "e2e")]
fn core_params(params: &FilterParams) -> Result<DatamoshParams> {
    Ok(DatamoshParams::new(
        params.mode,
        params.blksize,
        params.maxshift,
        params.shiftrange,
        params.length,
        params.strict,
    )?)
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_copy_is_identity() -> Result<()> {
    require_datamosh!();

    let clip_config =
        TestClipConfig::gray8(64, 48, 5, ClipContentType::MovingBox { speed_x: 2, speed_y: 1 });
    let params = FilterParams {
        mode: Some(DatamoshMode::Copy as i64),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;

    let src = read_sequence::<u8>(&src_node)?;
    assert_matches_core::<u8>(&mosh_node, &src, "copy")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_glide_8bit_gray_default_params() -> Result<()> {
    require_datamosh!();

    let clip_config =
        TestClipConfig::gray8(96, 64, 4, ClipContentType::MovingBox { speed_x: 4, speed_y: 2 });
    let params = FilterParams {
        length: Some(12),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;
    assert_eq!(mosh_node.info().num_frames, 12);

    let expected = run(&read_sequence::<u8>(&src_node)?, &core_params(&params)?)?;
    assert_matches_core::<u8>(&mosh_node, &expected, "glide 8-bit")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_movement_8bit_rgb() -> Result<()> {
    require_datamosh!();

    let clip_config = TestClipConfig {
        width: 64,
        height: 64,
        format: "vs.RGB24",
        length: 6,
        content_type: ClipContentType::MovingBox { speed_x: 2, speed_y: 2 },
        colors: ("[0, 64, 128]", "[255, 200, 16]"),
    };
    let params = FilterParams {
        mode: Some(DatamoshMode::Movement as i64),
        blksize: Some(8),
        maxshift: Some(4),
        shiftrange: Some(2),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;
    assert_eq!(mosh_node.info().num_frames, clip_config.length);

    let expected = run(&read_sequence::<u8>(&src_node)?, &core_params(&params)?)?;

    // Request frames out of order to exercise the frame history
    let _ = mosh_node.get_frame(4)?;
    let _ = mosh_node.get_frame(1)?;
    assert_matches_core::<u8>(&mosh_node, &expected, "movement rgb")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_long_movement_any_order() -> Result<()> {
    require_datamosh!();

    // Long enough for the frame history to thin its checkpoints
    let clip_config =
        TestClipConfig::gray8(32, 32, 48, ClipContentType::MovingBox { speed_x: 1, speed_y: 1 });
    let params = FilterParams {
        mode: Some(DatamoshMode::Movement as i64),
        blksize: Some(8),
        maxshift: Some(2),
        shiftrange: Some(1),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;

    let expected = run(&read_sequence::<u8>(&src_node)?, &core_params(&params)?)?;

    for n in [47, 3, 30, 29, 0, 46, 17] {
        let _ = mosh_node.get_frame(n)?;
    }
    for n in (0..clip_config.length).rev() {
        let _ = mosh_node.get_frame(n)?;
    }
    assert_matches_core::<u8>(&mosh_node, &expected, "long movement")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_glide_16bit_yuv444() -> Result<()> {
    require_datamosh!();

    let clip_config = TestClipConfig {
        width: 64,
        height: 48,
        format: "vs.YUV444P16",
        length: 3,
        content_type: ClipContentType::MovingBox { speed_x: 2, speed_y: 0 },
        colors: ("[4096, 32768, 32768]", "[60000, 20000, 40000]"),
    };
    let params = FilterParams {
        blksize: Some(16),
        maxshift: Some(4),
        shiftrange: Some(1),
        length: Some(5),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;

    let expected = run(&read_sequence::<u16>(&src_node)?, &core_params(&params)?)?;
    assert_matches_core::<u16>(&mosh_node, &expected, "glide 16-bit")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_glide_float_gray() -> Result<()> {
    require_datamosh!();

    let clip_config = TestClipConfig {
        width: 48,
        height: 48,
        format: "vs.GRAYS",
        length: 2,
        content_type: ClipContentType::MovingBox { speed_x: 3, speed_y: 3 },
        colors: ("[0.25]", "[0.75]"),
    };
    let params = FilterParams {
        length: Some(4),
        blksize: Some(8),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;

    let expected = run(&read_sequence::<f32>(&src_node)?, &core_params(&params)?)?;
    assert_matches_core::<f32>(&mosh_node, &expected, "glide float")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_single_frame_passes_through() -> Result<()> {
    require_datamosh!();

    let clip_config = TestClipConfig::gray8(32, 32, 1, ClipContentType::Blank);
    let params = FilterParams {
        length: Some(10),
        ..Default::default()
    };

    let env = Environment::from_script(&generate_script(&clip_config, &params))?;
    let (src_node, _) = env.get_output(0)?;
    let (mosh_node, _) = env.get_output(1)?;
    assert_eq!(mosh_node.info().num_frames, 1);

    let src = read_sequence::<u8>(&src_node)?;
    assert_matches_core::<u8>(&mosh_node, &src, "single frame")?;

    Ok(())
}

#[test]
#[cfg(feature = "e2e")]
fn test_datamosh_rejects_invalid_input() {
    require_datamosh!();

    let single = TestClipConfig::gray8(32, 32, 1, ClipContentType::Blank);
    let strict = FilterParams {
        strict: Some(1),
        ..Default::default()
    };
    assert!(Environment::from_script(&generate_script(&single, &strict)).is_err());

    let small = TestClipConfig::gray8(32, 32, 4, ClipContentType::Blank);
    let oversized = FilterParams {
        blksize: Some(48),
        ..Default::default()
    };
    assert!(Environment::from_script(&generate_script(&small, &oversized)).is_err());

    let oversized_copy = FilterParams {
        mode: Some(DatamoshMode::Copy as i64),
        blksize: Some(48),
        ..Default::default()
    };
    assert!(Environment::from_script(&generate_script(&small, &oversized_copy)).is_err());

    let bad_mode = FilterParams {
        mode: Some(7),
        ..Default::default()
    };
    assert!(Environment::from_script(&generate_script(&small, &bad_mode)).is_err());

    let subsampled = TestClipConfig {
        format: "vs.YUV420P8",
        colors: ("[0, 128, 128]", "[255, 128, 128]"),
        ..TestClipConfig::gray8(32, 32, 4, ClipContentType::Blank)
    };
    assert!(
        Environment::from_script(&generate_script(&subsampled, &FilterParams::default())).is_err()
    );
}
