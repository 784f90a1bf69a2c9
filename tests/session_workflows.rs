//! Integration tests for complete session workflows
//!
//! These tests drive the public API against real files in temporary
//! directories, using the colour-key and mock backends so no model is needed.

use anyhow::Result;
use bgremove_studio::{
    backends::{ColorKeySegmenter, MockBehavior, MockSegmenter},
    driver::{Command, Driver, Outcome},
    remove_background_file, Action, CodecError, FitBox, OutputFormat, Phase, Session, Slot,
    StudioConfig, StudioError,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Red square on a flat grey background
fn subject_on_grey(width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
    for y in height / 4..height * 3 / 4 {
        for x in width / 4..width * 3 / 4 {
            image.put_pixel(x, y, Rgb([220, 30, 30]));
        }
    }
    image
}

fn write_image(dir: &TempDir, name: &str, format: ImageFormat) -> Result<PathBuf> {
    let path = dir.path().join(name);
    DynamicImage::ImageRgb8(subject_on_grey(64, 48)).save_with_format(&path, format)?;
    Ok(path)
}

fn color_key_session() -> Session {
    Session::new(Arc::new(ColorKeySegmenter::default()))
}

#[test]
fn test_load_remove_save_png() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_image(&dir, "photo.png", ImageFormat::Png)?;
    let mut session = color_key_session();

    session.load(&input)?;
    assert_eq!(session.phase(), Phase::Loaded);
    assert_eq!(session.source_path(), Some(input.as_path()));
    assert!(session.result().is_none());

    session.remove_background()?;
    assert_eq!(session.phase(), Phase::Processed);
    assert_eq!(session.suggested_filename().as_deref(), Some("photo_no_bg.png"));

    let target = session
        .suggested_save_path(dir.path())
        .expect("image is loaded");
    let written = session.save(&target)?;
    assert_eq!(written, target);

    let saved = image::open(&written)?.to_rgba8();
    assert_eq!(saved.dimensions(), (64, 48));
    assert_eq!(saved.get_pixel(0, 0)[3], 0, "background is transparent");
    assert_eq!(*saved.get_pixel(32, 24), Rgba([220, 30, 30, 255]));
    Ok(())
}

#[test]
fn test_each_supported_input_format_loads() -> Result<()> {
    let dir = TempDir::new()?;
    let inputs = [
        write_image(&dir, "a.jpg", ImageFormat::Jpeg)?,
        write_image(&dir, "b.jpeg", ImageFormat::Jpeg)?,
        write_image(&dir, "c.png", ImageFormat::Png)?,
        write_image(&dir, "d.bmp", ImageFormat::Bmp)?,
        write_image(&dir, "E.PNG", ImageFormat::Png)?,
    ];

    let mut session = color_key_session();
    for input in &inputs {
        session.load(input)?;
        assert_eq!(session.phase(), Phase::Loaded, "{}", input.display());
        let original = session.original().expect("loaded");
        assert_eq!((original.width(), original.height()), (64, 48));
    }
    Ok(())
}

#[test]
fn test_second_load_supersedes_result() -> Result<()> {
    let dir = TempDir::new()?;
    let photo = write_image(&dir, "photo.jpg", ImageFormat::Jpeg)?;
    let other = write_image(&dir, "other.png", ImageFormat::Png)?;
    let mut session = color_key_session();

    session.load(&photo)?;
    session.remove_background()?;
    session.load(&other)?;

    assert_eq!(session.phase(), Phase::Loaded);
    assert_eq!(session.source_path(), Some(other.as_path()));
    assert!(session.result().is_none());
    assert!(!session.is_permitted(Action::Save));
    Ok(())
}

#[test]
fn test_failed_load_keeps_previous_image() -> Result<()> {
    let dir = TempDir::new()?;
    let photo = write_image(&dir, "photo.png", ImageFormat::Png)?;
    let mut session = color_key_session();
    session.load(&photo)?;

    let missing = dir.path().join("missing.jpg");
    let err = session.load(&missing).unwrap_err();
    assert!(matches!(
        err,
        StudioError::ImageLoad {
            source: CodecError::NotFound,
            ..
        }
    ));
    assert_eq!(session.phase(), Phase::Loaded);
    assert_eq!(session.source_path(), Some(photo.as_path()));
    Ok(())
}

#[test]
fn test_off_thread_removal_and_stale_result() -> Result<()> {
    let dir = TempDir::new()?;
    let photo = write_image(&dir, "photo.png", ImageFormat::Png)?;
    let mut session = color_key_session();
    session.load(&photo)?;

    let job = session.begin_removal()?;
    let output = std::thread::spawn(move || job.run())
        .join()
        .expect("worker thread");
    session.finish_removal(output)?;
    assert_eq!(session.phase(), Phase::Processed);

    // A job outliving a Clear is rejected
    let job = session.begin_removal()?;
    session.clear();
    let err = session.finish_removal(job.run()).unwrap_err();
    assert!(matches!(err, StudioError::StaleRemoval));
    assert_eq!(session.phase(), Phase::Empty);
    Ok(())
}

#[test]
fn test_previews_fit_box() -> Result<()> {
    let dir = TempDir::new()?;
    let photo = write_image(&dir, "photo.png", ImageFormat::Png)?;
    let mut session = color_key_session();
    session.load(&photo)?;
    session.remove_background()?;

    let preview = session
        .preview(Slot::Result, FitBox::default())?
        .expect("result present");
    assert_eq!((preview.width(), preview.height()), (400, 300));
    assert!(preview.color().has_alpha());

    let preview = session
        .preview(Slot::Original, FitBox::new(100, 100))?
        .expect("original present");
    assert_eq!((preview.width(), preview.height()), (100, 75));
    Ok(())
}

#[test]
fn test_driver_with_injected_session() -> Result<()> {
    let dir = TempDir::new()?;
    let photo = write_image(&dir, "photo.bmp", ImageFormat::Bmp)?;
    let session = Session::new(Arc::new(MockSegmenter::new(MockBehavior::Transparent)))
        .with_output_format(OutputFormat::Tiff);
    let config = StudioConfig::builder().save_dir(dir.path()).build()?;
    let mut driver = Driver::with_session(session, config);

    driver.dispatch(Command::Drop(format!("{{{}}}\n", photo.display())))?;
    driver.dispatch(Command::RemoveBackground)?;
    let outcome = driver.dispatch(Command::Save(None))?;

    let expected = dir.path().join("photo_no_bg.tiff");
    assert_eq!(outcome, Outcome::Saved(expected.clone()));
    let saved = image::open(&expected)?;
    assert!(saved.to_rgba8().pixels().all(|p| p[3] == 0));
    Ok(())
}

#[test]
fn test_remove_background_file_default_output() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_image(&dir, "portrait.jpg", ImageFormat::Jpeg)?;

    let written = remove_background_file(&input, None, &StudioConfig::default())?;
    assert_eq!(written, dir.path().join("portrait_no_bg.png"));
    assert!(written.is_file());

    let explicit = dir.path().join("nested").join("cut");
    let written = remove_background_file(&input, Some(explicit), &StudioConfig::default())?;
    assert_eq!(written, dir.path().join("nested").join("cut.png"));
    assert!(written.is_file());

    // The file name follows the encoded format
    let misnamed = dir.path().join("cut.jpg");
    let written = remove_background_file(&input, Some(misnamed.clone()), &StudioConfig::default())?;
    assert_eq!(written, dir.path().join("cut.png"));
    assert!(!misnamed.exists());
    assert_eq!(image::guess_format(&std::fs::read(&written)?)?, ImageFormat::Png);
    Ok(())
}

#[test]
fn test_transparent_source_stays_transparent() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("icon.png");
    let mut icon = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
    icon.put_pixel(8, 8, Rgba([0, 0, 255, 0]));
    icon.save(&path)?;

    let mut session = color_key_session();
    session.load(&path)?;
    session.remove_background()?;
    let result = session.result().expect("processed").to_rgba8();
    assert_eq!(result.get_pixel(8, 8)[3], 0);
    Ok(())
}
