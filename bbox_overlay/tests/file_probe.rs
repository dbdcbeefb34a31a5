use bbox_overlay::error::ProbeError;
use bbox_overlay::{
    BBOX_HEADING, CardBoard, CardElement, CardOutcome, Dimensions, DisplayRect, FileProbe, ImageElement,
    ImageProbe, OverlayPipeline, PipelineConfig,
};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

fn write_png(dir: &std::path::Path, name: &str, width: u32, height: u32) {
    let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
    img.save(dir.join(name)).unwrap();
}

#[tokio::test]
async fn reads_natural_size_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "car.png", 800, 600);

    let probe = FileProbe::new(dir.path());
    let size = probe.natural_dimensions("/car.png").await.unwrap();
    assert_eq!(size, Dimensions::new(800.0, 600.0));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let probe = FileProbe::new(dir.path());
    let err = probe.natural_dimensions("/nope.png").await.unwrap_err();
    assert!(matches!(err, ProbeError::Io { .. }));
}

#[tokio::test]
async fn pass_over_real_files_skips_broken_links() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png", 800, 600);
    std::fs::write(dir.path().join("broken.png"), b"truncated").unwrap();

    let image = |src: &str| {
        Some(ImageElement {
            src: src.to_string(),
            displayed: Some(Dimensions::new(400.0, 300.0)),
        })
    };
    let board = CardBoard::new(vec![
        CardElement::new("a", image("/a.png")).with_field(BBOX_HEADING, "100,100,200,200"),
        CardElement::new("broken", image("/broken.png")).with_field(BBOX_HEADING, "1,1,2,2"),
        CardElement::new("gone", image("/gone.png")).with_field(BBOX_HEADING, "1,1,2,2"),
    ]);

    let pipeline = OverlayPipeline::new(Arc::new(FileProbe::new(dir.path())), PipelineConfig::default());
    let report = pipeline.render(&board).await;

    assert_eq!(
        report.outcome("a"),
        Some(&CardOutcome::Drawn(DisplayRect { x: 50.0, y: 50.0, width: 50.0, height: 50.0 }))
    );
    assert_eq!(report.failed(), 2);
    assert_eq!(board.overlay_count(), 1);
}
