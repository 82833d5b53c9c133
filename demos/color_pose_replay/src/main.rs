use argh::FromArgs;
use serde::Deserialize;
use std::{fs::File, io::Write, path::PathBuf, sync::Arc};

use colorpose::{
    geometry::RigidTransform,
    image::{ColorImage, DepthImage, ImageSize},
    tf::{CancellationToken, StaticTransformBuffer, Timestamp},
    ApproximateTimeSynchronizer, CameraInfo, ColorPoseEstimator, EstimatorConfig,
    JsonLinesPublisher, PipelineError, PixelRegion, StaticDetector,
};

#[derive(FromArgs, Debug)]
/// Replay a recorded scenario through the color pose estimator
struct Args {
    /// path to the scenario file
    #[argh(option, short = 's')]
    scenario: PathBuf,
    /// path to an estimator configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
    /// path to write the published messages to, stdout if omitted
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Scenario {
    camera_info: CameraInfo,
    #[serde(default)]
    world_t_camera: RigidTransform,
    detections: Vec<PixelRegion>,
    frames: Vec<ScenarioFrame>,
}

#[derive(Deserialize)]
struct ScenarioFrame {
    stamp: f64,
    /// raw depth of every pixel
    depth: u16,
    #[serde(default)]
    patches: Vec<DepthPatch>,
}

/// A rectangle of constant raw depth painted over the frame.
#[derive(Deserialize)]
struct DepthPatch {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    depth: u16,
}

fn depth_image(size: ImageSize, frame: &ScenarioFrame) -> Result<DepthImage, Box<dyn std::error::Error>> {
    let mut depth = DepthImage::from_size_val(size, frame.depth)?;
    let data = depth.as_slice_mut();
    for patch in &frame.patches {
        let y_end = patch.y.saturating_add(patch.height).min(size.height);
        let x_end = patch.x.saturating_add(patch.width).min(size.width);
        for y in patch.y..y_end {
            for x in patch.x..x_end {
                data[y * size.width + x] = patch.depth;
            }
        }
    }
    Ok(depth)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => EstimatorConfig::from_json_file(path)?,
        None => EstimatorConfig::default(),
    };

    let scenario: Scenario = serde_json::from_reader(std::io::BufReader::new(File::open(
        &args.scenario,
    )?))?;
    log::info!(
        "Loaded {} frames and {} detections from {}",
        scenario.frames.len(),
        scenario.detections.len(),
        args.scenario.display()
    );

    // create a cancel token to stop the replay
    let cancel = CancellationToken::new();
    ctrlc::set_handler({
        let cancel = cancel.clone();
        move || {
            println!("Received Ctrl-C signal. Sending cancel signal !!");
            cancel.cancel();
        }
    })?;

    let transforms = StaticTransformBuffer::default().with_cancellation(cancel.clone());
    transforms.set_static_transform(&config.world_frame, &config.camera_frame, scenario.world_t_camera);

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };

    let mut sync = ApproximateTimeSynchronizer::from_config(&config);
    let mut estimator = ColorPoseEstimator::new(
        config,
        StaticDetector::from_regions(scenario.detections),
        JsonLinesPublisher::new(writer),
        Arc::new(transforms),
    )?
    .with_cancellation(cancel.clone());

    let size = ImageSize {
        width: scenario.camera_info.width as usize,
        height: scenario.camera_info.height as usize,
    };
    let color = ColorImage::from_size_val(size, 0)?;

    let mut processed = 0;
    for frame in &scenario.frames {
        if cancel.is_cancelled() {
            break;
        }

        let stamp = Timestamp::from_secs_f64(frame.stamp);
        sync.push_depth(stamp, depth_image(size, frame)?);
        sync.push_camera_info(stamp, scenario.camera_info.clone());
        let Some(triple) = sync.push_color(stamp, color.clone()) else {
            log::warn!("No synchronized frame at {:.3}s", frame.stamp);
            continue;
        };

        match estimator.process_frame(&triple) {
            Ok(report) => {
                for skipped in report.skipped() {
                    if let Some(err) = &skipped.error {
                        log::warn!("{} skipped: {err}", skipped.label);
                    }
                }
                processed += 1;
            }
            Err(PipelineError::Cancelled { published }) => {
                log::warn!("Cancelled with {published} records published");
                break;
            }
            Err(err) => log::error!("Failed to process frame at {:.3}s: {err}", frame.stamp),
        }
    }

    log::info!(
        "Processed {processed} of {} frames, {} messages dropped by the synchronizer",
        scenario.frames.len(),
        sync.dropped()
    );

    Ok(())
}
