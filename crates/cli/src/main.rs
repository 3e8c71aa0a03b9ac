use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::Receiver;
use image::metadata::Orientation;

use personal_mirror_core::analysis::domain::analysis_request::AnalysisRequest;
use personal_mirror_core::analysis::infrastructure::face_api_client::FaceApiClient;
use personal_mirror_core::analysis::infrastructure::retrying_face_analyzer::RetryingFaceAnalyzer;
use personal_mirror_core::camera::domain::camera_session::CameraSession;
use personal_mirror_core::camera::domain::device_info::{DeviceInfo, Panel};
use personal_mirror_core::camera::infrastructure::static_device_enumerator::StaticDeviceEnumerator;
use personal_mirror_core::camera::infrastructure::still_image_camera::StillImageCamera;
use personal_mirror_core::detection::domain::detection_gate::GatePolicy;
use personal_mirror_core::photo::infrastructure::analysis_sink::AnalysisSink;
use personal_mirror_core::photo::infrastructure::jpeg_reencoder::JpegReencoder;
use personal_mirror_core::photo::infrastructure::pictures_folder_sink::PicturesFolderSink;
use personal_mirror_core::pipeline::mirror_controller::{
    MirrorController, MirrorMessage, MirrorSettings,
};
use personal_mirror_core::shared::constants::{FACE_API_KEY_ENV, IMAGE_EXTENSIONS};
use personal_mirror_core::shared::mirror_config::MirrorConfig;

/// Saves a photo, and optionally analyzes it, whenever a face comes into view.
#[derive(Parser)]
#[command(name = "personal-mirror")]
struct Cli {
    /// Camera as <panel>:<image path>, panel is front, back or unknown. Repeatable.
    #[arg(long = "device", required = true)]
    devices: Vec<String>,

    /// JSON config file (default: <config dir>/PersonalMirror/config.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory photos are saved to.
    #[arg(long)]
    pictures_dir: Option<PathBuf>,

    /// Capture only the first face of the session, then exit.
    #[arg(long)]
    one_shot: bool,

    /// Exit after this many capture cycles.
    #[arg(long)]
    max_cycles: Option<usize>,

    /// Skip remote face analysis even when an API key is set.
    #[arg(long)]
    no_analysis: bool,

    /// Milliseconds between face detection checks.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Stop after this many seconds.
    #[arg(long)]
    duration_secs: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let devices = cli
        .devices
        .iter()
        .map(|d| parse_device(d))
        .collect::<Result<Vec<_>, _>>()?;
    validate(&cli, &devices)?;

    let config = load_config(&cli)?;
    log::debug!("Using {config:?}");

    let cancelled = Arc::new(AtomicBool::new(false));
    let pictures_dir = config.resolve_pictures_dir()?;
    log::info!("Saving photos to {}", pictures_dir.display());

    let camera = StillImageCamera::new().with_jpeg_quality(config.jpeg_quality);
    let analysis = build_analysis(&config, &cancelled)?;
    let settings = MirrorSettings {
        effect: config.effect_definition(),
        gate_policy: config.gate_policy,
        orientation: Orientation::NoTransforms,
        max_cycles: match config.gate_policy {
            GatePolicy::OneShot => Some(1),
            GatePolicy::RearmOnCompletion => cli.max_cycles,
        },
    };

    let mut controller = MirrorController::new(
        CameraSession::new(Box::new(camera)),
        Arc::new(JpegReencoder::new(config.jpeg_quality)),
        PicturesFolderSink::new(pictures_dir, config.photo_name.clone()),
        analysis,
        settings,
        cancelled.clone(),
    );

    if let Some(secs) = cli.duration_secs {
        let cancelled = cancelled.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            log::info!("Time limit of {secs}s reached");
            cancelled.store(true, Ordering::Relaxed);
        });
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let reporter = thread::spawn(move || report(&rx));

    let enumerator = StaticDeviceEnumerator::new(devices);
    let result = controller.run(&enumerator, &tx);
    drop(tx);
    let _ = reporter.join();

    let summary = result?;
    log::info!(
        "{} photo(s) saved in {} cycle(s)",
        summary.photos_saved,
        summary.cycles_completed
    );
    Ok(())
}

fn load_config(cli: &Cli) -> Result<MirrorConfig, Box<dyn std::error::Error>> {
    let path = cli.config.clone().or_else(MirrorConfig::default_path);
    let mut config = match path {
        Some(path) => MirrorConfig::load(&path)?,
        None => MirrorConfig::default(),
    }
    .with_env();

    if let Some(dir) = &cli.pictures_dir {
        config.pictures_dir = Some(dir.clone());
    }
    if let Some(ms) = cli.interval_ms {
        config.detection_interval_ms = ms;
    }
    if cli.one_shot {
        config.gate_policy = GatePolicy::OneShot;
    }
    if cli.no_analysis {
        config.analysis.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

fn build_analysis(
    config: &MirrorConfig,
    cancelled: &Arc<AtomicBool>,
) -> Result<Option<AnalysisSink>, Box<dyn std::error::Error>> {
    if !config.analysis.enabled {
        log::info!("Face analysis disabled");
        return Ok(None);
    }
    let Some(api_key) = config.analysis.api_key.clone() else {
        log::warn!("{FACE_API_KEY_ENV} is not set, face analysis disabled");
        return Ok(None);
    };

    let client = FaceApiClient::new(&config.analysis.endpoint, api_key, config.analysis.timeout())?;
    let analyzer = RetryingFaceAnalyzer::new(
        Box::new(client),
        config.retry_policy(),
        cancelled.clone(),
    );
    log::info!("Face analysis via {}", config.analysis.endpoint);
    Ok(Some(AnalysisSink::new(
        Arc::new(analyzer),
        AnalysisRequest::MIRROR,
    )))
}

fn report(rx: &Receiver<MirrorMessage>) {
    for message in rx {
        match message {
            MirrorMessage::SessionReady { device, mirrored } => {
                let preview = if mirrored { "mirrored" } else { "not mirrored" };
                log::info!("Watching {} ({preview})", device.name);
            }
            MirrorMessage::FaceAdmitted { cycle } => log::info!("Cycle {cycle}: face in view"),
            MirrorMessage::DetectionSuppressed { cycle_in_flight } => {
                log::debug!("Detection ignored while cycle {cycle_in_flight} runs")
            }
            MirrorMessage::PhotoSaved { path, .. } => println!("{}", path.display()),
            MirrorMessage::FacesAnalyzed { cycle, faces } => {
                log::info!("Cycle {cycle}: {} face(s) analyzed", faces.len());
                for face in &faces {
                    println!("  {}", face.describe());
                }
            }
            MirrorMessage::CycleFailed {
                cycle,
                stage,
                error,
            } => log::warn!("Cycle {cycle}: {stage} failed: {error}"),
            MirrorMessage::CycleComplete { cycle, success } => {
                log::debug!("Cycle {cycle} complete (success: {success})")
            }
            MirrorMessage::GateRearmed => log::info!("Face left view, waiting for the next one"),
        }
    }
}

/// `front:/path/face.png` → front-panel device whose id is the path.
fn parse_device(arg: &str) -> Result<DeviceInfo, String> {
    let (panel, path) = arg
        .split_once(':')
        .ok_or_else(|| format!("Device must be <panel>:<path>, got '{arg}'"))?;
    let panel: Panel = panel.parse()?;
    if path.is_empty() {
        return Err(format!("Device path is empty in '{arg}'"));
    }
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    Ok(DeviceInfo::new(path, name, panel))
}

fn validate(cli: &Cli, devices: &[DeviceInfo]) -> Result<(), Box<dyn std::error::Error>> {
    for device in devices {
        let path = Path::new(&device.id);
        if !path.exists() {
            return Err(format!("Device image not found: {}", path.display()).into());
        }
        if !is_image(path) {
            return Err(format!("Device is not an image file: {}", path.display()).into());
        }
    }
    if cli.max_cycles == Some(0) {
        return Err("--max-cycles must be at least 1".into());
    }
    if cli.interval_ms == Some(0) {
        return Err("--interval-ms must be at least 1".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
