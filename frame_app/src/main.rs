//! Frame pipeline demo application
//!
//! Generates a small random scene and runs several frames through the
//! cull-and-bin pipeline. Each frame is drawn on a worker thread while the
//! following frame is culled on the main thread.
//!
//! Usage: `frame_app [bins.toml|bins.ron] [frame_count]`

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_cull::config::ConfigError;
use rust_cull::foundation::logging;
use rust_cull::prelude::*;
use slotmap::SlotMap;
use thiserror::Error;

const DEFAULT_FRAMES: u64 = 4;
const OBJECT_COUNT: usize = 48;

#[derive(Error, Debug)]
enum AppError {
    #[error("Cull error: {0}")]
    Cull(#[from] CullError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

struct SceneGeom {
    name: String,
    state: Arc<RenderState>,
    position: Vec3,
}

struct Scene {
    geoms: SlotMap<GeomKey, SceneGeom>,
}

impl Scene {
    fn generate(count: usize, rng: &mut StdRng) -> Self {
        let mut geoms = SlotMap::with_key();

        geoms.insert(SceneGeom {
            name: "sky".to_string(),
            state: RenderState::new()
                .with(CullBinAttrib::new("background", 0))
                .with(RenderAttrib::DepthWrite(false))
                .into_shared(),
            position: Vec3::zeros(),
        });

        for i in 0..count {
            let mode = match rng.gen_range(0..6) {
                0 => TransparencyMode::Alpha,
                1 => TransparencyMode::Binary,
                2 => TransparencyMode::Dual,
                _ => TransparencyMode::None,
            };
            let state = RenderState::new()
                .with(TransparencyAttrib::new(mode))
                .with(TextureId(rng.gen_range(0..4)))
                .into_shared();
            let position = Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-15.0..5.0),
            );
            geoms.insert(SceneGeom {
                name: format!("{mode:?}-{i}").to_lowercase(),
                state,
                position,
            });
        }

        for (order, label) in ["score", "lives", "fps"].into_iter().enumerate() {
            geoms.insert(SceneGeom {
                name: label.to_string(),
                state: RenderState::new()
                    .with(TransparencyAttrib::new(TransparencyMode::Dual))
                    .with(CullBinAttrib::new("fixed", i32::try_from(order).unwrap_or(i32::MAX)))
                    .into_shared(),
                position: Vec3::new(0.0, 0.0, 1.0),
            });
        }

        Self { geoms }
    }

    #[allow(clippy::cast_precision_loss)]
    fn traverse(&self, frame: u64, result: &mut CullResult) -> Result<(), CullError> {
        let drift = (frame as f32 * 0.5).sin();
        for (key, geom) in &self.geoms {
            let offset = Vec3::new(0.0, 0.0, drift);
            let transform = Mat4::new_translation(&(geom.position + offset));
            result.add_object(CullableObject::new(key, Arc::clone(&geom.state), transform))?;
        }
        Ok(())
    }

    fn name(&self, key: GeomKey) -> &str {
        self.geoms.get(key).map_or("?", |geom| geom.name.as_str())
    }
}

fn load_config(path: Option<&str>) -> Result<CullBinConfig, AppError> {
    match path {
        Some(path) => {
            log::info!("Loading bin table from {path}");
            Ok(CullBinConfig::load_from_file(path)?)
        }
        None => {
            log::info!("Using the default bin table");
            Ok(CullBinConfig::default())
        }
    }
}

fn report_frame(scene: &Scene, context: &RecordingContext, stats: DrawStats) {
    let calls = context.take_calls();
    log::info!(
        "Drew {} objects in {} bins",
        stats.objects_drawn,
        stats.bins_drawn
    );

    let mut current_bin: Option<&str> = None;
    for call in &calls {
        if current_bin != Some(call.bin.as_str()) {
            current_bin = Some(call.bin.as_str());
            log::info!("  [{}]", call.bin);
        }
        log::debug!(
            "    {} ({:?})",
            scene.name(call.geom),
            call.state.transparency_mode()
        );
    }
}

fn run(config: &CullBinConfig, frames: u64) -> Result<(), AppError> {
    let context = Arc::new(RecordingContext::looking_from(
        Point3::new(0.0, 2.0, 20.0),
        Point3::origin(),
    ));
    let mut pipeline = FramePipeline::from_config(config, context.clone())?;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let scene = Scene::generate(OBJECT_COUNT, &mut rng);
    log::info!("Scene has {} geoms", scene.geoms.len());

    let mut in_flight: Option<CulledFrame> = None;
    for frame in 0..frames {
        let (culled, drawn) = std::thread::scope(|scope| {
            let drawing = in_flight.take().map(|previous| scope.spawn(move || previous.draw()));
            let culled = pipeline.cull_frame(|result| scene.traverse(frame, result));
            let drawn = drawing.and_then(|handle| match handle.join() {
                Ok(stats) => Some(stats),
                Err(_) => {
                    log::error!("Draw thread panicked");
                    None
                }
            });
            (culled, drawn)
        });

        if let Some(stats) = drawn {
            report_frame(&scene, &context, stats);
        }
        let culled = culled?;
        log::info!(
            "Culled frame {} with {} objects",
            culled.frame_number(),
            culled.result().object_count()
        );
        in_flight = Some(culled);
    }

    if let Some(last) = in_flight.take() {
        let stats = last.draw();
        report_frame(&scene, &context, stats);
    }

    pipeline.shutdown();
    Ok(())
}

fn main() {
    logging::init_with_level("info");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let outcome = parse_frames(args.get(1).map(String::as_str))
        .and_then(|frames| load_config(args.first().map(String::as_str)).map(|config| (config, frames)))
        .and_then(|(config, frames)| run(&config, frames));

    if let Err(err) = outcome {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn parse_frames(arg: Option<&str>) -> Result<u64, AppError> {
    arg.map_or(Ok(DEFAULT_FRAMES), |value| {
        value
            .parse()
            .map_err(|_| AppError::InvalidArgument(format!("frame count '{value}'")))
    })
}
