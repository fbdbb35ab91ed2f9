use clap::Parser;
use landmark_gesture::config::EngineConfig;
use landmark_gesture::session::{RecordingSession, SessionEvent};
use landmark_gesture::synthetic::{Shape, SyntheticSpec, synthesize_recording};
use landmark_gesture::template::TemplateStore;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output directory for the recordings
    #[arg(short, long)]
    output: String,

    #[arg(value_enum, default_value = "wave")]
    shape: Shape,

    /// Number of recordings to generate
    #[arg(short, long, default_value = "10")]
    count: usize,

    /// Frames per recording
    #[arg(short, long, default_value = "25")]
    frames: usize,

    /// Landmarks that follow the shape
    #[arg(short, long, default_values_t = [15usize])]
    moving: Vec<usize>,

    #[arg(long, default_value = "1.0")]
    amplitude: f64,

    #[arg(long, default_value = "0.0")]
    noise: f64,

    #[arg(long, default_value = "0.0")]
    dropout: f64,

    #[arg(long, default_value = "0")]
    seed: u64,

    /// Also record a gesture template of this name into `<models>/gestures`
    #[arg(long, requires = "models")]
    template_name: Option<String>,

    /// Models directory the template is saved to
    #[arg(long)]
    models: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let spec = SyntheticSpec {
        shape: args.shape,
        frames: args.frames,
        moving: args.moving.clone(),
        amplitude: args.amplitude,
        noise: args.noise,
        dropout: args.dropout,
        ..Default::default()
    };
    std::fs::create_dir_all(&args.output)?;
    for i in 0..args.count {
        let recording = synthesize_recording(&spec, args.seed + i as u64);
        let file_name = format!("{:?}_{:04}.json", args.shape, i).to_lowercase();
        let path = Path::new(&args.output).join(file_name);
        recording.save(&path)?;
    }
    println!("wrote {} recordings to {}", args.count, args.output);

    if let (Some(name), Some(models)) = (&args.template_name, &args.models) {
        record_template(&spec, args.seed, name, models)?;
    }
    Ok(())
}

/// Feeds one clean recording through a capture session and saves the result.
fn record_template(
    spec: &SyntheticSpec,
    seed: u64,
    name: &str,
    models: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig {
        window_len: spec.frames,
        ..Default::default()
    };
    let clean = SyntheticSpec {
        noise: 0.0,
        dropout: 0.0,
        ..spec.clone()
    };
    let mut session = RecordingSession::new(&config)?
        .with_selection(spec.moving.iter().copied().collect(), Default::default());
    session.handle(SessionEvent::Start { now_ms: 0 });
    session.handle(SessionEvent::Tick {
        now_ms: config.session.countdown_ms,
    });
    for frame in synthesize_recording(&clean, seed).frames.iter().flatten() {
        session.handle(SessionEvent::FrameCaptured(frame));
    }
    let mut store = TemplateStore::load_dir(models, None)?;
    match session.save_into(&mut store, Some(name))? {
        Some(path) => println!("saved template {} to {}", name, path.display()),
        None => println!("{} recorded no usable motion", name),
    }
    Ok(())
}
