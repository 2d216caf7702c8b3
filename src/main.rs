use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use particle_shapes::{shapes::Shape, Mode, Rgb, Settings};
use std::io;
use std::process::ExitCode;

/// Particle cloud that morphs between parametric shapes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Shape to start with
  #[arg(short, long, value_enum, default_value_t = Shape::Heart)]
  shape: Shape,
  /// Input driving the interaction factor
  #[arg(short, long, value_enum, default_value_t = Mode::Camera)]
  mode: Mode,
  /// Particle color as #rrggbb
  #[arg(short, long, default_value = "#00fbff", value_parser = parse_color)]
  color: Rgb,
  /// Particle size in world units
  #[arg(long, default_value_t = 0.15)]
  size: f32,
  /// Rotation about the vertical axis, radians per frame
  #[arg(long, default_value_t = 0.003)]
  rotation: f32,
  /// Gesture sensitivity
  #[arg(long, default_value_t = 4.0)]
  sensitivity: f32,
  /// Number of particles
  #[arg(short, long, default_value_t = 20_000)]
  particles: u32,
  /// Seed for reproducible shapes and jitter
  #[arg(long)]
  seed: Option<u64>,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Frames to simulate in headless mode, 0 runs until Ctrl-C
  #[arg(long, default_value_t = 600)]
  frames: u64,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn parse_color(s: &str) -> Result<Rgb, String> {
  s.parse().map_err(|e: particle_shapes::error::Error| e.to_string())
}

impl Args {
  fn settings(&self) -> Settings {
    Settings {
      mode: self.mode,
      shape: self.shape,
      color: self.color,
      size: self.size,
      rotation: self.rotation,
      sensitivity: self.sensitivity,
      particle_count: self.particles,
      seed: self.seed,
    }
  }
}

fn main() -> ExitCode {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = &args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(*shell, &mut cmd, name, &mut io::stdout());
    return ExitCode::SUCCESS;
  }

  env_logger::init();
  let settings = args.settings();
  let result = settings.validate().and_then(|()| {
    if args.headless {
      particle_shapes::state::run_headless(settings, args.frames)
    } else {
      particle_shapes::state::run(settings)
    }
  });
  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{e}");
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
