use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use solar_system::AppConfig;
use std::io;
use std::path::PathBuf;

/// Real-time solar system with a skybox and a free-fly camera
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Window width in pixels
  #[arg(long, default_value_t = 1024)]
  width: u32,
  /// Window height in pixels
  #[arg(long, default_value_t = 768)]
  height: u32,
  /// Directory holding the planets/ and cubemap/ images
  #[arg(short, long, default_value = "assets")]
  assets: PathBuf,
  /// Longitude divisions of the sphere mesh
  #[arg(long, default_value_t = 100)]
  segments_h: u32,
  /// Latitude bands of the sphere mesh
  #[arg(long, default_value_t = 100)]
  segments_v: u32,
  /// Wait for vertical sync when presenting
  #[arg(long, default_value_t = false)]
  vsync: bool,
  /// Shade planets with the point light instead of flat texture colour
  #[arg(long, default_value_t = false)]
  lit: bool,
  /// Camera speed in units per second
  #[arg(long)]
  speed: Option<f32>,
  /// Degrees of rotation per pixel of mouse movement
  #[arg(long)]
  sensitivity: Option<f32>,
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

impl Args {
  fn into_config(self) -> AppConfig {
    let mut config = AppConfig {
      width: self.width,
      height: self.height,
      assets: self.assets,
      vsync: self.vsync,
      lit: self.lit,
      ..AppConfig::default()
    };
    config.sphere.horizontal_segments = self.segments_h;
    config.sphere.vertical_segments = self.segments_v;
    if let Some(speed) = self.speed {
      config.camera.speed = speed;
    }
    if let Some(sensitivity) = self.sensitivity {
      config.camera.sensitivity = sensitivity;
    }
    config
  }
}

fn main() {
  env_logger::init();
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return;
  }

  if let Err(err) = solar_system::state::run(args.into_config()) {
    log::error!("{err}");
    std::process::exit(1);
  }
}
