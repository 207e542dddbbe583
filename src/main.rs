use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use plexus_sim::FieldParams;
use std::io;

/// Animated particle-network background
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Initial surface width in pixels
  #[arg(long, default_value_t = 1280)]
  width: u32,
  /// Initial surface height in pixels
  #[arg(long, default_value_t = 720)]
  height: u32,
  /// Surface area per particle, in square pixels
  #[arg(short, long, default_value_t = 15_000.0)]
  density: f32,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Stop a headless run after this many frames
  #[arg(long)]
  frames: Option<u64>,
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

fn main() {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return;
  }

  let params = FieldParams {
    density: args.density,
    ..FieldParams::default()
  };
  plexus_sim::state::run(params, args.width, args.height, args.headless, args.frames);
}
