use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chromatic_vortex::{ContinuousParams, Jitter, MathConstant, Simulation};

const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// A breathing vortex of particles shaped by a mathematical constant.
#[derive(Parser, Debug)]
#[command(name = "chromatic-vortex")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of particles
    #[arg(short = 'n', long, default_value_t = 45_000)]
    count: u32,

    /// Governing constant, by id (phi, pi, e, tau, ...) or label
    #[arg(short, long, default_value = "phi")]
    constant: MathConstant,

    /// Seed the spawn jitter for reproducible fields
    #[arg(long)]
    seed: Option<u64>,

    /// Disable spawn jitter entirely
    #[arg(long, conflicts_with = "seed")]
    no_jitter: bool,

    /// Rotation speed, 0 to 3
    #[arg(long, default_value_t = 1.0)]
    rotation_speed: f32,

    /// Breathing speed, 0 to 3
    #[arg(long, default_value_t = 1.0)]
    breathe_speed: f32,

    /// Spiral tightness, 0.1 to 3
    #[arg(long, default_value_t = 1.0)]
    spiral_tightness: f32,

    /// Hue drift, 0 to 3
    #[arg(long, default_value_t = 1.0)]
    color_shift: f32,

    /// Particle opacity, 0.1 to 1
    #[arg(long, default_value_t = 0.65)]
    opacity: f32,

    /// Frame rate cap
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Print the constant table and exit
    #[arg(long)]
    list_constants: bool,
}

impl Cli {
    fn jitter(&self) -> Jitter {
        match (self.no_jitter, self.seed) {
            (true, _) => Jitter::Disabled,
            (false, Some(seed)) => Jitter::Seeded(seed),
            (false, None) => Jitter::Entropy,
        }
    }

    fn continuous(&self) -> ContinuousParams {
        ContinuousParams {
            rotation_speed: self.rotation_speed,
            breathe_speed: self.breathe_speed,
            spiral_tightness: self.spiral_tightness,
            color_shift: self.color_shift,
            particle_opacity: self.opacity,
        }
    }
}

fn list_constants() {
    for constant in MathConstant::ALL {
        println!("{:<12} {:<24} {:.9}", constant.id(), constant.label(), constant.value());
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_constants {
        list_constants();
        return ExitCode::SUCCESS;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .init();

    let fps = cli.fps;
    let result = Simulation::new()
        .with_particle_count(cli.count)
        .with_constant(cli.constant)
        .with_continuous(cli.continuous())
        .with_jitter(cli.jitter())
        .with_visuals(|v| {
            v.target_fps(fps);
        })
        .run();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "chromatic-vortex failed");
            ExitCode::FAILURE
        }
    }
}
