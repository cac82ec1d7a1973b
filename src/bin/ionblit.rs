use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ionblit::{DeviceContext, MonotonicClock, PipelineOpts, Rotation, RunConfig};

/// Blit a raw image to the display through GE2D for one second and report the frame rate.
///
/// Configuration is read from the JSON file named by `IONBLIT_CONFIG`, if set.
#[derive(Parser, Debug)]
// Every argument reaches the rotation parser, so `-h` and `-V` are not flags.
#[command(name = "ionblit", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Rotation: 0 = 0°, 1 = 90°, 2 = 180°, 3 = 270°. Anything else means 0.
    #[arg(allow_hyphen_values = true)]
    rotation: Option<String>,

    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    _ignored: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rotation = cli
        .rotation
        .as_deref()
        .map(Rotation::from_arg)
        .unwrap_or_default();

    let config = RunConfig::from_env().context("load configuration")?;
    config.validate().context("validate configuration")?;

    let mut ctx = DeviceContext::new(config.device_provider());
    let opts = PipelineOpts::from_config(&config, rotation);
    let result = ionblit::pipeline::run(&mut ctx, &opts, &mut MonotonicClock::new());
    ctx.close();

    let stats = result.context("display pipeline")?;
    println!(
        "Frames={} in {:.6} seconds (FPS: {})",
        stats.frames,
        stats.elapsed.as_secs_f64(),
        stats.fps()
    );
    Ok(())
}
