use std::path::PathBuf;

use clap::Parser;

mod app;
mod config;
mod ui;

use app::App;
use config::Config;

/// Drive a configured menu against a demo sketch
#[derive(Parser, Debug)]
#[command(name = "skatolo", version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "skatolo.toml")]
    config: PathBuf,
    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 60)]
    frames: u32,
}

fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {}, using defaults", args.config.display(), e);
            Config::default()
        }
    };

    let mut app = App::new(config);
    app.run(args.frames);

    let sketch = app.sketch().borrow();
    log::info!(
        "Menu value {}, preset {}, speed {}",
        app.menu().list.value(),
        sketch.preset,
        sketch.speed
    );
}
