//! `glscene [SCENE] [CONFIG]`
//!
//! Opens a window and renders SCENE (default `assets/scene.json`). CONFIG is
//! an optional JSON file of [`AppConfig`] overrides.

use anyhow::Context;
use glscene::AppConfig;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let scene = args.next();
    let mut config = match args.next() {
        Some(path) => AppConfig::from_file(&path)
            .with_context(|| format!("failed to read config {path}"))?,
        None => AppConfig::default(),
    };
    if let Some(scene) = scene {
        config.scene = scene.into();
    }

    glscene::app::run(config)
}
