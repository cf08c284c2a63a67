pub mod app;
pub mod renderer;

use color_eyre::Result;
use app::App;
use renderer::config::RenderConfig;

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = RenderConfig::from_env().and_then(|config| App::new(config).run());
    if let Err(err) = &result {
        log::error!("{err:#}");
    }

    result
}
