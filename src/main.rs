use hauntstead::{app::HauntedApp, config::WorldConfig, environment::EnvironmentKind};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Route such as "/" or "/debug"; the debug marker enables the tooling
    let route = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    let kind = EnvironmentKind::from_route(&route);
    log::info!("Starting with route '{}' ({:?})", route, kind);

    HauntedApp::new(WorldConfig::from_env(), kind).run()
}
