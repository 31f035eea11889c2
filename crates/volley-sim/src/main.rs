mod config;
mod link;
mod scenario;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use config::SimConfig;
use scenario::{Scenario, ScenarioParams};
use tracing::{error, info, warn};
use volley_game::{BulletRegistry, LookupTables};

const DEFAULT_CONFIG: &str = "volley.toml";

fn load_registry(dir: &str, tables: &LookupTables) -> Option<BulletRegistry> {
    match volley_content::load_dir(Path::new(dir), tables) {
        Ok(registry) if !registry.is_empty() => return Some(registry),
        Ok(_) => warn!("No bullet types in {dir}, using built-in set"),
        Err(e) => warn!("Failed to load content from {dir}: {e}, using built-in set"),
    }
    match BulletRegistry::builtin() {
        Ok(registry) => Some(registry),
        Err(e) => {
            error!("Built-in bullet set is invalid: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = match SimConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Volley simulator v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Seed: {}, ticks: {}, tick rate: {}, drop rate: {}",
        config.simulation.seed,
        config.simulation.ticks,
        config.simulation.tick_rate,
        config.network.drop_rate
    );

    let tables = LookupTables::new();
    let Some(registry) = load_registry(&config.content.directory, &tables) else {
        std::process::exit(1);
    };
    for ty in registry.all() {
        info!(
            "  [{}] {} (hit: {}, sound: {}, status: {}, range: {:.0})",
            ty.id,
            ty.name,
            tables.effect_name(ty.hit_effect),
            tables.sound_name(ty.hit_sound),
            tables.status_name(ty.status),
            ty.range()
        );
    }

    let mut sim = Scenario::new(
        Arc::new(registry),
        ScenarioParams {
            seed: config.simulation.seed,
            fire_interval: config.simulation.fire_interval,
            targets: config.simulation.targets,
            drop_rate: config.network.drop_rate,
        },
    );

    let mut pacer = (config.simulation.tick_rate > 0).then(|| {
        tokio::time::interval(Duration::from_secs_f64(
            1.0 / f64::from(config.simulation.tick_rate),
        ))
    });

    while sim.current_tick() < config.simulation.ticks {
        if let Some(interval) = pacer.as_mut() {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {}
            }
        }

        if let Err(e) = sim.step() {
            error!("Simulation stopped at tick {}: {e}", sim.current_tick());
            break;
        }

        if sim.current_tick() % 100 == 0 {
            let (server, client) = sim.live_bullets();
            info!(
                "tick {}: {} bullet(s) on server, {} on client",
                sim.current_tick(),
                server,
                client
            );
        }
    }

    let link = sim.link_stats();
    info!("Finished after {} tick(s), {} volley(s)", sim.current_tick(), sim.volleys());
    info!("Server: {}", sim.server_tally());
    info!("Client: {}", sim.client_tally());
    info!(
        "Link: sent={} delivered={} dropped={} bytes={}",
        link.sent, link.delivered, link.dropped, link.bytes
    );
}
