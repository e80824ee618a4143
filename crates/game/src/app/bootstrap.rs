use engine::{ContentError, LoopConfig, Scene, World, WorldConfig, DEFAULT_WORLD_SEED};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay;

const SEED_ENV_VAR: &str = "TENDENCIES_SEED";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, ContentError> {
    init_tracing();
    info!("=== Homicidal Tendencies Startup ===");

    let defs = gameplay::build_def_database()?;
    let world_config = WorldConfig {
        seed: resolve_world_seed(std::env::var(SEED_ENV_VAR).ok().as_deref()),
        ..WorldConfig::default()
    };
    info!(
        def_count = defs.entity_defs().len(),
        seed = world_config.seed,
        "world_configured"
    );
    let scene = gameplay::GameplayScene::new(World::new(defs, world_config));

    Ok(AppWiring {
        config: LoopConfig::default(),
        scene: Box::new(scene),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn resolve_world_seed(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return DEFAULT_WORLD_SEED;
    };
    match parse_seed(raw) {
        Some(seed) => seed,
        None => {
            warn!(
                env_var = SEED_ENV_VAR,
                value = raw,
                "invalid seed env var value; falling back to default"
            );
            DEFAULT_WORLD_SEED
        }
    }
}

/// Accepts decimal or `0x`-prefixed hex.
fn parse_seed(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<u64>().ok(),
    }
}
