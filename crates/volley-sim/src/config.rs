use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub content: ContentSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct SimulationSection {
    /// Seeds both worlds and the lossy link.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Ticks to run before shutting down.
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Ticks per second. 0 runs unpaced.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Ticks between turret volleys.
    #[serde(default = "default_fire_interval")]
    pub fire_interval: u64,
    /// Target units per team.
    #[serde(default = "default_targets")]
    pub targets: u32,
}

fn default_seed() -> u64 {
    1
}

fn default_ticks() -> u64 {
    600
}

fn default_tick_rate() -> u32 {
    60
}

fn default_fire_interval() -> u64 {
    10
}

fn default_targets() -> u32 {
    6
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ticks: default_ticks(),
            tick_rate: default_tick_rate(),
            fire_interval: default_fire_interval(),
            targets: default_targets(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkSection {
    /// Probability that a replication datagram is lost.
    #[serde(default)]
    pub drop_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct ContentSection {
    #[serde(default = "default_content_directory")]
    pub directory: String,
}

fn default_content_directory() -> String {
    "content/bullets".into()
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            directory: default_content_directory(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SimConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.network.drop_rate) {
            return Err(format!(
                "network.drop_rate must be in [0, 1], got {}",
                self.network.drop_rate
            ));
        }
        if self.simulation.fire_interval == 0 {
            return Err("simulation.fire_interval must be at least 1".into());
        }
        Ok(())
    }
}
