//! tonezone command line tool
//!
//! Inspects zone tables and plays cadence patterns against a logging sink,
//! which is handy for eyeballing a zone's timing before wiring the engine to
//! real synthesis hardware.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::info;

use tonezone::cadence::{EmitCommand, SegmentDuration, Sequencer, ToneKind, ToneSink};
use tonezone::config::ToneZoneConfig;
use tonezone::registry::ToneZoneRegistry;
use tonezone::utils::setup_logging;
use tonezone::Result;

#[derive(Parser)]
#[command(name = "tonezone")]
#[command(about = "Call-progress tone zone inspector")]
#[command(version = tonezone::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (builtin zone table if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List all zones in the table
    List,
    /// Show one zone's cadences and levels
    Show {
        /// Country code
        country: String,
    },
    /// Play a tone against a logging sink
    Play {
        /// Country code
        country: String,
        /// Tone kind (dialtone, busy, ringtone, ...)
        tone: ToneKind,
        /// Stop playback after this many milliseconds
        #[arg(short, long, default_value = "10000")]
        duration_ms: u64,
    },
    /// Validate a configuration file
    ValidateConfig,
    /// Print the builtin zone table as TOML
    GenerateConfig {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_configuration(&cli)?;
    config.logging.level = cli.log_level.clone();
    setup_logging(&config.logging)?;

    match &cli.command {
        Commands::List => list_zones(&config),
        Commands::Show { country } => show_zone(&config, country),
        Commands::Play {
            country,
            tone,
            duration_ms,
        } => play_tone(&config, country, *tone, *duration_ms).await,
        Commands::ValidateConfig => validate_configuration(&config),
        Commands::GenerateConfig { output } => generate_default_config(output.clone()),
    }
}

fn load_configuration(cli: &Cli) -> Result<ToneZoneConfig> {
    let config = if let Some(config_path) = &cli.config {
        ToneZoneConfig::load_from_file(config_path)?
    } else {
        match ToneZoneConfig::load_from_env() {
            Ok(config) => config,
            Err(_) => ToneZoneConfig::default_config(),
        }
    };

    config.validate()?;
    Ok(config)
}

fn list_zones(config: &ToneZoneConfig) -> Result<()> {
    let registry = ToneZoneRegistry::build(config)?;

    for zone in registry.all_zones() {
        println!(
            "{:>3}  {:<8} {:<45} ring {:?}",
            zone.id,
            zone.country,
            zone.description,
            zone.ring_cadence.steps()
        );
    }
    Ok(())
}

fn show_zone(config: &ToneZoneConfig, country: &str) -> Result<()> {
    let registry = ToneZoneRegistry::build(config)?;
    let zone = registry
        .lookup_country(country)
        .ok_or_else(|| tonezone::Error::configuration(format!("Unknown zone '{}'", country)))?;

    println!("{} (id {}) - {}", zone.country, zone.id, zone.description);
    println!("  ring cadence: {:?} ms", zone.ring_cadence.steps());
    println!(
        "  levels: dtmf {}/{} dB, mf {}/{} dB",
        zone.levels.dtmf_low_level,
        zone.levels.dtmf_high_level,
        zone.levels.mfr1_level,
        zone.levels.mfr2_level
    );
    for kind in zone.tone_kinds() {
        let pattern = registry.resolve_tone(&zone, kind)?;
        println!(
            "  {:<11} {} segments, {:?}, cycle {} ms",
            kind.to_string(),
            pattern.len(),
            pattern.termination(),
            pattern.cycle_millis()
        );
    }
    Ok(())
}

/// Sink that logs each emitted segment instead of producing audio
struct LoggingSink;

#[async_trait]
impl ToneSink for LoggingSink {
    async fn emit(&mut self, command: &EmitCommand) -> Result<()> {
        let duration = match command.duration {
            SegmentDuration::Millis(ms) => format!("{} ms", ms),
            SegmentDuration::Indefinite => "hold".to_string(),
        };
        info!(
            frequencies = ?command.frequencies,
            modulation = ?command.modulation_hz,
            level_db = command.level_db,
            gated = command.gated,
            %duration,
            "emit"
        );
        Ok(())
    }

    async fn quiesce(&mut self) -> Result<()> {
        info!("quiesce");
        Ok(())
    }
}

async fn play_tone(
    config: &ToneZoneConfig,
    country: &str,
    tone: ToneKind,
    duration_ms: u64,
) -> Result<()> {
    let registry = ToneZoneRegistry::build(config)?;
    let pattern = registry.resolve_with_fallback(country, tone)?;
    let zone = registry
        .lookup_country(country)
        .ok_or_else(|| tonezone::Error::configuration(format!("Unknown zone '{}'", country)))?;

    let level_db = pattern
        .segment(0)
        .map(|s| zone.level_for(&s.frequencies))
        .unwrap_or(tonezone::NOMINAL_TONE_LEVEL_DB);

    let mut sequencer = Sequencer::new(pattern, level_db);
    let mut sink = LoggingSink;
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    info!(country, tone = %tone, duration_ms, "Playing");

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = timeout(
        Duration::from_millis(duration_ms),
        sequencer.play(&mut sink, &mut cancel_rx),
    )
    .await;

    ctrl_c.abort();

    match outcome {
        Ok(result) => {
            let state = result?;
            info!(?state, "Playback finished");
        }
        Err(_) => {
            sequencer.cancel();
            info!(state = ?sequencer.state(), "Playback window elapsed");
        }
    }
    Ok(())
}

fn validate_configuration(config: &ToneZoneConfig) -> Result<()> {
    config.validate()?;
    let registry = ToneZoneRegistry::build(config)?;

    println!("Configuration is valid");
    println!("  Zones: {}", registry.len());
    println!("  Default zone: {}", registry.default_zone());
    Ok(())
}

fn generate_default_config(output_path: Option<PathBuf>) -> Result<()> {
    let config = ToneZoneConfig::default_config();
    let toml_content = toml::to_string_pretty(&config)
        .map_err(|e| tonezone::Error::internal(format!("Failed to serialize config: {}", e)))?;

    match output_path {
        Some(path) => {
            std::fs::write(&path, toml_content)?;
            println!("Default configuration written to: {}", path.display());
        }
        None => {
            println!("{}", toml_content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_generation() {
        assert!(generate_default_config(None).is_ok());
    }

    #[test]
    fn test_list_and_show() {
        let config = ToneZoneConfig::default_config();
        assert!(list_zones(&config).is_ok());
        assert!(show_zone(&config, "uk").is_ok());
        assert!(show_zone(&config, "zz").is_err());
    }

    #[tokio::test]
    async fn test_play_bounded_by_duration() {
        let config = ToneZoneConfig::default_config();
        play_tone(&config, "us", ToneKind::Busy, 50).await.unwrap();
    }
}
