//! pzl: chained question/answer puzzles
//!
//! Commands:
//!   build <chain-file>  - encrypt a question/answer list into a puzzle artifact
//!   play <artifact>     - answer the questions of an artifact on stdin
//!   config show         - display the effective settings

mod chain_file;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use pzl_core::config::{EncryptionVariant, KdfPreset, PuzzleSettings};
use pzl_crypto::{CryptoConfig, PuzzleArtifact};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pzl",
    version,
    about = "Chained question/answer puzzles",
    long_about = "pzl: encrypt a list of questions and answers into a puzzle where each \
                  answer unlocks the next question"
)]
struct Cli {
    /// Path to pzl.toml settings file
    #[arg(long, short = 'c', env = "PZL_CONFIG", default_value = "pzl.toml", global = true)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); default from settings
    #[arg(long, env = "PZL_LOG", global = true)]
    log: Option<String>,

    /// Log format; default from settings
    #[arg(long, env = "PZL_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a question/answer list into a puzzle artifact
    ///
    /// The chain file is a JSON array (`.json`) or TOML with a `chain` array.
    /// Its length must be odd: questions and answers alternate and the last
    /// entry is the final message.
    Build {
        /// Chain file
        chain: PathBuf,
        /// Artifact output path (default: <chain stem>.pzl.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Encryption variant (overrides settings)
        #[arg(long, short = 'e')]
        encryption: Option<VariantArg>,
        /// scrypt cost preset (overrides settings)
        #[arg(long)]
        preset: Option<PresetArg>,
    },

    /// Play a puzzle artifact on stdin/stdout
    ///
    /// Exits 0 when every answer is right, 1 on the first wrong answer.
    Play {
        /// Artifact produced by `pzl build`
        artifact: PathBuf,
    },

    /// Settings management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective settings (defaults merged with the settings file)
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantArg {
    Plain,
    Spiced,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetArg {
    Fast,
    Default,
    Strong,
}

/// Exit status for errors, kept apart from the wrong-answer status.
const ERROR_EXIT: u8 = 2;

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(ERROR_EXIT)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let loaded = settings::load_settings(&cli.config)?;
    let mut settings = loaded.settings;

    let level = cli.log.clone().unwrap_or_else(|| settings.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None => parse_log_format(&settings.log.format),
    };
    init_logging(&level, format);

    if !loaded.from_file {
        warn!(
            "settings file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Build {
            chain,
            output,
            encryption,
            preset,
        } => {
            apply_overrides(&mut settings, encryption, preset);
            cmd_build(&settings, &chain, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Play { artifact } => cmd_play(&artifact),
        Commands::Config {
            action: ConfigAction::Show,
        } => {
            cmd_config_show(&settings, &cli.config, loaded.from_file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout belongs to the puzzle; logs always go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn parse_log_format(name: &str) -> LogFormat {
    if name.eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    }
}

fn apply_overrides(
    settings: &mut PuzzleSettings,
    encryption: Option<VariantArg>,
    preset: Option<PresetArg>,
) {
    if let Some(encryption) = encryption {
        settings.encryption = match encryption {
            VariantArg::Plain => EncryptionVariant::Plain,
            VariantArg::Spiced => EncryptionVariant::Spiced,
        };
    }
    if let Some(preset) = preset {
        settings.scrypt.preset = match preset {
            PresetArg::Fast => KdfPreset::Fast,
            PresetArg::Default => KdfPreset::Default,
            PresetArg::Strong => KdfPreset::Strong,
        };
    }
}

// ── `pzl build` ───────────────────────────────────────────────────────────────

fn cmd_build(settings: &PuzzleSettings, chain_path: &Path, output: Option<&Path>) -> Result<()> {
    let items = chain_file::load_chain(chain_path)?;

    let crypto = CryptoConfig::resolve(settings, &mut rand::thread_rng())
        .context("resolving crypto settings")?;
    if settings.scrypt.preset == KdfPreset::Fast && settings.scrypt.n.is_none() {
        warn!("building with the fast scrypt preset: answers are cheap to brute-force");
    }

    let artifact = PuzzleArtifact::from_list(&items, crypto)
        .with_context(|| format!("building puzzle from {}", chain_path.display()))?;
    let bytes = artifact.to_bytes()?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| chain_file::default_output(chain_path));
    std::fs::write(&output, &bytes)
        .with_context(|| format!("writing artifact: {}", output.display()))?;

    info!(output = %output.display(), bytes = bytes.len(), "wrote artifact");
    println!("{}", output.display());
    Ok(())
}

// ── `pzl play` ────────────────────────────────────────────────────────────────

fn cmd_play(artifact_path: &Path) -> Result<ExitCode> {
    let data = std::fs::read(artifact_path)
        .with_context(|| format!("reading artifact: {}", artifact_path.display()))?;
    let artifact = PuzzleArtifact::from_bytes(&data)
        .with_context(|| format!("loading artifact: {}", artifact_path.display()))?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let outcome = pzl_unlock::run_puzzle(&artifact, &mut stdin.lock(), &mut stdout.lock())?;
    std::io::stdout().flush().context("flushing stdout")?;

    Ok(ExitCode::from(outcome.exit_code()))
}

// ── `pzl config show` ─────────────────────────────────────────────────────────

fn cmd_config_show(settings: &PuzzleSettings, config_path: &Path, from_file: bool) -> Result<()> {
    if from_file {
        println!("# Settings from: {}", config_path.display());
    } else {
        println!("# Settings: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = settings.to_toml().context("serializing settings to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from([
            "pzl", "build", "riddle.toml", "-o", "out.json", "-e", "spiced", "--preset", "fast",
        ]);
        let Commands::Build {
            chain,
            output,
            encryption,
            preset,
        } = cli.command
        else {
            panic!("expected build");
        };
        assert_eq!(chain, PathBuf::from("riddle.toml"));
        assert_eq!(output, Some(PathBuf::from("out.json")));
        assert!(matches!(encryption, Some(VariantArg::Spiced)));
        assert!(matches!(preset, Some(PresetArg::Fast)));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pzl", "play", "p.json", "--log", "debug", "--log-format", "json"]);
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert!(matches!(cli.log_format, Some(LogFormat::Json)));
        assert!(matches!(cli.command, Commands::Play { .. }));
    }

    #[test]
    fn test_apply_overrides() {
        let mut settings = PuzzleSettings::default();
        apply_overrides(&mut settings, Some(VariantArg::Spiced), Some(PresetArg::Strong));
        assert_eq!(settings.encryption, EncryptionVariant::Spiced);
        assert_eq!(settings.scrypt.preset, KdfPreset::Strong);

        apply_overrides(&mut settings, None, None);
        assert_eq!(settings.encryption, EncryptionVariant::Spiced);
    }

    #[test]
    fn test_parse_log_format() {
        assert!(matches!(parse_log_format("JSON"), LogFormat::Json));
        assert!(matches!(parse_log_format("text"), LogFormat::Text));
        assert!(matches!(parse_log_format("bogus"), LogFormat::Text));
    }

    #[test]
    fn test_build_writes_playable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let chain = dir.path().join("riddle.json");
        std::fs::write(&chain, r#"["Q1?", "A1", "Done!"]"#).unwrap();

        let mut settings = PuzzleSettings::default();
        settings.scrypt.preset = KdfPreset::Fast;
        cmd_build(&settings, &chain, None).unwrap();

        let data = std::fs::read(dir.path().join("riddle.pzl.json")).unwrap();
        let artifact = PuzzleArtifact::from_bytes(&data).unwrap();
        let mut output = Vec::new();
        let outcome = pzl_unlock::run_puzzle(
            &artifact,
            &mut std::io::Cursor::new("A1\n"),
            &mut output,
        )
        .unwrap();
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(output, b"Q1?\nDone!\n");
    }

    #[test]
    fn test_build_rejects_even_chain() {
        let dir = tempfile::tempdir().unwrap();
        let chain = dir.path().join("riddle.toml");
        std::fs::write(&chain, r#"chain = ["Q1?", "A1"]"#).unwrap();

        let mut settings = PuzzleSettings::default();
        settings.scrypt.preset = KdfPreset::Fast;
        let out = dir.path().join("out.json");
        assert!(cmd_build(&settings, &chain, Some(&out)).is_err());
        assert!(!out.exists());
    }
}
