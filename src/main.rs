use chordforge::config::Config;
use chordforge::corpus::{load_corpus, Modifiers};
use chordforge::error::{CfResult, ChordError};
use chordforge::profile::KeyerProfile;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "Chord layout search for one-handed keyers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// File or directory of text to optimise against.
    #[arg(global = true, long, default_value = "corpus")]
    corpus: PathBuf,

    /// Use the corpus text as-is instead of converting it to QWERTY keystrokes.
    #[arg(global = true, long, default_value_t = false)]
    no_transcode: bool,

    /// Keyer profile JSON; the built-in profile is used when absent.
    #[arg(global = true, long)]
    profile: Option<PathBuf>,

    /// Search parameters JSON; explicit flags still win.
    #[arg(global = true, long = "config")]
    config_file: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Improve a saved layout with beam search.
    Beam(cmd::beam::BeamArgs),
    /// Build layouts from scratch with an ant colony.
    Colony(cmd::colony::ColonyArgs),
    /// Re-evaluate a saved layout.
    Score(cmd::score::ScoreArgs),
    /// Summarise the chord universes of the profile.
    Chords(cmd::chords::ChordsArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(e) = run(cli, &matches) {
        error!("❌ {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli, matches: &ArgMatches) -> CfResult<()> {
    let profile = match &cli.profile {
        Some(path) => {
            info!("📂 Loading profile: {}", path.display());
            KeyerProfile::load_from_file(path)?
        }
        None => KeyerProfile::default(),
    };

    if let Commands::Chords(args) = &cli.command {
        return cmd::chords::run(args, &profile);
    }

    let config = resolve_config(&cli, matches)?;

    info!("📂 Loading corpus: {}", cli.corpus.display());
    let keys = load_corpus(&cli.corpus, !cli.no_transcode, &Modifiers::default())?;
    if keys.is_empty() {
        return Err(ChordError::Config(format!(
            "corpus at {} is empty",
            cli.corpus.display()
        )));
    }

    match &cli.command {
        Commands::Beam(args) => cmd::beam::run(args, &config, &profile, &keys),
        Commands::Colony(args) => cmd::colony::run(args, &config, &profile, &keys),
        Commands::Score(args) => cmd::score::run(args, &profile, &keys),
        Commands::Chords(args) => cmd::chords::run(args, &profile),
    }
}

/// CLI values, or the `--config` file with explicitly typed flags merged on top.
/// Flattened flags live in the subcommand's matches, not the root.
fn resolve_config(cli: &Cli, matches: &ArgMatches) -> CfResult<Config> {
    let (cli_config, name) = match &cli.command {
        Commands::Beam(args) => (&args.config, "beam"),
        Commands::Colony(args) => (&args.config, "colony"),
        Commands::Score(_) | Commands::Chords(_) => return Ok(Config::default()),
    };

    let config = match &cli.config_file {
        Some(path) => {
            info!("⚖️  Loading config from: {}", path.display());
            let sub = matches
                .subcommand_matches(name)
                .ok_or_else(|| ChordError::Config(format!("missing '{}' arguments", name)))?;
            let mut config = Config::load_from_file(path)?;
            config.merge_from_cli(cli_config, sub);
            config
        }
        None => cli_config.clone(),
    };
    config.validate()?;
    Ok(config)
}
