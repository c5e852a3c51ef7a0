//! CLI frontend for the gamebook engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gamebook",
    about = "Compile and play choose-your-path gamebook scripts",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine activity to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Script compilation settings shared by every command that reads a script.
#[derive(Args)]
struct ScriptArgs {
    /// Path to the gamebook script
    script: PathBuf,

    /// Chapter prefix that marks item use-chapters
    #[arg(long, default_value = gb_core::DEFAULT_USE_PREFIX)]
    use_prefix: String,

    /// Extra phrase marking an inventory line as currency (repeatable)
    #[arg(long = "currency", value_name = "PHRASE")]
    currency: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a script and report diagnostics
    Check {
        #[command(flatten)]
        script: ScriptArgs,
    },

    /// Compile a script and export the chapter table as JSON
    Build {
        #[command(flatten)]
        script: ScriptArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write unrecognized script lines to this file
        #[arg(long, value_name = "FILE")]
        rest: Option<PathBuf>,
    },

    /// Play a script interactively
    Play {
        #[command(flatten)]
        script: ScriptArgs,

        /// Player id used for save slots
        #[arg(short, long, default_value = "player")]
        player: String,

        /// Directory holding save slots
        #[arg(long, default_value = "saves")]
        saves: PathBuf,

        /// Directory images are resolved against
        #[arg(long)]
        assets: Option<PathBuf>,

        /// RNG seed for reproducible dice rolls
        #[arg(short, long)]
        seed: Option<u64>,

        /// Help book script, browsed in-game with ':book'
        #[arg(long, value_name = "FILE")]
        help_book: Option<PathBuf>,
    },

    /// List a player's save slots
    Saves {
        /// Player id
        player: String,

        /// Directory holding save slots
        #[arg(long, default_value = "saves")]
        saves: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { script } => commands::check::run(&script.script, &script.options()),
        Commands::Build {
            script,
            output,
            rest,
        } => commands::build::run(
            &script.script,
            &script.options(),
            output.as_deref(),
            rest.as_deref(),
        ),
        Commands::Play {
            script,
            player,
            saves,
            assets,
            seed,
            help_book,
        } => commands::play::run(
            &script.script,
            &script.options(),
            commands::play::PlayArgs {
                player: &player,
                saves: &saves,
                assets,
                seed,
                help_book: help_book.as_deref(),
            },
        ),
        Commands::Saves { player, saves } => commands::saves::run(&player, &saves),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

impl ScriptArgs {
    fn options(&self) -> gb_dsl::CompileOptions {
        self.currency.iter().fold(
            gb_dsl::CompileOptions::default().with_use_prefix(self.use_prefix.as_str()),
            |options, phrase| options.with_currency_keyword(phrase.as_str()),
        )
    }
}
