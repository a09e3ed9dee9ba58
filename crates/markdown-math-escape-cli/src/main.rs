use anyhow::{Context, Result};
use clap::Parser;
use markdown_math_escape::{DelimiterProfile, InlineNotation, Markdown};
use markdown_math_escape_config::Config;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::{fs, process};

/// Render Markdown to HTML, keeping LaTeX math intact.
#[derive(Debug, Parser)]
#[command(name = "mathdown", version, about)]
struct Args {
    /// Markdown file to read (stdin when omitted)
    input: Option<PathBuf>,

    /// Write HTML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Math delimiter convention: `dollar` or `fenced`
    #[arg(short, long)]
    delimiters: Option<String>,

    /// Inline output notation: `latex` or `source`
    #[arg(short, long)]
    notation: Option<String>,

    /// Config file (defaults to ~/.config/markdown-math-escape/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable GitHub-style tables
    #[arg(long)]
    tables: bool,

    /// Enable ~~strikethrough~~
    #[arg(long)]
    strikethrough: bool,

    /// Enable footnotes
    #[arg(long)]
    footnotes: bool,

    /// Enable task list items
    #[arg(long)]
    tasklists: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}

/// Merges command-line overrides into the loaded settings.
fn resolve_config(args: &Args, loaded: Option<Config>) -> Result<Config> {
    let mut config = loaded.unwrap_or_default();
    if let Some(name) = &args.delimiters {
        config.delimiters = name.parse::<DelimiterProfile>()?;
    }
    if let Some(name) = &args.notation {
        config.notation = name.parse::<InlineNotation>()?;
    }
    config.markdown.tables |= args.tables;
    config.markdown.strikethrough |= args.strikethrough;
    config.markdown.footnotes |= args.footnotes;
    config.markdown.tasklists |= args.tasklists;
    Ok(config)
}

fn load_config(args: &Args) -> Result<Option<Config>> {
    let config_path = match &args.config {
        Some(path) => Config::expand_path(path).unwrap_or_else(|| path.clone()),
        None => Config::config_path(),
    };
    log::info!("Config path: {}", config_path.display());
    let loaded = Config::load_from_path(&config_path)?;
    if loaded.is_none() {
        if args.config.is_some() {
            anyhow::bail!("config file not found: {}", config_path.display());
        }
        log::info!("No config file found, using defaults");
    }
    Ok(loaded)
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("reading stdin")?;
            Ok(source)
        }
    }
}

fn write_output(output: Option<&PathBuf>, html: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, format!("{html}\n"))
                .with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{html}").context("writing stdout")
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args, load_config(args)?)?;
    let escape = config.math_escape();
    log::info!(
        "Rendering with {} delimiters, {} notation",
        escape.profile(),
        escape.notation()
    );

    let source = read_input(args.input.as_ref())?;
    let html = Markdown::new(config.markdown)
        .with_extension(&escape)
        .convert(&source)?;
    write_output(args.output.as_ref(), &html)
}

fn main() {
    let args = Args::parse();

    // RUST_LOG, when set, wins over -v
    env_logger::Builder::new()
        .filter_level(args.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = run(&args) {
        log::debug!("{e:?}");
        eprintln!("mathdown: {e:#}");
        process::exit(1);
    }
}
