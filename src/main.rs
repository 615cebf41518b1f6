//! gutentei CLI: annotated TEI samples from Project Gutenberg.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::Result;

use gutentei::catalogue::Text;
use gutentei::config::SamplesConfig;
use gutentei::error::GutenteiResult;
use gutentei::markup::{TeiHeader, TrailingText};
use gutentei::nlp::RuleAnnotator;
use gutentei::samples::{BatchReport, Samples, SamplesError, write_tei};

#[derive(Parser)]
#[command(name = "gutentei", version, about = "Annotated TEI samples from Project Gutenberg")]
struct Cli {
    /// Config file (defaults to `<WORKDIR>/samples.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory for the catalogue cache, texts, and TEI output.
    workdir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or reuse) texts.json from the catalogue.
    Texts,

    /// Convert a selection of texts to annotated TEI.
    Tei {
        /// Only texts in this language.
        #[arg(long)]
        language: Option<String>,

        /// Texts to pass over at the head of the sorted list.
        #[arg(long)]
        skip: Option<usize>,

        /// Maximum number of texts to convert.
        #[arg(long)]
        limit: Option<usize>,

        /// Worker threads.
        #[arg(long)]
        threads: Option<usize>,

        /// Keep text after the last token instead of dropping it.
        #[arg(long)]
        emit_trailing: bool,

        /// Regenerate existing TEI files.
        #[arg(long)]
        overwrite: bool,
    },

    /// Annotate a local plain-text file and print TEI to stdout.
    Annotate {
        /// Plain-text file (Gutenberg boilerplate is stripped if present).
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.workdir.join("samples.toml"));
    let mut config = SamplesConfig::load_or_default(&config_path)?;

    match cli.command {
        Commands::Texts => texts(&cli.workdir, &config)?,

        Commands::Tei {
            language,
            skip,
            limit,
            threads,
            emit_trailing,
            overwrite,
        } => {
            if let Some(language) = language {
                config.language = language;
            }
            if let Some(skip) = skip {
                config.skip = skip;
            }
            if let Some(limit) = limit {
                config.limit = limit;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            if emit_trailing {
                config.trailing_text = TrailingText::Emit;
            }
            config.overwrite |= overwrite;

            let report = tei(&cli.workdir, &config)?;
            if !report.is_success() {
                miette::bail!(
                    "{} of {} texts failed",
                    report.failed.len(),
                    report.failed.len() + report.written.len()
                );
            }
        }

        Commands::Annotate { file } => annotate(&file, &config)?,
    }

    Ok(())
}

/// Build or reuse texts.json and print the most common languages.
fn texts(workdir: &Path, config: &SamplesConfig) -> GutenteiResult<()> {
    let samples = Samples::new(workdir)?;
    let texts = samples.texts(&config.catalogue_url)?;

    let mut languages: Vec<(&str, usize)> = Vec::new();
    for text in &texts {
        match languages.iter_mut().find(|(l, _)| *l == text.language) {
            Some((_, n)) => *n += 1,
            None => languages.push((text.language.as_str(), 1)),
        }
    }
    languages.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    println!("{} texts in {}", texts.len(), samples.texts_file().display());
    for (language, count) in languages.iter().take(10) {
        println!("  {language:<6} {count}");
    }
    Ok(())
}

fn tei(workdir: &Path, config: &SamplesConfig) -> GutenteiResult<BatchReport> {
    let samples = Samples::new(workdir)?;
    let texts = samples.texts(&config.catalogue_url)?;
    let selected = Samples::select(&texts, &config.language, config.skip, config.limit);
    let report = samples.process(&RuleAnnotator, &selected, config)?;

    for (id, path) in &report.written {
        println!("{id}\t{}", path.display());
    }
    for (id, error) in &report.failed {
        eprintln!("{id}\tFAILED: {error}");
    }
    Ok(report)
}

fn annotate(file: &Path, config: &SamplesConfig) -> GutenteiResult<()> {
    let contents = std::fs::read_to_string(file).map_err(|source| SamplesError::Io {
        path: file.display().to_string(),
        source,
    })?;
    let body = Text::body(&contents);
    let title = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let header = TeiHeader {
        title: &title,
        language: Some(&config.language),
        ..Default::default()
    };

    let stdout = std::io::stdout().lock();
    let mut out = write_tei(stdout, &header, &body, &RuleAnnotator, config.align_options())?;
    writeln!(out).map_err(|source| SamplesError::Io {
        path: "<stdout>".into(),
        source,
    })?;
    Ok(())
}
