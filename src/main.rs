use clap::{Parser, Subcommand};
use folio::{Color, TocError, TocOutcome, TocPipelineBuilder, has_placeholders, seed_file};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Injects final page numbers into the table of contents of rendered PDFs.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace TOC placeholders in INPUT with page numbers and write OUTPUT.
    Stamp {
        input: PathBuf,
        output: PathBuf,
        /// `false` copies the input through unchanged.
        #[arg(default_value_t = true, action = clap::ArgAction::Set)]
        enable: bool,
        /// Write the run outcome as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Fill color of the patch over each placeholder, e.g. `#ffffff`.
        #[arg(long, value_parser = Color::parse_hex)]
        cover_color: Option<Color>,
        /// Only cover placeholders; keep their glyphs in the content stream.
        #[arg(long)]
        no_retire: bool,
    },
    /// Add placeholder attributes to the TOC links of a rendered HTML file.
    Seed {
        html: PathBuf,
        #[arg(long)]
        disabled: bool,
    },
    /// Report whether a PDF still contains TOC placeholders.
    Check { pdf: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, TocError> {
    match cli.command {
        Command::Stamp { input, output, enable, report, cover_color, no_retire } => {
            let mut builder = TocPipelineBuilder::new().with_enabled(enable).with_glyph_retirement(!no_retire);
            if let Some(color) = cover_color {
                builder = builder.with_cover_color(color);
            }
            let mut pipeline = builder.build();
            let outcome = pipeline.run(&input, &output)?;

            match &outcome {
                TocOutcome::Rewritten(r) => {
                    println!("Injected {} page number(s) into {}", r.patches, output.display());
                    if !r.guessed.is_empty() {
                        println!("  {} number(s) are guesses", r.guessed.len());
                    }
                }
                TocOutcome::Degraded { stage, reason } => {
                    println!("Kept the original document ({} failed: {})", stage, reason);
                }
                TocOutcome::NoPlaceholders => println!("No TOC placeholders; document copied unchanged"),
                TocOutcome::Disabled => println!("TOC page numbers disabled; document copied unchanged"),
            }
            if let Some(path) = report {
                fs::write(&path, serde_json::to_vec_pretty(&outcome)?)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Seed { html, disabled } => {
            if !html.is_file() {
                return Err(TocError::InputNotFound(html));
            }
            let count = seed_file(&html, !disabled)?;
            println!("Seeded {} TOC placeholder(s)", count);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { pdf } => {
            if !pdf.is_file() {
                return Err(TocError::InputNotFound(pdf));
            }
            let found = has_placeholders(&pdf);
            println!("{}", if found { "placeholders: yes" } else { "placeholders: no" });
            Ok(ExitCode::SUCCESS)
        }
    }
}
