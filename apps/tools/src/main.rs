use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reader_core::{
    encoder::{self, Command as ReaderCommand},
    load_settings,
    surface::{render_page, BookSource, SurfaceOptions},
    FontFamily, MarkRequest, ReaderBridge, SearchQuery, Settings,
};
use shared::domain::{Cfi, FontSize, MarkKind, MarkToken, RequestId, Theme};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reader-tools")]
struct Cli {
    /// Settings file; defaults to `reader.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feeds a log of renderer messages (one JSON object per line) through a
    /// bridge and prints the resulting snapshot.
    Replay {
        file: PathBuf,
        /// Stop at the first rejected message.
        #[arg(long)]
        strict: bool,
    },
    /// Prints the script a command would inject.
    Encode {
        #[command(subcommand)]
        command: EncodeCommand,
    },
    /// Renders the surface page for a book.
    Surface {
        #[arg(long, default_value = "epub")]
        source_type: String,
        #[arg(long)]
        book: String,
        /// JSON file holding a saved location table.
        #[arg(long)]
        locations: Option<PathBuf>,
        /// JSON file holding a theme.
        #[arg(long)]
        theme: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum EncodeCommand {
    #[command(name = "goto")]
    GoTo {
        cfi: String,
    },
    #[command(name = "goto-number")]
    GoToNumber {
        location: u32,
    },
    Next,
    #[command(name = "prev")]
    Previous,
    Theme {
        /// JSON file holding a theme, e.g. `{"body":{"background":"#fff"}}`.
        file: PathBuf,
    },
    FontFamily {
        family: String,
    },
    FontSize {
        size: String,
    },
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        request_id: u64,
    },
    Html {
        #[arg(long, default_value_t = 1)]
        request_id: u64,
    },
    #[command(name = "mark")]
    AddMark {
        kind: String,
        cfi_range: String,
        #[arg(long)]
        class_name: Option<String>,
        /// Annotation data as inline JSON.
        #[arg(long)]
        data: Option<String>,
        /// Mint a click token for the annotation.
        #[arg(long)]
        clickable: bool,
    },
    #[command(name = "unmark")]
    RemoveMark {
        kind: String,
        cfi_range: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());

    match cli.command {
        Command::Replay { file, strict } => replay(&settings, &file, strict)?,
        Command::Encode { command } => {
            let command = build_command(command, &settings)?;
            println!("{}", encoder::encode(&command)?);
        }
        Command::Surface {
            source_type,
            book,
            locations,
            theme,
            out,
        } => {
            let Some(source) = BookSource::from_kind(&source_type, book) else {
                bail!("unknown source type {source_type:?}; expected epub, opf, binary or base64");
            };
            let mut options = SurfaceOptions::new(source, &settings);
            if let Some(path) = theme {
                options = options.with_theme(read_theme(&path)?);
            }
            if let Some(path) = locations {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("reading location table {}", path.display()))?;
                options = options.with_locations(serde_json::from_str::<Vec<Cfi>>(&raw)?);
            }

            let page = render_page(&options)?;
            match out {
                Some(path) => {
                    fs::write(&path, page)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "surface page written");
                }
                None => println!("{page}"),
            }
        }
    }

    Ok(())
}

fn replay(settings: &Settings, file: &Path, strict: bool) -> Result<()> {
    let log = fs::read_to_string(file)
        .with_context(|| format!("reading message log {}", file.display()))?;
    let mut bridge = ReaderBridge::new(settings);
    let mut rejected = 0usize;
    let mut replayed = 0usize;

    for (index, line) in log.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        replayed += 1;
        if let Err(err) = bridge.handle_message(line) {
            if strict {
                bail!("line {}: {err}", index + 1);
            }
            warn!(line = index + 1, error = %err, "message rejected");
            rejected += 1;
        }
    }

    info!(replayed, rejected, "replay finished");
    println!("{}", serde_json::to_string_pretty(bridge.state())?);
    Ok(())
}

fn read_theme(path: &Path) -> Result<Theme> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading theme {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing theme {}", path.display()))
}

fn build_command(command: EncodeCommand, settings: &Settings) -> Result<ReaderCommand> {
    Ok(match command {
        EncodeCommand::GoTo { cfi } => ReaderCommand::GoToLocation(Cfi::new(cfi)),
        EncodeCommand::GoToNumber { location } => ReaderCommand::GoToLocationNumber(location),
        EncodeCommand::Next => ReaderCommand::GoNext,
        EncodeCommand::Previous => ReaderCommand::GoPrevious,
        EncodeCommand::Theme { file } => ReaderCommand::ChangeTheme(read_theme(&file)?),
        EncodeCommand::FontFamily { family } => {
            ReaderCommand::ChangeFontFamily(FontFamily::new(&family)?)
        }
        EncodeCommand::FontSize { size } => {
            ReaderCommand::ChangeFontSize(size.parse::<FontSize>()?)
        }
        EncodeCommand::Search { query, request_id } => ReaderCommand::Search {
            query: SearchQuery::new(&query)?,
            request: RequestId(request_id),
        },
        EncodeCommand::Html { request_id } => ReaderCommand::CalculateHtml {
            request: RequestId(request_id),
        },
        EncodeCommand::AddMark {
            kind,
            cfi_range,
            class_name,
            data,
            clickable,
        } => {
            let mut mark = MarkRequest::new(kind.parse::<MarkKind>()?, cfi_range);
            if let Some(class_name) = class_name {
                mark = mark.with_class_name(&class_name)?;
            }
            if let Some(data) = data {
                mark = mark.with_data(serde_json::from_str(&data).context("parsing mark data")?);
            }
            ReaderCommand::AddMark {
                mark,
                styles: settings.default_mark_styles(),
                token: clickable.then(MarkToken::generate),
            }
        }
        EncodeCommand::RemoveMark { kind, cfi_range } => ReaderCommand::RemoveMark {
            cfi_range: Cfi::new(cfi_range),
            kind: kind.parse::<MarkKind>()?,
        },
    })
}
