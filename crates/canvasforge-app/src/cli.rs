//! Headless canvas management: list, organize, import and capture.
//!
//! Every command loads the persisted collection, applies its change through
//! the [`Editor`] and saves again when something changed.

use canvasforge_capture::{CaptureError, SourceLoader, capture, decode_dimensions, encode_png};
use canvasforge_core::settings::SettingsError;
use canvasforge_core::storage::{FileStorage, StorageError, load_persisted_state, save_persisted_state};
use canvasforge_core::{Canvas, Editor, EngineSettings, ImportedImage, ObjectId, ValidationError};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "canvasforge", about = "Manage and capture canvasforge canvases")]
pub struct CliArgs {
    /// Directory holding the persisted canvases. Defaults to the user data dir.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Engine settings file (JSON).
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List canvases, optionally filtered by name.
    List {
        #[arg(short, long)]
        search: Option<String>,
        /// Only show favorites, in slot order.
        #[arg(long)]
        favorites: bool,
    },
    /// Create a canvas and make it active.
    Create { name: Option<String> },
    Rename { id: String, name: String },
    Delete { id: String },
    /// Make a canvas the active one.
    Select { id: String },
    /// Toggle a canvas in the favorites bar.
    Favorite { id: String },
    /// Import image files onto the active canvas.
    Import {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
    /// Add a frame with a `W:H` aspect ratio to the active canvas.
    Frame { ratio: String },
    /// Set the prompt of an image or frame, creating its prompt node.
    Prompt { object: ObjectId, text: String },
    /// Render an image or frame of the active canvas to a PNG file.
    Capture {
        object: ObjectId,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Directory that relative image sources resolve against.
        #[arg(long, value_name = "DIR")]
        assets: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type CliResult<T> = Result<T, CliError>;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub async fn run(args: CliArgs) -> CliResult<()> {
    let storage = match &args.data_dir {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    };
    let settings = match &args.settings {
        Some(path) => EngineSettings::load(path)?,
        None => EngineSettings::default(),
    };
    let collection = load_persisted_state(&storage).await?;
    let mut editor = Editor::with_collection(collection, settings);

    execute(&mut editor, args.command)?;

    if editor.take_dirty() {
        save_persisted_state(&storage, editor.collection()).await?;
        log::info!("Saved canvases to {:?}", storage.base_path());
    }
    Ok(())
}

fn execute(editor: &mut Editor, command: Command) -> CliResult<()> {
    match command {
        Command::List { search, favorites } => {
            let active = editor.collection().active_id().to_string();
            let canvases: Vec<&Canvas> = if favorites {
                let collection = editor.collection();
                collection
                    .favorites()
                    .iter()
                    .flatten()
                    .filter_map(|id| collection.get(id))
                    .collect()
            } else {
                editor.search_canvases(search.as_deref().unwrap_or(""))
            };
            for canvas in canvases {
                let marker = if canvas.id == active { "*" } else { " " };
                println!("{marker} {}  {}  ({} objects)", canvas.id, canvas.name, canvas.len());
            }
        }
        Command::Create { name } => {
            let id = editor.create_canvas(name.as_deref());
            println!("{id}");
        }
        Command::Rename { id, name } => editor.rename_canvas(&id, &name)?,
        Command::Delete { id } => editor.delete_canvas(&id)?,
        Command::Select { id } => editor.select_canvas(&id)?,
        Command::Favorite { id } => {
            let now = editor.toggle_favorite(&id)?;
            println!("{}", if now { "favorited" } else { "unfavorited" });
        }
        Command::Import { files } => {
            let images = files
                .iter()
                .map(|path| imported_image(path))
                .collect::<CliResult<Vec<_>>>()?;
            for id in editor.import_images(&images) {
                println!("{id}");
            }
        }
        Command::Frame { ratio } => println!("{}", editor.add_frame(&ratio)?),
        Command::Prompt { object, text } => {
            let target = editor
                .canvas()
                .resolve(object)
                .ok_or(ValidationError::UnknownObject(object))?;
            let existing = editor.canvas().prompt_node_for(object).map(|node| node.id());
            let node = match existing {
                Some(node) => node,
                None => {
                    editor.select(target)?;
                    editor.add_prompt_node()?
                }
            };
            editor.set_prompt(node, text)?;
        }
        Command::Capture { object, output, assets } => {
            let target = editor
                .canvas()
                .resolve(object)
                .ok_or(ValidationError::UnknownObject(object))?;
            let loader = match assets {
                Some(dir) => SourceLoader::with_base_dir(dir),
                None => SourceLoader::new(),
            };
            let pixels = capture(editor.canvas(), target, &loader)?;
            let png = encode_png(&pixels)?;
            std::fs::write(&output, png).map_err(io_error(&output))?;
            log::info!("Captured {}x{} to {:?}", pixels.width, pixels.height, output);
        }
    }
    Ok(())
}

/// Read an image file's size and record it by absolute path.
fn imported_image(path: &Path) -> CliResult<ImportedImage> {
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let (width, height) = decode_dimensions(&bytes)?;
    let absolute = std::fs::canonicalize(path).map_err(io_error(path))?;
    Ok(ImportedImage::new(
        absolute.to_string_lossy(),
        f64::from(width),
        f64::from(height),
    ))
}
