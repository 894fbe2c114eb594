//! Canvasforge Core Library
//!
//! Platform-agnostic object model, viewport and interaction engine for the
//! canvasforge image compositing surface.

pub mod canvas;
pub mod collection;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod objects;
pub mod settings;
pub mod storage;
pub mod viewport;

pub use canvas::Canvas;
pub use collection::{CanvasCollection, FAVORITE_SLOTS};
pub use editor::{Editor, ImportedImage};
pub use error::{ValidationError, ValidationResult};
pub use geometry::RotatedRect;
pub use input::{Key, KeyEvent, Modifiers, PointerButton, PointerEvent};
pub use interaction::{Effect, Handle, HandleKind, Interaction, InteractionMode, Selection};
pub use objects::{FrameObject, ImageObject, ObjectId, ObjectKind, ObjectRef, PromptNode};
pub use settings::EngineSettings;
pub use viewport::Viewport;
