//! Editor façade: the operations a host UI drives.
//!
//! Owns the canvas collection, the viewport and the interaction state, and
//! tracks whether a committed mutation is waiting to be persisted.

use crate::canvas::Canvas;
use crate::collection::CanvasCollection;
use crate::error::{ValidationError, ValidationResult};
use crate::input::{Key, KeyEvent, PointerEvent};
use crate::interaction::{Effect, Interaction, InteractionMode, PointerDown, Selection};
use crate::objects::{FrameObject, ImageObject, ObjectId, ObjectRef, parse_aspect_ratio};
use crate::settings::EngineSettings;
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};

/// An image to import, with its natural pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedImage {
    pub src: String,
    pub width: f64,
    pub height: f64,
}

impl ImportedImage {
    pub fn new(src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            src: src.into(),
            width,
            height,
        }
    }
}

/// Canvas editing state for one process.
#[derive(Debug, Clone)]
pub struct Editor {
    collection: CanvasCollection,
    viewport: Viewport,
    interaction: Interaction,
    settings: EngineSettings,
    /// Prompt used when a dispatch target has no prompt node.
    edit_prompt: String,
    pan_key_held: bool,
    dirty: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

impl Editor {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_collection(CanvasCollection::new(), settings)
    }

    /// Create an editor over a previously persisted collection.
    pub fn with_collection(mut collection: CanvasCollection, settings: EngineSettings) -> Self {
        collection.repair();
        Self {
            collection,
            viewport: Viewport::with_settings(&settings),
            interaction: Interaction::new(),
            settings,
            edit_prompt: String::new(),
            pan_key_held: false,
            dirty: false,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn collection(&self) -> &CanvasCollection {
        &self.collection
    }

    /// The active canvas.
    pub fn canvas(&self) -> &Canvas {
        self.collection.active()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> &Selection {
        self.interaction.selection()
    }

    pub fn mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    /// Whether a committed mutation has not been persisted yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and reset the dirty flag. The host forwards it to autosave.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- Canvas management ---

    /// Create a canvas and switch to it.
    pub fn create_canvas(&mut self, name: Option<&str>) -> String {
        let id = self.collection.create(name);
        self.reset_interaction();
        self.mark_dirty();
        id
    }

    pub fn select_canvas(&mut self, id: &str) -> ValidationResult<()> {
        if self.collection.active_id() == id {
            return Ok(());
        }
        self.collection.select(id)?;
        self.reset_interaction();
        self.mark_dirty();
        Ok(())
    }

    pub fn rename_canvas(&mut self, id: &str, name: &str) -> ValidationResult<()> {
        self.collection.rename(id, name)?;
        self.mark_dirty();
        Ok(())
    }

    pub fn delete_canvas(&mut self, id: &str) -> ValidationResult<()> {
        let was_active = self.collection.active_id() == id;
        self.collection.delete(id)?;
        if was_active {
            self.reset_interaction();
        }
        self.mark_dirty();
        Ok(())
    }

    pub fn toggle_favorite(&mut self, id: &str) -> ValidationResult<bool> {
        let before = self.collection.favorites().clone();
        let now = self.collection.toggle_favorite(id)?;
        if &before != self.collection.favorites() {
            self.mark_dirty();
        }
        Ok(now)
    }

    pub fn set_favorite(&mut self, slot: usize, id: Option<&str>) -> ValidationResult<()> {
        self.collection.set_favorite(slot, id)?;
        self.mark_dirty();
        Ok(())
    }

    pub fn search_canvases(&self, query: &str) -> Vec<&Canvas> {
        self.collection.search(query)
    }

    /// Remove every object from the active canvas.
    pub fn clear_canvas(&mut self) {
        self.interaction.cancel();
        self.interaction.selection_mut().clear();
        if !self.collection.active().is_empty() {
            self.collection.active_mut().clear();
            self.mark_dirty();
        }
    }

    fn reset_interaction(&mut self) {
        self.interaction = Interaction::new();
    }

    // --- Objects ---

    /// Import images centered in the current view.
    ///
    /// Each image is scaled down to fit the import extent, keeping its
    /// aspect ratio, and successive images are offset diagonally.
    pub fn import_images(&mut self, images: &[ImportedImage]) -> Vec<ObjectId> {
        let center = self.viewport.view_center();
        let max_extent = self.settings.import_max_extent;
        let offset = self.settings.import_cascade_offset;

        let mut ids = Vec::with_capacity(images.len());
        for (i, source) in images.iter().enumerate() {
            if source.width <= 0.0 || source.height <= 0.0 {
                log::warn!("Skipping image with empty size: {}", source.src);
                continue;
            }
            let scale = (max_extent / source.width.max(source.height)).min(1.0);
            let size = Size::new(source.width * scale, source.height * scale);
            let cascade = Vec2::new(offset, offset) * i as f64;
            let position = center + cascade - size.to_vec2() / 2.0;
            let image = ImageObject::new(source.src.clone(), position, size.width, size.height);
            ids.push(self.collection.active_mut().add_image(image));
        }
        if !ids.is_empty() {
            log::debug!("Imported {} image(s)", ids.len());
            self.mark_dirty();
        }
        ids
    }

    /// Add a frame with the given `"W:H"` aspect ratio at the view center.
    pub fn add_frame(&mut self, ratio: &str) -> ValidationResult<ObjectId> {
        let aspect = parse_aspect_ratio(ratio)?;
        let frame = FrameObject::centered(
            self.viewport.view_center(),
            aspect,
            self.settings.default_frame_extent,
        );
        let id = self.collection.active_mut().add_frame(frame);
        self.mark_dirty();
        Ok(id)
    }

    /// Insert an image on a specific canvas, on top of its image band.
    ///
    /// Used for provider results, which may complete after the user has
    /// switched canvases.
    pub fn insert_image(&mut self, canvas_id: &str, image: ImageObject) -> ValidationResult<ObjectId> {
        let canvas = self
            .collection
            .get_mut(canvas_id)
            .ok_or_else(|| ValidationError::UnknownCanvas(canvas_id.to_string()))?;
        let id = canvas.add_image(image);
        self.mark_dirty();
        Ok(id)
    }

    /// Delete an object from the active canvas, cascading to its prompt node.
    pub fn delete_object(&mut self, obj: ObjectRef) -> ValidationResult<Vec<ObjectRef>> {
        let removed = self.collection.active_mut().remove(obj);
        if removed.is_empty() {
            return Err(ValidationError::UnknownObject(obj.id()));
        }
        self.after_removal();
        Ok(removed)
    }

    /// Replace the selection with a single object on the active canvas.
    pub fn select(&mut self, obj: ObjectRef) -> ValidationResult<()> {
        if !self.canvas().contains(obj) {
            return Err(ValidationError::UnknownObject(obj.id()));
        }
        self.interaction.cancel();
        self.interaction.selection_mut().select_only(obj);
        Ok(())
    }

    /// Delete every selected object.
    pub fn delete_selected(&mut self) -> Vec<ObjectRef> {
        let targets = self.interaction.selection().items().to_vec();
        let canvas = self.collection.active_mut();
        let removed: Vec<ObjectRef> = targets.into_iter().flat_map(|obj| canvas.remove(obj)).collect();
        if !removed.is_empty() {
            self.after_removal();
        }
        removed
    }

    fn after_removal(&mut self) {
        self.interaction.cancel();
        let canvas = self.collection.active();
        self.interaction.selection_mut().retain_live(canvas);
        self.mark_dirty();
    }

    // --- Prompt nodes ---

    fn single_selected(&self) -> ValidationResult<ObjectRef> {
        self.interaction
            .selection()
            .single()
            .ok_or(ValidationError::SingleSelectionRequired)
    }

    /// Attach a prompt node to the single selected image or frame.
    pub fn add_prompt_node(&mut self) -> ValidationResult<ObjectId> {
        let target = self.single_selected()?;
        let width = self.settings.prompt_node_width;
        let id = self.collection.active_mut().attach_prompt_node(target, width)?;
        self.mark_dirty();
        Ok(id)
    }

    /// Remove the prompt node of the single selected object, or the selected
    /// node itself. Returns the removed node, if there was one.
    pub fn remove_prompt_node(&mut self) -> ValidationResult<Option<ObjectId>> {
        let target = self.single_selected()?;
        let node = match target {
            ObjectRef::PromptNode(id) => Some(id),
            other => self.canvas().prompt_node_for(other.id()).map(|n| n.id()),
        };
        let Some(node) = node else {
            return Ok(None);
        };
        self.collection.active_mut().remove(ObjectRef::PromptNode(node));
        self.after_removal();
        Ok(Some(node))
    }

    /// Replace the text of a prompt node on the active canvas.
    pub fn set_prompt(&mut self, node: ObjectId, text: impl Into<String>) -> ValidationResult<()> {
        self.collection.active_mut().set_prompt(node, text)?;
        self.mark_dirty();
        Ok(())
    }

    pub fn edit_prompt(&self) -> &str {
        &self.edit_prompt
    }

    pub fn set_edit_prompt(&mut self, prompt: impl Into<String>) {
        self.edit_prompt = prompt.into();
    }

    /// The prompt a dispatch against `target` would use.
    ///
    /// An attached prompt node always wins, even when blank; otherwise the
    /// editor-wide edit prompt is used.
    pub fn resolve_prompt(&self, target: ObjectRef) -> ValidationResult<String> {
        let canvas = self.canvas();
        if !canvas.contains(target) {
            return Err(ValidationError::UnknownObject(target.id()));
        }
        let text = match canvas.prompt_node_for(target.id()) {
            Some(node) => node.prompt.trim(),
            None => self.edit_prompt.trim(),
        };
        if text.is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        Ok(text.to_string())
    }

    // --- Input ---

    /// Feed a pointer event into the interaction state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Effect {
        let effect = match event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => {
                let input = PointerDown {
                    screen: position,
                    button,
                    modifiers,
                    pan_held: self.pan_key_held,
                };
                let canvas = self.collection.active_mut();
                self.interaction
                    .pointer_down(canvas, &self.viewport, &self.settings, input)
            }
            PointerEvent::Move { position } => {
                let canvas = self.collection.active_mut();
                self.interaction
                    .pointer_move(canvas, &mut self.viewport, &self.settings, position)
            }
            PointerEvent::Up { .. } => {
                if let Some(mode) = self.interaction.pointer_up() {
                    log::debug!("Interaction ended: {:?}", mode);
                }
                Effect::default()
            }
            PointerEvent::Wheel { position, delta } => Effect {
                view_changed: self.zoom_wheel(position, delta.y),
                ..Effect::default()
            },
        };
        if effect.canvas_changed {
            self.mark_dirty();
        }
        effect
    }

    /// Handle a key event. Returns true if the key was consumed.
    pub fn handle_key(&mut self, event: &KeyEvent) -> bool {
        match event {
            KeyEvent::Pressed(Key::Space) => {
                self.pan_key_held = true;
                true
            }
            KeyEvent::Released(Key::Space) => {
                self.pan_key_held = false;
                true
            }
            KeyEvent::Pressed(Key::Delete | Key::Backspace) => !self.delete_selected().is_empty(),
            KeyEvent::Pressed(Key::Escape) => {
                self.interaction.cancel();
                let had_selection = !self.interaction.selection().is_empty();
                self.interaction.selection_mut().clear();
                had_selection
            }
            _ => false,
        }
    }

    // --- View ---

    /// Set the screen rectangle the canvas is displayed in.
    pub fn set_viewport_bounds(&mut self, origin: Point, size: Size) {
        self.viewport.set_bounds(origin, size);
    }

    pub fn zoom_in(&mut self) -> bool {
        self.viewport.zoom_step(self.settings.zoom_step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.viewport.zoom_step(-self.settings.zoom_step)
    }

    /// Wheel zoom anchored at the cursor.
    pub fn zoom_wheel(&mut self, anchor: Point, delta_y: f64) -> bool {
        self.viewport
            .zoom_wheel(anchor, delta_y, self.settings.wheel_zoom_sensitivity)
    }

    /// Set the zoom directly, anchored at the viewport center.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let center = self.viewport.screen_center();
        self.viewport.zoom_at(center, zoom)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }
}
