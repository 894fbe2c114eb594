//! Interaction state machine: selection, manipulation handles and the
//! move/resize/rotate/pan session lifecycle.
//!
//! At most one session is active. A pointer-down always resolves the
//! previous session first, and pointer-up (from a global listener) ends it.

use crate::canvas::Canvas;
use crate::geometry::angle_degrees;
use crate::input::{Modifiers, PointerButton};
use crate::objects::{ObjectId, ObjectRef};
use crate::settings::EngineSettings;
use crate::viewport::Viewport;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Distance from the top edge to the rotate handle (in canvas units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Type of manipulation handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Bottom-right corner. Images and frames.
    Resize,
    /// Above the top edge. Images only.
    Rotate,
}

/// A manipulation handle with its position and owner.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
    pub target: ObjectRef,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind, target: ObjectRef) -> Self {
        Self {
            position,
            kind,
            target,
        }
    }

    /// Check if a canvas point hits this handle.
    /// `tolerance` should already be divided by the zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Get the handles of an object.
pub fn get_handles(canvas: &Canvas, obj: ObjectRef) -> Vec<Handle> {
    match obj {
        ObjectRef::Image(id) => canvas
            .image(id)
            .map(|img| {
                vec![
                    Handle::new(img.resize_handle(), HandleKind::Resize, obj),
                    Handle::new(img.rotate_handle(ROTATE_HANDLE_OFFSET), HandleKind::Rotate, obj),
                ]
            })
            .unwrap_or_default(),
        ObjectRef::Frame(id) => canvas
            .frame(id)
            .map(|frame| vec![Handle::new(frame.resize_handle(), HandleKind::Resize, obj)])
            .unwrap_or_default(),
        ObjectRef::PromptNode(_) => Vec::new(),
    }
}

/// Observable state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Moving,
    Resizing,
    Rotating,
    Panning,
}

/// Snapshot for moving one or more objects.
///
/// Attached prompt nodes are not part of the snapshot: their geometry is
/// derived from the parent on every read.
#[derive(Debug, Clone)]
pub struct MoveSession {
    /// Screen position where the drag started.
    pub start_screen: Point,
    /// Starting top-left of every moving object.
    pub origins: HashMap<ObjectRef, Point>,
}

/// Snapshot for a bottom-right resize.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    pub target: ObjectRef,
    pub start_screen: Point,
    pub start_width: f64,
    pub start_height: f64,
    /// Locked ratio for frames.
    pub start_aspect_ratio: Option<f64>,
}

/// Snapshot for rotating an image about its center.
#[derive(Debug, Clone)]
pub struct RotateSession {
    pub target: ObjectId,
    /// Canvas-space center, fixed for the whole session.
    pub center: Point,
    /// Angle from center to the starting pointer, in degrees.
    pub start_angle: f64,
    pub start_rotation: f64,
}

/// Viewport pan driven by raw screen deltas.
#[derive(Debug, Clone)]
pub struct PanSession {
    pub last_screen: Point,
}

/// The in-progress drag.
#[derive(Debug, Clone)]
pub enum Session {
    Move(MoveSession),
    Resize(ResizeSession),
    Rotate(RotateSession),
    Pan(PanSession),
}

impl Session {
    pub fn mode(&self) -> InteractionMode {
        match self {
            Session::Move(_) => InteractionMode::Moving,
            Session::Resize(_) => InteractionMode::Resizing,
            Session::Rotate(_) => InteractionMode::Rotating,
            Session::Pan(_) => InteractionMode::Panning,
        }
    }
}

/// Ordered set of selected objects.
///
/// Prompt nodes are always selected alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: Vec<ObjectRef>,
}

impl Selection {
    pub fn items(&self) -> &[ObjectRef] {
        &self.items
    }

    pub fn contains(&self, obj: ObjectRef) -> bool {
        self.items.contains(&obj)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The selected object if exactly one is selected.
    pub fn single(&self) -> Option<ObjectRef> {
        match self.items.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Ids of the selected images.
    pub fn image_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.items.iter().filter_map(|obj| match obj {
            ObjectRef::Image(id) => Some(*id),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the selection with a single object.
    pub fn select_only(&mut self, obj: ObjectRef) {
        self.items.clear();
        self.items.push(obj);
    }

    /// Toggle membership. Prompt nodes never join a multi-selection.
    pub fn toggle(&mut self, obj: ObjectRef) {
        if let Some(pos) = self.items.iter().position(|&o| o == obj) {
            self.items.remove(pos);
            return;
        }
        if matches!(obj, ObjectRef::PromptNode(_)) {
            self.select_only(obj);
            return;
        }
        self.items.retain(|o| !matches!(o, ObjectRef::PromptNode(_)));
        self.items.push(obj);
    }

    /// Remove a specific object.
    pub fn remove(&mut self, obj: ObjectRef) {
        self.items.retain(|&o| o != obj);
    }

    /// Drop entries that no longer exist on the canvas.
    pub fn retain_live(&mut self, canvas: &Canvas) {
        self.items.retain(|&o| canvas.contains(o));
    }
}

/// Pointer-down input.
#[derive(Debug, Clone, Copy)]
pub struct PointerDown {
    pub screen: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// Space (or another pan modifier) is held.
    pub pan_held: bool,
}

/// What a state machine step changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Effect {
    /// Object geometry or z-order changed.
    pub canvas_changed: bool,
    /// Pan or zoom changed.
    pub view_changed: bool,
    /// Selection changed.
    pub selection_changed: bool,
}

/// Pointer-driven interaction state: the selection plus the optional
/// current session.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    selection: Selection,
    session: Option<Session>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.session.as_ref().map_or(InteractionMode::Idle, Session::mode)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Drop any active session without applying further movement.
    pub fn cancel(&mut self) {
        self.session = None;
    }

    /// Start an interaction.
    ///
    /// Selected objects' handles take priority over object bodies. A press
    /// with no resolvable target clears the selection (primary button) or
    /// starts a pan (secondary/middle button, or with the pan key held).
    pub fn pointer_down(
        &mut self,
        canvas: &mut Canvas,
        viewport: &Viewport,
        settings: &EngineSettings,
        input: PointerDown,
    ) -> Effect {
        self.pointer_up();
        let mut effect = Effect::default();

        if input.pan_held {
            self.session = Some(Session::Pan(PanSession {
                last_screen: input.screen,
            }));
            return effect;
        }

        let point = viewport.to_canvas(input.screen);
        let hit = canvas.hit_test(point);

        if input.button != PointerButton::Primary {
            if hit.is_none() {
                self.session = Some(Session::Pan(PanSession {
                    last_screen: input.screen,
                }));
            }
            return effect;
        }

        let tolerance = settings.handle_tolerance / viewport.zoom;
        if let Some(handle) = self.hit_selected_handle(canvas, point, tolerance) {
            effect.canvas_changed = canvas.bring_to_front(handle.target);
            self.session = self.start_handle_session(canvas, handle, input.screen, point);
            return effect;
        }

        let Some(target) = hit else {
            effect.selection_changed = !self.selection.is_empty();
            self.selection.clear();
            return effect;
        };

        let before = self.selection.clone();
        match target {
            ObjectRef::PromptNode(_) => self.selection.select_only(target),
            _ if input.modifiers.toggles_selection() => self.selection.toggle(target),
            _ if !self.selection.contains(target) => self.selection.select_only(target),
            _ => {}
        }
        effect.selection_changed = before != self.selection;
        effect.canvas_changed = canvas.bring_to_front(target);

        // Prompt nodes never move directly; a press only selects and raises.
        if matches!(target, ObjectRef::PromptNode(_)) || !self.selection.contains(target) {
            return effect;
        }

        let origins: HashMap<ObjectRef, Point> = match target {
            ObjectRef::Frame(id) => canvas
                .frame(id)
                .map(|f| (target, f.position))
                .into_iter()
                .collect(),
            _ => self
                .selection
                .image_ids()
                .filter_map(|id| canvas.image(id).map(|img| (ObjectRef::Image(id), img.position)))
                .collect(),
        };
        if !origins.is_empty() {
            self.session = Some(Session::Move(MoveSession {
                start_screen: input.screen,
                origins,
            }));
        }
        effect
    }

    fn hit_selected_handle(&self, canvas: &Canvas, point: Point, tolerance: f64) -> Option<Handle> {
        self.selection
            .items()
            .iter()
            .rev()
            .flat_map(|&obj| get_handles(canvas, obj))
            .find(|h| h.hit_test(point, tolerance))
    }

    fn start_handle_session(
        &self,
        canvas: &Canvas,
        handle: Handle,
        screen: Point,
        point: Point,
    ) -> Option<Session> {
        match (handle.kind, handle.target) {
            (HandleKind::Resize, ObjectRef::Image(id)) => {
                let img = canvas.image(id)?;
                Some(Session::Resize(ResizeSession {
                    target: handle.target,
                    start_screen: screen,
                    start_width: img.width,
                    start_height: img.height,
                    start_aspect_ratio: None,
                }))
            }
            (HandleKind::Resize, ObjectRef::Frame(id)) => {
                let frame = canvas.frame(id)?;
                Some(Session::Resize(ResizeSession {
                    target: handle.target,
                    start_screen: screen,
                    start_width: frame.width,
                    start_height: frame.height,
                    start_aspect_ratio: Some(frame.aspect_ratio),
                }))
            }
            (HandleKind::Rotate, ObjectRef::Image(id)) => {
                let img = canvas.image(id)?;
                let center = img.center();
                Some(Session::Rotate(RotateSession {
                    target: id,
                    center,
                    start_angle: angle_degrees(center, point),
                    start_rotation: img.rotation,
                }))
            }
            _ => None,
        }
    }

    /// Continue the active session with the pointer at `screen`.
    pub fn pointer_move(
        &mut self,
        canvas: &mut Canvas,
        viewport: &mut Viewport,
        settings: &EngineSettings,
        screen: Point,
    ) -> Effect {
        let mut effect = Effect::default();
        let Some(session) = self.session.as_mut() else {
            return effect;
        };

        match session {
            Session::Move(m) => {
                let delta = viewport.screen_delta_to_canvas(screen - m.start_screen);
                for (&obj, &origin) in &m.origins {
                    let moved = match obj {
                        ObjectRef::Image(id) => canvas.image_mut(id).map(|o| &mut o.position),
                        ObjectRef::Frame(id) => canvas.frame_mut(id).map(|o| &mut o.position),
                        ObjectRef::PromptNode(_) => None,
                    };
                    if let Some(position) = moved {
                        *position = origin + delta;
                        effect.canvas_changed = true;
                    }
                }
            }
            Session::Resize(r) => {
                let delta = viewport.screen_delta_to_canvas(screen - r.start_screen);
                effect.canvas_changed = apply_resize(canvas, r, delta, settings);
            }
            Session::Rotate(r) => {
                let current = angle_degrees(r.center, viewport.to_canvas(screen));
                if let Some(img) = canvas.image_mut(r.target) {
                    img.rotation = r.start_rotation + (current - r.start_angle);
                    effect.canvas_changed = true;
                }
            }
            Session::Pan(p) => {
                viewport.pan_by(screen - p.last_screen);
                p.last_screen = screen;
                effect.view_changed = true;
            }
        }
        effect
    }

    /// End the active session. Returns the mode that ended, if any.
    pub fn pointer_up(&mut self) -> Option<InteractionMode> {
        self.session.take().map(|s| s.mode())
    }
}

fn apply_resize(canvas: &mut Canvas, r: &ResizeSession, delta: Vec2, settings: &EngineSettings) -> bool {
    match r.target {
        ObjectRef::Frame(id) => {
            let Some(frame) = canvas.frame_mut(id) else {
                return false;
            };
            let aspect = r.start_aspect_ratio.unwrap_or(frame.aspect_ratio);
            frame.aspect_ratio = aspect;
            frame.set_width((r.start_width + delta.x).max(settings.min_frame_width));
            true
        }
        ObjectRef::Image(id) => {
            let Some(img) = canvas.image_mut(id) else {
                return false;
            };
            img.width = (r.start_width + delta.x).max(settings.min_image_size);
            img.height = (r.start_height + delta.y).max(settings.min_image_size);
            true
        }
        ObjectRef::PromptNode(_) => false,
    }
}
