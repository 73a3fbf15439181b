//! Pointer-driven editing.
//!
//! The state machine turns raw pointer events into label creation, resize,
//! move and selection. It is always in one of three states:
//!
//! | State    | Entered on                        | Left on    |
//! |----------|-----------------------------------|------------|
//! | `Free`   | start, every pointer-up           | pointer-down inside the frame |
//! | `Resize` | pointer-down on a handle or on empty canvas (creates a label) | pointer-up |
//! | `Move`   | pointer-down on a label body      | pointer-up |
//!
//! Every transition requests a redraw of the active item.

use crate::config::SessionConfig;
use crate::hit_test::{HitResult, HitTestIndex};
use crate::model::{
    BODY_HANDLE, BoxGeometry, CREATION_HANDLE, Frame, LabelId, LabelShape, LabelTemplate, Point,
};
use crate::state::{Session, SessionError};

/// Current gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    /// No gesture in progress.
    Free,
    /// Dragging a resize handle of a label.
    Resize { label: LabelId, handle: u8 },
    /// Dragging a whole label.
    Move {
        label: LabelId,
        /// Geometry when the drag started.
        origin: LabelShape,
        /// Pointer position when the drag started.
        click: Point,
    },
}

/// Cursor the UI should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    /// Over empty canvas inside the frame: a click creates a label.
    Crosshair,
    /// Over a label body or dragging one.
    Move,
    /// Over a resize handle or dragging one.
    Resize(u8),
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEnd {
    /// The label was kept with its final geometry.
    Kept(LabelId),
    /// The label ended up below the minimum size and was discarded.
    Discarded(LabelId),
}

/// Pointer interaction state machine.
#[derive(Debug)]
pub struct InteractionStateMachine {
    state: InteractionState,
    template: LabelTemplate,
    frame: Frame,
    min_box_size: f32,
    handle_radius: u32,
    hit_index: HitTestIndex,
    hover: HitResult,
    last_pointer: Option<Point>,
}

impl InteractionStateMachine {
    /// Create a state machine for a canvas of the given pixel size, with the
    /// image drawn inside `frame`.
    pub fn new(canvas_width: u32, canvas_height: u32, frame: Frame) -> Self {
        Self::with_config(canvas_width, canvas_height, frame, &SessionConfig::default())
    }

    pub fn with_config(
        canvas_width: u32,
        canvas_height: u32,
        frame: Frame,
        config: &SessionConfig,
    ) -> Self {
        Self {
            state: InteractionState::Free,
            template: LabelTemplate::default(),
            frame,
            min_box_size: config.min_box_size,
            handle_radius: config.handle_radius,
            hit_index: HitTestIndex::new(canvas_width, canvas_height),
            hover: HitResult::NONE,
            last_pointer: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == InteractionState::Free
    }

    /// What the pointer was over at the last move in the free state.
    pub fn hover(&self) -> HitResult {
        self.hover
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Category and attributes given to newly drawn labels.
    pub fn set_template(&mut self, template: LabelTemplate) {
        self.template = template;
    }

    pub fn template(&self) -> &LabelTemplate {
        &self.template
    }

    /// Change the drawing frame (e.g. after the image or canvas changed).
    pub fn set_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    /// Change the canvas size.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.hit_index.resize(width, height);
    }

    /// Pick at a canvas point, repainting the identity surface first if the
    /// session changed since it was last painted.
    pub fn hit_test(&mut self, session: &Session, point: Point) -> HitResult {
        if self.hit_index.is_stale(session) {
            self.hit_index.rebuild(session, self.handle_radius);
        }
        self.hit_index.query(point)
    }

    // ========================================================================
    // Pointer events
    // ========================================================================

    pub fn on_pointer_down(&mut self, session: &mut Session, point: Point) -> Result<(), SessionError> {
        self.last_pointer = Some(point);
        if !self.is_free() {
            log::debug!("Pointer down during {:?}; ignored", self.state);
            return Ok(());
        }
        if !self.frame.contains(&point) {
            return Ok(());
        }

        let hit = self.hit_test(session, point);
        self.state = match (hit.label, hit.handle) {
            (Some(label), Some(handle)) if handle != BODY_HANDLE => {
                session.select_label(Some(label))?;
                log::debug!("Resizing label {} by handle {}", label, handle);
                InteractionState::Resize { label, handle }
            }
            (Some(label), _) => {
                let Some(origin) = session.label(label).and_then(|l| l.shape.clone()) else {
                    session.select_label(Some(label))?;
                    return Ok(());
                };
                session.select_label(Some(label))?;
                log::debug!("Moving label {}", label);
                InteractionState::Move {
                    label,
                    origin,
                    click: point,
                }
            }
            (None, _) => {
                let shape = LabelShape::Box(BoxGeometry::at(point));
                let label = session.create_label(&self.template, Some(shape))?;
                session.select_label(Some(label))?;
                log::debug!("Drawing new label {}", label);
                InteractionState::Resize {
                    label,
                    handle: CREATION_HANDLE,
                }
            }
        };
        self.hover = HitResult::NONE;
        session.request_redraw(session.current_item_index());
        Ok(())
    }

    pub fn on_pointer_move(&mut self, session: &mut Session, point: Point) -> Result<(), SessionError> {
        self.last_pointer = Some(point);
        if self.is_free() {
            self.update_hover(session, point);
            return Ok(());
        }
        match &self.state {
            InteractionState::Free => Ok(()),
            InteractionState::Resize { label, handle } => {
                let target = self.frame.clamp(point);
                let handle = *handle;
                session.update_shape(*label, |shape| shape.resize_with_handle(handle, target))
            }
            InteractionState::Move {
                label,
                origin,
                click,
            } => {
                let mut moved = origin.clone();
                moved.translate(point.x - click.x, point.y - click.y);
                moved.clamp_to(&self.frame);
                session.update_shape(*label, |shape| *shape = moved)
            }
        }
    }

    /// Only feedback changes while no gesture is running.
    fn update_hover(&mut self, session: &Session, point: Point) {
        self.hover = if self.frame.contains(&point) {
            self.hit_test(session, point)
        } else {
            HitResult::NONE
        };
    }

    /// Finish the current gesture at `point`.
    pub fn on_pointer_up(
        &mut self,
        session: &mut Session,
        point: Point,
    ) -> Result<Option<GestureEnd>, SessionError> {
        if self.is_free() {
            self.last_pointer = Some(point);
            return Ok(None);
        }
        self.on_pointer_move(session, point)?;
        self.finish(session)
    }

    /// The drawing surface went away mid-gesture. The gesture is finished
    /// with the last geometry it produced.
    pub fn surface_lost(&mut self, session: &mut Session) -> Result<Option<GestureEnd>, SessionError> {
        self.hit_index.invalidate();
        self.hover = HitResult::NONE;
        if self.is_free() {
            return Ok(None);
        }
        log::debug!("Surface lost during {:?}; finishing gesture", self.state);
        self.finish(session)
    }

    fn finish(&mut self, session: &mut Session) -> Result<Option<GestureEnd>, SessionError> {
        let state = std::mem::replace(&mut self.state, InteractionState::Free);
        session.request_redraw(session.current_item_index());

        let label = match state {
            InteractionState::Free => return Ok(None),
            InteractionState::Move { label, .. } => label,
            InteractionState::Resize { label, .. } => {
                if session.label(label).is_none_or(|l| !l.valid) {
                    return Ok(None);
                }
                session.update_shape(label, LabelShape::normalize)?;
                let degenerate = session
                    .label(label)
                    .and_then(|l| l.shape.as_ref())
                    .is_some_and(|s| s.is_degenerate(self.min_box_size));
                if degenerate {
                    session.discard_label(label)?;
                    return Ok(Some(GestureEnd::Discarded(label)));
                }
                label
            }
        };

        session.propagate_selection(label);
        Ok(Some(GestureEnd::Kept(label)))
    }

    /// Cursor for the current state and hover.
    pub fn cursor(&self) -> CursorHint {
        match &self.state {
            InteractionState::Resize { handle, .. } => CursorHint::Resize(*handle),
            InteractionState::Move { .. } => CursorHint::Move,
            InteractionState::Free => match (self.hover.label, self.hover.handle) {
                (Some(_), Some(handle)) if handle != BODY_HANDLE => CursorHint::Resize(handle),
                (Some(_), _) => CursorHint::Move,
                (None, _) => {
                    if self.last_pointer.is_some_and(|p| self.frame.contains(&p)) {
                        CursorHint::Crosshair
                    } else {
                        CursorHint::Default
                    }
                }
            },
        }
    }
}
