//! Control surface: play/pause, single step, reset and reload.
//!
//! A `Session` owns the chain model, the layout, the animator and the
//! editor buffer. The window calls [`Session::frame`] once per repaint.
//! Rejected loads and step errors are kept in [`Session::error`] for
//! display; they never replace the running chain.

use crate::animator::Animator;
use crate::chain::{ChainDocument, ChainModel};
use crate::error::ChainError;
use crate::graph::ForceLayout;
use crate::render::{Scene, ValueDisplay};
use crate::settings::Settings;
use std::time::Duration;
use tracing::{info, trace, warn};

pub struct Session {
    model: ChainModel,
    layout: ForceLayout,
    animator: Animator,
    scene: Scene,
    display: ValueDisplay,
    /// JSON text the reset button reloads from
    pub editor: String,
    error: Option<String>,
    step_transition: Duration,
    /// Time of the most recent frame, in seconds
    now: f64,
}

impl Session {
    pub fn new(doc: &ChainDocument, editor: String, settings: &Settings) -> Result<Self, ChainError> {
        let model = ChainModel::from_document(doc)?;
        let mut session = Self {
            model,
            layout: ForceLayout::from_settings(settings),
            animator: Animator::new(),
            scene: Scene::default(),
            display: ValueDisplay::default(),
            editor,
            error: None,
            step_transition: Duration::from_millis(settings.step_transition_ms),
            now: 0.0,
        };
        session.layout.load(&session.model);
        session.scene.redraw_links(&session.model, session.layout.positions());
        session.sync_values();
        Ok(session)
    }

    pub fn is_playing(&self) -> bool {
        self.animator.is_running()
    }

    /// Play/pause
    pub fn toggle_play(&mut self) {
        if self.animator.is_running() {
            self.animator.stop();
        } else {
            self.error = None;
            self.animator.start();
        }
    }

    /// Cancel any animation and advance one full step with a timed transition
    pub fn step_once(&mut self) {
        self.animator.stop();
        match self.model.step(1.0, Some(self.step_transition)) {
            Ok(()) => self.error = None,
            Err(e) => self.report(e),
        }
        self.sync_values();
    }

    /// Cancel any animation, restore loaded values, then reload from the editor.
    ///
    /// If the editor text is rejected the restored chain stays loaded.
    pub fn reset(&mut self) {
        self.animator.stop();
        self.model.reset();

        match self.model.load_json(&self.editor) {
            Ok(()) => {
                info!("reloaded chain from editor");
                self.error = None;
                self.layout.load(&self.model);
                self.scene.redraw_links(&self.model, self.layout.positions());
            }
            Err(e) => self.report(e),
        }
        self.sync_values();
    }

    /// Drive one repaint at wall-clock time `now` (seconds).
    ///
    /// Returns `true` while anything is still moving and another frame is wanted.
    pub fn frame(&mut self, now: f64) -> bool {
        self.now = now;

        let model = &mut self.model;
        let animating = match self.animator.frame(now, |dt| model.step(dt, None)) {
            Ok(outcome) => {
                if outcome.ticks > 0 {
                    trace!(ticks = outcome.ticks, "animator ticks");
                }
                outcome.reschedule
            }
            Err(e) => {
                self.report(e);
                false
            }
        };

        if self.layout.tick() {
            self.scene.redraw_links(&self.model, self.layout.positions());
        }

        self.sync_values();

        animating || !self.layout.is_settled() || self.display.is_animating(now)
    }

    /// Pretty-print the editor text if it parses
    pub fn format_editor(&mut self) {
        match ChainDocument::from_json(&self.editor).and_then(|doc| doc.to_json_pretty()) {
            Ok(text) => {
                self.editor = text;
                self.error = None;
            }
            Err(e) => self.report(e),
        }
    }

    fn sync_values(&mut self) {
        if let Some(request) = self.model.take_redraw() {
            self.display.apply(&self.model, request, self.now);
        }
    }

    fn report(&mut self, e: ChainError) {
        warn!(error = %e, "chain operation rejected");
        self.error = Some(e.to_string());
    }

    pub fn model(&self) -> &ChainModel {
        &self.model
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn display(&self) -> &ValueDisplay {
        &self.display
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn layout_running(&self) -> bool {
        self.layout.is_running()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
