//! Main application window: controls, chain editor and graph view.

use crate::chain::NodeHandle;
use crate::render;
use crate::session::Session;
use crate::settings::Settings;
use crate::theme;
use eframe::egui::{self, Align2, FontId, Pos2, Stroke, Vec2};

/// Arrowhead length in layout units
const ARROW_SIZE: f32 = 10.0;

/// Segments used to draw a loop arc
const LOOP_SEGMENTS: usize = 24;

pub struct MarkovApp {
    session: Session,
    /// Width and height of the layout area
    layout_size: Vec2,
    node_radius: f32,
    hovered: Option<NodeHandle>,
    /// Clicked state whose outgoing paths are listed in the side panel
    selected: Option<NodeHandle>,
}

impl MarkovApp {
    pub fn new(session: Session, settings: &Settings) -> Self {
        Self {
            session,
            layout_size: Vec2::new(settings.width, settings.height),
            node_radius: settings.node_radius,
            hovered: None,
            selected: None,
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Markov Chain");
        ui.add_space(10.0);

        let playing = self.session.is_playing();
        ui.horizontal(|ui| {
            let label = if playing { "⏸ Pause" } else { "▶ Play" };
            if ui.button(label).clicked() {
                self.session.toggle_play();
            }
            if ui.add_enabled(!playing, egui::Button::new("Step")).clicked() {
                self.session.step_once();
            }
            if ui.add_enabled(!playing, egui::Button::new("Reset")).clicked() {
                self.session.reset();
                self.selected = None;
            }
        });

        ui.add_space(6.0);
        if playing {
            ui.colored_label(theme::state::RUNNING, "● Running");
        }
        let model = self.session.model();
        ui.colored_label(
            theme::text::MUTED,
            format!(
                "{} states, total mass {}",
                model.state_count(),
                render::percent_label(model.total_mass())
            ),
        );

        if self.session.layout_running() {
            ui.colored_label(theme::text::MUTED, "Layout settling");
        }

        if let Some(error) = self.session.error() {
            ui.add_space(6.0);
            ui.colored_label(theme::state::ERROR, error);
        }

        if let Some(handle) = self.selected {
            self.render_selected(ui, handle);
        }

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Chain definition (applied on Reset)");
            if ui.small_button("Format").clicked() {
                self.session.format_editor();
            }
        });
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut self.session.editor)
                    .code_editor()
                    .desired_rows(24)
                    .desired_width(f32::INFINITY),
            );
        });
    }

    /// Outgoing links of the selected state as SVG path data
    fn render_selected(&self, ui: &mut egui::Ui, handle: NodeHandle) {
        let Some(state) = self.session.model().state(handle) else {
            return;
        };
        ui.separator();
        ui.label(format!("{} ({})", state.name, render::percent_label(state.value)));

        let outgoing = self
            .session
            .scene()
            .links
            .iter()
            .filter(|(link, _)| state.links.contains(link));
        for (_, geometry) in outgoing {
            let path = geometry.svg_path();
            ui.horizontal(|ui| {
                if ui.small_button("Copy").on_hover_text("Copy SVG path").clicked() {
                    ui.output_mut(|o| o.copied_text = path.clone());
                }
                ui.monospace(&path);
            });
        }
    }

    fn render_graph(&mut self, ui: &mut egui::Ui, now: f64) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click());
        let rect = response.rect;

        // Fit the layout area into the panel, keeping its aspect ratio
        let scale = (rect.width() / self.layout_size.x)
            .min(rect.height() / self.layout_size.y)
            .max(0.01);
        let origin = rect.center() - self.layout_size * scale / 2.0;
        let to_screen = move |p: Pos2| origin + p.to_vec2() * scale;

        let scene = self.session.scene();
        let model = self.session.model();

        // Hover: nearest node under the cursor
        self.hovered = response.hover_pos().and_then(|cursor| {
            scene
                .nodes
                .iter()
                .find(|(_, pos)| (to_screen(*pos) - cursor).length() <= self.node_radius * scale)
                .map(|(handle, _)| *handle)
        });
        if response.clicked() {
            self.selected = self.hovered;
        }

        // Edges first, behind nodes
        let link_stroke = Stroke::new(theme::stroke_width::LINK * scale, theme::LINK);
        for (_, geometry) in &scene.links {
            let points: Vec<Pos2> = geometry.points(LOOP_SEGMENTS).into_iter().map(to_screen).collect();
            painter.add(egui::Shape::line(points, link_stroke));

            let tip = to_screen(geometry.tip());
            let dir = geometry.tip_direction();
            let perp = Vec2::new(-dir.y, dir.x);
            let size = ARROW_SIZE * scale;
            painter.add(egui::Shape::convex_polygon(
                vec![
                    tip,
                    tip - dir * size + perp * size * 0.5,
                    tip - dir * size - perp * size * 0.5,
                ],
                theme::LINK,
                Stroke::NONE,
            ));
        }

        let radius = self.node_radius * scale;
        let name_font = FontId::proportional((14.0 * scale).max(6.0));
        let percent_font = FontId::monospace((12.0 * scale).max(6.0));

        for (handle, pos) in &scene.nodes {
            let Some(state) = model.state(*handle) else {
                continue;
            };
            let value = self.session.display().value(*handle, now).unwrap_or(state.value);
            let center = to_screen(*pos);

            painter.circle_filled(center, radius, render::node_fill(value));

            // Highlight the hovered state and the states it reaches in one step
            let border = match self.hovered {
                Some(h) if h == *handle => Stroke::new(3.0, theme::text::PRIMARY),
                Some(h) if model.one_step_to(h, *handle) => Stroke::new(2.0, theme::state::RUNNING),
                _ => Stroke::new(theme::stroke_width::NODE, theme::text::MUTED),
            };
            painter.circle_stroke(center, radius, border);

            painter.text(
                center + Vec2::new(0.0, -5.0 * scale),
                Align2::CENTER_BOTTOM,
                &state.name,
                name_font.clone(),
                theme::text::PRIMARY,
            );
            painter.text(
                center + Vec2::new(0.0, 17.0 * scale),
                Align2::CENTER_BOTTOM,
                render::percent_label(value),
                percent_font.clone(),
                theme::text::PRIMARY,
            );
        }
    }
}

impl eframe::App for MarkovApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        // Animator ticks, one layout iteration, pending value redraws
        if self.session.frame(now) {
            ctx.request_repaint();
        }

        ctx.set_visuals(egui::Visuals::dark());

        egui::SidePanel::right("controls")
            .min_width(320.0)
            .frame(egui::Frame::none()
                .fill(theme::bg::PANEL)
                .inner_margin(egui::Margin::same(12.0)))
            .show(ctx, |ui| {
                self.render_controls(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::GRAPH))
            .show(ctx, |ui| {
                self.render_graph(ui, now);
            });

        // Button presses change state after this frame's simulation pass
        if ctx.input(|i| i.pointer.any_click()) {
            ctx.request_repaint();
        }
    }
}
