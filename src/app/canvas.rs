use eframe::egui::{self, Align2, Color32, FontId, PointerButton, Pos2, Rect, Sense, Shape, Stroke, Ui, vec2};

use seedgraph::RenderSnapshot;
use seedgraph::util::truncate_label;

use super::SeedGraphApp;
use super::render_utils::{
    blend_color, circle_visible, draw_background, ghost_color, link_stroke, node_color, node_radius,
    screen_to_world, segment_maybe_visible, world_to_screen,
};

struct ScreenNode {
    index: usize,
    position: Pos2,
    radius: f32,
}

impl SeedGraphApp {
    fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.1, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    fn handle_graph_pan(&mut self, response: &egui::Response) {
        let background_drag = self.dragging.is_none() && response.dragged_by(PointerButton::Primary);
        if background_drag
            || response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn hovered_node(ui: &Ui, screen_nodes: &[ScreenNode]) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        screen_nodes
            .iter()
            .filter_map(|node| {
                let distance = node.position.distance(pointer);
                (distance <= node.radius + 3.0).then_some((node.index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Engine coordinates are centered on the engine's viewport center; the
    /// canvas centers that point and applies pan/zoom on top.
    fn world_position(&self, rect: Rect, screen: Pos2) -> Pos2 {
        let center = self.explorer.engine().center();
        let world = screen_to_world(rect, self.pan, self.zoom, screen) + center;
        Pos2::new(world.x, world.y)
    }

    fn handle_node_drag(&mut self, ui: &Ui, rect: Rect, response: &egui::Response, hovered_id: Option<&str>) {
        let pointer = ui.input(|input| input.pointer.interact_pos());

        if response.drag_started_by(PointerButton::Primary)
            && let (Some(id), Some(pointer)) = (hovered_id, pointer)
        {
            let world = self.world_position(rect, pointer);
            if self.explorer.pin(id, world.x, world.y) {
                self.dragging = Some(id.to_owned());
            }
        }

        if let Some(id) = self.dragging.clone() {
            if response.drag_stopped() {
                self.explorer.unpin(&id);
                self.dragging = None;
            } else if let Some(pointer) = pointer {
                let world = self.world_position(rect, pointer);
                self.explorer.drag_to(&id, world.x, world.y);
            }
        }
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);

        let snapshot = if self.live_physics {
            self.explorer.tick()
        } else {
            self.explorer.render_snapshot()
        };
        if snapshot.nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Nothing visible. Add a node or show hidden types.",
                FontId::proportional(14.0),
                Color32::from_gray(180),
            );
            return;
        }

        let center = self.explorer.engine().center();
        let (pan, zoom) = (self.pan, self.zoom);
        let to_screen = |x: f32, y: f32| world_to_screen(rect, pan, zoom, vec2(x - center.x, y - center.y));

        let screen_nodes = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| ScreenNode {
                index,
                position: to_screen(node.x, node.y),
                radius: node_radius(node.node_type, zoom),
            })
            .filter(|node| circle_visible(rect, node.position, node.radius))
            .collect::<Vec<_>>();

        let hovered = Self::hovered_node(ui, &screen_nodes);
        let hovered_id = hovered.map(|index| snapshot.nodes[index].id.clone());
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        self.handle_node_drag(ui, rect, &response, hovered_id.as_deref());
        self.handle_graph_pan(&response);

        Self::paint_links(&painter, rect, zoom, &snapshot, &to_screen);
        Self::paint_nodes(&painter, zoom, &snapshot, &screen_nodes, hovered);

        if let Some(index) = hovered {
            let node = &snapshot.nodes[index];
            let detail = if node.has_sub_graph { "  |  nested" } else { "" };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}{detail}", node.label, node.node_type.label()),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.double_clicked() {
            if let Some(id) = &hovered_id {
                let _ = self.explorer.enter_sub_graph(id);
                self.pan = egui::Vec2::ZERO;
            }
        } else if response.clicked_by(PointerButton::Primary) {
            match &hovered_id {
                Some(id) => {
                    let toggle = ui.input(|input| input.modifiers.command || input.modifiers.shift);
                    self.explorer.click_node(id, toggle);
                }
                None => self.explorer.click_background(),
            }
        }

        if !self.explorer.is_settled() || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }
    }

    fn paint_links(
        painter: &egui::Painter,
        rect: Rect,
        zoom: f32,
        snapshot: &RenderSnapshot,
        to_screen: &impl Fn(f32, f32) -> Pos2,
    ) {
        for link in &snapshot.links {
            let start = to_screen(link.source.0, link.source.1);
            let end = to_screen(link.target.0, link.target.1);
            if !segment_maybe_visible(rect, start, end) {
                continue;
            }

            let stroke = link_stroke(link.kind, zoom, link.is_ghost);
            if link.is_ghost {
                painter.extend(Shape::dashed_line(&[start, end], stroke, 6.0, 4.0));
            } else {
                painter.line_segment([start, end], stroke);
            }

            if zoom > 0.9 && !link.relation.is_empty() {
                painter.text(
                    start + (end - start) * 0.5,
                    Align2::CENTER_CENTER,
                    &link.relation,
                    FontId::proportional(10.0),
                    Color32::from_gray(150),
                );
            }
        }
    }

    fn paint_nodes(
        painter: &egui::Painter,
        zoom: f32,
        snapshot: &RenderSnapshot,
        screen_nodes: &[ScreenNode],
        hovered: Option<usize>,
    ) {
        let selected_color = Color32::from_rgb(245, 206, 93);

        for screen_node in screen_nodes {
            let node = &snapshot.nodes[screen_node.index];
            let (position, radius) = (screen_node.position, screen_node.radius);
            let is_hovered = hovered == Some(screen_node.index);

            let mut color = node_color(node.node_type);
            if is_hovered {
                color = blend_color(color, Color32::WHITE, 0.25);
            }
            if node.is_ghost {
                color = ghost_color(color);
            }

            painter.circle_filled(position, radius, color);
            if node.selected {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.0, selected_color));
            }
            let outline = if node.is_root { 2.4 } else { 1.0 };
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(outline, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            );
            if node.has_sub_graph {
                painter.circle_stroke(
                    position,
                    radius * 0.5,
                    Stroke::new(1.2, Color32::from_rgba_unmultiplied(240, 240, 240, 160)),
                );
            }

            let should_draw_label = node.selected || is_hovered || node.is_root || zoom > 0.7;
            if should_draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    truncate_label(&node.label, 32),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }
    }
}
