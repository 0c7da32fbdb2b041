use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use seedgraph::{LinkKind, NodeType};
use seedgraph::notify::ToastKind;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Translucent variant for tentative (ghost) elements.
pub(super) fn ghost_color(color: Color32) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), 90)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Cheap cull on the segment's bounding box.
pub(super) fn segment_maybe_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    Rect::from_two_pos(start, end).expand(2.0).intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn node_color(node_type: NodeType) -> Color32 {
    match node_type {
        NodeType::Concept => Color32::from_rgb(103, 164, 235),
        NodeType::Entity => Color32::from_rgb(126, 200, 140),
        NodeType::Event => Color32::from_rgb(239, 161, 92),
        NodeType::Person => Color32::from_rgb(226, 118, 152),
        NodeType::Place => Color32::from_rgb(176, 142, 230),
        NodeType::Question => Color32::from_rgb(240, 210, 100),
        NodeType::Source => Color32::from_rgb(150, 170, 180),
        NodeType::Trace => Color32::from_rgb(120, 120, 130),
    }
}

pub(super) fn node_radius(node_type: NodeType, zoom: f32) -> f32 {
    let base = if node_type.is_lineage() { 6.0 } else { 12.0 };
    (base * zoom.powf(0.40)).clamp(2.5, 40.0)
}

pub(super) fn link_stroke(kind: LinkKind, zoom: f32, ghost: bool) -> Stroke {
    let (width, color) = match kind {
        LinkKind::Semantic => (1.4, Color32::from_rgba_unmultiplied(150, 160, 175, 200)),
        LinkKind::Lineage => (0.9, Color32::from_rgba_unmultiplied(110, 110, 120, 170)),
    };
    let color = if ghost { ghost_color(color) } else { color };
    Stroke::new((width * zoom.sqrt()).clamp(0.5, 3.4), color)
}

pub(super) fn toast_color(kind: ToastKind) -> Color32 {
    match kind {
        ToastKind::Info => Color32::from_rgb(44, 62, 80),
        ToastKind::Error => Color32::from_rgb(120, 40, 44),
    }
}
