use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::memory::Layer;

pub(super) const ENTITY_COLOR: Color32 = Color32::from_rgb(244, 180, 76);
pub(super) const HUB_EDGE_COLOR: Color32 = Color32::from_rgb(196, 150, 82);
pub(super) const DIRECT_EDGE_COLOR: Color32 = Color32::from_rgb(128, 150, 176);
pub(super) const SELECTED_RING_COLOR: Color32 = Color32::from_rgb(245, 236, 200);
pub(super) const SEARCH_RING_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
pub(super) const LABEL_COLOR: Color32 = Color32::from_gray(236);

pub(super) fn layer_color(layer: Layer) -> Color32 {
    match layer {
        Layer::Identity => Color32::from_rgb(186, 120, 240),
        Layer::Project => Color32::from_rgb(84, 160, 255),
        Layer::Session => Color32::from_rgb(86, 200, 140),
        Layer::Task => Color32::from_rgb(240, 110, 110),
    }
}

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

/// Scales opacity; `color` stays premultiplied.
pub(super) fn fade(color: Color32, factor: f32) -> Color32 {
    color.gamma_multiply(factor.clamp(0.0, 1.0))
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 20, 27));

    let step = (64.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(56, 64, 78, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Cheap bounding-box cull for a segment; may keep a few segments that only
/// pass near a corner.
pub(super) fn segment_near_rect(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_and_world_round_trip() {
        let rect = Rect::from_min_size(pos2(20.0, 40.0), vec2(800.0, 600.0));
        let pan = vec2(-35.0, 12.0);
        let world = vec2(143.0, -71.5);
        let screen = world_to_screen(rect, pan, 1.7, world);
        assert!((screen_to_world(rect, pan, 1.7, screen) - world).length() < 1e-3);
    }

    #[test]
    fn fade_scales_opacity() {
        assert_eq!(fade(ENTITY_COLOR, 0.13).a(), 33);
        assert_eq!(fade(ENTITY_COLOR, 1.0), ENTITY_COLOR);
    }

    #[test]
    fn layers_have_distinct_colors() {
        let colors = Layer::ALL.map(layer_color);
        for (index, color) in colors.iter().enumerate() {
            assert!(!colors[index + 1..].contains(color));
            assert_ne!(*color, ENTITY_COLOR);
        }
    }

    #[test]
    fn segment_cull_rejects_far_segments() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        assert!(segment_near_rect(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!segment_near_rect(rect, pos2(-50.0, -50.0), pos2(-10.0, -5.0), 2.0));
    }
}
