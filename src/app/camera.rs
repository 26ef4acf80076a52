use eframe::egui::{Pos2, Rect, Vec2};

use super::render_utils::{screen_to_world, world_to_screen};

pub(super) const MIN_ZOOM: f32 = 0.05;
pub(super) const MAX_ZOOM: f32 = 12.0;
const MIN_FIT_EXTENT: f32 = 80.0;

#[derive(Clone, Copy, Debug)]
struct CameraAnimation {
    from_pan: Vec2,
    from_zoom: f32,
    to_pan: Vec2,
    to_zoom: f32,
    elapsed_secs: f32,
    duration_secs: f32,
}

/// Pan/zoom state of the graph canvas. `zoom` is the global scale applied to
/// world coordinates; `pan` offsets the world origin from the canvas center.
#[derive(Clone, Debug)]
pub(super) struct Camera {
    pan: Vec2,
    zoom: f32,
    animation: Option<CameraAnimation>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            animation: None,
        }
    }
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

impl Camera {
    pub(super) fn pan(&self) -> Vec2 {
        self.pan
    }

    pub(super) fn zoom(&self) -> f32 {
        self.zoom
    }

    pub(super) fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        world_to_screen(rect, self.pan, self.zoom, world)
    }

    pub(super) fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        screen_to_world(rect, self.pan, self.zoom, screen)
    }

    pub(super) fn pan_by(&mut self, delta: Vec2) {
        self.animation = None;
        self.pan += delta;
    }

    /// Scales around `pointer`, keeping the world point under it fixed.
    pub(super) fn zoom_at(&mut self, rect: Rect, pointer: Pos2, factor: f32) {
        self.animation = None;
        let world_before = self.screen_to_world(rect, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Animates to `scale`, keeping the world point at the canvas center fixed.
    pub(super) fn zoom_to(&mut self, scale: f32, duration_ms: f32) {
        let scale = scale.clamp(MIN_ZOOM, MAX_ZOOM);
        let center_world = -self.pan / self.zoom;
        self.animate_to(-center_world * scale, scale, duration_ms);
    }

    /// Animates so `bounds` (world space) fills a viewport of `viewport`
    /// pixels, leaving `padding_px` on every side.
    pub(super) fn zoom_to_fit(
        &mut self,
        bounds: Rect,
        viewport: Vec2,
        duration_ms: f32,
        padding_px: f32,
    ) {
        let available = (viewport - Vec2::splat(padding_px * 2.0)).max(Vec2::splat(1.0));
        let extent = bounds.size().max(Vec2::splat(MIN_FIT_EXTENT));
        let scale = (available.x / extent.x)
            .min(available.y / extent.y)
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let center = bounds.center().to_vec2();
        self.animate_to(-center * scale, scale, duration_ms);
    }

    fn animate_to(&mut self, pan: Vec2, zoom: f32, duration_ms: f32) {
        if duration_ms <= 0.0 {
            self.animation = None;
            self.pan = pan;
            self.zoom = zoom;
            return;
        }

        self.animation = Some(CameraAnimation {
            from_pan: self.pan,
            from_zoom: self.zoom,
            to_pan: pan,
            to_zoom: zoom,
            elapsed_secs: 0.0,
            duration_secs: duration_ms / 1000.0,
        });
    }

    /// Advances a running transition; returns whether one is still running.
    pub(super) fn advance(&mut self, delta_secs: f32) -> bool {
        let Some(mut animation) = self.animation.take() else {
            return false;
        };

        animation.elapsed_secs += delta_secs.max(0.0);
        let t = (animation.elapsed_secs / animation.duration_secs).clamp(0.0, 1.0);
        let eased = ease_in_out_cubic(t);

        let log_from = animation.from_zoom.ln();
        let log_to = animation.to_zoom.ln();
        self.zoom = (log_from + (log_to - log_from) * eased).exp();
        self.pan = animation.from_pan + (animation.to_pan - animation.from_pan) * eased;

        if t < 1.0 {
            self.animation = Some(animation);
            true
        } else {
            self.pan = animation.to_pan;
            self.zoom = animation.to_zoom;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))
    }

    #[test]
    fn fit_centers_and_scales_bounds_into_view() {
        let mut camera = Camera::default();
        let bounds = Rect::from_min_max(pos2(100.0, 100.0), pos2(500.0, 300.0));
        camera.zoom_to_fit(bounds, viewport().size(), 0.0, 50.0);

        assert!((camera.zoom() - 1.75).abs() < 1e-4);
        let center = camera.world_to_screen(viewport(), bounds.center().to_vec2());
        assert!((center - viewport().center()).length() < 1e-3);

        let corner = camera.world_to_screen(viewport(), bounds.min.to_vec2());
        assert!(corner.x >= 50.0 - 1e-3 && corner.y >= 50.0 - 1e-3);
    }

    #[test]
    fn animated_fit_reaches_target_after_duration() {
        let mut camera = Camera::default();
        let bounds = Rect::from_center_size(pos2(40.0, -20.0), vec2(200.0, 200.0));
        camera.zoom_to_fit(bounds, viewport().size(), 400.0, 0.0);

        assert!(camera.advance(0.2));
        assert!(!camera.advance(0.25));
        assert!((camera.zoom() - 3.0).abs() < 1e-4);
        assert!((camera.pan() - vec2(-120.0, 60.0)).length() < 1e-3);
    }

    #[test]
    fn zoom_to_keeps_center_and_clamps() {
        let mut camera = Camera::default();
        camera.pan_by(vec2(30.0, -10.0));
        let center_before = camera.screen_to_world(viewport(), viewport().center());

        camera.zoom_to(2.0, 0.0);
        let center_after = camera.screen_to_world(viewport(), viewport().center());
        assert!((center_before - center_after).length() < 1e-3);
        assert_eq!(camera.zoom(), 2.0);

        camera.zoom_to(1000.0, 0.0);
        assert_eq!(camera.zoom(), MAX_ZOOM);
    }

    #[test]
    fn zoom_at_keeps_pointer_anchor() {
        let mut camera = Camera::default();
        let pointer = pos2(620.0, 180.0);
        let anchor = camera.screen_to_world(viewport(), pointer);
        camera.zoom_at(viewport(), pointer, 1.15);
        assert!((camera.screen_to_world(viewport(), pointer) - anchor).length() < 1e-3);
    }

    #[test]
    fn manual_pan_cancels_animation() {
        let mut camera = Camera::default();
        camera.zoom_to(4.0, 1000.0);
        camera.pan_by(vec2(5.0, 5.0));
        assert!(!camera.advance(0.016));
        assert_eq!(camera.zoom(), 1.0);
    }
}
