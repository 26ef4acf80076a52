use std::collections::VecDeque;

use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 180;

#[derive(Debug, Default)]
pub(in crate::app) struct FpsCounter {
    current: f32,
    samples: VecDeque<f32>,
}

impl FpsCounter {
    fn record(&mut self, delta_secs: f32) {
        if delta_secs <= f32::EPSILON {
            return;
        }

        self.current = (1.0 / delta_secs).clamp(0.0, 1000.0);
        self.samples.push_back(self.current);
        while self.samples.len() > FPS_SAMPLE_WINDOW {
            self.samples.pop_front();
        }
    }

    fn summary(&self) -> Option<String> {
        if self.samples.is_empty() {
            return None;
        }

        let average = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        let low = self.samples.iter().copied().fold(f32::INFINITY, f32::min);
        Some(format!(
            "FPS {:.0} | avg {average:.1} | low {low:.0} | {:.1} ms",
            self.current,
            1000.0 / self.current.max(f32::EPSILON)
        ))
    }
}

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        self.fps.record(dt);
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if self.show_fps {
            self.fps.summary()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_a_bounded_window() {
        let mut counter = FpsCounter::default();
        assert!(counter.summary().is_none());

        for _ in 0..FPS_SAMPLE_WINDOW + 20 {
            counter.record(1.0 / 60.0);
        }
        counter.record(0.0);
        assert_eq!(counter.samples.len(), FPS_SAMPLE_WINDOW);
        assert!((counter.current - 60.0).abs() < 0.01);

        counter.record(1.0 / 30.0);
        let summary = counter.summary().expect("samples recorded");
        assert!(summary.starts_with("FPS 30"));
        assert!(summary.contains("low 30"));
    }
}
