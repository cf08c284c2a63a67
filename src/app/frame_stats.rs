use std::time::Duration;

/// Frame rate averaged over one second windows
#[derive(Debug, Default)]
pub struct FrameStats {
    frame_count: u32,
    window_elapsed: Duration,
    fps: f32,
    mspf: f32,
}

impl FrameStats {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame. Returns true when a full window elapsed and the averages changed.
    pub fn tick(&mut self, frame_time: Duration) -> bool {
        self.frame_count += 1;
        self.window_elapsed += frame_time;

        if self.window_elapsed < Self::WINDOW {
            return false;
        }

        let secs = self.window_elapsed.as_secs_f32();
        self.fps = self.frame_count as f32 / secs;
        self.mspf = 1000.0 * secs / self.frame_count as f32;

        self.frame_count = 0;
        self.window_elapsed = Duration::ZERO;
        true
    }

    pub fn get_fps(&self) -> f32 {
        self.fps
    }

    pub fn get_mspf(&self) -> f32 {
        self.mspf
    }

    pub fn window_title(&self, app_name: &str) -> String {
        format!("{app_name}    fps: {:.0}   mspf: {:.3}", self.fps, self.mspf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_reported_before_a_second() {
        let mut stats = FrameStats::new();
        for _ in 0..59 {
            assert!(!stats.tick(Duration::from_millis(16)));
        }
        assert_eq!(stats.get_fps(), 0.0);
    }

    #[test]
    fn averages_over_the_window() {
        let mut stats = FrameStats::new();
        let mut reported = false;
        for _ in 0..50 {
            reported = stats.tick(Duration::from_millis(20));
        }
        assert!(reported);
        assert!((stats.get_fps() - 50.0).abs() < 1e-3);
        assert!((stats.get_mspf() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn window_restarts_after_report() {
        let mut stats = FrameStats::new();
        assert!(stats.tick(Duration::from_millis(1500)));
        assert!(!stats.tick(Duration::from_millis(10)));
        assert!((stats.get_fps() - 1.0 / 1.5).abs() < 1e-3);
    }

    #[test]
    fn title_format() {
        let mut stats = FrameStats::new();
        for _ in 0..4 {
            stats.tick(Duration::from_millis(250));
        }
        assert_eq!(stats.window_title("boxdraw"), "boxdraw    fps: 4   mspf: 250.000");
    }
}
