use std::time::Duration;

const FPS_INTERVAL_MS: f32 = 1000.0;

/// Frame time bookkeeping shared by every example.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    /// Duration of the last frame in seconds
    pub frame_timer: f32,

    /// Frame rate independent timer value in `0.0..=1.0`, for use in animations
    pub timer: f32,
    pub timer_speed: f32,
    pub paused: bool,

    pub frame_counter: u32,
    pub last_fps: u32,
    fps_timer: f32,
}

impl FrameTimer {
    pub fn new(timer_speed: f32) -> Self {
        Self {
            frame_timer: 1.0,
            timer: 0.0,
            timer_speed,
            paused: false,
            frame_counter: 0,
            last_fps: 0,
            fps_timer: 0.0,
        }
    }

    /// Records a finished frame. Returns `true` once per fps interval,
    /// after `last_fps` has been refreshed.
    pub fn end_frame(&mut self, elapsed: Duration) -> bool {
        self.frame_counter += 1;

        let elapsed_ms = elapsed.as_micros() as f32 / 1000.0;
        self.frame_timer = elapsed_ms / 1000.0;

        if !self.paused {
            self.timer += self.timer_speed * self.frame_timer;
            if self.timer > 1.0 {
                self.timer -= 1.0;
            }
        }

        self.fps_timer += elapsed_ms;
        if self.fps_timer > FPS_INTERVAL_MS {
            self.last_fps = self.frame_counter;
            self.fps_timer = 0.0;
            self.frame_counter = 0;
            return true;
        }

        false
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn frame_time_ms(&self) -> f32 {
        self.frame_timer * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn timer_advances_by_speed_and_wraps() {
        let mut timer = FrameTimer::new(0.5);
        timer.end_frame(Duration::from_millis(500));
        assert_relative_eq!(timer.timer, 0.25, epsilon = 1e-5);
        assert_relative_eq!(timer.frame_timer, 0.5, epsilon = 1e-5);

        timer.timer = 0.9;
        timer.end_frame(Duration::from_millis(400));
        assert_relative_eq!(timer.timer, 0.1, epsilon = 1e-5);
    }

    #[test]
    fn paused_timer_still_counts_frames() {
        let mut timer = FrameTimer::new(1.0);
        timer.toggle_pause();
        timer.end_frame(Duration::from_millis(100));
        assert_eq!(timer.timer, 0.0);
        assert_eq!(timer.frame_counter, 1);
        assert_relative_eq!(timer.frame_time_ms(), 100.0, epsilon = 1e-3);
    }

    #[test]
    fn fps_is_published_after_one_second() {
        let mut timer = FrameTimer::new(0.25);
        for _ in 0..100 {
            assert!(!timer.end_frame(Duration::from_millis(10)));
        }
        assert!(timer.end_frame(Duration::from_millis(10)));
        assert_eq!(timer.last_fps, 101);
        assert_eq!(timer.frame_counter, 0);
        assert!(!timer.end_frame(Duration::from_millis(10)));
        assert_eq!(timer.last_fps, 101);
    }
}
