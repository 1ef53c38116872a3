#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub align: TextAlign,
}

/// Text shown on top of an example, refreshed once per fps interval.
#[derive(Debug, Default)]
pub struct TextOverlay {
    lines: Vec<OverlayLine>,
    updating: bool,
    pub visible: bool,
}

impl TextOverlay {
    pub fn new(visible: bool) -> Self {
        Self {
            lines: Vec::new(),
            updating: false,
            visible,
        }
    }

    pub fn begin(&mut self) {
        self.lines.clear();
        self.updating = true;
    }

    pub fn add_text(&mut self, text: impl Into<String>, x: f32, y: f32, align: TextAlign) {
        if !self.updating {
            return;
        }
        self.lines.push(OverlayLine {
            text: text.into(),
            x,
            y,
            align,
        });
    }

    pub fn end(&mut self) {
        self.updating = false;
    }

    pub fn lines(&self) -> &[OverlayLine] {
        &self.lines
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

pub fn frame_statistics(frame_time_ms: f32, fps: u32) -> String {
    format!("{:.2}ms ({} fps)", frame_time_ms, fps)
}

pub fn window_title(title: &str, device_name: &str, fps: u32, overlay_enabled: bool) -> String {
    let mut window_title = format!("{} - {}", title, device_name);
    if !overlay_enabled {
        window_title += &format!(" - {} fps", fps);
    }
    window_title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_only_collected_between_begin_and_end() {
        let mut overlay = TextOverlay::new(true);
        overlay.add_text("ignored", 0.0, 0.0, TextAlign::Left);
        assert!(overlay.lines().is_empty());

        overlay.begin();
        overlay.add_text("Vulkan Example", 5.0, 5.0, TextAlign::Left);
        overlay.add_text("VK_EXT_debug_marker active", 5.0, 85.0, TextAlign::Left);
        overlay.end();
        overlay.add_text("late", 0.0, 0.0, TextAlign::Right);

        let texts: Vec<_> = overlay.lines().iter().map(|line| line.text.as_str()).collect();
        assert_eq!(texts, ["Vulkan Example", "VK_EXT_debug_marker active"]);
        assert_eq!(overlay.lines()[1].y, 85.0);
    }

    #[test]
    fn begin_discards_previous_lines() {
        let mut overlay = TextOverlay::new(false);
        overlay.begin();
        overlay.add_text("first", 0.0, 0.0, TextAlign::Center);
        overlay.end();
        overlay.begin();
        overlay.end();
        assert!(overlay.lines().is_empty());
    }

    #[test]
    fn title_carries_fps_only_without_overlay() {
        assert_eq!(
            window_title("Vulkan Example", "GeForce", 60, false),
            "Vulkan Example - GeForce - 60 fps"
        );
        assert_eq!(
            window_title("Vulkan Example", "GeForce", 60, true),
            "Vulkan Example - GeForce"
        );
    }

    #[test]
    fn statistics_use_two_decimals() {
        assert_eq!(frame_statistics(16.6666, 60), "16.67ms (60 fps)");
    }
}
