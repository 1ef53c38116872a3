use derive_builder::Builder;
use log::LevelFilter;
use nalgebra_glm as glm;
use std::path::PathBuf;

#[derive(Builder, Debug, Clone)]
#[builder(default)]
pub struct ExampleSettings {
    #[builder(setter(into))]
    pub title: String,

    /// Application and engine name handed to the instance
    #[builder(setter(into))]
    pub name: String,

    pub width: u32,
    pub height: u32,

    /// Enables the validation layer and routes its messages to the log
    pub validation: bool,

    /// Forces a FIFO present mode
    pub vsync: bool,

    /// Requests `VK_EXT_debug_marker` when the device offers it
    pub enable_debug_markers: bool,

    pub enable_text_overlay: bool,
    pub clear_color: [f32; 4],

    /// Multiplier for speeding up (or slowing down) the animation timer
    pub timer_speed: f32,
    pub rotation_speed: f32,
    pub zoom_speed: f32,

    pub zoom: f32,
    pub rotation: glm::Vec3,
    pub camera_position: glm::Vec3,

    /// Base directory for shaders, models and textures
    #[builder(setter(into))]
    pub asset_path: PathBuf,

    pub log_level: LevelFilter,
}

impl Default for ExampleSettings {
    fn default() -> Self {
        Self {
            title: "Vulkan Example".to_string(),
            name: "vulkanExample".to_string(),
            width: 1280,
            height: 720,
            validation: cfg!(feature = "validation"),
            vsync: false,
            enable_debug_markers: false,
            enable_text_overlay: false,
            clear_color: [0.025, 0.025, 0.025, 1.0],
            timer_speed: 0.25,
            rotation_speed: 1.0,
            zoom_speed: 1.0,
            zoom: 0.0,
            rotation: glm::vec3(0.0, 0.0, 0.0),
            camera_position: glm::vec3(0.0, 0.0, 0.0),
            asset_path: PathBuf::from("assets/"),
            log_level: LevelFilter::Info,
        }
    }
}

impl ExampleSettings {
    pub fn asset(&self, relative_path: &str) -> PathBuf {
        self.asset_path.join(relative_path)
    }

    pub fn dimensions(&self) -> [u32; 2] {
        [self.width, self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_defaults_for_unset_fields() {
        let settings = ExampleSettingsBuilder::default()
            .title("Debug markers")
            .zoom(-8.5)
            .build()
            .unwrap();

        assert_eq!(settings.title, "Debug markers");
        assert_eq!(settings.name, "vulkanExample");
        assert_eq!(settings.dimensions(), [1280, 720]);
        assert_eq!(settings.zoom, -8.5);
        assert_eq!(settings.timer_speed, 0.25);
        assert_eq!(settings.clear_color, [0.025, 0.025, 0.025, 1.0]);
        assert_eq!(settings.validation, cfg!(feature = "validation"));
        assert!(!settings.vsync);
        assert!(!settings.enable_debug_markers);
        assert!(!settings.enable_text_overlay);
    }

    #[test]
    fn assets_resolve_below_the_asset_path() {
        let settings = ExampleSettingsBuilder::default()
            .asset_path("data")
            .build()
            .unwrap();

        assert_eq!(
            settings.asset("shaders/debugmarker/toon.vert.spv"),
            PathBuf::from("data/shaders/debugmarker/toon.vert.spv")
        );
    }
}
