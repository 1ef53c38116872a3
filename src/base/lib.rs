pub mod app;
pub mod logger;
pub mod overlay;
pub mod settings;
pub mod timer;
pub mod view;
pub mod vulkan;

pub use ash;
pub use nalgebra_glm as glm;
pub use winit;
