use nalgebra_glm as glm;

const ROTATION_FACTOR: f32 = 1.25;
const ZOOM_FACTOR: f32 = 0.005;
const PAN_FACTOR: f32 = 0.01;

/// Wheel units reported per notch by most platforms
const WHEEL_DELTA: f32 = 120.0;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

/// Mouse driven orbit view used by the examples.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Euler angles in degrees
    pub rotation: glm::Vec3,
    pub camera_position: glm::Vec3,
    pub zoom: f32,
    pub mouse_position: glm::Vec2,
    pub rotation_speed: f32,
    pub zoom_speed: f32,
    pub buttons: MouseButtons,
    /// Set by input, consumed once per frame
    pub view_updated: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            rotation: glm::vec3(0.0, 0.0, 0.0),
            camera_position: glm::vec3(0.0, 0.0, 0.0),
            zoom: 0.0,
            mouse_position: glm::vec2(0.0, 0.0),
            rotation_speed: 1.0,
            zoom_speed: 1.0,
            buttons: MouseButtons::default(),
            view_updated: false,
        }
    }
}

impl ViewState {
    /// Returns `true` if the view changed.
    pub fn cursor_moved(&mut self, position: glm::Vec2) -> bool {
        let delta = self.mouse_position - position;
        let mut changed = false;

        if self.buttons.left {
            self.rotation.x += delta.y * ROTATION_FACTOR * self.rotation_speed;
            self.rotation.y -= delta.x * ROTATION_FACTOR * self.rotation_speed;
            changed = true;
        }

        if self.buttons.right {
            self.zoom += delta.y * ZOOM_FACTOR * self.zoom_speed;
            changed = true;
        }

        if self.buttons.middle {
            self.camera_position.x -= delta.x * PAN_FACTOR;
            self.camera_position.y -= delta.y * PAN_FACTOR;
            changed = true;
        }

        self.mouse_position = position;
        self.view_updated |= changed;
        changed
    }

    pub fn scrolled(&mut self, lines: f32) {
        self.scrolled_units(lines * WHEEL_DELTA);
    }

    /// Touchpads report pixels, one pixel counts as one wheel unit.
    pub fn scrolled_pixels(&mut self, pixels: f32) {
        self.scrolled_units(pixels);
    }

    fn scrolled_units(&mut self, units: f32) {
        self.zoom += units * ZOOM_FACTOR * self.zoom_speed;
        self.view_updated = true;
    }

    /// Returns whether the view changed since the last call.
    pub fn take_updated(&mut self) -> bool {
        std::mem::replace(&mut self.view_updated, false)
    }

    pub fn model_matrix(&self) -> glm::Mat4 {
        let view = glm::translate(&glm::Mat4::identity(), &glm::vec3(0.0, 0.0, self.zoom));
        let model = glm::translate(&view, &self.camera_position);
        let model = glm::rotate(
            &model,
            self.rotation.x.to_radians(),
            &glm::vec3(1.0, 0.0, 0.0),
        );
        let model = glm::rotate(
            &model,
            self.rotation.y.to_radians(),
            &glm::vec3(0.0, 1.0, 0.0),
        );
        glm::rotate(
            &model,
            self.rotation.z.to_radians(),
            &glm::vec3(0.0, 0.0, 1.0),
        )
    }
}

pub fn perspective(fov_degrees: f32, aspect_ratio: f32, near: f32, far: f32) -> glm::Mat4 {
    glm::perspective_zo(aspect_ratio, fov_degrees.to_radians(), near, far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moving_without_buttons_only_tracks_the_cursor() {
        let mut view = ViewState::default();
        assert!(!view.cursor_moved(glm::vec2(10.0, 20.0)));
        assert_eq!(view.mouse_position, glm::vec2(10.0, 20.0));
        assert_eq!(view.rotation, glm::vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn left_drag_rotates() {
        let mut view = ViewState {
            rotation_speed: 0.5,
            ..ViewState::default()
        };
        view.cursor_moved(glm::vec2(100.0, 100.0));
        view.buttons.left = true;

        assert!(view.cursor_moved(glm::vec2(110.0, 90.0)));
        assert_relative_eq!(view.rotation.x, 10.0 * 1.25 * 0.5, epsilon = 1e-5);
        assert_relative_eq!(view.rotation.y, 10.0 * 1.25 * 0.5, epsilon = 1e-5);
    }

    #[test]
    fn right_drag_zooms_and_middle_drag_pans() {
        let mut view = ViewState {
            zoom_speed: 2.0,
            ..ViewState::default()
        };
        view.buttons.right = true;
        view.cursor_moved(glm::vec2(0.0, 50.0));
        assert_relative_eq!(view.zoom, -50.0 * 0.005 * 2.0, epsilon = 1e-5);

        view.buttons.right = false;
        view.buttons.middle = true;
        view.cursor_moved(glm::vec2(20.0, 40.0));
        assert_relative_eq!(view.camera_position.x, 0.2, epsilon = 1e-5);
        assert_relative_eq!(view.camera_position.y, -0.1, epsilon = 1e-5);
    }

    #[test]
    fn one_wheel_line_is_one_notch() {
        let mut view = ViewState::default();
        view.scrolled(1.0);
        assert_relative_eq!(view.zoom, 0.6, epsilon = 1e-5);
        view.scrolled(-2.0);
        assert_relative_eq!(view.zoom, -0.6, epsilon = 1e-5);
    }

    #[test]
    fn pixel_scrolling_zooms_by_wheel_units() {
        let mut view = ViewState::default();
        view.scrolled_pixels(60.0);
        assert_relative_eq!(view.zoom, 0.3, epsilon = 1e-5);
        view.scrolled_pixels(-60.0);
        assert_relative_eq!(view.zoom, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn updates_are_reported_once() {
        let mut view = ViewState::default();
        view.cursor_moved(glm::vec2(5.0, 5.0));
        assert!(!view.take_updated());

        view.buttons.left = true;
        view.cursor_moved(glm::vec2(6.0, 5.0));
        assert!(view.take_updated());
        assert!(!view.take_updated());

        view.scrolled(1.0);
        view.scrolled_pixels(3.0);
        assert!(view.take_updated());
        assert!(!view.view_updated);
    }

    #[test]
    fn model_matrix_translates_by_zoom() {
        let view = ViewState {
            zoom: -8.5,
            camera_position: glm::vec3(0.1, 1.1, 0.0),
            ..ViewState::default()
        };
        let origin = view.model_matrix() * glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.x, 0.1, epsilon = 1e-5);
        assert_relative_eq!(origin.y, 1.1, epsilon = 1e-5);
        assert_relative_eq!(origin.z, -8.5, epsilon = 1e-5);
    }
}
