use lenslab_core::overlay::renderer::{DisplayMode, RenderOptions};

/// User-toggleable demo state. Held in memory only and mutated by explicit
/// user action; every launch starts from the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub detection_enabled: bool,
    pub display_mode: DisplayMode,
    pub show_details: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detection_enabled: true,
            display_mode: DisplayMode::Landmarks,
            show_details: true,
        }
    }
}

impl Settings {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            mode: self.display_mode,
            show_details: self.show_details,
        }
    }
}
