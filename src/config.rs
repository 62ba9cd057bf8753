/// How many simultaneous camera viewports the frame is split into.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SplitscreenMode {
    #[default]
    None,
    TwoPlayer,
    FourPlayer,
}

impl SplitscreenMode {
    pub fn viewport_count(self) -> usize {
        match self {
            SplitscreenMode::None => 1,
            SplitscreenMode::TwoPlayer => 2,
            SplitscreenMode::FourPlayer => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub splitscreen_mode: SplitscreenMode,
    /// Number of rotating frame regions (frames in flight).
    pub frame_overlap: usize,
    /// Fixed per-pass instance capacity; overflowing passes are truncated.
    pub max_instances_per_pass: usize,
    /// Fixed per-pass draw command capacity.
    pub max_draw_commands_per_pass: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            splitscreen_mode: SplitscreenMode::None,
            frame_overlap: 2,
            max_instances_per_pass: 16_384,
            max_draw_commands_per_pass: 4_096,
        }
    }
}
