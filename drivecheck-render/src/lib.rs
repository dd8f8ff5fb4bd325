//! Software renderer for the assessment screens.
//!
//! Draws into an RGBA8 frame buffer using shapes and seven-segment digits
//! only, so no font assets are needed.

mod digits;
mod palette;
pub mod render;
pub mod scene;

pub use render::{FrameStats, Renderer, SCENE_HEIGHT, SCENE_WIDTH, SkiaRenderer};
pub use scene::Scene;
