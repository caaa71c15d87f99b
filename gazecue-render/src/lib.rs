pub mod images;
pub mod overlay;
pub mod render;
pub mod text;

pub use images::{load_scaled, rgba_to_pixmap};
pub use overlay::debug_lines;
pub use render::{BACKGROUND, FrameStats, Layout, REST_MESSAGE, SkiaRenderer, blit_at, blit_centered};
pub use text::{TextCache, load_font, render_text_pixmap};
