pub mod canvas;
pub mod overlay;
pub mod skeleton;
#[cfg(feature = "desktop")]
pub mod window;

pub use canvas::FrameBuffer;
pub use overlay::{DrawMode, Marker, RenderReport, SelectiveRenderer};
pub use skeleton::POSE_CONNECTIONS;
#[cfg(feature = "desktop")]
pub use window::MinifbRenderer;
