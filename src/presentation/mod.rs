//! Presentation layer: one view model, several renderers.

pub mod render;
pub mod view;

pub use render::{MarkdownRenderer, PlainTextRenderer, Renderer, renderer_for};
pub use view::{Badge, BadgeTone, NetworkBanner, PrimaryAction, ViewModel};
