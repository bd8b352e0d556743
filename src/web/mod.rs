//! HTML presentation and HTTP routing
//!
//! Pages are rendered into a [`StringBuilder`] whose low-space callback
//! flushes the buffer as one HTTP chunk, so pages larger than the buffer
//! stream without per-byte send overhead. [`HtmlWriter`] emits the
//! structured fragments, [`ActionGate`] makes state-changing GET links
//! idempotent, and [`Router`]/[`Menu`] own dispatch.

pub mod actions;
pub mod chunked;
pub mod html;
pub mod navigation;
pub mod router;
pub mod string_builder;

pub use actions::ActionGate;
pub use chunked::ChunkedWriter;
pub use html::HtmlWriter;
pub use navigation::{Menu, MenuItem};
pub use router::{HttpRequest, Method, Router};
pub use string_builder::StringBuilder;
