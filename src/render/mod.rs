//! Response rendering.
//!
//! Turns a `PanelResult` into a [`PanelView`]: the meta review (structured or
//! narrative), one card per personality, and the per-item error list. Output is
//! presentation-neutral [`StyledLine`]s so both the TUI and text mode can use it.

mod markdown;
mod meta;
mod panel;
mod personality;
mod styled;

pub use panel::{PanelView, RenderOptions};
pub use styled::{SpanStyle, StyledLine, Tone};
