//! Inline message markup
//!
//! Dialog messages support a small nested markup language:
//! `[bold]`, `[italic]`, `[accent]` and hyperlinks (`[url]…[/url]`,
//! `[link=URL]text[/link]`). Rendering produces an ordered list of styled
//! runs for the host to draw.

pub mod context;
pub mod parser;
pub mod renderer;

pub use context::{FormattingContext, FormattingContextStack, StyleFlag};
pub use parser::{MarkupParser, Token};
pub use renderer::{resolve_link, LinkRun, MarkupRenderer, Run, TextRun};
