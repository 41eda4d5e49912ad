//! Rendering of log entries into human readable text.
//!
//! A [`Formatter`] decides the markup; [`Templates`] hold the sentences with
//! `%name%` placeholders; [`FieldHooks`] and a [`ForeignValueResolver`]
//! rewrite individual field values before they are substituted.

pub mod field;
pub mod formatter;
pub mod html;
pub mod plain;
pub mod template;

pub use field::{FieldHooks, FieldRenderContext, ForeignValueResolver, StoreDisplayResolver};
pub use formatter::{Formatter, FormatterConstructor, FormatterFactory};
pub use html::HtmlFormatter;
pub use plain::PlainFormatter;
pub use template::{substitute, Templates};
