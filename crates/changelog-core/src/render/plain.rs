use crate::render::formatter::Formatter;

/// Plain text formatter, the default
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl PlainFormatter {
    pub const NAME: &'static str = "plain";
}

impl Formatter for PlainFormatter {
    fn name(&self) -> &'static str {
        Self::NAME
    }
}
