#![allow(clippy::result_large_err)]

use crate::adapter::ChangeLogAdapter;
use crate::errors::Result;
use crate::model::FieldChange;
use crate::render::formatter::Formatter;

/// HTML formatter: entries and listings as `<ul>` lists
///
/// Listing rows link to the given URL when one is supplied. Values are
/// escaped only when `escape_values` is configured; link targets always are.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter {
    escape_values: bool,
}

impl HtmlFormatter {
    pub const NAME: &'static str = "html";

    pub fn new(escape_values: bool) -> Self {
        Self { escape_values }
    }

    fn list_row(&self, adapter: &ChangeLogAdapter, link: &str) -> String {
        let text = self.format_list_entry(adapter);
        if link.is_empty() {
            format!("<li>{}</li>", text)
        } else {
            format!("<li><a href=\"{}\">{}</a></li>", escape_html(link), text)
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

impl Formatter for HtmlFormatter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn escape(&self, text: &str) -> String {
        if self.escape_values {
            escape_html(text)
        } else {
            text.to_string()
        }
    }

    fn format_start(&self) -> String {
        "<ul class=\"changelog-entry\">".to_string()
    }

    fn format_end(&self) -> String {
        "</ul>".to_string()
    }

    fn format_list_start(&self) -> String {
        "<ul class=\"changelog-list\">".to_string()
    }

    fn format_list_end(&self) -> String {
        "</ul>".to_string()
    }

    fn format_insertion(&self, adapter: &ChangeLogAdapter) -> String {
        let text = self.fill(&adapter.templates().insertion, &self.entry_params(adapter));
        format!("<li>{}</li>", text)
    }

    fn format_deletion(&self, adapter: &ChangeLogAdapter) -> String {
        let text = self.fill(&adapter.templates().deletion, &self.entry_params(adapter));
        format!("<li>{}</li>", text)
    }

    fn format_custom_message(&self, adapter: &ChangeLogAdapter) -> Result<String> {
        Ok(format!("<li>{}</li>", self.custom_message_sentence(adapter)?))
    }

    fn format_update_change(&self, adapter: &ChangeLogAdapter, change: &FieldChange) -> String {
        format!("<li>{}</li>", self.change_sentence(adapter, change))
    }

    fn format_list_insertion(&self, adapter: &ChangeLogAdapter, link: &str) -> String {
        self.list_row(adapter, link)
    }

    fn format_list_update(&self, adapter: &ChangeLogAdapter, link: &str) -> String {
        self.list_row(adapter, link)
    }

    fn format_list_deletion(&self, adapter: &ChangeLogAdapter, link: &str) -> String {
        self.list_row(adapter, link)
    }

    fn format_list_custom_message(&self, adapter: &ChangeLogAdapter, link: &str) -> String {
        self.list_row(adapter, link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_escaping_is_opt_in() {
        assert_eq!(HtmlFormatter::new(false).escape("<i>"), "<i>");
        assert_eq!(HtmlFormatter::new(true).escape("<i>"), "&lt;i&gt;");
    }
}
