pub mod log;
pub mod message;
pub mod migrate;
pub mod show;

use changelog_core::ChangeLogAdapter;

/// `#<id> [<user>] <listing row>`
pub(crate) fn summary_line(adapter: &ChangeLogAdapter) -> String {
    format!(
        "#{} [{}] {}",
        adapter.entry().id().unwrap_or_default(),
        adapter.render_username(),
        adapter.render_list("")
    )
}

/// Full rendering, indented under a summary line
pub(crate) fn detail_lines(adapter: &ChangeLogAdapter) -> Vec<String> {
    adapter
        .to_string()
        .lines()
        .map(|line| format!("    {}", line))
        .collect()
}
