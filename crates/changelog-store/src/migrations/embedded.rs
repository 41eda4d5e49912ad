//! SQL compiled into the binary, one entry per schema step

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// Every migration, oldest first
pub fn get_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_change_log_entries",
        sql: include_str!("../../migrations/001_change_log_entries.sql"),
    }]
}
