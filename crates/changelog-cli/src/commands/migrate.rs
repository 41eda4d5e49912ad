//! Migrate command
//!
//! Usage: changelog migrate [--db <PATH>]

use crate::context::{CliResult, GlobalArgs};
use changelog_store::migrations::applied_migrations;

pub fn execute(global: &GlobalArgs) -> CliResult {
    let repo = global.open_repo()?;
    let applied = applied_migrations(repo.connection())?;

    println!("Database ready: {}", global.db.display());
    for migration in applied {
        println!("  {}", migration);
    }
    Ok(())
}
