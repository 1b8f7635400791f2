//! Undo command implementation

use std::path::Path;

use colored::Colorize;

use fragment_core::{Trash, UndoRecipe};
use fragment_fs::ConfigStore;

use crate::error::{CliError, Result};

/// Replay the recipe stored in `recipe_file` against the same-directory trash.
pub fn run_undo(recipe_file: &Path) -> Result<()> {
    let recipe: UndoRecipe = ConfigStore::new().load(recipe_file)?;
    if recipe.is_empty() {
        return Err(CliError::user(format!(
            "Undo recipe {} has no steps",
            recipe_file.display()
        )));
    }

    recipe.rollback(&Trash::new())?;

    println!("{} Rolled back {} step(s):", "OK".green().bold(), recipe.steps().len());
    for step in recipe.steps().iter().rev() {
        println!("   {} {}", "-".dimmed(), step);
    }
    Ok(())
}
