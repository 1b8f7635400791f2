//! Check and fix command implementations

use colored::Colorize;
use serde::Serialize;

use fragment_core::{Evaluation, FragmentController, Phase, Status, TransactionId};
use fragment_fs::ConfigStore;

use super::request::build_request;
use crate::cli::PhaseArgs;
use crate::error::Result;

/// JSON shape of a check or fix run
#[derive(Debug, Serialize)]
struct PhaseOutput<'a> {
    transaction: &'a str,
    phase: Phase,
    #[serde(flatten)]
    evaluation: &'a Evaluation,
}

/// Run one phase of the fragment transaction.
pub fn run_phase(args: &PhaseArgs, phase: Phase) -> Result<()> {
    let request = build_request(&args.request)?;
    let txn = match &args.txn {
        Some(id) => id.parse::<TransactionId>()?,
        None => TransactionId::generate(),
    };

    let evaluation = FragmentController::new().evaluate(&request, phase, &txn)?;

    if let (Some(file), Some(recipe)) = (&args.undo_out, &evaluation.undo) {
        ConfigStore::new().save(file, recipe)?;
        tracing::debug!(file = %file.display(), "Undo recipe written");
    }

    if args.json {
        let output = PhaseOutput {
            transaction: txn.as_str(),
            phase,
            evaluation: &evaluation,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_evaluation(&request.path.display().to_string(), &txn, &evaluation);
    if let (Some(file), true) = (&args.undo_out, evaluation.undo.is_some()) {
        println!("Undo recipe written to {}", file.display().to_string().cyan());
    }
    Ok(())
}

fn print_evaluation(path: &str, txn: &TransactionId, evaluation: &Evaluation) {
    match evaluation.status {
        Status::AlreadyCorrect => {
            println!("{} {}: {}", "OK".green().bold(), path.cyan(), evaluation.message);
        }
        Status::Pending => {
            println!("{} {}: {}", "PENDING".yellow().bold(), path.cyan(), evaluation.message);
            if let Some(diff) = &evaluation.diff {
                println!();
                for line in diff.lines() {
                    if line.starts_with("+++") || line.starts_with("---") {
                        println!("{}", line.bold());
                    } else if line.starts_with('+') {
                        println!("{}", line.green());
                    } else if line.starts_with('-') {
                        println!("{}", line.red());
                    } else if line.starts_with("@@") {
                        println!("{}", line.cyan());
                    } else {
                        println!("{line}");
                    }
                }
            }
            println!();
            println!("Transaction: {}", txn.as_str().cyan());
            // The undo recipe below is only valid for a fix run under this id.
            println!(
                "Apply with {} and the same request options.",
                format!("fragment fix --txn {txn}").cyan()
            );
        }
        Status::Applied => {
            println!("{} {}: {}", "FIXED".green().bold(), path.cyan(), evaluation.message);
            if let Some(backup) = &evaluation.backup {
                println!("   {} original kept at {}", "-".dimmed(), backup.display());
            }
            println!("Transaction: {}", txn.as_str().cyan());
        }
    }

    if let Some(recipe) = &evaluation.undo {
        println!("Undo:");
        for step in recipe.steps() {
            println!("   {} {}", "-".dimmed(), step);
        }
    }

    for warning in &evaluation.warnings {
        println!("{}: {}", "warning".yellow().bold(), warning);
    }
}
