use crate::review::EnsureOutcome;
use crate::stack::ChainedItem;
use console::style;
use std::fmt::Display;

/// Centralized output formatting utilities for consistent CLI presentation
pub struct Output;

impl Output {
    /// Print a success message with checkmark
    pub fn success<T: Display>(message: T) {
        println!("{} {}", style("✓").green(), message);
    }

    /// Print a warning message with warning emoji
    pub fn warning<T: Display>(message: T) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    /// Print an info message with info emoji
    pub fn info<T: Display>(message: T) {
        println!("{} {}", style("ℹ").cyan(), message);
    }

    /// Print a sub-item with arrow prefix
    pub fn sub_item<T: Display>(message: T) {
        println!("  {} {}", style("→").dim(), message);
    }

    /// Print a section header
    pub fn section<T: Display>(title: T) {
        println!("\n{}", style(title).bold().underlined());
    }

    /// Print a tip/suggestion
    pub fn tip<T: Display>(message: T) {
        println!("{} {}", style("TIP:").cyan(), style(message).dim());
    }

    /// One line per item: position, enabled flag, branch, upstream, title
    pub fn stack_items(name: &str, chain: &[ChainedItem]) {
        Self::section(format!("Stack '{name}'"));
        if chain.is_empty() {
            Self::info("No items");
            return;
        }

        for chained in chain {
            let state = if chained.item.enabled {
                style("on ").green()
            } else {
                style("off").dim()
            };
            println!(
                "  {:>2}. [{}] {} {} {}",
                style(chained.position).cyan(),
                state,
                chained.item.branch,
                style(format!("(onto {})", chained.upstream)).dim(),
                chained.item.title
            );
        }
    }

    /// Outcome of reconciling one pull request
    pub fn pr_outcome(position: usize, branch: &str, outcome: &EnsureOutcome) {
        let label = match outcome {
            EnsureOutcome::Created { .. } => style("created").green(),
            EnsureOutcome::Updated => style("updated").cyan(),
            EnsureOutcome::Skipped => style("skipped").dim(),
        };
        match outcome {
            EnsureOutcome::Created { url } => {
                println!("  {:>2}. {} {} {}", position, label, branch, style(url).underlined())
            }
            _ => println!("  {:>2}. {} {}", position, label, branch),
        }
    }
}
