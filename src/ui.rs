use colored::Colorize;
use reconcile::{Diagnostic, Diagnostics, Severity};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Print one diagnostic, indented under the resource it belongs to
fn diagnostic(diagnostic: &Diagnostic) {
    let line = if diagnostic.detail.is_empty() {
        diagnostic.summary.clone()
    } else {
        format!("{}: {}", diagnostic.summary, diagnostic.detail.dimmed())
    };
    match diagnostic.severity {
        Severity::Error => eprintln!("    {} {line}", "✗".red()),
        Severity::Warning => eprintln!("    {} {line}", "⚠".yellow()),
    }
}

pub fn diagnostics(diagnostics: &Diagnostics) {
    for d in diagnostics {
        diagnostic(d);
    }
}

/// "1 entry", "3 entries"
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
