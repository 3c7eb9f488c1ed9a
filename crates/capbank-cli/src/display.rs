//! Display utilities for the CLI

use capbank_types::{Amount, BankError, BankEvent, EventRecord};
use colored::*;

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print a rejected operation with its error kind
pub fn rejected(err: &BankError) {
    println!(
        "  {} {} {}",
        "✗".bright_red(),
        format!("[{}]", err.kind()).bright_red().bold(),
        err.to_string().bright_red()
    );
}

pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

/// Whole-unit rendering of an amount
pub fn units(amount: Amount) -> String {
    format!("{} units", amount)
}

/// One line per journaled event
pub fn event(record: &EventRecord) {
    let (label, sign) = match &record.event {
        BankEvent::Deposit { .. } => ("deposit".bright_green(), "+"),
        BankEvent::Withdrawal { .. } => ("withdrawal".bright_yellow(), "-"),
    };
    println!(
        "  {:>6}  {}  {:<10}  {:<16} {}{}",
        format!("#{}", record.sequence).bright_black(),
        record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
        label,
        record.event.account().to_string().bright_white(),
        sign,
        units(record.event.amount()).bright_cyan()
    );
}
