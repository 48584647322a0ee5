//! Terminal output helpers: a small trimmed slice of the teacher's styling
//! toolkit (TTY detection, `NO_COLOR`, colored status lines) scaled to this
//! binary's three commands — no tables, progress bars or JSON mode, since
//! nothing here produces tabular or machine-consumed output.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

fn colors_enabled() -> bool {
    std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
}

pub fn header(text: &str) {
    if colors_enabled() {
        println!("{} {}", "libretto".cyan().bold(), text.dimmed());
    } else {
        println!("libretto {text}");
    }
}

pub fn success(text: &str) {
    if colors_enabled() {
        println!("{} {text}", "✓".green());
    } else {
        println!("[ok] {text}");
    }
}

pub fn info(text: &str) {
    if colors_enabled() {
        println!("{} {text}", "i".blue());
    } else {
        println!("[info] {text}");
    }
}

pub fn warning(text: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "!".yellow(), text.yellow());
    } else {
        eprintln!("[warn] {text}");
    }
}

pub fn error(text: &str) {
    if colors_enabled() {
        eprintln!("{} {}", "x".red(), text.red());
    } else {
        eprintln!("[error] {text}");
    }
}
