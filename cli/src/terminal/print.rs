use std::fmt::Display;

use colored::*;
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const REPORT_WIDTH: usize = 64;

#[macro_export]
macro_rules! mprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

/// Emits a line verbatim through the logging pipeline so it shares the progress bar's writer.
pub fn print(msg: &str) {
    info!(target: PRINT_TARGET, raw_msg = msg);
}

/// Centres `label` inside a line of `fill` characters spanning the report width.
fn rule(fill: &str, label: Option<ColoredString>) -> String {
    let Some(label) = label else {
        return fill.repeat(REPORT_WIDTH).color(colors::SEPARATOR).to_string();
    };
    let label_width: usize = console::measure_text_width(&label.to_string());
    let remaining: usize = REPORT_WIDTH.saturating_sub(label_width);
    let left: ColoredString = fill.repeat(remaining / 2).color(colors::SEPARATOR);
    let right: ColoredString = fill.repeat(remaining - remaining / 2).color(colors::SEPARATOR);
    format!("{left}{label}{right}")
}

pub fn banner(quiet: u8) {
    if quiet > 0 {
        return;
    }
    let title: ColoredString = format!(" sweepr {} ", env!("CARGO_PKG_VERSION"))
        .bright_green()
        .bold();
    print(&rule("═", Some(title)));
}

pub fn header(msg: &str, quiet: u8) {
    if quiet > 0 {
        return;
    }
    let label: ColoredString = format!("[ {} ]", msg.to_uppercase()).bright_green();
    print(&rule("─", Some(label)));
}

pub fn fat_separator() {
    print(&rule("═", None));
}

/// `key....: value`, with the dots padding `key` out to `key_width`.
pub fn aligned_line(key: &str, key_width: usize, value: impl Display) {
    let pad: String = ".".repeat(key_width.saturating_sub(key.len()) + 1);
    print(&format!(
        "{} {}{}{} {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::PRIMARY),
        pad.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR),
        value.to_string().color(colors::TEXT_DEFAULT)
    ));
}

pub fn tree_head(idx: usize, name: &str, detail: Option<&str>) {
    let mut line: String = format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        idx.to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    );
    if let Some(detail) = detail {
        line += &format!(" ({})", detail.color(colors::HOSTNAME));
    }
    print(&line);
}

/// Prints `key: value` rows as the branches of one tree level.
pub fn as_tree_one_level(rows: Vec<(String, ColoredString)>) {
    let widest: usize = rows
        .iter()
        .map(|(key, _)| UnicodeWidthStr::width(key.as_str()))
        .max()
        .unwrap_or(0);

    let last: usize = rows.len().saturating_sub(1);
    for (i, (key, value)) in rows.iter().enumerate() {
        let branch: &str = if i == last { "└─" } else { "├─" };
        let pad: String = ".".repeat(widest - UnicodeWidthStr::width(key.as_str()) + 1);
        print(&format!(
            " {} {}{}{} {}",
            branch.color(colors::SEPARATOR),
            key.color(colors::TEXT_DEFAULT),
            pad.color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        ));
    }
}

pub fn centerln(msg: &str) {
    let indent: usize = REPORT_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2;
    print(&format!("{}{msg}", " ".repeat(indent)));
}

pub fn no_results() {
    let boxed = |s: &str| format!("│{s:^width$}│", width = REPORT_WIDTH - 2);
    let edge: String = "─".repeat(REPORT_WIDTH - 2);
    print(&format!("┌{edge}┐").color(colors::SEPARATOR).to_string());
    print(&boxed("no open ports found").red().bold().to_string());
    print(&boxed("try a wider port list or a longer timeout").to_string());
    print(&format!("└{edge}┘").color(colors::SEPARATOR).to_string());
}
