//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use facelens_core::model::{ranked, AnalysisResult, Prediction};
use unicode_width::UnicodeWidthStr;

/// Width of the label column.
const LABEL_WIDTH: usize = 24;

/// Width of a full (100%) confidence bar.
const BAR_WIDTH: usize = 30;

/// Print a complete analysis.
pub fn print_analysis(result: &AnalysisResult) {
    print_section("Ancestry", &result.ancestry, "Top Match");
    print_section("Country of Origin", &result.origin, "Top Match");
    print_section("Emotions", &result.emotions, "Dominant Emotion");

    println!("{}", "Description".cyan().bold());
    if result.description.trim().is_empty() {
        println!("  {}", "No description provided.".dimmed());
    } else {
        println!("  {}", result.description.trim());
    }
    println!();
}

/// Print one ranked list with its top entry.
fn print_section<P: Prediction>(title: &str, items: &[P], top_label: &str) {
    println!("{}", title.cyan().bold());

    let sorted = ranked(items);
    if sorted.is_empty() {
        println!("  {}", "No predictions.".dimmed());
        println!();
        return;
    }

    for item in &sorted {
        println!(
            "  {} {} {}",
            pad_right(&truncate_visual(item.label(), LABEL_WIDTH), LABEL_WIDTH),
            bar(item.percentage()),
            format!("{:>5.1}%", item.percentage()).bold()
        );
    }

    let best = sorted[0];
    println!();
    println!(
        "  {}: {} with {:.1}% confidence",
        top_label.bold(),
        best.label(),
        best.percentage()
    );
    println!();
}

/// Render a percentage as a coloured bar.
fn bar(percentage: f64) -> ColoredString {
    let filled = filled_cells(percentage);
    let text = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
    if percentage >= 66.0 {
        text.green()
    } else if percentage >= 33.0 {
        text.yellow()
    } else {
        text.dimmed()
    }
}

fn filled_cells(percentage: f64) -> usize {
    let clamped = percentage.clamp(0.0, 100.0);
    ((clamped / 100.0) * BAR_WIDTH as f64).round() as usize
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_cells() {
        assert_eq!(filled_cells(0.0), 0);
        assert_eq!(filled_cells(50.0), BAR_WIDTH / 2);
        assert_eq!(filled_cells(100.0), BAR_WIDTH);
        assert_eq!(filled_cells(250.0), BAR_WIDTH);
    }

    #[test]
    fn test_truncate_visual() {
        assert_eq!(truncate_visual("Japanese", 24), "Japanese");
        assert_eq!(truncate_visual("Southern Mediterranean", 10), "Southern..");
    }

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("Happy", 8), "Happy   ");
        assert_eq!(pad_right("Surprised", 4), "Surprised");
    }
}
