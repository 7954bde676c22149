//! Terminal output utilities: notes, ANSI styling, and audit result tables.

use skyaudit_orchestrator::{EvaluationOutcome, LinkEvaluation, ReportSummary, SiteCheck};

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

fn paint(s: &str, style: &str) -> String {
    if supports_color() {
        format!("{style}{s}{RESET}")
    } else {
        s.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

pub struct Column {
    pub header: String,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into(), max_width: None }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width.max(2));
        self
    }
}

/// Render a left-aligned table. Cells longer than their column's
/// `max_width` are cut and end in `…`.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let cell = |row: &Vec<String>, i: usize| -> String {
        let raw = row.get(i).map(String::as_str).unwrap_or("");
        match columns[i].max_width {
            Some(max) => truncate(raw, max),
            None => raw.to_string(),
        }
    };

    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(visible_width(&cell(row, i)));
        }
    }

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| pad(&col.header, *w))
        .collect();
    out.push_str(&format!("  {}\n", paint(&header.join("  "), BOLD)));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..columns.len())
            .map(|i| pad(&cell(row, i), widths[i]))
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ").trim_end()));
    }
    out
}

fn pad(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(s));
    format!("{s}{}", " ".repeat(padding))
}

/// Cut plain text to `max` visible characters.
fn truncate(s: &str, max: usize) -> String {
    if s.contains('\x1b') || s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max - 1).collect();
    format!("{kept}…")
}

// ---------------------------------------------------------------------------
// Audit output
// ---------------------------------------------------------------------------

pub fn print_site_check(check: &SiteCheck) {
    if check.has_widget {
        note_success(&format!("Accessibility widget found on {}", check.url));
    } else {
        note_warn(&format!("No accessibility widget found on {}", check.url));
    }
    println!("  {}", paint(&check.reasoning, DIM));

    if !check.links.is_empty() {
        println!("\nLinks to evaluate ({}):", check.links.len());
        for link in &check.links {
            println!("  - {link}");
        }
    }
}

/// Results table: one row per link with compliance, passed and issues.
pub fn render_evaluations(evaluations: &[LinkEvaluation]) -> String {
    let columns = [
        Column::new("Link").max_width(60),
        Column::new("Compliance"),
        Column::new("Passed").max_width(50),
        Column::new("Issues").max_width(50),
    ];
    let rows: Vec<Vec<String>> = evaluations
        .iter()
        .map(|e| match &e.outcome {
            EvaluationOutcome::Evaluated(evaluation) => vec![
                e.url.clone(),
                if evaluation.compliance {
                    paint("compliant", GREEN)
                } else {
                    paint("non-compliant", RED)
                },
                evaluation.passed.join("; "),
                evaluation.issues.join("; "),
            ],
            EvaluationOutcome::Failed(reason) => vec![
                e.url.clone(),
                paint("failed", YELLOW),
                String::new(),
                reason.clone(),
            ],
        })
        .collect();
    render_table(&columns, &rows)
}

pub fn print_summary(summary: &ReportSummary) {
    println!(
        "\n{} links: {} compliant, {} non-compliant, {} failed",
        summary.total, summary.compliant, summary.non_compliant, summary.failed
    );
}
