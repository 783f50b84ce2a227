//! What the user sees while a crawl runs.
//!
//! Every line starts with a short colored tag. Colors are used only when
//! stdout is a terminal and `NO_COLOR` is unset. The same condition decides
//! whether per-chapter progress rewrites one line or prints one line each.
//! Diagnostics go through `tracing`.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// Tag colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Heading,
    Busy,
    Good,
    Caution,
    Bad,
    Quiet,
}

impl Tone {
    fn sgr(self) -> &'static str {
        match self {
            Tone::Heading => "1;35",
            Tone::Busy => "1;36",
            Tone::Good => "1;32",
            Tone::Caution => "1;33",
            Tone::Bad => "1;31",
            Tone::Quiet => "90",
        }
    }
}

/// Terminal front end for the crawler and the CLI.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    interactive: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Detects whether stdout is an interactive, color-capable terminal.
    pub fn new() -> Self {
        Self {
            interactive: io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// A console that never colors and never rewrites lines.
    pub fn plain() -> Self {
        Self { interactive: false }
    }

    fn paint(&self, tone: Tone, text: &str) -> String {
        if self.interactive {
            format!("\x1b[{}m{text}\x1b[0m", tone.sgr())
        } else {
            text.to_string()
        }
    }

    fn line(&self, tone: Tone, tag: &str, message: impl Display) -> String {
        format!("{} {message}", self.paint(tone, tag))
    }

    pub fn heading(&self, text: &str) {
        println!("\n{}", self.paint(Tone::Heading, text));
    }

    pub fn notice(&self, message: impl Display) {
        println!("{}", self.line(Tone::Busy, "::", message));
    }

    pub fn done(&self, message: impl Display) {
        println!("{}", self.line(Tone::Good, "ok", message));
    }

    pub fn caution(&self, message: impl Display) {
        println!("{}", self.line(Tone::Caution, "!!", message));
    }

    pub fn fail(&self, message: impl Display) {
        eprintln!("{}", self.line(Tone::Bad, "xx", message));
    }

    /// Lists the site ids a user can pick from.
    pub fn site_list<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        self.notice("Supported sites:");
        for id in ids {
            println!("   {} {id}", self.paint(Tone::Quiet, "-"));
        }
    }

    pub fn searching(&self, query: &str) {
        self.notice(format_args!("Searching for \"{query}\""));
    }

    /// Reports the hit the crawl will follow, and how many were passed over.
    pub fn found_novel(&self, title: &str, hit_count: usize) {
        self.done(found_novel_message(title, hit_count));
    }

    pub fn found_chapters(&self, count: usize) {
        self.done(format_args!("{count} chapters listed"));
    }

    /// Shows which chapter is being downloaded.
    pub fn chapter_progress(&self, position: usize, total: usize, title: &str) {
        let message = self.line(Tone::Busy, "..", chapter_label(position, total, title));
        if self.interactive {
            print!("\r\x1b[2K{message}");
            let _ = io::stdout().flush();
        } else {
            println!("{message}");
        }
    }

    pub fn chapter_skipped(&self, position: usize, total: usize, title: &str, reason: impl Display) {
        self.end_progress();
        self.caution(format_args!(
            "skipped {}: {reason}",
            chapter_label(position, total, title)
        ));
    }

    /// Ends a rewritten progress line so the next output starts clean.
    pub fn end_progress(&self) {
        if self.interactive {
            print!("\r\x1b[2K");
            let _ = io::stdout().flush();
        }
    }

    /// Asks a question and returns the trimmed answer.
    pub fn prompt(&self, question: &str) -> io::Result<String> {
        print!("{} {question} ", self.paint(Tone::Busy, "??"));
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

fn chapter_label(position: usize, total: usize, title: &str) -> String {
    format!("[{position}/{total}] {title}")
}

fn found_novel_message(title: &str, hit_count: usize) -> String {
    match hit_count {
        0 | 1 => format!("Found \"{title}\""),
        n => format!("Found \"{title}\" (first of {n} results)"),
    }
}
