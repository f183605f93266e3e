//! Terminal implementation of the core [`Reporter`].
//!
//! Status lines go to stdout, warnings and errors to stderr. Download
//! progress is redrawn in place only when stderr is a terminal.

use std::io::{IsTerminal, Write};
use std::sync::Mutex;

use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};

use cask_core::Reporter;
use cask_schema::{Token, Version};

use super::theme::{Theme, format_progress, format_size};

/// Reporter that prints to the terminal.
#[derive(Debug)]
pub struct Output {
    theme: Theme,
    quiet: bool,
    live: bool,
    /// Last progress percentage drawn, to avoid redrawing every chunk.
    last_progress: Mutex<Option<u64>>,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            live: std::io::stderr().is_terminal(),
            last_progress: Mutex::new(None),
        }
    }

    fn line(&self, icon: &str, color: crossterm::style::Color, token: &Token, version: &Version, detail: &str) {
        let version = if version.is_empty() { "-" } else { version.as_str() };
        println!(
            "  {} {:<20} {:<14} {}",
            icon.with(color),
            token.as_str().with(self.theme.colors.token),
            version.with(self.theme.colors.version),
            detail
        );
    }

    fn clear_progress(&self) {
        let Ok(mut last) = self.last_progress.lock() else {
            return;
        };
        if last.take().is_some() && self.live {
            let mut err = std::io::stderr();
            let _ = queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
            let _ = err.flush();
        }
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!("{}", title.to_uppercase().bold());
    }

    fn downloading(&self, token: &Token, version: &Version, current: u64, total: Option<u64>) {
        if self.quiet || !self.live {
            return;
        }
        let pct = total.filter(|t| *t > 0).map_or(current >> 20, |t| current * 100 / t);
        let Ok(mut last) = self.last_progress.lock() else {
            return;
        };
        if *last == Some(pct) {
            return;
        }
        *last = Some(pct);

        let mut err = std::io::stderr();
        let _ = queue!(err, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(
            err,
            "  {} {} {} {}",
            self.theme.icons.active.with(self.theme.colors.active),
            token.as_str().with(self.theme.colors.token),
            version.as_str().with(self.theme.colors.version),
            format_progress(current, total).with(self.theme.colors.secondary)
        );
        let _ = err.flush();
    }

    fn installing(&self, token: &Token, version: &Version) {
        self.clear_progress();
        if !self.quiet {
            self.line(self.theme.icons.active, self.theme.colors.active, token, version, "installing");
        }
    }

    fn removing(&self, token: &Token, version: &Version) {
        if !self.quiet {
            self.line(self.theme.icons.active, self.theme.colors.active, token, version, "removing");
        }
    }

    fn done(&self, token: &Token, version: &Version, detail: &str, size: Option<u64>) {
        self.clear_progress();
        if self.quiet {
            return;
        }
        let detail = match size {
            Some(bytes) => format!("{detail} {}", format_size(bytes).with(self.theme.colors.secondary)),
            None => detail.to_string(),
        };
        self.line(self.theme.icons.success, self.theme.colors.success, token, version, &detail);
    }

    fn failed(&self, token: &Token, version: &Version, reason: &str) {
        self.clear_progress();
        let version = if version.is_empty() { "-" } else { version.as_str() };
        eprintln!(
            "  {} {:<20} {:<14} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            token.as_str().with(self.theme.colors.token),
            version.with(self.theme.colors.version),
            reason.with(self.theme.colors.error)
        );
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.info.with(self.theme.colors.active));
        }
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", self.theme.icons.success.with(self.theme.colors.success));
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("  {} {msg}", self.theme.icons.warning.with(self.theme.colors.warning));
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        if self.quiet {
            return;
        }
        println!();
        println!(
            "{} {count} {}, elapsed {elapsed_secs:.2}s",
            action.to_uppercase(),
            if count == 1 { "cask" } else { "casks" }
        );
    }
}
