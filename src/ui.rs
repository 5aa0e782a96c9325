//! Terminal rendering and input for the turn loop.
//!
//! Two styles are supported. Fancy output draws boxed replies, colored status
//! lines and a `[YOUR TURN]` marker. Plain output prints bare text so another
//! program can drive the session over stdin/stdout.
//!
//! Stdin is read on a background thread that feeds a channel. The Ctrl-C
//! handler posts to the same channel, so an interrupt at the prompt ends input
//! the same way end-of-file does and the command still finishes normally.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use colored::Colorize;
use tracing::debug;

use crate::mirror::{DiffReport, render};
use crate::turn::TurnIo;
use crate::{Error, Result};

/// Set while the process is blocked on a human input line.
static AWAITING_INPUT: AtomicBool = AtomicBool::new(false);

/// Set by the first interrupt received while an agent turn is running.
static TURN_INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Sender half of the console input channel, once stdin is being read.
static INPUT_EVENTS: Mutex<Option<Sender<InputEvent>>> = Mutex::new(None);

/// Install the Ctrl-C handler.
///
/// At the input prompt an interrupt ends input, as if stdin had closed.
/// During an agent turn the first interrupt only warns and the second exits
/// with status 130, leaving the agent process to finish on its own.
pub fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        if AWAITING_INPUT.load(Ordering::SeqCst) {
            eprintln!();
            let events = INPUT_EVENTS.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(tx) = events.as_ref() {
                let _ = tx.send(InputEvent::Interrupt);
                return;
            }
            std::process::exit(0);
        }
        if TURN_INTERRUPTED.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted. The agent process may still be running.");
            std::process::exit(130);
        }
        eprintln!(
            "\nAn agent turn is in progress. Press Ctrl-C again to exit without waiting for it."
        );
    })
    .map_err(|e| Error::Other(format!("failed to set Ctrl-C handler: {}", e)))
}

/// One event on the console input channel.
#[derive(Debug)]
pub(crate) enum InputEvent {
    Line(String),
    Eof,
    Failed(std::io::Error),
    Interrupt,
}

/// Lines typed by the human, in order, ending at end-of-file or an interrupt.
#[derive(Debug)]
pub(crate) struct LineSource {
    rx: Receiver<InputEvent>,
    closed: bool,
    interrupted: bool,
}

impl LineSource {
    pub(crate) fn new(rx: Receiver<InputEvent>) -> Self {
        Self {
            rx,
            closed: false,
            interrupted: false,
        }
    }

    /// Start reading stdin on a background thread.
    fn stdin() -> Self {
        let (tx, rx) = mpsc::channel();
        *INPUT_EVENTS.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx.clone());
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut lock = stdin.lock();
            loop {
                let mut line = String::new();
                let event = match lock.read_line(&mut line) {
                    Ok(0) => InputEvent::Eof,
                    Ok(_) => InputEvent::Line(line),
                    Err(e) => InputEvent::Failed(e),
                };
                let last = !matches!(event, InputEvent::Line(_));
                if tx.send(event).is_err() || last {
                    break;
                }
            }
        });
        Self::new(rx)
    }

    /// Block for the next line. `None` once input has ended.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(InputEvent::Line(line)) => Ok(Some(line.trim().to_string())),
            Ok(InputEvent::Failed(e)) => {
                self.closed = true;
                Err(e.into())
            }
            Ok(InputEvent::Interrupt) => {
                debug!("input interrupted");
                self.closed = true;
                self.interrupted = true;
                Ok(None)
            }
            Ok(InputEvent::Eof) | Err(_) => {
                self.closed = true;
                Ok(None)
            }
        }
    }
}

/// How replies and prompts are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStyle {
    Fancy,
    Plain,
}

impl OutputStyle {
    pub fn from_plain_flag(plain: bool) -> Self {
        if plain {
            OutputStyle::Plain
        } else {
            OutputStyle::Fancy
        }
    }
}

/// Whether ANSI colors should be emitted for `style` on stdout.
///
/// `colored` decides for fancy output from `NO_COLOR`, `CLICOLOR` and
/// whether stdout is a terminal.
pub fn use_color(style: OutputStyle) -> bool {
    style == OutputStyle::Fancy && colored::control::SHOULD_COLORIZE.should_colorize()
}

fn term_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(80)
        .clamp(40, 100)
}

/// Greedy word wrap that keeps blank lines and never splits long words.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let indent: String = paragraph.chars().take_while(|c| c.is_whitespace()).collect();
        let mut current = indent.clone();
        for word in paragraph.split_whitespace() {
            let current_len = current.chars().count();
            if current_len > indent.len() && current_len + 1 + word.chars().count() > width {
                lines.push(std::mem::replace(&mut current, indent.clone()));
            }
            if current.chars().count() > indent.len() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Draw `text` inside a titled box of total width `width`.
pub fn render_box(title: &str, text: &str, width: usize, color: bool) -> String {
    let frame = |piece: &str| {
        if color {
            piece.cyan().to_string()
        } else {
            piece.to_string()
        }
    };
    let inner = width - 2;
    let content_width = width - 4;
    let border = format!("+{}+", "-".repeat(inner));

    let mut out = String::new();
    out.push_str(&format!("{}\n", frame(&border)));
    let title = format!(" {} ", title);
    out.push_str(&format!("{}\n", frame(&format!("|{:<inner$}|", title, inner = inner))));
    out.push_str(&format!("{}\n", frame(&format!("|{}|", " ".repeat(inner)))));
    for line in wrap_text(text.trim(), content_width) {
        let pad = content_width.saturating_sub(line.chars().count());
        out.push_str(&format!(
            "{}{}{}{}\n",
            frame("| "),
            line,
            " ".repeat(pad),
            frame(" |")
        ));
    }
    out.push_str(&format!("{}\n", frame(&border)));
    out
}

/// Console implementation of [`TurnIo`] over stdin/stdout.
#[derive(Debug)]
pub struct ConsoleIo {
    style: OutputStyle,
    color: bool,
    input: Option<LineSource>,
}

impl ConsoleIo {
    pub fn new(style: OutputStyle) -> Self {
        Self {
            style,
            color: use_color(style),
            input: None,
        }
    }

    pub fn style(&self) -> OutputStyle {
        self.style
    }

    pub fn color(&self) -> bool {
        self.color
    }
}

impl TurnIo for ConsoleIo {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = std::io::stdout();
        match self.style {
            OutputStyle::Fancy => {
                let marker = if self.color {
                    "[YOUR TURN]".green()
                } else {
                    "[YOUR TURN]".normal()
                };
                writeln!(stdout, "{} {}", marker, prompt)?;
                write!(stdout, "\u{203a} ")?;
            }
            OutputStyle::Plain => {
                if !prompt.is_empty() {
                    writeln!(stdout, "{}", prompt)?;
                }
            }
        }
        stdout.flush()?;

        let input = self.input.get_or_insert_with(LineSource::stdin);
        TURN_INTERRUPTED.store(false, Ordering::SeqCst);
        AWAITING_INPUT.store(true, Ordering::SeqCst);
        let line = input.next_line();
        AWAITING_INPUT.store(false, Ordering::SeqCst);
        line
    }

    fn status(&mut self, message: &str) {
        match self.style {
            OutputStyle::Fancy if self.color => println!("{} {}", "[WORKING]".yellow(), message),
            OutputStyle::Fancy => println!("[WORKING] {}", message),
            OutputStyle::Plain => println!("{}", message),
        }
    }

    fn reply(&mut self, title: &str, text: &str) {
        match self.style {
            OutputStyle::Fancy => print!("{}", render_box(title, text, term_width(), self.color)),
            OutputStyle::Plain => println!("{}", text),
        }
    }

    fn changes(&mut self, report: &DiffReport, before: &Path, after: &Path) -> Result<()> {
        print!("{}", render(report, before, after, self.color)?);
        Ok(())
    }

    fn interrupted(&self) -> bool {
        self.input.as_ref().is_some_and(|input| input.interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let lines = wrap_text("one two three four five six", 10);
        assert_eq!(lines, vec!["one two", "three four", "five six"]);
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines_and_long_words() {
        let lines = wrap_text("first\n\nsupercalifragilistic word", 8);
        assert_eq!(lines, vec!["first", "", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_wrap_text_keeps_list_indent() {
        let lines = wrap_text("  - a b c d", 7);
        assert_eq!(lines, vec!["  - a b", "  c d"]);
    }

    #[test]
    fn test_render_box_plain() {
        let rendered = render_box("ANSWER", "hello world", 40, false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.chars().count() == 40));
        assert!(lines[1].starts_with("| ANSWER "));
        assert!(lines[3].starts_with("| hello world"));
    }

    #[test]
    fn test_render_box_color_wraps_frame_only() {
        colored::control::set_override(true);
        let rendered = render_box("T", "body", 40, true);
        assert!(rendered.contains(&"| ".cyan().to_string()));
        assert!(rendered.contains(&format!("{}body", "| ".cyan())));
        assert!(!rendered.contains(&"body".cyan().to_string()));
    }

    #[test]
    fn test_line_source_ends_at_interrupt() {
        let (tx, rx) = mpsc::channel();
        let mut source = LineSource::new(rx);
        tx.send(InputEvent::Line("  first answer \n".to_string())).unwrap();
        tx.send(InputEvent::Interrupt).unwrap();
        tx.send(InputEvent::Line("never read\n".to_string())).unwrap();

        assert_eq!(source.next_line().unwrap().as_deref(), Some("first answer"));
        assert!(!source.interrupted);
        assert_eq!(source.next_line().unwrap(), None);
        assert_eq!(source.next_line().unwrap(), None);
        assert!(source.interrupted);
    }

    #[test]
    fn test_line_source_ends_at_eof_and_surfaces_errors() {
        let (tx, rx) = mpsc::channel();
        let mut source = LineSource::new(rx);
        tx.send(InputEvent::Eof).unwrap();
        assert_eq!(source.next_line().unwrap(), None);
        assert!(!source.interrupted);

        let (tx, rx) = mpsc::channel();
        let mut source = LineSource::new(rx);
        tx.send(InputEvent::Failed(std::io::Error::other("tty gone"))).unwrap();
        assert_eq!(source.next_line().unwrap_err().category(), "filesystem");
        assert_eq!(source.next_line().unwrap(), None);

        let (tx, rx) = mpsc::channel::<InputEvent>();
        let mut source = LineSource::new(rx);
        drop(tx);
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn test_output_style_from_flag() {
        assert_eq!(OutputStyle::from_plain_flag(true), OutputStyle::Plain);
        assert_eq!(OutputStyle::from_plain_flag(false), OutputStyle::Fancy);
        assert!(!use_color(OutputStyle::Plain));
    }
}
