//! Terminal adapter
//!
//! Decides whether a spinner is talking to a live terminal or to redirected
//! output, and owns every byte written to the sink: cursor visibility, line
//! clearing, and ANSI stripping for non-interactive output.

pub mod ansi;
pub mod style;

use crossterm::cursor::{Hide, Show};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use std::fmt;
use std::io::{self, IsTerminal, Write};
use tracing::trace;

pub use ansi::{has_styling, strip_styling};
pub use style::{ColorSettings, Palette, Style};

type TerminalCheck = Box<dyn Fn() -> bool + Send>;

enum Target {
    Stdout,
    Stderr,
    Custom {
        writer: Box<dyn Write + Send>,
        terminal: TerminalCheck,
    },
}

/// Output stream a spinner writes to
pub struct Sink {
    target: Target,
}

impl Sink {
    /// Standard output (the default)
    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
        }
    }

    /// Standard error
    pub fn stderr() -> Self {
        Self {
            target: Target::Stderr,
        }
    }

    /// Any writer. It is treated as redirected output: no animation and no
    /// styling.
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self::with_terminal_check(writer, || false)
    }

    /// A writer known to be attached to a terminal, e.g. a pseudo-terminal
    /// master.
    pub fn terminal(writer: impl Write + Send + 'static) -> Self {
        Self::with_terminal_check(writer, || true)
    }

    /// A writer whose terminal status is decided by `check`, asked every
    /// time the spinner needs to know (e.g. a pseudo-terminal that can be
    /// detached).
    pub fn with_terminal_check(
        writer: impl Write + Send + 'static,
        check: impl Fn() -> bool + Send + 'static,
    ) -> Self {
        Self {
            target: Target::Custom {
                writer: Box::new(writer),
                terminal: Box::new(check),
            },
        }
    }

    /// Whether the sink is a character-device terminal.
    ///
    /// For stdout/stderr this asks the OS each time. A handle whose status
    /// cannot be determined counts as redirected.
    pub fn is_terminal(&self) -> bool {
        match &self.target {
            Target::Stdout => io::stdout().is_terminal(),
            Target::Stderr => io::stderr().is_terminal(),
            Target::Custom { terminal, .. } => terminal(),
        }
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match &self.target {
            Target::Stdout => "stdout",
            Target::Stderr => "stderr",
            Target::Custom { .. } => "writer",
        };
        f.debug_tuple("Sink").field(&name).finish()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.target {
            Target::Stdout => io::stdout().write(buf),
            Target::Stderr => io::stderr().write(buf),
            Target::Custom { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Stdout => io::stdout().flush(),
            Target::Stderr => io::stderr().flush(),
            Target::Custom { writer, .. } => writer.flush(),
        }
    }
}

/// A sink plus the interactivity decision made for it.
///
/// All writes are best-effort: failures are logged at trace level and
/// otherwise ignored.
#[derive(Debug)]
pub struct Terminal {
    sink: Sink,
    interactive: bool,
}

impl Terminal {
    /// `force_plain` is the non-interactive override; when set the sink is
    /// never treated as interactive.
    pub fn new(sink: Sink, force_plain: bool) -> Self {
        let interactive = !force_plain && sink.is_terminal();
        Self { sink, interactive }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Ask the sink again whether it is a terminal
    pub fn recheck(&self) -> bool {
        self.sink.is_terminal()
    }

    /// Fall back to plain output for the rest of this terminal's life
    pub fn demote(&mut self) {
        self.interactive = false;
    }

    pub fn hide_cursor(&mut self) {
        if self.interactive {
            let result = queue!(self.sink, Hide);
            self.finish(result);
        }
    }

    pub fn show_cursor(&mut self) {
        if self.interactive {
            let result = queue!(self.sink, Show);
            self.finish(result);
        }
    }

    /// Return to column zero and erase to the end of the line
    pub fn clear_line(&mut self) {
        if self.interactive {
            let result = queue!(self.sink, Print("\r"), Clear(ClearType::UntilNewLine));
            self.finish(result);
        }
    }

    /// Replace the current line with `line` (no newline). On redirected
    /// output the line is written stripped and newline-terminated instead.
    pub fn redraw(&mut self, line: &str) {
        if !self.interactive {
            self.write_line(line);
            return;
        }
        let result = queue!(
            self.sink,
            Print("\r"),
            Clear(ClearType::UntilNewLine),
            Print(line)
        );
        self.finish(result);
    }

    /// Write `line` followed by a newline
    pub fn write_line(&mut self, line: &str) {
        let result = if self.interactive {
            writeln!(self.sink, "{}", line)
        } else {
            writeln!(self.sink, "{}", strip_styling(line))
        };
        self.finish(result);
    }

    fn finish(&mut self, result: io::Result<()>) {
        if let Err(err) = result.and_then(|_| self.sink.flush()) {
            trace!(error = %err, sink = ?self.sink, "terminal write failed");
        }
    }
}
