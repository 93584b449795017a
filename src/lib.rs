//! twirl - animated terminal spinners
//!
//! A spinner cycles through a sequence of glyphs next to a status message
//! and an optional prefix label, then finishes with a done/fail line.
//!
//! ## Key Features
//!
//! - **Background rendering**: one render thread per active spinner, with
//!   message, prefix, colors and frames updatable from the caller
//! - **Redirect aware**: piped or redirected output gets plain log lines
//!   instead of animation, with ANSI styling stripped
//! - **Cursor safety**: the cursor is hidden while spinning and restored on
//!   stop, drop, or SIGINT/SIGTERM via the interrupt supervisor
//! - **Configurable**: builder API, TOML config file and env overrides
//!
//! ```no_run
//! use twirl::Spinner;
//!
//! let spinner = Spinner::builder().message("Fetching").symbols("dots").build();
//! spinner.start();
//! // ... work ...
//! spinner.update_message("Unpacking");
//! spinner.done(["Fetched 3 files"]);
//! ```
//!
//! ## Signals
//!
//! Signal handling is opt-in. A spinner only restores the cursor on
//! SIGINT/SIGTERM when it is built with a [`Context`] carrying an
//! [`InterruptSupervisor`]; `Spinner::new()` and a builder without
//! `.context(..)` install no handler and leave signals to the host.
//!
//! ```no_run
//! use twirl::{Context, InterruptSupervisor, Spinner};
//!
//! # fn main() -> Result<(), twirl::InterruptError> {
//! let context = Context::new().with_interrupts(InterruptSupervisor::install()?);
//! let spinner = Spinner::builder().context(context.clone()).build();
//! spinner.start();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod interrupt;
pub mod spinner;
pub mod symbols;
pub mod terminal;

pub use config::{ConfigError, SpinnerBuilder, SpinnerConfig};
pub use context::Context;
pub use interrupt::{Interrupt, InterruptError, InterruptSupervisor, Registration};
pub use spinner::{Spinner, NO_MESSAGE};
pub use symbols::FrameSource;
pub use terminal::{strip_styling, ColorSettings, Palette, Sink, Style};

/// Re-exported so callers can build [`Style`]s without a direct crossterm
/// dependency
pub use crossterm::style::{Attribute, Color};
