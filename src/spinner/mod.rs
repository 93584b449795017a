//! Spinner engine
//!
//! A [`Spinner`] owns one background render thread while active. The thread
//! wakes every `frequency`, composes the current line from the shared
//! [`RenderState`](state::RenderState) and redraws it. Stopping is
//! synchronous: the caller signals the thread, joins it, clears the line and
//! only then prints the final message, so frames and the final line never
//! interleave.
//!
//! On redirected output (or with the non-interactive override) no thread is
//! started; the message is logged as plain lines instead.

mod state;

use crate::config::{SpinnerBuilder, SpinnerConfig, DEFAULT_FREQUENCY_MS};
use crate::context::Context;
use crate::interrupt::Registration;
use crate::symbols::{self, FrameSource};
use crate::terminal::{Palette, Sink, Style, Terminal};
use state::{Outcome, RenderState, Seed};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Pass to [`Spinner::done`], [`Spinner::fail`] or [`Spinner::stop`] to
/// finish without a message
pub const NO_MESSAGE: [&str; 0] = [];

struct Worker {
    stop: SyncSender<()>,
    handle: JoinHandle<()>,
}

/// An animated terminal spinner.
///
/// All methods take `&self`; a spinner can be shared across threads behind
/// an `Arc`.
pub struct Spinner {
    state: Arc<RenderState>,
    terminal: Arc<Mutex<Terminal>>,
    /// Serializes start/stop and owns the render thread handle
    lifecycle: Mutex<Option<Worker>>,
    /// Mirrors the terminal's decision so updates need not lock it
    interactive: AtomicBool,
    frequency: Duration,
    _restore: Option<Registration>,
}

impl Spinner {
    /// A spinner with default settings writing to stdout
    pub fn new() -> Self {
        SpinnerBuilder::new().build()
    }

    pub fn builder() -> SpinnerBuilder {
        SpinnerBuilder::new()
    }

    pub(crate) fn assemble(
        config: &SpinnerConfig,
        palette: Palette,
        sink: Sink,
        context: &Context,
    ) -> Self {
        if let Err(err) = config.validate() {
            warn!(error = %err, "invalid spinner configuration, falling back to defaults");
        }

        let frames = config.symbols.resolve().unwrap_or_else(symbols::default_frames);
        let frequency = match config.frequency_ms {
            0 => Duration::from_millis(DEFAULT_FREQUENCY_MS),
            ms => Duration::from_millis(ms),
        };

        let terminal = Terminal::new(sink, context.is_non_interactive() || config.non_interactive);
        let interactive = AtomicBool::new(terminal.is_interactive());
        let terminal = Arc::new(Mutex::new(terminal));

        let restore = context.interrupts().map(|supervisor| {
            let terminal = Arc::clone(&terminal);
            supervisor.register(move || lock(&terminal).show_cursor())
        });

        let state = RenderState::new(Seed {
            message: config.message.clone(),
            prefix: config.prefix.clone(),
            delimiter: config.delimiter.clone(),
            frames,
            done_symbol: config.done_symbol.clone(),
            fail_symbol: config.fail_symbol.clone(),
            palette,
        });

        Self {
            state: Arc::new(state),
            terminal,
            lifecycle: Mutex::new(None),
            interactive,
            frequency,
            _restore: restore,
        }
    }

    /// Start animating. Does nothing if already active.
    pub fn start(&self) {
        let mut worker = lock(&self.lifecycle);
        if !self.state.activate() {
            return;
        }

        let mut terminal = lock(&self.terminal);
        if !self.is_interactive() {
            debug!("spinner started on non-interactive output");
            terminal.write_line(&self.state.message());
            return;
        }

        if !terminal.recheck() {
            debug!("sink is no longer a terminal, rendering a single frame");
            terminal.demote();
            self.interactive.store(false, Ordering::SeqCst);
            if let Some(line) = self.state.render(0) {
                terminal.redraw(&line);
            }
            return;
        }
        terminal.hide_cursor();
        drop(terminal);

        let (stop, stopped) = mpsc::sync_channel(1);
        let state = Arc::clone(&self.state);
        let terminal = Arc::clone(&self.terminal);
        let frequency = self.frequency;
        let spawned = thread::Builder::new()
            .name("twirl-render".to_string())
            .spawn(move || render_loop(&state, &terminal, &stopped, frequency));

        match spawned {
            Ok(handle) => {
                debug!(?frequency, "spinner started");
                *worker = Some(Worker { stop, handle });
            }
            Err(err) => {
                warn!(error = %err, "failed to spawn render thread, rendering a single frame");
                if let Some(line) = self.state.render(0) {
                    lock(&self.terminal).redraw(&line);
                }
            }
        }
    }

    /// Replace the message. Shown on the next tick; on redirected output it
    /// is also logged immediately.
    pub fn update_message(&self, message: &str) {
        self.state.set_message(message);
        if !self.is_interactive() {
            lock(&self.terminal).write_line(message);
        }
    }

    pub fn update_prefix(&self, prefix: &str) {
        self.state.set_prefix(prefix);
    }

    pub fn update_message_color(&self, style: impl Into<Style>) {
        self.state.set_message_style(style.into());
    }

    pub fn update_prefix_color(&self, style: impl Into<Style>) {
        self.state.set_prefix_style(style.into());
    }

    pub fn update_spinner_color(&self, style: impl Into<Style>) {
        self.state.set_spinner_style(style.into());
    }

    /// Swap the frame set while running.
    ///
    /// The cycle position is kept, so the first frame shown afterwards may
    /// be from the middle of the new set. An unknown catalog name leaves the
    /// current frames in place.
    pub fn update_symbols(&self, source: impl Into<FrameSource>) {
        let source = source.into();
        match source.resolve() {
            Some(frames) => {
                debug!(frames = frames.len(), "swapping spinner frames");
                self.state.set_frames(frames);
            }
            None => warn!(?source, "unknown frame set, keeping current frames"),
        }
    }

    /// Stop and print the message parts (joined by spaces) after the done
    /// glyph. With no parts nothing is printed.
    pub fn done<I, S>(&self, message: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.finish(Outcome::Done, join(message).as_deref());
    }

    /// Stop and print the message after the fail glyph; prints `Failed`
    /// when no parts are given
    pub fn fail<I, S>(&self, message: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.finish(Outcome::Failed, join(message).as_deref());
    }

    /// Stop and print the message as-is, without a glyph
    pub fn stop<I, S>(&self, message: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.finish(Outcome::Stopped, join(message).as_deref());
    }

    /// Snapshot of the current frames
    pub fn symbols(&self) -> Vec<String> {
        self.state.frames()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether this spinner animates (terminal sink, no override)
    pub fn is_interactive(&self) -> bool {
        self.interactive.load(Ordering::SeqCst)
    }

    pub fn message(&self) -> String {
        self.state.message()
    }

    pub fn prefix(&self) -> String {
        self.state.prefix()
    }

    /// Index of the frame most recently rendered
    pub fn frame_index(&self) -> usize {
        self.state.frame_index()
    }

    pub fn frequency(&self) -> Duration {
        self.frequency
    }

    fn finish(&self, outcome: Outcome, text: Option<&str>) {
        if !self.halt() {
            return;
        }
        if let Some(line) = self.state.final_line(outcome, text) {
            lock(&self.terminal).write_line(&line);
        }
    }

    /// Active -> idle. Returns false if the spinner was already idle.
    fn halt(&self) -> bool {
        let mut worker = lock(&self.lifecycle);
        if !self.state.deactivate() {
            return false;
        }

        if let Some(Worker { stop, handle }) = worker.take() {
            // Capacity 1 and a single sender: this never blocks.
            let _ = stop.try_send(());
            if handle.join().is_err() {
                warn!("render thread panicked");
            }
        }

        let mut terminal = lock(&self.terminal);
        terminal.clear_line();
        terminal.show_cursor();
        debug!("spinner stopped");
        true
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.halt();
    }
}

impl std::fmt::Debug for Spinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spinner")
            .field("active", &self.is_active())
            .field("message", &self.message())
            .field("prefix", &self.prefix())
            .field("frequency", &self.frequency)
            .finish()
    }
}

fn render_loop(
    state: &RenderState,
    terminal: &Mutex<Terminal>,
    stopped: &Receiver<()>,
    frequency: Duration,
) {
    let mut tick: usize = 0;
    loop {
        match stopped.recv_timeout(frequency) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        let Some(line) = state.render(tick) else {
            break;
        };
        lock(terminal).redraw(&line);
        tick = tick.wrapping_add(1);
    }
    trace!(ticks = tick, "render loop exited");
}

/// Space-joined message parts, or `None` when there are no parts at all.
/// Empty parts still count as a message.
fn join<I, S>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = parts
        .into_iter()
        .map(|part| part.as_ref().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupt::{Interrupt, InterruptSupervisor};
    use crate::terminal::has_styling;
    use crossterm::style::{Attribute, Color};
    use std::io::{self, Write};
    use std::time::Instant;

    const CLEAR: &str = "\r\x1b[K";

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }

        /// Lines drawn by the render loop, in order
        fn frames(&self) -> Vec<String> {
            self.text()
                .split(CLEAR)
                .filter(|segment| !segment.is_empty() && !segment.starts_with('\x1b'))
                .map(String::from)
                .collect()
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out waiting for spinner output");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn animated(out: &Capture) -> SpinnerBuilder {
        Spinner::builder()
            .sink(Sink::terminal(out.clone()))
            .frequency(Duration::from_millis(10))
    }

    fn leading_glyph(line: &str) -> &str {
        line.split(' ').next().unwrap_or_default()
    }

    #[test]
    fn test_spinner_output() {
        let out = Capture::default();
        let sp = animated(&out).message("Testing").build();

        sp.start();
        thread::sleep(Duration::from_millis(50));
        sp.stop(["Done"]);

        let text = out.text();
        assert!(!text.is_empty());
        assert!(text.contains("Testing"));
        assert_eq!(text.matches("Done").count(), 1);
        assert!(text.ends_with("\x1b[?25hDone\n"));
        assert!(out.frames().iter().all(|line| line.ends_with(" Testing")));
    }

    #[test]
    fn test_spinner_state() {
        let out = Capture::default();
        let sp = animated(&out).symbols(["-", "\\", "|", "/"]).build();

        sp.start();
        thread::sleep(Duration::from_millis(20));
        assert!(sp.is_active());

        sp.stop(["Stopped"]);
        assert!(!sp.is_active());
    }

    #[test]
    fn test_frames_follow_tick_count() {
        let out = Capture::default();
        let frames = ["a", "b", "c", "d"];
        let sp = animated(&out).symbols(frames).build();

        sp.start();
        wait_for(|| out.frames().len() >= 9);
        sp.stop(NO_MESSAGE);

        for (tick, line) in out.frames().iter().enumerate() {
            assert_eq!(leading_glyph(line), frames[tick % frames.len()]);
        }
    }

    #[test]
    fn test_double_start_runs_one_loop() {
        let out = Capture::default();
        let frames = ["1", "2", "3"];
        let sp = animated(&out).symbols(frames).build();

        sp.start();
        sp.start();
        wait_for(|| out.frames().len() >= 6);
        sp.start();
        sp.done(NO_MESSAGE);

        let rendered = out.frames();
        for (tick, line) in rendered.iter().enumerate() {
            assert_eq!(leading_glyph(line), frames[tick % frames.len()]);
        }
        assert_eq!(out.text().matches("\x1b[?25l").count(), 1);
    }

    #[test]
    fn test_stop_when_idle_is_silent() {
        let out = Capture::default();
        let sp = animated(&out).build();

        sp.done(["never shown"]);
        sp.fail(NO_MESSAGE);
        assert!(out.text().is_empty());

        sp.start();
        wait_for(|| !out.frames().is_empty());
        sp.done(["finished"]);
        let written = out.text();

        sp.stop(["again"]);
        sp.fail(["again"]);
        sp.done(NO_MESSAGE);
        assert_eq!(out.text(), written);
    }

    #[test]
    fn test_message_update_is_picked_up() {
        let out = Capture::default();
        let sp = animated(&out).message("Initial").build();

        sp.start();
        wait_for(|| !out.frames().is_empty());
        sp.update_message("Updated");
        wait_for(|| out.frames().iter().any(|line| line.contains("Updated")));
        sp.stop(NO_MESSAGE);

        let rendered = out.frames();
        let first = rendered
            .iter()
            .position(|line| line.contains("Updated"))
            .unwrap();
        assert!(first > 0);
        assert!(rendered[..first].iter().all(|line| line.contains("Initial")));
        assert!(rendered[first..].iter().all(|line| line.contains("Updated")));
        assert_eq!(sp.message(), "Updated");
    }

    #[test]
    fn test_prefix_update_and_delimiter() {
        let out = Capture::default();
        let sp = animated(&out)
            .symbols(["*"])
            .delimiter(" > ")
            .message("copying")
            .build();

        sp.start();
        wait_for(|| !out.frames().is_empty());
        sp.update_prefix("Backup");
        wait_for(|| out.frames().iter().any(|line| line.starts_with("Backup")));
        sp.done(["copied"]);

        assert!(out.frames().contains(&"Backup > * copying".to_string()));
        assert!(out.text().ends_with("Backup > ✓ copied\n"));
    }

    #[test]
    fn test_symbol_swap_keeps_cycle_position() {
        let out = Capture::default();
        let old = ["a1", "a2", "a3"];
        let new = ["b1", "b2", "b3", "b4", "b5"];
        let sp = animated(&out).symbols(old).build();

        sp.start();
        wait_for(|| out.frames().len() >= 2);
        sp.update_symbols(new);
        wait_for(|| out.frames().iter().filter(|l| l.starts_with('b')).count() >= 2);
        sp.stop(NO_MESSAGE);

        let rendered = out.frames();
        let swap = rendered
            .iter()
            .position(|line| line.starts_with('b'))
            .unwrap();
        assert!(swap >= 2);
        // The cycle is not restarted: the first new frame is `new[tick % 5]`.
        for (tick, line) in rendered.iter().enumerate() {
            let expected = if tick < swap {
                old[tick % old.len()]
            } else {
                new[tick % new.len()]
            };
            assert_eq!(leading_glyph(line), expected);
        }
        assert_eq!(sp.symbols(), new);
    }

    #[test]
    fn test_unknown_symbols_keep_current_frames() {
        let sp = Spinner::builder()
            .sink(Sink::writer(io::sink()))
            .symbols(["x", "y"])
            .build();
        sp.update_symbols("no-such-set");
        assert_eq!(sp.symbols(), ["x", "y"]);

        sp.update_symbols("pipe");
        assert_eq!(sp.symbols(), ["|", "/", "-", "\\"]);
    }

    #[test]
    fn test_fail_without_message_prints_default() {
        let out = Capture::default();
        let sp = animated(&out).build();

        sp.start();
        sp.fail(NO_MESSAGE);

        assert!(out.text().ends_with("✗ Failed\n"));
    }

    #[test]
    fn test_done_styles_are_closed() {
        let out = Capture::default();
        let sp = animated(&out)
            .done_color(Style::from(Color::Green).then(Attribute::Italic))
            .build();

        sp.start();
        sp.done(["Task", "completed!"]);

        let text = out.text();
        let styled = Style::from(Color::Green).then(Attribute::Italic).paint("Task completed!");
        assert!(text.ends_with(&format!("✓ {}\n", styled)));
        assert!(text.ends_with("\x1b[0m\n"));
    }

    #[test]
    fn test_non_interactive_output_is_plain() {
        let out = Capture::default();
        let sp = Spinner::builder()
            .sink(Sink::writer(out.clone()))
            .frequency(Duration::from_millis(10))
            .message("Working")
            .message_color(Color::Cyan)
            .spinner_color(Color::Red)
            .done_color(Attribute::Bold)
            .build();
        assert!(!sp.is_interactive());

        sp.start();
        assert!(sp.is_active());
        thread::sleep(Duration::from_millis(30));
        sp.update_message("Halfway");
        sp.update_message_color(Color::Magenta);
        sp.done(["Finished"]);
        assert!(!sp.is_active());

        let text = out.text();
        assert!(!has_styling(&text));
        assert!(!text.contains('\x1b'));
        assert_eq!(text, "Working\nHalfway\n✓ Finished\n");
    }

    #[test]
    fn test_detached_terminal_falls_back_to_plain_output() {
        let out = Capture::default();
        let attached = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&attached);
        let sink = Sink::with_terminal_check(out.clone(), move || flag.load(Ordering::SeqCst));
        let sp = Spinner::builder()
            .sink(sink)
            .frequency(Duration::from_millis(10))
            .symbols(["*"])
            .message("Working")
            .spinner_color(Color::Red)
            .message_color(Color::Cyan)
            .done_color(Attribute::Bold)
            .build();
        assert!(sp.is_interactive());

        attached.store(false, Ordering::SeqCst);
        sp.start();
        assert!(sp.is_active());
        assert!(!sp.is_interactive());
        thread::sleep(Duration::from_millis(30));
        sp.update_message("Halfway");
        sp.done(["Finished"]);

        let text = out.text();
        assert!(!text.contains('\x1b'));
        assert_eq!(text, "* Working\nHalfway\n✓ Finished\n");
    }

    #[test]
    fn test_empty_message_parts_print_glyph() {
        let out = Capture::default();
        let sp = animated(&out).build();
        sp.start();
        sp.done([""]);
        assert!(out.text().ends_with("\x1b[?25h✓ \n"));

        let out = Capture::default();
        let sp = animated(&out).build();
        sp.start();
        sp.fail([""]);
        assert!(out.text().ends_with("\x1b[?25h✗ \n"));
        assert!(!out.text().contains("Failed"));
    }

    #[test]
    fn test_context_override_disables_animation() {
        let out = Capture::default();
        let context = Context::new();
        context.set_non_interactive(true);
        let sp = animated(&out).context(context).message("quiet").build();

        sp.start();
        thread::sleep(Duration::from_millis(30));
        sp.stop(NO_MESSAGE);

        assert_eq!(out.text(), "quiet\n");
    }

    #[test]
    fn test_empty_frames_render_blank_glyph() {
        let out = Capture::default();
        let sp = animated(&out).symbols(Vec::<String>::new()).message("bare").build();

        sp.start();
        wait_for(|| !out.frames().is_empty());
        sp.stop(NO_MESSAGE);

        assert!(out.frames().iter().all(|line| line == "bare"));
    }

    #[test]
    fn test_concurrent_stops_join_once() {
        let out = Capture::default();
        let sp = Arc::new(animated(&out).build());
        sp.start();
        wait_for(|| !out.frames().is_empty());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sp = Arc::clone(&sp);
                thread::spawn(move || {
                    if i % 2 == 0 {
                        sp.done(["finished"]);
                    } else {
                        sp.fail(NO_MESSAGE);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let text = out.text();
        assert!(!sp.is_active());
        assert_eq!(text.matches("\x1b[?25h").count(), 1);
        assert_eq!(
            text.matches("finished").count() + text.matches("Failed").count(),
            1
        );
    }

    #[test]
    fn test_interrupt_restores_cursor() {
        let out = Capture::default();
        let supervisor = InterruptSupervisor::detached();
        let context = Context::new().with_interrupts(supervisor.clone());
        let sp = animated(&out).context(context).build();
        assert_eq!(supervisor.registered(), 1);

        sp.start();
        wait_for(|| !out.frames().is_empty());
        supervisor.deliver(Interrupt::CtrlC);

        assert!(out.text().contains("\x1b[?25h"));
        assert_eq!(supervisor.registered(), 0);
        sp.stop(NO_MESSAGE);
    }

    #[test]
    fn test_signal_restore_is_opt_in() {
        let plain = Spinner::builder().sink(Sink::writer(io::sink())).build();
        assert!(plain._restore.is_none());

        let supervisor = InterruptSupervisor::detached();
        let context = Context::new().with_interrupts(supervisor.clone());
        let first = Spinner::builder()
            .sink(Sink::writer(io::sink()))
            .context(context.clone())
            .build();
        let second = Spinner::builder()
            .sink(Sink::writer(io::sink()))
            .context(context)
            .build();
        assert!(first._restore.is_some());
        assert_eq!(supervisor.registered(), 2);

        drop(second);
        assert_eq!(supervisor.registered(), 1);
    }

    #[test]
    fn test_drop_deregisters_and_stops() {
        let out = Capture::default();
        let supervisor = InterruptSupervisor::detached();
        let context = Context::new().with_interrupts(supervisor.clone());
        {
            let sp = animated(&out).context(context).build();
            sp.start();
            wait_for(|| !out.frames().is_empty());
        }
        assert_eq!(supervisor.registered(), 0);
        assert!(out.text().ends_with("\x1b[?25h"));
    }
}
