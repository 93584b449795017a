//! Interrupt supervisor
//!
//! Listens for SIGINT/SIGTERM (Ctrl+C on other platforms) on a dedicated
//! thread. When one arrives every registered restore callback runs once and
//! subscribers are told which signal fired; exiting is then left to the
//! host. A signal nobody is subscribed to, and any signal arriving after
//! the first one or after [`InterruptSupervisor::cancel`], terminates the
//! process with the conventional exit status instead of being swallowed.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum InterruptError {
    #[error("Failed to install signal listener: {0}")]
    Install(#[from] io::Error),
}

/// Which termination signal was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// SIGINT / Ctrl+C
    CtrlC,
    /// SIGTERM
    Terminate,
}

impl Interrupt {
    /// Conventional shell exit status for this signal
    pub fn exit_code(self) -> i32 {
        match self {
            Interrupt::CtrlC => 130,
            Interrupt::Terminate => 143,
        }
    }
}

type Callback = Box<dyn FnOnce() + Send>;

struct Inner {
    callbacks: Mutex<HashMap<u64, Callback>>,
    next_id: AtomicU64,
    fired: Mutex<Option<Interrupt>>,
    notify: broadcast::Sender<Interrupt>,
    cancel: watch::Sender<bool>,
}

impl Inner {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (notify, _) = broadcast::channel(4);
        let (cancel, cancelled) = watch::channel(false);
        let inner = Self {
            callbacks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            fired: Mutex::new(None),
            notify,
            cancel,
        };
        (inner, cancelled)
    }

    /// Run the signal path once. Returns whether a subscriber took the
    /// notification.
    fn fire(&self, interrupt: Interrupt) -> bool {
        {
            let mut fired = self.fired.lock().unwrap_or_else(PoisonError::into_inner);
            if fired.is_some() {
                return false;
            }
            *fired = Some(interrupt);
        }

        let callbacks: Vec<Callback> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, callback)| callback)
            .collect();
        debug!(?interrupt, callbacks = callbacks.len(), "running restore callbacks");
        for callback in callbacks {
            callback();
        }

        self.cancel.send_replace(true);
        self.notify.send(interrupt).is_ok()
    }
}

/// Process-wide signal listener shared by every spinner of a [`Context`].
///
/// Cloning is cheap; clones share one listener.
///
/// [`Context`]: crate::Context
#[derive(Clone)]
pub struct InterruptSupervisor {
    inner: Arc<Inner>,
}

impl InterruptSupervisor {
    /// Start listening for termination signals
    pub fn install() -> Result<Self, InterruptError> {
        let (inner, cancelled) = Inner::new();
        let inner = Arc::new(inner);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let signals = {
            let _guard = runtime.enter();
            Signals::register()?
        };

        let listener = Arc::clone(&inner);
        thread::Builder::new()
            .name("twirl-signals".to_string())
            .spawn(move || runtime.block_on(listen(listener, signals, cancelled)))?;

        debug!("interrupt supervisor installed");
        Ok(Self { inner })
    }

    /// A supervisor with no OS listener. Signals only arrive through
    /// [`deliver`](Self::deliver).
    pub fn detached() -> Self {
        let (inner, _) = Inner::new();
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Register a callback to run once when a signal arrives. Dropping the
    /// returned handle deregisters it.
    pub fn register(&self, callback: impl FnOnce() + Send + 'static) -> Registration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Box::new(callback));
        Registration {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Receive the signal notification. Only signals delivered after this
    /// call are observed; use [`triggered`](Self::triggered) for earlier ones.
    pub fn subscribe(&self) -> broadcast::Receiver<Interrupt> {
        self.inner.notify.subscribe()
    }

    /// The signal that fired, if any
    pub fn triggered(&self) -> Option<Interrupt> {
        *self
            .inner
            .fired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the callbacks and notify subscribers as if the OS had delivered
    /// `interrupt`. Unlike a real signal this never exits the process.
    pub fn deliver(&self, interrupt: Interrupt) {
        self.inner.fire(interrupt);
    }

    /// Stop supervising. Registered callbacks will not run, and a signal
    /// arriving afterwards terminates the process as if no handler had
    /// been installed.
    pub fn cancel(&self) {
        self.inner.cancel.send_replace(true);
    }

    /// Number of callbacks still waiting for a signal
    pub fn registered(&self) -> usize {
        self.inner
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for InterruptSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptSupervisor")
            .field("registered", &self.registered())
            .field("triggered", &self.triggered())
            .finish()
    }
}

/// Keeps a restore callback registered until dropped
#[derive(Debug)]
pub struct Registration {
    id: u64,
    inner: Weak<Inner>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .callbacks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.id);
        }
    }
}

async fn listen(inner: Arc<Inner>, mut signals: Signals, mut cancelled: watch::Receiver<bool>) {
    tokio::select! {
        interrupt = signals.recv() => {
            match interrupt {
                Some(interrupt) => {
                    if !inner.fire(interrupt) {
                        terminate(interrupt);
                    }
                }
                None => {
                    warn!("signal stream closed");
                    return;
                }
            }
        }
        _ = cancelled.wait_for(|cancelled| *cancelled) => {
            debug!("interrupt supervisor cancelled");
        }
    }

    // tokio keeps its OS handler for the life of the process, so dropping
    // `signals` would leave later signals swallowed.
    if let Some(interrupt) = signals.recv().await {
        terminate(interrupt);
    }
}

/// The outcome the signal would have had without a handler
fn terminate(interrupt: Interrupt) -> ! {
    debug!(?interrupt, "unhandled signal, exiting");
    std::process::exit(interrupt.exit_code())
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> Option<Interrupt> {
        tokio::select! {
            received = self.interrupt.recv() => received.map(|_| Interrupt::CtrlC),
            received = self.terminate.recv() => received.map(|_| Interrupt::Terminate),
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<Interrupt> {
        tokio::signal::ctrl_c().await.ok().map(|_| Interrupt::CtrlC)
    }
}
