//! Network reachability as a two-valued observable.
//!
//! The signal is seeded once from a [`LinkProbe`] and afterwards only moves when
//! the platform hook pushes a new value through a [`ConnectivityReporter`].
//! It is independent of the reducer: connectivity changes never touch `UiState`.

use std::io;
#[cfg(target_os = "linux")]
use std::{fs, path::PathBuf};

use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Available,
    Unavailable,
}

impl ConnectivityState {
    pub fn is_available(&self) -> bool {
        matches!(self, ConnectivityState::Available)
    }
}

impl From<bool> for ConnectivityState {
    fn from(up: bool) -> Self {
        if up {
            ConnectivityState::Available
        } else {
            ConnectivityState::Unavailable
        }
    }
}

/// Synchronous platform lookup of the current link state.
pub trait LinkProbe: Send + Sync {
    fn probe(&self) -> io::Result<ConnectivityState>;
}

/// Always reports the same state.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub ConnectivityState);

impl LinkProbe for StaticProbe {
    fn probe(&self) -> io::Result<ConnectivityState> {
        Ok(self.0)
    }
}

/// The link lookup for the host platform.
///
/// Only Linux exposes link state through sysfs. Elsewhere the signal starts out
/// `Available` and the fetch itself reports a missing network.
pub fn host_link_lookup() -> Box<dyn LinkProbe> {
    #[cfg(target_os = "linux")]
    {
        Box::new(SysfsLinkProbe::new())
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(StaticProbe(ConnectivityState::Available))
    }
}

/// Link-level check against `/sys/class/net`.
///
/// Any non-loopback interface whose `operstate` is `up` counts as a network
/// path. `unknown` is accepted too since point-to-point links (VPNs, modems)
/// report it while passing traffic. This says nothing about internet reachability.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone)]
pub struct SysfsLinkProbe {
    root: PathBuf,
}

#[cfg(target_os = "linux")]
impl SysfsLinkProbe {
    pub fn new() -> Self {
        Self::with_root("/sys/class/net")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(target_os = "linux")]
impl Default for SysfsLinkProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl LinkProbe for SysfsLinkProbe {
    fn probe(&self) -> io::Result<ConnectivityState> {
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            if name == "lo" {
                continue;
            }

            let operstate = match fs::read_to_string(entry.path().join("operstate")) {
                Ok(s) => s,
                // Interfaces can vanish between readdir and read.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };

            match operstate.trim() {
                "up" | "unknown" => {
                    debug!(interface = ?name, "link up");
                    return Ok(ConnectivityState::Available);
                }
                _ => {}
            }
        }

        Ok(ConnectivityState::Unavailable)
    }
}

/// Owner side of the connectivity observable.
#[derive(Debug)]
pub struct ConnectivitySignal {
    tx: watch::Sender<ConnectivityState>,
}

impl ConnectivitySignal {
    /// Seed the signal from `probe`. A probe error is logged and treated as offline.
    pub fn from_probe(probe: &dyn LinkProbe) -> Self {
        let initial = probe.probe().unwrap_or_else(|e| {
            warn!("connectivity lookup failed, assuming offline: {e}");
            ConnectivityState::Unavailable
        });
        Self::new(initial)
    }

    pub fn new(initial: ConnectivityState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> ConnectivityState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ConnectivityWatch {
        ConnectivityWatch {
            rx: self.tx.subscribe(),
        }
    }

    /// Handle for the platform hook that pushes later changes.
    pub fn reporter(&self) -> ConnectivityReporter {
        ConnectivityReporter {
            tx: self.tx.clone(),
        }
    }
}

/// Pushes connectivity changes into a [`ConnectivitySignal`].
#[derive(Debug, Clone)]
pub struct ConnectivityReporter {
    tx: watch::Sender<ConnectivityState>,
}

impl ConnectivityReporter {
    /// Publish `state`. Subscribers are only woken when it actually changed.
    pub fn report(&self, state: ConnectivityState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            debug!(?state, "connectivity changed");
        }
    }
}

/// Subscriber side of the connectivity observable.
#[derive(Debug, Clone)]
pub struct ConnectivityWatch {
    rx: watch::Receiver<ConnectivityState>,
}

impl ConnectivityWatch {
    pub fn current(&self) -> ConnectivityState {
        *self.rx.borrow()
    }

    /// Wait for the next change. `None` once the signal and all reporters are gone.
    pub async fn changed(&mut self) -> Option<ConnectivityState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
