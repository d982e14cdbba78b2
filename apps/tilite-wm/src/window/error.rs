use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, warn};
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto;
use x11rb::protocol::ErrorKind;
use x11rb::x11_utils::X11Error;

#[derive(Debug, Error)]
pub enum WmError {
    #[error("cannot connect to the X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X connection failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("cannot allocate X resource: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("another window manager is already running")]
    OtherWm,

    #[error(transparent)]
    Config(#[from] tilite_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, WmError>;

impl WmError {
    /// Errors the event loop cannot recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WmError::Connect(_)
                | WmError::Connection(_)
                | WmError::OtherWm
                | WmError::Config(_)
                | WmError::Reply(ReplyError::ConnectionError(_))
                | WmError::ReplyOrId(ReplyOrIdError::ConnectionError(_))
        )
    }
}

/// Errors that routinely happen when a client disappears between our request
/// and the server processing it.
pub fn is_ignorable(kind: ErrorKind, major_opcode: u8) -> bool {
    matches!(
        (kind, major_opcode),
        (ErrorKind::Window, _)
            | (ErrorKind::Drawable, xproto::GET_GEOMETRY_REQUEST)
            | (ErrorKind::Match, xproto::SET_INPUT_FOCUS_REQUEST)
            | (ErrorKind::Match, xproto::CONFIGURE_WINDOW_REQUEST)
    )
}

/// Counts protocol errors delivered as events. None of them is fatal.
#[derive(Debug, Default)]
pub struct ErrorTracker {
    ignored: AtomicU64,
    unexpected: AtomicU64,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: &X11Error) {
        if is_ignorable(error.error_kind, error.major_opcode) {
            self.ignored.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Ignoring X error {:?} from request {} (resource {:#x})",
                error.error_kind, error.major_opcode, error.bad_value
            );
        } else {
            self.unexpected.fetch_add(1, Ordering::Relaxed);
            warn!(
                "X error {:?} from request {} (minor {}, resource {:#x})",
                error.error_kind, error.major_opcode, error.minor_opcode, error.bad_value
            );
        }
    }

    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    pub fn unexpected(&self) -> u64 {
        self.unexpected.load(Ordering::Relaxed)
    }
}

/// Turns an X error reply (usually a window that vanished) into `None`.
/// A broken connection still propagates.
pub fn reply_or_none<T>(result: std::result::Result<T, ReplyError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::X11Error(e)) => {
            debug!("Request failed with {:?}, abandoning", e.error_kind);
            Ok(None)
        }
        Err(ReplyError::ConnectionError(e)) => Err(e.into()),
    }
}

/// Logs a non-critical failure and carries on without the value.
pub fn log_warn<T, E: std::fmt::Display>(result: std::result::Result<T, E>, operation: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Warning in {}: {}", operation, e);
            None
        }
    }
}
