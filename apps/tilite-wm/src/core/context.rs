use tracing::info;
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{ChangeWindowAttributesAux, ConnectionExt as _, EventMask, Window};
use x11rb::protocol::ErrorKind;
use x11rb::rust_connection::RustConnection;

use crate::ewmh::atoms::AtomCollection;
use crate::window::error::{Result, WmError};

/// The connection plus everything about the screen that the manager reads
/// on every request.
pub struct Context<C> {
    pub conn: C,
    pub screen_num: usize,
    pub root_window: Window,
    pub atoms: AtomCollection,
    pub screen_width: i32,
    pub screen_height: i32,
}

impl Context<RustConnection> {
    /// Connects to `$DISPLAY`, interns atoms and claims substructure
    /// redirection on the root window.
    pub fn new() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root_window = screen.root;
        let screen_width = screen.width_in_pixels.into();
        let screen_height = screen.height_in_pixels.into();

        let atoms = AtomCollection::new(&conn)?.reply()?;
        become_wm(&conn, root_window)?;
        info!("Managing screen {} ({}x{})", screen_num, screen_width, screen_height);

        Ok(Self::from_parts(conn, screen_num, root_window, atoms, screen_width, screen_height))
    }
}

impl<C> Context<C> {
    pub fn from_parts(
        conn: C,
        screen_num: usize,
        root_window: Window,
        atoms: AtomCollection,
        screen_width: i32,
        screen_height: i32,
    ) -> Self {
        Self { conn, screen_num, root_window, atoms, screen_width, screen_height }
    }
}

fn become_wm(conn: &RustConnection, root: Window) -> Result<()> {
    let event_mask = EventMask::STRUCTURE_NOTIFY
        | EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::KEY_PRESS
        | EventMask::PROPERTY_CHANGE;
    let values = ChangeWindowAttributesAux::new().event_mask(event_mask);

    match conn.change_window_attributes(root, &values)?.check() {
        Ok(()) => Ok(()),
        Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => Err(WmError::OtherWm),
        Err(e) => Err(e.into()),
    }
}
