use x11rb::cursor::Handle;
use x11rb::protocol::xproto::Cursor;
use x11rb::resource_manager::new_from_default;
use x11rb::rust_connection::RustConnection;

use crate::window::error::Result;

/// Pointer shapes for the root window and the two drag gestures.
/// The default value (all `NONE`) keeps the server's cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursors {
    pub normal: Cursor,
    pub move_: Cursor,
    pub resize: Cursor,
}

impl Cursors {
    pub fn load(conn: &RustConnection, screen_num: usize) -> Result<Self> {
        let db = new_from_default(conn)?;
        let handle = Handle::new(conn, screen_num, &db)?.reply()?;

        let load = |name: &str| -> Result<Cursor> { Ok(handle.load_cursor(conn, name)?) };

        Ok(Self {
            normal: load("left_ptr")?,
            move_: load("fleur")?,
            resize: load("bottom_right_corner")?,
        })
    }
}
