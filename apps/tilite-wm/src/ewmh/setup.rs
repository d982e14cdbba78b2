use tracing::info;
use x11rb::protocol::xproto::{AtomEnum, Window};

use crate::core::conn::XConn;
use crate::ewmh::atoms::AtomCollection;
use crate::ewmh::state;
use crate::window::error::Result;
use crate::window::geometry::Rect;
use crate::window::registry::NUM_WORKSPACES;

pub const WM_NAME: &str = "tilite";

/// `"1\0" .. "9\0"`
fn desktop_names() -> Vec<u8> {
    (1..=NUM_WORKSPACES)
        .flat_map(|n| format!("{n}\0").into_bytes())
        .collect()
}

/// Publishes the root window properties every EWMH pager expects.
/// Returns the supporting check window.
pub fn setup_hints<C: XConn>(
    conn: &C,
    atoms: &AtomCollection,
    root: Window,
    workarea: Rect,
) -> Result<Window> {
    let check_win = conn.create_check_window(root)?;
    let window_type = AtomEnum::WINDOW.into();

    conn.change_property32(check_win, atoms._NET_SUPPORTING_WM_CHECK, window_type, &[check_win])?;
    conn.change_property8(check_win, atoms._NET_WM_NAME, atoms.UTF8_STRING, WM_NAME.as_bytes())?;
    conn.change_property32(root, atoms._NET_SUPPORTING_WM_CHECK, window_type, &[check_win])?;

    conn.change_property32(
        root,
        atoms._NET_NUMBER_OF_DESKTOPS,
        AtomEnum::CARDINAL.into(),
        &[NUM_WORKSPACES as u32],
    )?;
    conn.change_property8(root, atoms._NET_DESKTOP_NAMES, atoms.UTF8_STRING, &desktop_names())?;
    state::set_current_desktop(conn, atoms, root, 0)?;
    conn.change_property32(root, atoms._NET_SUPPORTED, AtomEnum::ATOM.into(), &atoms.supported())?;
    state::set_workarea(conn, atoms, root, workarea)?;

    info!("EWMH hints published, check window {:#x}", check_win);
    Ok(check_win)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConn, ROOT};

    #[test]
    fn test_root_properties() {
        let conn = FakeConn::new();
        let atoms = AtomCollection::sequential();

        let check = setup_hints(&conn, &atoms, ROOT, Rect::new(0, 0, 1000, 600)).unwrap();

        assert_eq!(conn.prop32(ROOT, atoms._NET_SUPPORTING_WM_CHECK), Some(vec![check]));
        assert_eq!(conn.prop32(check, atoms._NET_SUPPORTING_WM_CHECK), Some(vec![check]));
        assert_eq!(conn.prop8(check, atoms._NET_WM_NAME), Some(b"tilite".to_vec()));
        assert_eq!(conn.prop32(ROOT, atoms._NET_NUMBER_OF_DESKTOPS), Some(vec![9]));
        assert_eq!(conn.prop32(ROOT, atoms._NET_CURRENT_DESKTOP), Some(vec![0]));
        assert_eq!(
            conn.prop8(ROOT, atoms._NET_DESKTOP_NAMES),
            Some(b"1\x002\x003\x004\x005\x006\x007\x008\x009\x00".to_vec())
        );
        let supported = conn.prop32(ROOT, atoms._NET_SUPPORTED).unwrap();
        assert!(supported.contains(&atoms._NET_WM_STATE_FULLSCREEN));
        assert!(supported.contains(&atoms._NET_WM_STRUT_PARTIAL));
    }
}
