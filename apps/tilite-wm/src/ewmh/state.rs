//! EWMH and ICCCM properties the manager publishes.

use x11rb::protocol::xproto::{Atom, AtomEnum, Window};

use crate::core::conn::XConn;
use crate::ewmh::atoms::AtomCollection;
use crate::window::error::Result;
use crate::window::geometry::Rect;
use crate::window::registry::NUM_WORKSPACES;

/// ICCCM `WM_STATE` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmState {
    Withdrawn = 0,
    Normal = 1,
}

pub fn has_state<C: XConn>(conn: &C, atoms: &AtomCollection, window: Window, state: Atom) -> Result<bool> {
    let states = conn.property32(window, atoms._NET_WM_STATE, AtomEnum::ATOM.into(), 1024)?;
    Ok(states.is_some_and(|s| s.contains(&state)))
}

/// Adds or removes one atom of `_NET_WM_STATE`, keeping the others.
/// The property is deleted once it would be empty.
pub fn set_state<C: XConn>(
    conn: &C,
    atoms: &AtomCollection,
    window: Window,
    state: Atom,
    add: bool,
) -> Result<()> {
    let mut states: Vec<Atom> = conn
        .property32(window, atoms._NET_WM_STATE, AtomEnum::ATOM.into(), 1024)?
        .unwrap_or_default();
    states.retain(|&s| s != state);
    if add {
        states.push(state);
    }

    if states.is_empty() {
        conn.delete_property(window, atoms._NET_WM_STATE)
    } else {
        conn.change_property32(window, atoms._NET_WM_STATE, AtomEnum::ATOM.into(), &states)
    }
}

pub fn set_wm_state<C: XConn>(conn: &C, atoms: &AtomCollection, window: Window, state: WmState) -> Result<()> {
    conn.change_property32(window, atoms.WM_STATE, atoms.WM_STATE, &[state as u32, x11rb::NONE])
}

pub fn set_frame_extents<C: XConn>(conn: &C, atoms: &AtomCollection, window: Window, border: u32) -> Result<()> {
    conn.change_property32(
        window,
        atoms._NET_FRAME_EXTENTS,
        AtomEnum::CARDINAL.into(),
        &[border; 4],
    )
}

pub fn set_window_desktop<C: XConn>(conn: &C, atoms: &AtomCollection, window: Window, desktop: usize) -> Result<()> {
    conn.change_property32(
        window,
        atoms._NET_WM_DESKTOP,
        AtomEnum::CARDINAL.into(),
        &[desktop as u32],
    )
}

pub fn set_client_list<C: XConn>(conn: &C, atoms: &AtomCollection, root: Window, windows: &[Window]) -> Result<()> {
    conn.change_property32(root, atoms._NET_CLIENT_LIST, AtomEnum::WINDOW.into(), windows)
}

pub fn set_current_desktop<C: XConn>(conn: &C, atoms: &AtomCollection, root: Window, desktop: usize) -> Result<()> {
    conn.change_property32(
        root,
        atoms._NET_CURRENT_DESKTOP,
        AtomEnum::CARDINAL.into(),
        &[desktop as u32],
    )
}

/// Publishes the focused window, or removes the property when there is none.
pub fn set_active_window<C: XConn>(
    conn: &C,
    atoms: &AtomCollection,
    root: Window,
    window: Option<Window>,
) -> Result<()> {
    match window {
        Some(w) => conn.change_property32(root, atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW.into(), &[w]),
        None => conn.delete_property(root, atoms._NET_ACTIVE_WINDOW),
    }
}

/// `_NET_WORKAREA` holds one rectangle per desktop; they are all the same.
pub fn set_workarea<C: XConn>(conn: &C, atoms: &AtomCollection, root: Window, area: Rect) -> Result<()> {
    let one = [area.x as u32, area.y as u32, area.width as u32, area.height as u32];
    let all: Vec<u32> = one.iter().copied().cycle().take(4 * NUM_WORKSPACES).collect();
    conn.change_property32(root, atoms._NET_WORKAREA, AtomEnum::CARDINAL.into(), &all)
}
