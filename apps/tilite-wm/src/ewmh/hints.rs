//! Client-supplied hints read when a window is mapped.

use x11rb::protocol::xproto::{Atom, AtomEnum, Window};

use crate::core::conn::XConn;
use crate::ewmh::atoms::AtomCollection;
use crate::window::error::Result;

const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;

/// `WM_NORMAL_HINTS` minimum and maximum size, when the client sets both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub min: (u32, u32),
    pub max: (u32, u32),
}

impl SizeLimits {
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }
}

pub fn size_limits<C: XConn>(conn: &C, window: Window) -> Result<Option<SizeLimits>> {
    let data = conn.property32(
        window,
        AtomEnum::WM_NORMAL_HINTS.into(),
        AtomEnum::WM_SIZE_HINTS.into(),
        18,
    )?;
    Ok(data.and_then(|d| {
        if d.len() < 9 {
            return None;
        }
        let flags = d[0];
        (flags & P_MIN_SIZE != 0 && flags & P_MAX_SIZE != 0).then(|| SizeLimits {
            min: (d[5], d[6]),
            max: (d[7], d[8]),
        })
    }))
}

pub fn is_transient<C: XConn>(conn: &C, window: Window) -> Result<bool> {
    let data = conn.property32(
        window,
        AtomEnum::WM_TRANSIENT_FOR.into(),
        AtomEnum::WINDOW.into(),
        1,
    )?;
    Ok(data.is_some_and(|d| d[0] != x11rb::NONE))
}

pub fn window_types<C: XConn>(conn: &C, atoms: &AtomCollection, window: Window) -> Result<Vec<Atom>> {
    Ok(conn
        .property32(window, atoms._NET_WM_WINDOW_TYPE, AtomEnum::ATOM.into(), 4)?
        .unwrap_or_default())
}

pub fn supports_protocol<C: XConn>(
    conn: &C,
    atoms: &AtomCollection,
    window: Window,
    protocol: Atom,
) -> Result<bool> {
    let protocols = conn.property32(window, atoms.WM_PROTOCOLS, AtomEnum::ATOM.into(), 64)?;
    Ok(protocols.is_some_and(|p| p.contains(&protocol)))
}

/// `_NET_WM_PID`, 0 when absent.
pub fn pid<C: XConn>(conn: &C, atoms: &AtomCollection, window: Window) -> Result<u32> {
    let data = conn.property32(window, atoms._NET_WM_PID, AtomEnum::CARDINAL.into(), 1)?;
    Ok(data.map_or(0, |d| d[0]))
}
