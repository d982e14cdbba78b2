//! Screen space reserved by docks through `_NET_WM_STRUT_PARTIAL` or the
//! older four-value `_NET_WM_STRUT`.

use tracing::debug;
use x11rb::protocol::xproto::{AtomEnum, Window};

use crate::core::conn::XConn;
use crate::ewmh::atoms::AtomCollection;
use crate::ewmh::hints::window_types;
use crate::window::error::Result;
use crate::window::geometry::Margins;

/// One dock's reservation. Spans are in root coordinates, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Strut {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
    pub left_span: (i64, i64),
    pub right_span: (i64, i64),
    pub top_span: (i64, i64),
    pub bottom_span: (i64, i64),
}

impl Strut {
    pub fn from_partial(values: &[u32]) -> Option<Self> {
        if values.len() < 12 {
            return None;
        }
        let v: Vec<i64> = values[..12].iter().map(|&x| i64::from(x as i32)).collect();
        Some(Self {
            left: v[0],
            right: v[1],
            top: v[2],
            bottom: v[3],
            left_span: (v[4], v[5]),
            right_span: (v[6], v[7]),
            top_span: (v[8], v[9]),
            bottom_span: (v[10], v[11]),
        })
    }

    /// The legacy property covers the whole edge.
    pub fn from_legacy(values: &[u32], screen_width: i32, screen_height: i32) -> Option<Self> {
        if values.len() < 4 {
            return None;
        }
        let vertical = (0, i64::from(screen_height) - 1);
        let horizontal = (0, i64::from(screen_width) - 1);
        Some(Self {
            left: i64::from(values[0] as i32),
            right: i64::from(values[1] as i32),
            top: i64::from(values[2] as i32),
            bottom: i64::from(values[3] as i32),
            left_span: vertical,
            right_span: vertical,
            top_span: horizontal,
            bottom_span: horizontal,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.right == 0 && self.top == 0 && self.bottom == 0
    }
}

fn overlaps((start, end): (i64, i64), extent: i32) -> bool {
    end >= 0 && start <= i64::from(extent) - 1
}

/// Per-edge maximum over every strut whose span touches the screen.
pub fn reserved_margins<I>(struts: I, screen_width: i32, screen_height: i32) -> Margins
where
    I: IntoIterator<Item = Strut>,
{
    let mut margins = Margins::default();
    let clamp = |v: i64| v.clamp(0, i64::from(i32::MAX)) as i32;

    for strut in struts.into_iter().filter(|s| !s.is_empty()) {
        if strut.left > 0 && overlaps(strut.left_span, screen_height) {
            margins.left = margins.left.max(clamp(strut.left));
        }
        if strut.right > 0 && overlaps(strut.right_span, screen_height) {
            margins.right = margins.right.max(clamp(strut.right));
        }
        if strut.top > 0 && overlaps(strut.top_span, screen_width) {
            margins.top = margins.top.max(clamp(strut.top));
        }
        if strut.bottom > 0 && overlaps(strut.bottom_span, screen_width) {
            margins.bottom = margins.bottom.max(clamp(strut.bottom));
        }
    }
    margins
}

/// Reads the strut of every dock among the root's children.
pub fn scan<C: XConn>(
    conn: &C,
    atoms: &AtomCollection,
    root: Window,
    screen_width: i32,
    screen_height: i32,
) -> Result<Margins> {
    let Some((_, children)) = conn.query_tree(root)? else {
        return Ok(Margins::default());
    };

    let mut struts = Vec::new();
    for window in children {
        if !window_types(conn, atoms, window)?.contains(&atoms._NET_WM_WINDOW_TYPE_DOCK) {
            continue;
        }
        let cardinal = AtomEnum::CARDINAL.into();
        let partial = conn
            .property32(window, atoms._NET_WM_STRUT_PARTIAL, cardinal, 12)?
            .and_then(|v| Strut::from_partial(&v));
        let strut = match partial {
            Some(s) => Some(s),
            None => conn
                .property32(window, atoms._NET_WM_STRUT, cardinal, 4)?
                .and_then(|v| Strut::from_legacy(&v, screen_width, screen_height)),
        };
        if let Some(s) = strut {
            debug!("Dock {:#x} reserves {:?}", window, s);
            struts.push(s);
        }
    }

    Ok(reserved_margins(struts, screen_width, screen_height))
}
