use x11rb::protocol::xproto::Window;

use crate::window::geometry::Rect;

#[derive(Debug, Clone)]
pub struct Client {
    /// The window ID of the application window
    pub window: Window,
    /// Last geometry we configured or observed, border excluded.
    pub geometry: Rect,
    /// Geometry to restore when leaving fullscreen.
    pub saved_geometry: Option<Rect>,
    pub workspace: usize,
    /// Min and max size hints are equal; never resized by dragging.
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_fullscreen: bool,
    pub is_mapped: bool,
    /// `_NET_WM_PID`, 0 when unknown. Diagnostics only.
    pub pid: u32,
}

impl Client {
    pub fn new(window: Window, geometry: Rect, workspace: usize) -> Self {
        Self {
            window,
            geometry,
            saved_geometry: None,
            workspace,
            is_fixed: false,
            is_floating: false,
            is_fullscreen: false,
            is_mapped: true,
            pid: 0,
        }
    }

    /// Whether the client takes part in the BSP layout.
    pub fn is_tileable(&self) -> bool {
        self.is_mapped && !self.is_floating && !self.is_fullscreen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tileable_flags() {
        let mut c = Client::new(1, Rect::new(0, 0, 10, 10), 0);
        assert!(c.is_tileable());
        c.is_floating = true;
        assert!(!c.is_tileable());
        c.is_floating = false;
        c.is_fullscreen = true;
        assert!(!c.is_tileable());
        c.is_fullscreen = false;
        c.is_mapped = false;
        assert!(!c.is_tileable());
    }
}
