macro_rules! atoms {
    ($($name:ident),* $(,)?) => {
        x11rb::atom_manager! {
            pub AtomCollection: AtomCollectionCookie {
                $($name,)*
            }
        }

        #[cfg(test)]
        impl AtomCollection {
            /// Distinct fake atom values for running the manager without a server.
            pub fn sequential() -> Self {
                let mut next = 0x100;
                let mut take = || {
                    next += 1;
                    next
                };
                Self { $($name: take(),)* }
            }
        }
    };
}

atoms! {
    UTF8_STRING,
    WM_PROTOCOLS,
    WM_DELETE_WINDOW,
    WM_TAKE_FOCUS,
    WM_STATE,
    _NET_SUPPORTED,
    _NET_SUPPORTING_WM_CHECK,
    _NET_WM_NAME,
    _NET_NUMBER_OF_DESKTOPS,
    _NET_DESKTOP_NAMES,
    _NET_CURRENT_DESKTOP,
    _NET_ACTIVE_WINDOW,
    _NET_CLIENT_LIST,
    _NET_WORKAREA,
    _NET_WM_DESKTOP,
    _NET_WM_PID,
    _NET_FRAME_EXTENTS,
    _NET_WM_STATE,
    _NET_WM_STATE_FULLSCREEN,
    _NET_WM_STATE_MODAL,
    _NET_WM_STRUT,
    _NET_WM_STRUT_PARTIAL,
    _NET_WM_WINDOW_TYPE,
    _NET_WM_WINDOW_TYPE_DOCK,
    _NET_WM_WINDOW_TYPE_UTILITY,
    _NET_WM_WINDOW_TYPE_DIALOG,
    _NET_WM_WINDOW_TYPE_TOOLBAR,
    _NET_WM_WINDOW_TYPE_SPLASH,
    _NET_WM_WINDOW_TYPE_POPUP_MENU,
    _NET_WM_WINDOW_TYPE_DROPDOWN_MENU,
    _NET_WM_WINDOW_TYPE_MENU,
    _NET_WM_WINDOW_TYPE_TOOLTIP,
    _NET_WM_WINDOW_TYPE_NOTIFICATION,
}

impl AtomCollection {
    /// Everything advertised in `_NET_SUPPORTED`.
    pub fn supported(&self) -> Vec<u32> {
        vec![
            self._NET_SUPPORTED,
            self._NET_SUPPORTING_WM_CHECK,
            self._NET_WM_NAME,
            self._NET_NUMBER_OF_DESKTOPS,
            self._NET_DESKTOP_NAMES,
            self._NET_CURRENT_DESKTOP,
            self._NET_ACTIVE_WINDOW,
            self._NET_CLIENT_LIST,
            self._NET_WORKAREA,
            self._NET_WM_DESKTOP,
            self._NET_WM_PID,
            self._NET_FRAME_EXTENTS,
            self._NET_WM_STATE,
            self._NET_WM_STATE_FULLSCREEN,
            self._NET_WM_STATE_MODAL,
            self._NET_WM_STRUT,
            self._NET_WM_STRUT_PARTIAL,
            self._NET_WM_WINDOW_TYPE,
            self._NET_WM_WINDOW_TYPE_DOCK,
            self._NET_WM_WINDOW_TYPE_UTILITY,
            self._NET_WM_WINDOW_TYPE_DIALOG,
            self._NET_WM_WINDOW_TYPE_TOOLBAR,
            self._NET_WM_WINDOW_TYPE_SPLASH,
            self._NET_WM_WINDOW_TYPE_POPUP_MENU,
            self._NET_WM_WINDOW_TYPE_DROPDOWN_MENU,
            self._NET_WM_WINDOW_TYPE_MENU,
            self._NET_WM_WINDOW_TYPE_TOOLTIP,
            self._NET_WM_WINDOW_TYPE_NOTIFICATION,
        ]
    }

    /// Window types that are always managed as floating.
    pub fn floating_types(&self) -> [u32; 9] {
        [
            self._NET_WM_WINDOW_TYPE_UTILITY,
            self._NET_WM_WINDOW_TYPE_DIALOG,
            self._NET_WM_WINDOW_TYPE_TOOLBAR,
            self._NET_WM_WINDOW_TYPE_SPLASH,
            self._NET_WM_WINDOW_TYPE_POPUP_MENU,
            self._NET_WM_WINDOW_TYPE_DROPDOWN_MENU,
            self._NET_WM_WINDOW_TYPE_MENU,
            self._NET_WM_WINDOW_TYPE_TOOLTIP,
            self._NET_WM_WINDOW_TYPE_NOTIFICATION,
        ]
    }
}
