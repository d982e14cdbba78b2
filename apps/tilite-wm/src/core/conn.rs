//! The narrow set of X requests the manager issues.
//!
//! `WindowManager` is generic over [`XConn`] so the whole event core can be
//! driven by the in-memory connection in `testing.rs`.

use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Allow, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
    ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, Cursor,
    EventMask, Grab, GrabMode, GrabStatus, InputFocus, Keycode, MapState, ModMask, PropMode, StackMode,
    Timestamp, Window, WindowClass, CONFIGURE_NOTIFY_EVENT,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::window::error::{reply_or_none, Result};
use crate::window::geometry::Rect;
use crate::window::keys::{KeyboardMapping, ModifierMapping};

/// The two attributes the manager cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub override_redirect: bool,
    pub viewable: bool,
}

pub trait XConn {
    fn flush(&self) -> Result<()>;
    fn wait_for_event(&self) -> Result<Event>;
    fn poll_for_event(&self) -> Result<Option<Event>>;

    /// Position and size, border excluded. `None` when the window is gone.
    fn geometry(&self, window: Window) -> Result<Option<Rect>>;
    fn attributes(&self, window: Window) -> Result<Option<WindowAttributes>>;
    /// Parent and children of `window`.
    fn query_tree(&self, window: Window) -> Result<Option<(Window, Vec<Window>)>>;
    /// Child of `root` under the pointer, if any.
    fn pointer_child(&self, root: Window) -> Result<Option<Window>>;
    fn property32(
        &self,
        window: Window,
        property: u32,
        type_: u32,
        length: u32,
    ) -> Result<Option<Vec<u32>>>;
    fn keyboard_mapping(&self) -> Result<KeyboardMapping>;
    fn modifier_mapping(&self) -> Result<ModifierMapping>;

    fn map_window(&self, window: Window) -> Result<()>;
    fn unmap_window(&self, window: Window) -> Result<()>;
    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()>;
    fn change_attributes(&self, window: Window, aux: &ChangeWindowAttributesAux) -> Result<()>;
    fn grab_button(
        &self,
        window: Window,
        button: ButtonIndex,
        modifiers: u16,
        owner_events: bool,
    ) -> Result<()>;
    fn grab_key(&self, root: Window, keycode: Keycode, modifiers: u16) -> Result<()>;
    fn ungrab_keys(&self, root: Window) -> Result<()>;
    /// Returns whether the grab succeeded.
    fn grab_pointer(&self, root: Window, cursor: Cursor) -> Result<bool>;
    fn ungrab_pointer(&self) -> Result<()>;
    fn replay_pointer(&self, time: Timestamp) -> Result<()>;
    fn set_input_focus(&self, window: Window) -> Result<()>;
    fn warp_pointer(&self, root: Window, x: i32, y: i32) -> Result<()>;

    fn change_property32(&self, window: Window, property: u32, type_: u32, data: &[u32])
        -> Result<()>;
    fn change_property8(&self, window: Window, property: u32, type_: u32, data: &[u8])
        -> Result<()>;
    fn delete_property(&self, window: Window, property: u32) -> Result<()>;
    fn send_client_message(&self, window: Window, type_: u32, data: [u32; 5]) -> Result<()>;
    /// Tells a client where it is without moving it.
    fn send_configure_notify(&self, window: Window, geometry: Rect, border: u32) -> Result<()>;
    fn kill_client(&self, window: Window) -> Result<()>;
    fn grab_server(&self) -> Result<()>;
    fn ungrab_server(&self) -> Result<()>;
    /// Creates the unmapped window advertised through `_NET_SUPPORTING_WM_CHECK`.
    fn create_check_window(&self, root: Window) -> Result<Window>;

    fn raise_window(&self, window: Window) -> Result<()> {
        self.configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
    }

    fn set_border(&self, window: Window, pixel: u32) -> Result<()> {
        self.change_attributes(window, &ChangeWindowAttributesAux::new().border_pixel(pixel))
    }
}

impl XConn for RustConnection {
    fn flush(&self) -> Result<()> {
        Connection::flush(self)?;
        Ok(())
    }

    fn wait_for_event(&self) -> Result<Event> {
        Ok(Connection::wait_for_event(self)?)
    }

    fn poll_for_event(&self) -> Result<Option<Event>> {
        Ok(Connection::poll_for_event(self)?)
    }

    fn geometry(&self, window: Window) -> Result<Option<Rect>> {
        let reply = reply_or_none(self.get_geometry(window)?.reply())?;
        Ok(reply.map(|g| {
            Rect::new(g.x.into(), g.y.into(), g.width.into(), g.height.into())
        }))
    }

    fn attributes(&self, window: Window) -> Result<Option<WindowAttributes>> {
        let reply = reply_or_none(self.get_window_attributes(window)?.reply())?;
        Ok(reply.map(|a| WindowAttributes {
            override_redirect: a.override_redirect,
            viewable: a.map_state == MapState::VIEWABLE,
        }))
    }

    fn query_tree(&self, window: Window) -> Result<Option<(Window, Vec<Window>)>> {
        let cookie = x11rb::protocol::xproto::ConnectionExt::query_tree(self, window)?;
        let reply = reply_or_none(cookie.reply())?;
        Ok(reply.map(|t| (t.parent, t.children)))
    }

    fn pointer_child(&self, root: Window) -> Result<Option<Window>> {
        let reply = reply_or_none(self.query_pointer(root)?.reply())?;
        Ok(reply.map(|p| p.child).filter(|&c| c != x11rb::NONE))
    }

    fn property32(
        &self,
        window: Window,
        property: u32,
        type_: u32,
        length: u32,
    ) -> Result<Option<Vec<u32>>> {
        let cookie = self.get_property(false, window, property, type_, 0, length)?;
        let reply = reply_or_none(cookie.reply())?;
        Ok(reply
            .and_then(|r| r.value32().map(|v| v.collect::<Vec<_>>()))
            .filter(|v| !v.is_empty()))
    }

    fn keyboard_mapping(&self) -> Result<KeyboardMapping> {
        let setup = self.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = self.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        Ok(KeyboardMapping {
            min_keycode: min,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    fn modifier_mapping(&self) -> Result<ModifierMapping> {
        let reply = self.get_modifier_mapping()?.reply()?;
        Ok(ModifierMapping {
            keycodes_per_modifier: (reply.keycodes.len() / 8) as u8,
            keycodes: reply.keycodes,
        })
    }

    fn map_window(&self, window: Window) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::map_window(self, window)?;
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::unmap_window(self, window)?;
        Ok(())
    }

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::configure_window(self, window, aux)?;
        Ok(())
    }

    fn change_attributes(&self, window: Window, aux: &ChangeWindowAttributesAux) -> Result<()> {
        self.change_window_attributes(window, aux)?;
        Ok(())
    }

    fn grab_button(
        &self,
        window: Window,
        button: ButtonIndex,
        modifiers: u16,
        owner_events: bool,
    ) -> Result<()> {
        // Client grabs freeze the pointer until we replay the click.
        let pointer_mode = if owner_events { GrabMode::ASYNC } else { GrabMode::SYNC };
        x11rb::protocol::xproto::ConnectionExt::grab_button(
            self,
            owner_events,
            window,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
            pointer_mode,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            button,
            modifiers.into(),
        )?;
        Ok(())
    }

    fn grab_key(&self, root: Window, keycode: Keycode, modifiers: u16) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::grab_key(
            self,
            true,
            root,
            modifiers.into(),
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn ungrab_keys(&self, root: Window) -> Result<()> {
        self.ungrab_key(Grab::ANY, root, ModMask::ANY)?;
        Ok(())
    }

    fn grab_pointer(&self, root: Window, cursor: Cursor) -> Result<bool> {
        let reply = reply_or_none(
            x11rb::protocol::xproto::ConnectionExt::grab_pointer(
                self,
                true,
                root,
                EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                cursor,
                x11rb::CURRENT_TIME,
            )?
            .reply(),
        )?;
        Ok(reply.is_some_and(|r| r.status == GrabStatus::SUCCESS))
    }

    fn ungrab_pointer(&self) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::ungrab_pointer(self, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn replay_pointer(&self, time: Timestamp) -> Result<()> {
        self.allow_events(Allow::REPLAY_POINTER, time)?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::set_input_focus(
            self,
            InputFocus::POINTER_ROOT,
            window,
            x11rb::CURRENT_TIME,
        )?;
        Ok(())
    }

    fn warp_pointer(&self, root: Window, x: i32, y: i32) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::warp_pointer(
            self,
            x11rb::NONE,
            root,
            0,
            0,
            0,
            0,
            coord(x),
            coord(y),
        )?;
        Ok(())
    }

    fn change_property32(
        &self,
        window: Window,
        property: u32,
        type_: u32,
        data: &[u32],
    ) -> Result<()> {
        x11rb::wrapper::ConnectionExt::change_property32(
            self,
            PropMode::REPLACE,
            window,
            property,
            type_,
            data,
        )?;
        Ok(())
    }

    fn change_property8(
        &self,
        window: Window,
        property: u32,
        type_: u32,
        data: &[u8],
    ) -> Result<()> {
        x11rb::wrapper::ConnectionExt::change_property8(
            self,
            PropMode::REPLACE,
            window,
            property,
            type_,
            data,
        )?;
        Ok(())
    }

    fn delete_property(&self, window: Window, property: u32) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::delete_property(self, window, property)?;
        Ok(())
    }

    fn send_client_message(&self, window: Window, type_: u32, data: [u32; 5]) -> Result<()> {
        let event = ClientMessageEvent::new(32, window, type_, data);
        self.send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(())
    }

    fn send_configure_notify(&self, window: Window, geometry: Rect, border: u32) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: coord(geometry.x),
            y: coord(geometry.y),
            width: extent(geometry.width),
            height: extent(geometry.height),
            border_width: u16::try_from(border).unwrap_or(u16::MAX),
            override_redirect: false,
        };
        self.send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::kill_client(self, window)?;
        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::grab_server(self)?;
        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        x11rb::protocol::xproto::ConnectionExt::ungrab_server(self)?;
        Ok(())
    }

    fn create_check_window(&self, root: Window) -> Result<Window> {
        let window = self.generate_id()?;
        self.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )?;
        Ok(window)
    }
}

/// Saturates a coordinate into the 16-bit wire range.
fn coord(value: i32) -> i16 {
    i16::try_from(value).unwrap_or(if value < 0 { i16::MIN } else { i16::MAX })
}

fn extent(value: i32) -> u16 {
    u16::try_from(value.max(0)).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_saturate() {
        assert_eq!(coord(-40), -40);
        assert_eq!(coord(70_000), i16::MAX);
        assert_eq!(coord(-70_000), i16::MIN);
        assert_eq!(extent(1920), 1920);
        assert_eq!(extent(-5), 0);
        assert_eq!(extent(100_000), u16::MAX);
    }
}
