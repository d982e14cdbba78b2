//! In-memory X server used by the manager tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use x11rb::errors::ConnectionError;
use x11rb::protocol::xproto::{
    ButtonIndex, ChangeWindowAttributesAux, ConfigureWindowAux, Cursor, Keycode, Keysym,
    Timestamp, Window,
};
use x11rb::protocol::Event;

use crate::core::conn::{WindowAttributes, XConn};
use crate::window::error::Result;
use crate::window::geometry::Rect;
use crate::window::keys::{keysym, KeyboardMapping, ModifierMapping};

pub const ROOT: Window = 1;
pub const SCREEN_WIDTH: i32 = 1000;
pub const SCREEN_HEIGHT: i32 = 600;

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Map(Window),
    Unmap(Window),
    Configure(Window, ConfigureWindowAux),
    ChangeAttributes(Window, ChangeWindowAttributesAux),
    GrabButton(Window, ButtonIndex, u16),
    GrabKey(Keycode, u16),
    UngrabKeys,
    GrabPointer(Cursor),
    UngrabPointer,
    ReplayPointer,
    Focus(Window),
    Warp(i32, i32),
    ClientMessage(Window, u32, [u32; 5]),
    ConfigureNotify(Window, Rect),
    Kill(Window),
    GrabServer,
    UngrabServer,
}

#[derive(Debug, Clone)]
struct FakeWindow {
    geometry: Rect,
    border_width: u32,
    border_pixel: Option<u32>,
    parent: Window,
    override_redirect: bool,
    mapped: bool,
}

#[derive(Default)]
struct State {
    requests: Vec<Request>,
    windows: HashMap<Window, FakeWindow>,
    stacking: Vec<Window>,
    props32: HashMap<(Window, u32), Vec<u32>>,
    props8: HashMap<(Window, u32), Vec<u8>>,
    events: VecDeque<Event>,
    pointer_child: Option<Window>,
    pointer_grab_refused: bool,
    focus: Option<Window>,
    next_id: u32,
}

/// Keysyms reachable on the fake keyboard, one per keycode starting at 8.
const KEYS: &[Keysym] = &[
    keysym::RETURN,
    keysym::SPACE,
    keysym::EQUAL,
    keysym::MINUS,
    keysym::NUM_0,
    keysym::E,
    keysym::F,
    keysym::J,
    keysym::K,
    keysym::M,
    keysym::Q,
    keysym::W,
    keysym::UP,
    keysym::DOWN,
    keysym::LEFT,
    keysym::RIGHT,
    keysym::NUM_LOCK,
    keysym::NUM_1,
    keysym::NUM_1 + 1,
    keysym::NUM_1 + 2,
    keysym::NUM_1 + 3,
    keysym::NUM_1 + 4,
    keysym::NUM_1 + 5,
    keysym::NUM_1 + 6,
    keysym::NUM_1 + 7,
    keysym::NUM_1 + 8,
];

pub struct FakeConn {
    state: RefCell<State>,
}

impl Default for FakeConn {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeConn {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                next_id: 0x0100_0000,
                ..State::default()
            }),
        }
    }

    /// Creates a top-level, unmapped client window.
    pub fn add_window(&self, window: Window, geometry: Rect) {
        let mut state = self.state.borrow_mut();
        state.windows.insert(
            window,
            FakeWindow {
                geometry,
                border_width: 0,
                border_pixel: None,
                parent: ROOT,
                override_redirect: false,
                mapped: false,
            },
        );
        state.stacking.push(window);
    }

    pub fn set_override_redirect(&self, window: Window) {
        if let Some(w) = self.state.borrow_mut().windows.get_mut(&window) {
            w.override_redirect = true;
        }
    }

    pub fn set_mapped(&self, window: Window, mapped: bool) {
        if let Some(w) = self.state.borrow_mut().windows.get_mut(&window) {
            w.mapped = mapped;
        }
    }

    pub fn set_parent(&self, window: Window, parent: Window) {
        if let Some(w) = self.state.borrow_mut().windows.get_mut(&window) {
            w.parent = parent;
        }
    }

    pub fn set_prop32(&self, window: Window, property: u32, data: &[u32]) {
        self.state
            .borrow_mut()
            .props32
            .insert((window, property), data.to_vec());
    }

    pub fn prop32(&self, window: Window, property: u32) -> Option<Vec<u32>> {
        self.state.borrow().props32.get(&(window, property)).cloned()
    }

    pub fn prop8(&self, window: Window, property: u32) -> Option<Vec<u8>> {
        self.state.borrow().props8.get(&(window, property)).cloned()
    }

    pub fn set_pointer_child(&self, window: Option<Window>) {
        self.state.borrow_mut().pointer_child = window;
    }

    /// Makes every later pointer grab fail as if another client held it.
    pub fn refuse_pointer_grabs(&self) {
        self.state.borrow_mut().pointer_grab_refused = true;
    }

    pub fn push_event(&self, event: Event) {
        self.state.borrow_mut().events.push_back(event);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }

    pub fn window_geometry(&self, window: Window) -> Option<Rect> {
        self.state.borrow().windows.get(&window).map(|w| w.geometry)
    }

    pub fn border_width(&self, window: Window) -> Option<u32> {
        self.state.borrow().windows.get(&window).map(|w| w.border_width)
    }

    pub fn border_pixel(&self, window: Window) -> Option<u32> {
        self.state
            .borrow()
            .windows
            .get(&window)
            .and_then(|w| w.border_pixel)
    }

    pub fn is_mapped(&self, window: Window) -> bool {
        self.state
            .borrow()
            .windows
            .get(&window)
            .is_some_and(|w| w.mapped)
    }

    pub fn focus(&self) -> Option<Window> {
        self.state.borrow().focus
    }

    /// Topmost window last.
    pub fn stacking(&self) -> Vec<Window> {
        self.state.borrow().stacking.clone()
    }

    pub fn keycode_of(sym: Keysym) -> Keycode {
        let index = KEYS.iter().position(|&k| k == sym).unwrap_or(0);
        8 + index as Keycode
    }

    fn record(&self, request: Request) {
        self.state.borrow_mut().requests.push(request);
    }
}

impl XConn for FakeConn {
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn wait_for_event(&self) -> Result<Event> {
        self.state
            .borrow_mut()
            .events
            .pop_front()
            .ok_or_else(|| ConnectionError::UnknownError.into())
    }

    fn poll_for_event(&self) -> Result<Option<Event>> {
        Ok(self.state.borrow_mut().events.pop_front())
    }

    fn geometry(&self, window: Window) -> Result<Option<Rect>> {
        Ok(self.window_geometry(window))
    }

    fn attributes(&self, window: Window) -> Result<Option<WindowAttributes>> {
        Ok(self.state.borrow().windows.get(&window).map(|w| WindowAttributes {
            override_redirect: w.override_redirect,
            viewable: w.mapped,
        }))
    }

    fn query_tree(&self, window: Window) -> Result<Option<(Window, Vec<Window>)>> {
        let state = self.state.borrow();
        let children = state
            .stacking
            .iter()
            .copied()
            .filter(|c| state.windows.get(c).is_some_and(|w| w.parent == window))
            .collect();
        if window == ROOT {
            return Ok(Some((x11rb::NONE, children)));
        }
        Ok(state.windows.get(&window).map(|w| (w.parent, children)))
    }

    fn pointer_child(&self, _root: Window) -> Result<Option<Window>> {
        Ok(self.state.borrow().pointer_child)
    }

    fn property32(
        &self,
        window: Window,
        property: u32,
        _type: u32,
        length: u32,
    ) -> Result<Option<Vec<u32>>> {
        Ok(self
            .prop32(window, property)
            .map(|mut v| {
                v.truncate(length as usize);
                v
            })
            .filter(|v| !v.is_empty()))
    }

    fn keyboard_mapping(&self) -> Result<KeyboardMapping> {
        Ok(KeyboardMapping {
            min_keycode: 8,
            keysyms_per_keycode: 1,
            keysyms: KEYS.to_vec(),
        })
    }

    fn modifier_mapping(&self) -> Result<ModifierMapping> {
        let mut keycodes = vec![0; 8];
        keycodes[4] = Self::keycode_of(keysym::NUM_LOCK);
        Ok(ModifierMapping {
            keycodes_per_modifier: 1,
            keycodes,
        })
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.set_mapped(window, true);
        self.record(Request::Map(window));
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.set_mapped(window, false);
        self.record(Request::Unmap(window));
        Ok(())
    }

    fn configure_window(&self, window: Window, aux: &ConfigureWindowAux) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if let Some(w) = state.windows.get_mut(&window) {
                let g = &mut w.geometry;
                g.x = aux.x.unwrap_or(g.x);
                g.y = aux.y.unwrap_or(g.y);
                g.width = aux.width.map_or(g.width, |v| v as i32);
                g.height = aux.height.map_or(g.height, |v| v as i32);
                w.border_width = aux.border_width.unwrap_or(w.border_width);
            }
            if aux.stack_mode.is_some() && state.windows.contains_key(&window) {
                state.stacking.retain(|&s| s != window);
                state.stacking.push(window);
            }
        }
        self.record(Request::Configure(window, aux.clone()));
        Ok(())
    }

    fn change_attributes(&self, window: Window, aux: &ChangeWindowAttributesAux) -> Result<()> {
        if let Some(pixel) = aux.border_pixel {
            if let Some(w) = self.state.borrow_mut().windows.get_mut(&window) {
                w.border_pixel = Some(pixel);
            }
        }
        self.record(Request::ChangeAttributes(window, aux.clone()));
        Ok(())
    }

    fn grab_button(
        &self,
        window: Window,
        button: ButtonIndex,
        modifiers: u16,
        _owner_events: bool,
    ) -> Result<()> {
        self.record(Request::GrabButton(window, button, modifiers));
        Ok(())
    }

    fn grab_key(&self, _root: Window, keycode: Keycode, modifiers: u16) -> Result<()> {
        self.record(Request::GrabKey(keycode, modifiers));
        Ok(())
    }

    fn ungrab_keys(&self, _root: Window) -> Result<()> {
        self.record(Request::UngrabKeys);
        Ok(())
    }

    fn grab_pointer(&self, _root: Window, cursor: Cursor) -> Result<bool> {
        self.record(Request::GrabPointer(cursor));
        Ok(!self.state.borrow().pointer_grab_refused)
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.record(Request::UngrabPointer);
        Ok(())
    }

    fn replay_pointer(&self, _time: Timestamp) -> Result<()> {
        self.record(Request::ReplayPointer);
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.state.borrow_mut().focus = Some(window);
        self.record(Request::Focus(window));
        Ok(())
    }

    fn warp_pointer(&self, _root: Window, x: i32, y: i32) -> Result<()> {
        self.record(Request::Warp(x, y));
        Ok(())
    }

    fn change_property32(
        &self,
        window: Window,
        property: u32,
        _type: u32,
        data: &[u32],
    ) -> Result<()> {
        self.set_prop32(window, property, data);
        Ok(())
    }

    fn change_property8(
        &self,
        window: Window,
        property: u32,
        _type: u32,
        data: &[u8],
    ) -> Result<()> {
        self.state
            .borrow_mut()
            .props8
            .insert((window, property), data.to_vec());
        Ok(())
    }

    fn delete_property(&self, window: Window, property: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.props32.remove(&(window, property));
        state.props8.remove(&(window, property));
        Ok(())
    }

    fn send_client_message(&self, window: Window, type_: u32, data: [u32; 5]) -> Result<()> {
        self.record(Request::ClientMessage(window, type_, data));
        Ok(())
    }

    fn send_configure_notify(&self, window: Window, geometry: Rect, _border: u32) -> Result<()> {
        self.record(Request::ConfigureNotify(window, geometry));
        Ok(())
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.record(Request::Kill(window));
        Ok(())
    }

    fn grab_server(&self) -> Result<()> {
        self.record(Request::GrabServer);
        Ok(())
    }

    fn ungrab_server(&self) -> Result<()> {
        self.record(Request::UngrabServer);
        Ok(())
    }

    fn create_check_window(&self, _root: Window) -> Result<Window> {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        Ok(state.next_id)
    }
}
