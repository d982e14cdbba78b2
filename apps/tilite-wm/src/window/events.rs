//! Event dispatch: one handler per X event the manager reacts to.

use tracing::{debug, warn};
use x11rb::protocol::xproto::{
    AtomEnum, ButtonPressEvent, ClientMessageEvent, ConfigWindow, ConfigureNotifyEvent,
    ConfigureRequestEvent, ConfigureWindowAux, KeyPressEvent, Mapping, MappingNotifyEvent,
    MotionNotifyEvent, PropertyNotifyEvent, UnmapNotifyEvent, Window,
};
use x11rb::protocol::Event;

use crate::core::conn::XConn;
use crate::ewmh::hints;
use crate::ewmh::state::{self, WmState};
use crate::window::drag::{
    classify_press, move_position, resize_size, DragOrigin, DragState, Press,
};
use crate::window::error::Result;
use crate::window::keys::Action;
use crate::window::manager::{configure_rect, WindowManager};
use crate::window::registry::MAX_CLIENTS;
use crate::window::spawn::spawn;

impl<C: XConn> WindowManager<C> {
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::ButtonPress(e) => self.on_button_press(e),
            Event::ButtonRelease(_) => self.on_button_release(),
            Event::ClientMessage(e) => self.on_client_message(e),
            Event::ConfigureNotify(e) => self.on_configure_notify(e),
            Event::ConfigureRequest(e) => self.on_configure_request(e),
            Event::DestroyNotify(e) => self.unregister(e.window),
            Event::KeyPress(e) => self.on_key_press(e),
            Event::MappingNotify(e) => self.on_mapping_notify(e),
            Event::MapRequest(e) => self.map_request(e.window),
            Event::MotionNotify(e) => self.on_motion(e),
            Event::PropertyNotify(e) => self.on_property_notify(e),
            Event::UnmapNotify(e) => self.on_unmap_notify(e),
            Event::Error(e) => {
                self.error_tracker.record(&e);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Decides whether and how to manage a window asking to be mapped.
    pub fn map_request(&mut self, window: Window) -> Result<()> {
        let Some(attrs) = self.conn().attributes(window)? else {
            return Ok(());
        };
        let Some(geometry) = self.conn().geometry(window)? else {
            return Ok(());
        };
        if attrs.override_redirect || geometry.width <= 0 || geometry.height <= 0 {
            return self.conn().map_window(window);
        }
        if self.registry.find(window).is_some() {
            return self.remap(window);
        }

        let atoms = self.atoms();
        let types = hints::window_types(self.conn(), atoms, window)?;
        if types.contains(&atoms._NET_WM_WINDOW_TYPE_DOCK) {
            debug!("Window {:#x} is a dock, mapping unmanaged", window);
            self.conn().map_window(window)?;
            return self.tile();
        }
        if self.registry.is_full() {
            warn!("Already managing {} windows, ignoring {:#x}", MAX_CLIENTS, window);
            return Ok(());
        }

        let floating_types = atoms.floating_types();
        let fixed = hints::size_limits(self.conn(), window)?.is_some_and(|l| l.is_fixed());
        let floating = fixed
            || types.iter().any(|t| floating_types.contains(t))
            || hints::is_transient(self.conn(), window)?;
        let wants_fullscreen =
            state::has_state(self.conn(), atoms, window, atoms._NET_WM_STATE_FULLSCREEN)?;

        let workspace = self.registry.current;
        if !self.register(window, workspace, floating, fixed)? {
            return Ok(());
        }
        self.set_wm_state(window, WmState::Normal)?;
        self.publish_client_list()?;

        let is_floating = self.registry.find(window).is_some_and(|c| c.is_floating);
        if wants_fullscreen {
            if let Some(c) = self.registry.find_mut(window) {
                c.is_floating = false;
            }
        } else if is_floating {
            self.center_floating(window)?;
            self.conn().raise_window(window)?;
        } else {
            self.tile()?;
        }

        self.conn().map_window(window)?;
        if wants_fullscreen {
            self.apply_fullscreen(window, true)?;
        }
        state::set_frame_extents(self.conn(), self.atoms(), window, self.border())?;

        if self.settings.new_win_focus {
            self.set_input_focus(Some(window), true, true)
        } else {
            self.update_borders()
        }
    }

    /// A known client mapped itself again.
    fn remap(&mut self, window: Window) -> Result<()> {
        let current = self.registry.current;
        let focused = self.registry.focused;
        let Some(client) = self.registry.find_mut(window) else {
            return Ok(());
        };
        if client.workspace != current {
            return Ok(());
        }

        if !client.is_mapped {
            client.is_mapped = true;
            let tileable = client.is_tileable();
            self.conn().map_window(window)?;
            if tileable {
                let anchor = focused.filter(|&f| f != window);
                self.registry.current_workspace_mut().tree.insert(anchor, window);
            }
            self.set_wm_state(window, WmState::Normal)?;
            self.tile()?;
        }

        if self.settings.new_win_focus {
            self.set_input_focus(Some(window), true, true)
        } else {
            self.update_borders()
        }
    }

    fn on_unmap_notify(&mut self, event: UnmapNotifyEvent) -> Result<()> {
        let window = event.window;
        let ws = self.registry.current_workspace_mut();
        let Some(client) = ws.clients.iter_mut().find(|c| c.window == window && c.is_mapped) else {
            return Ok(());
        };
        client.is_mapped = false;
        ws.tree.remove(window);
        debug!("Window {:#x} unmapped", window);

        self.set_wm_state(window, WmState::Withdrawn)?;
        self.publish_client_list()?;
        self.tile()?;

        if self.registry.focused == Some(window) {
            let next = self.registry.current_workspace().first_mapped();
            self.set_input_focus(next, true, false)
        } else {
            self.update_borders()
        }
    }

    fn on_configure_request(&mut self, event: ConfigureRequestEvent) -> Result<()> {
        let window = event.window;
        if let Some(c) = self.registry.find(window) {
            if !c.is_floating && !c.is_fullscreen {
                return self.conn().send_configure_notify(window, c.geometry, self.border());
            }
        }

        let mask = u16::from(event.value_mask);
        let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
        let mut aux = ConfigureWindowAux::new();
        if has(ConfigWindow::X) {
            aux = aux.x(i32::from(event.x));
        }
        if has(ConfigWindow::Y) {
            aux = aux.y(i32::from(event.y));
        }
        if has(ConfigWindow::WIDTH) {
            aux = aux.width(u32::from(event.width));
        }
        if has(ConfigWindow::HEIGHT) {
            aux = aux.height(u32::from(event.height));
        }
        if has(ConfigWindow::BORDER_WIDTH) {
            aux = aux.border_width(u32::from(event.border_width));
        }
        if has(ConfigWindow::SIBLING) {
            aux = aux.sibling(event.sibling);
        }
        if has(ConfigWindow::STACK_MODE) {
            aux = aux.stack_mode(event.stack_mode);
        }
        self.conn().configure_window(window, &aux)?;

        if let Some(c) = self.registry.find_mut(window).filter(|c| c.is_floating && !c.is_fullscreen) {
            let g = &mut c.geometry;
            g.x = aux.x.unwrap_or(g.x);
            g.y = aux.y.unwrap_or(g.y);
            g.width = aux.width.map_or(g.width, |w| w as i32);
            g.height = aux.height.map_or(g.height, |h| h as i32);
        }
        Ok(())
    }

    fn on_configure_notify(&mut self, event: ConfigureNotifyEvent) -> Result<()> {
        if event.window != self.root() {
            return Ok(());
        }
        let (width, height) = (i32::from(event.width), i32::from(event.height));
        if (width, height) == self.screen() {
            return Ok(());
        }
        debug!("Screen resized to {}x{}", width, height);
        self.ctx.screen_width = width;
        self.ctx.screen_height = height;
        self.tile()
    }

    fn on_client_message(&mut self, event: ClientMessageEvent) -> Result<()> {
        let atoms = self.atoms();
        let (current_desktop, active_window, wm_state, fullscreen) = (
            atoms._NET_CURRENT_DESKTOP,
            atoms._NET_ACTIVE_WINDOW,
            atoms._NET_WM_STATE,
            atoms._NET_WM_STATE_FULLSCREEN,
        );
        let data = event.data.as_data32();

        if event.type_ == current_desktop {
            self.change_workspace(data[0] as usize)
        } else if event.type_ == active_window {
            self.activate(event.window)
        } else if event.type_ == wm_state {
            if data[1] != fullscreen && data[2] != fullscreen {
                return Ok(());
            }
            let Some(client) = self.registry.find(event.window) else {
                return Ok(());
            };
            let on = match data[0] {
                0 => false,
                1 => true,
                2 => !client.is_fullscreen,
                _ => return Ok(()),
            };
            self.apply_fullscreen(event.window, on)
        } else {
            Ok(())
        }
    }

    fn on_property_notify(&mut self, event: PropertyNotifyEvent) -> Result<()> {
        let atoms = self.atoms();
        let root = self.root();

        if event.window == root && event.atom == atoms._NET_CURRENT_DESKTOP {
            let value = self.conn().property32(
                root,
                atoms._NET_CURRENT_DESKTOP,
                AtomEnum::CARDINAL.into(),
                1,
            )?;
            return match value {
                Some(v) => self.change_workspace(v[0] as usize),
                None => Ok(()),
            };
        }

        if event.atom == atoms._NET_WM_STRUT_PARTIAL || event.atom == atoms._NET_WM_STRUT {
            debug!("Strut changed on {:#x}", event.window);
            return self.tile();
        }

        if event.atom == atoms._NET_WM_STATE {
            let Some(is_fullscreen) = self.registry.find(event.window).map(|c| c.is_fullscreen) else {
                return Ok(());
            };
            let wants =
                state::has_state(self.conn(), atoms, event.window, atoms._NET_WM_STATE_FULLSCREEN)?;
            if wants != is_fullscreen {
                return self.apply_fullscreen(event.window, wants);
            }
        }
        Ok(())
    }

    fn on_key_press(&mut self, event: KeyPressEvent) -> Result<()> {
        let state = u16::from(event.state);
        let Some(action) = self.keymap.lookup(event.detail, state).cloned() else {
            return Ok(());
        };
        debug!("Key {} (state {:#x}): {:?}", event.detail, state, action);

        match action {
            Action::Spawn(argv) => {
                spawn(&argv);
                Ok(())
            }
            Action::Builtin(op) => self.run_builtin(op),
            Action::SwitchWorkspace(n) => {
                self.change_workspace(n)?;
                self.publish_client_list()
            }
            Action::MoveToWorkspace(n) => {
                self.move_to_workspace(n)?;
                self.publish_client_list()
            }
        }
    }

    fn on_mapping_notify(&mut self, event: MappingNotifyEvent) -> Result<()> {
        if event.request == Mapping::KEYBOARD || event.request == Mapping::MODIFIER {
            debug!("Keyboard mapping changed, regrabbing keys");
            self.grab_keys()?;
        }
        Ok(())
    }

    /// Walks up from `window` to the root's child that contains it.
    fn toplevel(&self, mut window: Window) -> Result<Window> {
        let root = self.root();
        while window != root && self.registry.find(window).is_none() {
            let Some((parent, _)) = self.conn().query_tree(window)? else {
                break;
            };
            if parent == root || parent == x11rb::NONE {
                break;
            }
            window = parent;
        }
        Ok(window)
    }

    fn on_button_press(&mut self, event: ButtonPressEvent) -> Result<()> {
        self.conn().replay_pointer(event.time)?;

        let clicked = if event.child != x11rb::NONE { event.child } else { event.event };
        let window = self.toplevel(clicked)?;
        let Some(client) = self.registry.current_workspace().get(window).cloned() else {
            return Ok(());
        };

        let press = classify_press(
            u16::from(event.state),
            event.detail,
            self.settings.modkey,
            client.is_floating,
            client.is_fixed,
        );
        let pointer = (i32::from(event.root_x), i32::from(event.root_y));

        match press {
            Press::Swap => {
                if !self.conn().grab_pointer(self.root(), self.cursors.move_)? {
                    debug!("Pointer grab refused, not swapping {:#x}", window);
                    return Ok(());
                }
                self.drag_state = DragState::Swapping { window, target: None };
                self.set_input_focus(Some(window), false, false)?;
                self.conn().set_border(window, self.settings.swap_border)
            }
            Press::Focus => self.set_input_focus(Some(window), true, false),
            Press::FloatOnly => {
                self.registry.focused = Some(window);
                self.toggle_floating()
            }
            Press::Drag { tear_off, resize } => {
                if tear_off {
                    self.registry.focused = Some(window);
                    self.toggle_floating()?;
                }
                let Some(geometry) = self.registry.find(window).map(|c| c.geometry) else {
                    return Ok(());
                };
                let cursor = if resize { self.cursors.resize } else { self.cursors.move_ };
                if !self.conn().grab_pointer(self.root(), cursor)? {
                    debug!("Pointer grab refused, not dragging {:#x}", window);
                    return Ok(());
                }
                let origin = DragOrigin::new(pointer, geometry);
                self.drag_state = if resize {
                    DragState::Resizing { window, origin }
                } else {
                    DragState::Moving { window, origin }
                };
                self.set_input_focus(Some(window), true, false)
            }
            Press::Ignore => Ok(()),
        }
    }

    fn on_motion(&mut self, event: MotionNotifyEvent) -> Result<()> {
        if self.drag_state.is_idle() || !self.throttle.accept(event.time) {
            return Ok(());
        }
        let pointer = (i32::from(event.root_x), i32::from(event.root_y));

        match self.drag_state {
            DragState::Idle => Ok(()),
            DragState::Swapping { window, target } => self.update_swap_target(window, target),
            DragState::Moving { window, origin } => self.drag_move(window, &origin, pointer),
            DragState::Resizing { window, origin } => self.drag_resize(window, &origin, pointer),
        }
    }

    fn border_pixel(&self, window: Window) -> u32 {
        if self.registry.focused == Some(window) {
            self.settings.focused_border
        } else {
            self.settings.unfocused_border
        }
    }

    fn update_swap_target(&mut self, window: Window, target: Option<Window>) -> Result<()> {
        let child = self.conn().pointer_child(self.root())?;
        let parent = match child {
            Some(c) => self.conn().query_tree(c)?.map(|(p, _)| p),
            None => None,
        };
        let candidate = child.and_then(|child| {
            self.registry
                .current_workspace()
                .clients
                .iter()
                .filter(|c| !c.is_floating && c.window != window)
                .find(|c| c.window == child || Some(c.window) == parent)
                .map(|c| c.window)
        });
        if candidate == target {
            return Ok(());
        }

        if let Some(old) = target {
            self.conn().set_border(old, self.border_pixel(old))?;
        }
        if let Some(new) = candidate {
            self.conn().set_border(new, self.settings.swap_border)?;
        }
        self.drag_state = DragState::Swapping { window, target: candidate };
        Ok(())
    }

    fn drag_move(&mut self, window: Window, origin: &DragOrigin, pointer: (i32, i32)) -> Result<()> {
        let snap = self.settings.snap_distance;
        let (x, y) = move_position(origin, pointer, self.settings.border_width, self.screen(), snap);
        let Some(client) = self.registry.find_mut(window) else {
            return Ok(());
        };
        client.geometry.x = x;
        client.geometry.y = y;
        self.conn()
            .configure_window(window, &ConfigureWindowAux::new().x(x).y(y))
    }

    fn drag_resize(&mut self, window: Window, origin: &DragOrigin, pointer: (i32, i32)) -> Result<()> {
        let screen = self.screen();
        let Some(client) = self.registry.find_mut(window) else {
            return Ok(());
        };
        let g = client.geometry;
        let (width, height) = resize_size(origin, pointer, (g.x, g.y), screen);
        client.geometry.width = width;
        client.geometry.height = height;
        let resized = client.geometry;
        configure_rect(&self.ctx.conn, window, resized, None)
    }

    fn on_button_release(&mut self) -> Result<()> {
        let finished = std::mem::take(&mut self.drag_state);
        if let DragState::Swapping { window, target } = finished {
            if let Some(target) = target {
                if self.registry.swap(window, target) {
                    self.registry.current_workspace_mut().tree.swap(window, target);
                    debug!("Swapped {:#x} with {:#x}", window, target);
                }
            }
            // Repaints the subject as well as the target.
            self.tile()?;
            self.update_borders()?;
        }
        self.conn().ungrab_pointer()
    }
}
