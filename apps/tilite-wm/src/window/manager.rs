use tracing::{debug, info};
use x11rb::protocol::xproto::{
    AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ConfigureWindowAux, EventMask, Window,
};

use tilite_config::Settings;

use crate::core::conn::XConn;
use crate::core::context::Context;
use crate::core::cursors::Cursors;
use crate::ewmh::atoms::AtomCollection;
use crate::ewmh::state::{self, WmState};
use crate::ewmh::{hints, setup, strut};
use crate::window::client::Client;
use crate::window::drag::{DragState, MotionThrottle};
use crate::window::error::{ErrorTracker, Result};
use crate::window::geometry::{
    center_window, clamp, work_area, Margins, Rect, MIN_FLOATING_SIZE, MIN_WINDOW_SIZE,
};
use crate::window::keys::{Builtin, Direction, Keymap, SHIFT};
use crate::window::registry::{Registry, NUM_WORKSPACES};

pub struct WindowManager<C> {
    pub ctx: Context<C>,
    pub settings: Settings,
    pub cursors: Cursors,
    pub registry: Registry,
    pub keymap: Keymap,
    pub drag_state: DragState,
    /// Space reserved by docks, refreshed on every retile.
    pub margins: Margins,
    pub monocle: bool,
    /// New clients start floating while set.
    pub global_floating: bool,
    pub error_tracker: ErrorTracker,
    pub(crate) throttle: MotionThrottle,
    running: bool,
}

impl<C: XConn> WindowManager<C> {
    pub fn new(ctx: Context<C>, settings: Settings, cursors: Cursors) -> Self {
        Self {
            keymap: Keymap::new(settings.modkey),
            throttle: MotionThrottle::new(settings.motion_throttle),
            ctx,
            settings,
            cursors,
            registry: Registry::new(),
            drag_state: DragState::Idle,
            margins: Margins::default(),
            monocle: false,
            global_floating: false,
            error_tracker: ErrorTracker::new(),
            running: false,
        }
    }

    pub(crate) fn conn(&self) -> &C {
        &self.ctx.conn
    }

    pub(crate) fn atoms(&self) -> &AtomCollection {
        &self.ctx.atoms
    }

    pub(crate) fn root(&self) -> Window {
        self.ctx.root_window
    }

    pub(crate) fn screen(&self) -> (i32, i32) {
        (self.ctx.screen_width, self.ctx.screen_height)
    }

    pub(crate) fn border(&self) -> u32 {
        self.settings.border_width.max(0) as u32
    }

    /// Publishes the EWMH root properties and installs every grab.
    pub fn setup(&mut self) -> Result<()> {
        let root = self.root();
        if self.cursors.normal != x11rb::NONE {
            self.conn().change_attributes(
                root,
                &ChangeWindowAttributesAux::new().cursor(self.cursors.normal),
            )?;
        }

        let (sw, sh) = self.screen();
        self.margins = strut::scan(self.conn(), self.atoms(), root, sw, sh)?;
        setup::setup_hints(self.conn(), self.atoms(), root, work_area(sw, sh, self.margins))?;

        self.grab_keys()?;

        let modkey = self.settings.modkey;
        let guards = self.keymap.locks().guards();
        for (button, mods) in [
            (ButtonIndex::M1, modkey),
            (ButtonIndex::M1, modkey | SHIFT),
            (ButtonIndex::M3, modkey),
        ] {
            for guard in guards {
                self.conn().grab_button(root, button, mods | guard, true)?;
            }
        }

        self.conn().flush()?;
        info!("Window manager ready");
        Ok(())
    }

    /// Resolves every binding against the current keyboard mapping and
    /// regrabs it on the root window.
    pub fn grab_keys(&mut self) -> Result<()> {
        let keyboard = self.conn().keyboard_mapping()?;
        let modifiers = self.conn().modifier_mapping()?;
        self.keymap.refresh(&keyboard, &modifiers);

        let root = self.root();
        self.conn().ungrab_keys(root)?;
        let grabs = self.keymap.grabs();
        for &(keycode, mods) in &grabs {
            self.conn().grab_key(root, keycode, mods)?;
        }
        debug!("Grabbed {} key combinations", grabs.len());
        Ok(())
    }

    fn grab_client_buttons(&self, window: Window) -> Result<()> {
        let modkey = self.settings.modkey;
        let guards = self.keymap.locks().guards();
        for (button, mods) in [
            (ButtonIndex::M1, 0),
            (ButtonIndex::M1, modkey),
            (ButtonIndex::M1, modkey | SHIFT),
            (ButtonIndex::M3, modkey),
        ] {
            for guard in guards {
                self.conn().grab_button(window, button, mods | guard, false)?;
            }
        }
        Ok(())
    }

    /// Adopts windows that were already on screen when we started.
    pub fn scan_windows(&mut self) -> Result<()> {
        let Some((_, children)) = self.conn().query_tree(self.root())? else {
            return Ok(());
        };
        info!("Scanning {} windows...", children.len());

        for window in children {
            let Some(attrs) = self.conn().attributes(window)? else {
                continue;
            };
            if attrs.viewable && !attrs.override_redirect {
                self.map_request(window)?;
            }
        }
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        self.running = true;
        while self.running {
            self.conn().flush()?;
            let event = self.conn().wait_for_event()?;
            self.handle_event(event)?;
            while self.running {
                let Some(event) = self.conn().poll_for_event()? else {
                    break;
                };
                self.handle_event(event)?;
            }
        }
        info!(
            "Exiting ({} ignored and {} unexpected X errors)",
            self.error_tracker.ignored(),
            self.error_tracker.unexpected()
        );
        Ok(())
    }

    pub fn quit(&mut self) {
        info!("Quit requested");
        self.running = false;
    }

    // --- client lifecycle ---

    /// Starts managing `window` with the classification already decided.
    /// Returns false when the window vanished first.
    pub(crate) fn register(
        &mut self,
        window: Window,
        workspace: usize,
        floating: bool,
        fixed: bool,
    ) -> Result<bool> {
        let Some(geometry) = self.conn().geometry(window)? else {
            return Ok(false);
        };

        let mut client = Client::new(window, geometry, workspace);
        client.is_floating = floating || self.global_floating;
        client.is_fixed = fixed;
        client.pid = hints::pid(self.conn(), self.atoms(), window)?;

        // ButtonPress is exclusive to one client and the application usually
        // holds it; the button grabs below deliver presses to us instead.
        let event_mask = EventMask::ENTER_WINDOW
            | EventMask::LEAVE_WINDOW
            | EventMask::FOCUS_CHANGE
            | EventMask::PROPERTY_CHANGE
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::BUTTON_RELEASE
            | EventMask::POINTER_MOTION;
        self.conn()
            .change_attributes(window, &ChangeWindowAttributesAux::new().event_mask(event_mask))?;
        self.grab_client_buttons(window)?;
        self.advertise_delete_window(window)?;

        debug!(
            "Managing window {:#x} (pid {}, floating {}, fixed {}) on workspace {}",
            window, client.pid, client.is_floating, fixed, workspace
        );
        self.registry.insert(client);
        state::set_window_desktop(self.conn(), self.atoms(), window, workspace)?;
        self.conn().raise_window(window)?;
        Ok(true)
    }

    /// Adds `WM_DELETE_WINDOW` to the client's `WM_PROTOCOLS`, keeping the rest.
    fn advertise_delete_window(&self, window: Window) -> Result<()> {
        let atoms = self.atoms();
        let mut protocols = self
            .conn()
            .property32(window, atoms.WM_PROTOCOLS, AtomEnum::ATOM.into(), 64)?
            .unwrap_or_default();
        if protocols.contains(&atoms.WM_DELETE_WINDOW) {
            return Ok(());
        }
        protocols.push(atoms.WM_DELETE_WINDOW);
        self.conn()
            .change_property32(window, atoms.WM_PROTOCOLS, AtomEnum::ATOM.into(), &protocols)
    }

    /// Forgets a destroyed window and hands focus to a neighbour.
    pub fn unregister(&mut self, window: Window) -> Result<()> {
        let Some(removed) = self.registry.remove(window) else {
            return Ok(());
        };
        debug!("Unmanaging window {:#x}", window);
        self.publish_client_list()?;

        if removed.client.workspace != self.registry.current {
            return Ok(());
        }
        self.tile()?;

        let ws = self.registry.current_workspace();
        let next = removed
            .prev
            .filter(|&p| ws.get(p).is_some_and(|c| c.is_mapped))
            .or_else(|| ws.first_mapped());
        self.set_input_focus(next, true, true)
    }

    pub fn publish_client_list(&self) -> Result<()> {
        let windows = self.registry.all_windows();
        state::set_client_list(self.conn(), self.atoms(), self.root(), &windows)
    }

    fn publish_desktops(&self) -> Result<()> {
        for index in 0..NUM_WORKSPACES {
            for client in &self.registry.workspace(index).clients {
                state::set_window_desktop(self.conn(), self.atoms(), client.window, index)?;
            }
        }
        Ok(())
    }

    // --- layout ---

    /// Refreshes the dock reservations and republishes `_NET_WORKAREA`.
    fn update_struts(&mut self) -> Result<()> {
        let (sw, sh) = self.screen();
        self.margins = strut::scan(self.conn(), self.atoms(), self.root(), sw, sh)?;
        state::set_workarea(self.conn(), self.atoms(), self.root(), work_area(sw, sh, self.margins))
    }

    /// Area handed to the tree: the work area minus the outer gaps.
    pub fn tiling_area(&self) -> Rect {
        let (sw, sh) = self.screen();
        let area = work_area(sw, sh, self.margins);
        let gaps = self.settings.gaps;
        Rect::new(
            area.x + gaps,
            area.y + gaps,
            (area.width - 2 * gaps).max(1),
            (area.height - 2 * gaps).max(1),
        )
    }

    /// Lays out the tileable clients of the current workspace.
    pub fn tile(&mut self) -> Result<()> {
        self.update_struts()?;

        let current = self.registry.current;
        let tileable = self.registry.workspace(current).tileable();
        if tileable.is_empty() {
            return Ok(());
        }

        let area = self.tiling_area();
        let gaps = self.settings.gaps;
        let placements: Vec<(Window, Rect)> = if self.monocle {
            tileable.iter().map(|&w| (w, area)).collect()
        } else {
            let tree = &mut self.registry.workspace_mut(current).tree;
            if tree.is_empty() {
                let mut anchor = None;
                for &window in &tileable {
                    tree.insert(anchor, window);
                    anchor = Some(window);
                }
            }
            tree.layout(area, gaps)
        };

        let border = self.settings.border_width;
        for (window, slot) in placements {
            let target = slot.shrink_border(border);
            let Some(client) = self.registry.find_mut(window) else {
                continue;
            };
            if client.geometry == target && !self.monocle {
                continue;
            }
            client.geometry = target;
            configure_rect(&self.ctx.conn, window, target, Some(self.border()))?;
        }

        if self.monocle {
            if let Some(focused) = self.registry.focused_client().filter(|c| c.is_tileable()) {
                self.conn().raise_window(focused.window)?;
            }
        }
        self.update_borders()
    }

    pub fn update_borders(&self) -> Result<()> {
        let focused = self.registry.focused;
        for client in &self.registry.current_workspace().clients {
            let pixel = if Some(client.window) == focused {
                self.settings.focused_border
            } else {
                self.settings.unfocused_border
            };
            self.conn().set_border(client.window, pixel)?;
        }
        if focused.is_some() {
            state::set_active_window(self.conn(), self.atoms(), self.root(), focused)?;
        }
        Ok(())
    }

    pub fn toggle_monocle(&mut self) -> Result<()> {
        self.monocle = !self.monocle;
        debug!("Monocle {}", if self.monocle { "on" } else { "off" });
        self.tile()?;
        if let Some(focused) = self.registry.focused {
            self.set_input_focus(Some(focused), true, true)?;
        }
        Ok(())
    }

    pub fn inc_gaps(&mut self) -> Result<()> {
        self.settings.gaps += 1;
        self.tile()
    }

    pub fn dec_gaps(&mut self) -> Result<()> {
        self.settings.gaps = (self.settings.gaps - 1).max(0);
        self.tile()
    }

    // --- focus ---

    /// Gives keyboard focus to `target`, or to the root when it is `None` or
    /// not a mapped client.
    pub fn set_input_focus(&mut self, target: Option<Window>, raise: bool, warp: bool) -> Result<()> {
        let client = target
            .and_then(|w| self.registry.find(w))
            .filter(|c| c.is_mapped)
            .cloned();

        match client {
            Some(client) => {
                let window = client.window;
                self.registry.focused = Some(window);
                self.registry.workspace_mut(client.workspace).last_focused = Some(window);

                self.conn().set_input_focus(window)?;
                self.send_take_focus(window)?;
                if raise && (self.monocle || client.is_floating || !self.settings.floating_on_top) {
                    self.conn().raise_window(window)?;
                }
                self.update_borders()?;
                if warp && self.settings.warp_cursor {
                    self.warp_to(client.geometry)?;
                }
            }
            None => {
                self.registry.focused = None;
                self.registry.current_workspace_mut().last_focused = None;
                self.conn().set_input_focus(self.root())?;
                state::set_active_window(self.conn(), self.atoms(), self.root(), None)?;
                self.update_borders()?;
            }
        }
        self.conn().flush()
    }

    fn send_take_focus(&self, window: Window) -> Result<()> {
        let atoms = self.atoms();
        if hints::supports_protocol(self.conn(), atoms, window, atoms.WM_TAKE_FOCUS)? {
            self.conn().send_client_message(
                window,
                atoms.WM_PROTOCOLS,
                [atoms.WM_TAKE_FOCUS, x11rb::CURRENT_TIME, 0, 0, 0],
            )?;
        }
        Ok(())
    }

    fn warp_to(&self, geometry: Rect) -> Result<()> {
        let (x, y) = geometry.center();
        self.conn().warp_pointer(self.root(), x, y)
    }

    pub fn focus_next(&mut self) -> Result<()> {
        self.cycle_focus(true)
    }

    pub fn focus_prev(&mut self) -> Result<()> {
        self.cycle_focus(false)
    }

    fn cycle_focus(&mut self, forward: bool) -> Result<()> {
        match self.registry.cycle(forward) {
            Some(window) => self.set_input_focus(Some(window), true, true),
            None => Ok(()),
        }
    }

    pub fn move_focused_next(&mut self) -> Result<()> {
        self.move_focused(true)
    }

    pub fn move_focused_prev(&mut self) -> Result<()> {
        self.move_focused(false)
    }

    fn move_focused(&mut self, forward: bool) -> Result<()> {
        let Some(focused) = self.registry.focused else {
            return Ok(());
        };
        let ws = self.registry.current_workspace();
        let Some(pos) = ws.position(focused) else {
            return Ok(());
        };
        let other = if forward { Some(pos + 1) } else { pos.checked_sub(1) };
        let neighbour = other.and_then(|p| ws.clients.get(p)).map(|c| c.window);

        if !self.registry.move_focused(forward) {
            return Ok(());
        }
        if let Some(other) = neighbour {
            self.registry.current_workspace_mut().tree.swap(focused, other);
        }
        self.tile()?;

        if let Some(client) = self.registry.find(focused) {
            if self.settings.warp_cursor {
                self.warp_to(client.geometry)?;
            }
        }
        self.send_take_focus(focused)
    }

    /// Activates a client on request, switching to its workspace first.
    pub fn activate(&mut self, window: Window) -> Result<()> {
        let Some(workspace) = self.registry.workspace_of(window) else {
            return Ok(());
        };
        if workspace != self.registry.current {
            self.change_workspace(workspace)?;
        }
        self.set_input_focus(Some(window), true, true)
    }

    // --- window state ---

    pub fn apply_fullscreen(&mut self, window: Window, on: bool) -> Result<()> {
        let Some(client) = self.registry.find(window) else {
            return Ok(());
        };
        if !client.is_mapped || client.is_fullscreen == on {
            return Ok(());
        }
        let workspace = client.workspace;
        let fullscreen = self.atoms()._NET_WM_STATE_FULLSCREEN;

        if on {
            let Some(live) = self.conn().geometry(window)? else {
                return Ok(());
            };
            let (sw, sh) = self.screen();
            let screen = Rect::new(0, 0, sw, sh);

            self.registry.workspace_mut(workspace).tree.remove(window);
            if let Some(c) = self.registry.find_mut(window) {
                c.saved_geometry = Some(live);
                c.is_fullscreen = true;
                c.geometry = screen;
            }
            configure_rect(&self.ctx.conn, window, screen, Some(0))?;
            self.conn().raise_window(window)?;
            state::set_state(self.conn(), self.atoms(), window, fullscreen, true)?;
            debug!("Window {:#x} fullscreen", window);
            return Ok(());
        }

        let Some(c) = self.registry.find_mut(window) else {
            return Ok(());
        };
        c.is_fullscreen = false;
        let restored = c.saved_geometry.take().unwrap_or(c.geometry);
        c.geometry = restored;
        let tileable = c.is_tileable();

        configure_rect(&self.ctx.conn, window, restored, Some(self.border()))?;
        state::set_state(self.conn(), self.atoms(), window, fullscreen, false)?;
        if tileable {
            let ws = self.registry.workspace_mut(workspace);
            let anchor = ws.tileable_before(window);
            ws.tree.insert(anchor, window);
        }
        debug!("Window {:#x} left fullscreen", window);

        if workspace == self.registry.current {
            self.tile()?;
        }
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        let Some(client) = self.registry.focused_client() else {
            return Ok(());
        };
        let (window, on) = (client.window, !client.is_fullscreen);
        self.apply_fullscreen(window, on)
    }

    /// Flips the focused client between tiled and floating.
    pub fn toggle_floating(&mut self) -> Result<()> {
        let Some(window) = self.registry.focused else {
            return Ok(());
        };
        if self.registry.find(window).is_some_and(|c| c.is_fullscreen) {
            self.apply_fullscreen(window, false)?;
        }
        let live = self.conn().geometry(window)?;
        let Some(client) = self.registry.find_mut(window) else {
            return Ok(());
        };

        client.is_floating = !client.is_floating;
        let floating = client.is_floating;
        let workspace = client.workspace;
        if floating {
            if let Some(live) = live {
                client.geometry = live;
            }
            let geometry = client.geometry;
            self.registry.workspace_mut(workspace).tree.remove(window);
            configure_rect(&self.ctx.conn, window, geometry, None)?;
        } else if client.is_tileable() {
            self.registry.workspace_mut(workspace).tree.insert(None, window);
        }
        debug!("Window {:#x} floating: {}", window, floating);

        self.tile()?;
        if floating {
            self.set_input_focus(Some(window), true, false)?;
        }
        Ok(())
    }

    /// Floats every client of the current workspace, or tiles them all back
    /// when none is tiled.
    pub fn toggle_floating_global(&mut self) -> Result<()> {
        self.global_floating = !self.global_floating;
        let ws = self.registry.current_workspace();
        let float_all = ws.clients.iter().any(|c| !c.is_floating);
        let windows: Vec<Window> = ws.clients.iter().map(|c| c.window).collect();

        if !float_all {
            self.registry.current_workspace_mut().tree.clear();
        }
        for window in windows {
            let live = if float_all { self.conn().geometry(window)? } else { None };
            let Some(client) = self.registry.find_mut(window) else {
                continue;
            };
            client.is_floating = float_all;
            if let Some(live) = live {
                client.geometry = live;
            }
            if float_all {
                let geometry = client.geometry;
                self.registry.current_workspace_mut().tree.remove(window);
                configure_rect(&self.ctx.conn, window, geometry, None)?;
                self.conn().raise_window(window)?;
            }
        }
        debug!("All windows floating: {}", float_all);
        self.tile()
    }

    // --- workspaces ---

    pub fn change_workspace(&mut self, target: usize) -> Result<()> {
        let current = self.registry.current;
        if target >= NUM_WORKSPACES || target == current {
            return Ok(());
        }
        debug!("Switching workspace {} -> {}", current + 1, target + 1);

        self.registry.workspace_mut(current).last_focused = self.registry.focused;
        self.conn().grab_server()?;

        for client in self.registry.workspace(current).clients.iter().filter(|c| c.is_mapped) {
            self.conn().unmap_window(client.window)?;
        }
        self.registry.current = target;
        self.registry.focused = None;
        for client in self.registry.workspace(target).clients.iter().filter(|c| c.is_mapped) {
            self.conn().map_window(client.window)?;
        }

        self.tile()?;
        let ws = self.registry.workspace(target);
        let next = ws
            .last_focused
            .filter(|&w| ws.get(w).is_some_and(|c| c.is_mapped))
            .or_else(|| ws.first_mapped());
        self.set_input_focus(next, false, true)?;

        state::set_current_desktop(self.conn(), self.atoms(), self.root(), target)?;
        self.publish_desktops()?;
        self.conn().ungrab_server()?;
        self.conn().flush()
    }

    /// Sends the focused client to another workspace.
    pub fn move_to_workspace(&mut self, target: usize) -> Result<()> {
        let Some(window) = self.registry.focused else {
            return Ok(());
        };
        if target >= NUM_WORKSPACES || target == self.registry.current {
            return Ok(());
        }

        self.conn().unmap_window(window)?;
        if !self.registry.move_to_workspace(window, target) {
            return Ok(());
        }
        state::set_window_desktop(self.conn(), self.atoms(), window, target)?;
        debug!("Moved window {:#x} to workspace {}", window, target + 1);

        self.registry.focused = None;
        self.tile()?;
        let head = self.registry.current_workspace().clients.first().map(|c| c.window);
        self.set_input_focus(head, false, false)
    }

    // --- keyboard actions ---

    pub fn close_focused(&mut self) -> Result<()> {
        let Some(window) = self.registry.focused else {
            return Ok(());
        };
        let atoms = self.atoms();
        if hints::supports_protocol(self.conn(), atoms, window, atoms.WM_DELETE_WINDOW)? {
            debug!("Asking window {:#x} to close", window);
            return self.conn().send_client_message(
                window,
                atoms.WM_PROTOCOLS,
                [atoms.WM_DELETE_WINDOW, x11rb::CURRENT_TIME, 0, 0, 0],
            );
        }
        debug!("Killing window {:#x}", window);
        self.conn().unmap_window(window)?;
        self.conn().kill_client(window)
    }

    fn focused_floating(&self) -> Option<Client> {
        self.registry
            .focused_client()
            .filter(|c| c.is_floating && !c.is_fullscreen)
            .cloned()
    }

    pub fn move_window(&mut self, direction: Direction) -> Result<()> {
        let Some(client) = self.focused_floating() else {
            return Ok(());
        };
        let amount = self.settings.move_window_amt;
        let mut g = client.geometry;
        match direction {
            Direction::Up => g.y -= amount,
            Direction::Down => g.y += amount,
            Direction::Left => g.x -= amount,
            Direction::Right => g.x += amount,
        }
        self.apply_floating_geometry(client.window, g)
    }

    pub fn resize_window(&mut self, direction: Direction) -> Result<()> {
        let Some(client) = self.focused_floating() else {
            return Ok(());
        };
        let amount = self.settings.resize_window_amt;
        let (sw, sh) = self.screen();
        let mut g = client.geometry;
        match direction {
            Direction::Up => g.height = clamp(g.height - amount, MIN_WINDOW_SIZE, g.height),
            Direction::Down => g.height = clamp(g.height + amount, MIN_WINDOW_SIZE, sh - g.y),
            Direction::Left => g.width = clamp(g.width - amount, MIN_WINDOW_SIZE, g.width),
            Direction::Right => g.width = clamp(g.width + amount, MIN_WINDOW_SIZE, sw - g.x),
        }
        self.apply_floating_geometry(client.window, g)
    }

    fn apply_floating_geometry(&mut self, window: Window, geometry: Rect) -> Result<()> {
        if let Some(c) = self.registry.find_mut(window) {
            c.geometry = geometry;
        }
        configure_rect(&self.ctx.conn, window, geometry, None)
    }

    pub fn run_builtin(&mut self, op: Builtin) -> Result<()> {
        match op {
            Builtin::CloseFocused => self.close_focused(),
            Builtin::Quit => {
                self.quit();
                Ok(())
            }
            Builtin::ToggleMonocle => self.toggle_monocle(),
            Builtin::FocusNext => self.focus_next(),
            Builtin::FocusPrev => self.focus_prev(),
            Builtin::MoveFocusedNext => self.move_focused_next(),
            Builtin::MoveFocusedPrev => self.move_focused_prev(),
            Builtin::MoveWindow(d) => self.move_window(d),
            Builtin::ResizeWindow(d) => self.resize_window(d),
            Builtin::ToggleFloating => self.toggle_floating(),
            Builtin::ToggleFloatingGlobal => self.toggle_floating_global(),
            Builtin::ToggleFullscreen => self.toggle_fullscreen(),
            Builtin::IncGaps => self.inc_gaps(),
            Builtin::DecGaps => self.dec_gaps(),
        }
    }

    /// Places a freshly classified floating client in the middle of the
    /// screen, no smaller than `MIN_FLOATING_SIZE`.
    pub(crate) fn center_floating(&mut self, window: Window) -> Result<()> {
        let Some(client) = self.registry.find(window) else {
            return Ok(());
        };
        let (sw, sh) = self.screen();
        let width = client.geometry.width.max(MIN_FLOATING_SIZE);
        let height = client.geometry.height.max(MIN_FLOATING_SIZE);
        let (x, y) = center_window(sw, sh, width, height);
        let centered = Rect::new(x, y, width, height);

        if let Some(c) = self.registry.find_mut(window) {
            c.geometry = centered;
        }
        configure_rect(&self.ctx.conn, window, centered, Some(self.border()))
    }

    pub(crate) fn set_wm_state(&self, window: Window, wm_state: WmState) -> Result<()> {
        state::set_wm_state(self.conn(), self.atoms(), window, wm_state)
    }
}

/// Moves and resizes `window`, optionally setting its border width too.
pub(crate) fn configure_rect<C: XConn>(
    conn: &C,
    window: Window,
    rect: Rect,
    border: Option<u32>,
) -> Result<()> {
    let mut aux = ConfigureWindowAux::new()
        .x(rect.x)
        .y(rect.y)
        .width(rect.width.max(1) as u32)
        .height(rect.height.max(1) as u32);
    if let Some(border) = border {
        aux = aux.border_width(border);
    }
    conn.configure_window(window, &aux)
}
