//! Keyboard bindings.
//!
//! The table is static apart from the modifier, which comes from the
//! configuration. Keysyms are resolved to keycodes against the server's
//! keyboard mapping whenever that mapping changes.

use tracing::{debug, warn};
use x11rb::protocol::xproto::{Keycode, Keysym};

use crate::window::spawn::split_cmd;

pub const SHIFT: u16 = 1 << 0;
pub const LOCK: u16 = 1 << 1;

pub mod keysym {
    use x11rb::protocol::xproto::Keysym;

    pub const SPACE: Keysym = 0x0020;
    pub const MINUS: Keysym = 0x002d;
    pub const NUM_0: Keysym = 0x0030;
    pub const NUM_1: Keysym = 0x0031;
    pub const EQUAL: Keysym = 0x003d;
    pub const E: Keysym = 0x0065;
    pub const F: Keysym = 0x0066;
    pub const J: Keysym = 0x006a;
    pub const K: Keysym = 0x006b;
    pub const M: Keysym = 0x006d;
    pub const Q: Keysym = 0x0071;
    pub const W: Keysym = 0x0077;
    pub const RETURN: Keysym = 0xff0d;
    pub const LEFT: Keysym = 0xff51;
    pub const UP: Keysym = 0xff52;
    pub const RIGHT: Keysym = 0xff53;
    pub const DOWN: Keysym = 0xff54;
    pub const MODE_SWITCH: Keysym = 0xff7e;
    pub const NUM_LOCK: Keysym = 0xff7f;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    CloseFocused,
    Quit,
    ToggleMonocle,
    FocusNext,
    FocusPrev,
    MoveFocusedNext,
    MoveFocusedPrev,
    MoveWindow(Direction),
    ResizeWindow(Direction),
    ToggleFloating,
    ToggleFloatingGlobal,
    ToggleFullscreen,
    IncGaps,
    DecGaps,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Spawn(Vec<String>),
    Builtin(Builtin),
    SwitchWorkspace(usize),
    MoveToWorkspace(usize),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub mods: u16,
    pub keysym: Keysym,
    pub keycode: Option<Keycode>,
    pub action: Action,
}

impl Binding {
    fn new(mods: u16, keysym: Keysym, action: Action) -> Self {
        Self {
            mods,
            keysym,
            keycode: None,
            action,
        }
    }
}

/// Reply of `GetKeyboardMapping` for the full keycode range.
#[derive(Debug, Clone, Default)]
pub struct KeyboardMapping {
    pub min_keycode: Keycode,
    pub keysyms_per_keycode: u8,
    pub keysyms: Vec<Keysym>,
}

impl KeyboardMapping {
    /// First keycode producing `sym` in any column.
    pub fn keycode(&self, sym: Keysym) -> Option<Keycode> {
        let per = usize::from(self.keysyms_per_keycode);
        if per == 0 {
            return None;
        }
        self.keysyms
            .chunks(per)
            .position(|chunk| chunk.contains(&sym))
            .and_then(|i| u8::try_from(usize::from(self.min_keycode) + i).ok())
    }
}

/// Reply of `GetModifierMapping`: eight rows of keycodes, one per modifier.
#[derive(Debug, Clone, Default)]
pub struct ModifierMapping {
    pub keycodes_per_modifier: u8,
    pub keycodes: Vec<Keycode>,
}

impl ModifierMapping {
    /// Modifier bit the keycode is bound to, if any.
    pub fn mask_of(&self, keycode: Keycode) -> u16 {
        let per = usize::from(self.keycodes_per_modifier);
        if per == 0 || keycode == 0 {
            return 0;
        }
        self.keycodes
            .chunks(per)
            .take(8)
            .position(|row| row.contains(&keycode))
            .map(|i| 1 << i)
            .unwrap_or(0)
    }
}

/// Lock-style modifiers that must not influence binding matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockMasks {
    pub numlock: u16,
    pub mode_switch: u16,
}

impl LockMasks {
    pub fn resolve(keyboard: &KeyboardMapping, modifiers: &ModifierMapping) -> Self {
        let mask = |sym| keyboard.keycode(sym).map(|kc| modifiers.mask_of(kc)).unwrap_or(0);
        Self {
            numlock: mask(keysym::NUM_LOCK),
            mode_switch: mask(keysym::MODE_SWITCH),
        }
    }

    pub fn clean(&self, mask: u16) -> u16 {
        mask & !(LOCK | self.numlock | self.mode_switch)
    }

    /// Every combination of the lock modifiers, grabbed alongside each binding.
    pub fn guards(&self) -> [u16; 8] {
        let (n, m) = (self.numlock, self.mode_switch);
        [0, LOCK, n, LOCK | n, m, LOCK | m, n | m, LOCK | n | m]
    }
}

pub struct Keymap {
    bindings: Vec<Binding>,
    locks: LockMasks,
}

impl Keymap {
    pub fn new(modkey: u16) -> Self {
        Self {
            bindings: default_bindings(modkey),
            locks: LockMasks::default(),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn locks(&self) -> LockMasks {
        self.locks
    }

    /// Re-resolves the lock masks and every keycode.
    pub fn refresh(&mut self, keyboard: &KeyboardMapping, modifiers: &ModifierMapping) {
        self.locks = LockMasks::resolve(keyboard, modifiers);
        for binding in &mut self.bindings {
            binding.keycode = keyboard.keycode(binding.keysym);
            if binding.keycode.is_none() {
                warn!("No keycode for keysym {:#x}, binding disabled", binding.keysym);
            }
        }
        debug!(
            "Lock masks: numlock {:#x}, mode_switch {:#x}",
            self.locks.numlock, self.locks.mode_switch
        );
    }

    /// `(keycode, modifiers)` pairs to grab on the root window.
    pub fn grabs(&self) -> Vec<(Keycode, u16)> {
        let guards = self.locks.guards();
        let mut out = Vec::new();
        for binding in &self.bindings {
            let Some(keycode) = binding.keycode else {
                continue;
            };
            out.extend(guards.iter().map(|guard| (keycode, binding.mods | guard)));
        }
        out
    }

    pub fn lookup(&self, keycode: Keycode, state: u16) -> Option<&Action> {
        let mods = self.locks.clean(state);
        self.bindings
            .iter()
            .find(|b| b.keycode == Some(keycode) && self.locks.clean(b.mods) == mods)
            .map(|b| &b.action)
    }
}

fn spawn(mods: u16, sym: Keysym, cmd: &str) -> Binding {
    Binding::new(mods, sym, Action::Spawn(split_cmd(cmd)))
}

fn builtin(mods: u16, sym: Keysym, op: Builtin) -> Binding {
    Binding::new(mods, sym, Action::Builtin(op))
}

pub fn default_bindings(modkey: u16) -> Vec<Binding> {
    use keysym::*;
    use Builtin::*;
    use Direction::*;

    let m = modkey;
    let ms = modkey | SHIFT;

    let mut binds = vec![
        spawn(m, RETURN, "kitty"),
        spawn(m, W, "surf git.bance.dev"),
        spawn(m, SPACE, "dmenu_run"),
        spawn(m, EQUAL, "pactl set-sink-volume @DEFAULT_SINK@ +5%"),
        spawn(m, MINUS, "pactl set-sink-volume @DEFAULT_SINK@ -5%"),
        spawn(m, NUM_0, "pactl set-sink-mute @DEFAULT_SINK@ toggle"),
        builtin(m, Q, CloseFocused),
        builtin(ms, E, Quit),
        builtin(m, M, ToggleMonocle),
        builtin(m, J, FocusNext),
        builtin(m, K, FocusPrev),
        builtin(ms, J, MoveFocusedNext),
        builtin(ms, K, MoveFocusedPrev),
        builtin(m, UP, MoveWindow(Up)),
        builtin(m, DOWN, MoveWindow(Down)),
        builtin(m, LEFT, MoveWindow(Left)),
        builtin(m, RIGHT, MoveWindow(Right)),
        builtin(ms, UP, ResizeWindow(Up)),
        builtin(ms, DOWN, ResizeWindow(Down)),
        builtin(ms, LEFT, ResizeWindow(Left)),
        builtin(ms, RIGHT, ResizeWindow(Right)),
        builtin(m, F, ToggleFloating),
        builtin(ms, SPACE, ToggleFloatingGlobal),
        builtin(ms, F, ToggleFullscreen),
        builtin(ms, EQUAL, IncGaps),
        builtin(ms, MINUS, DecGaps),
    ];

    for ws in 0..9u32 {
        binds.push(Binding::new(m, NUM_1 + ws, Action::SwitchWorkspace(ws as usize)));
        binds.push(Binding::new(ms, NUM_1 + ws, Action::MoveToWorkspace(ws as usize)));
    }
    binds
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOD4: u16 = 1 << 6;
    const MOD2: u16 = 1 << 4;

    // Two columns per keycode starting at 8; keycode 10 is `j`, 11 is Num_Lock.
    fn keyboard() -> KeyboardMapping {
        let mut keysyms = vec![0; 2 * 60];
        let mut set = |keycode: usize, sym| keysyms[(keycode - 8) * 2] = sym;
        set(10, keysym::J);
        set(11, keysym::NUM_LOCK);
        set(12, keysym::RETURN);
        set(13, keysym::NUM_1);
        KeyboardMapping {
            min_keycode: 8,
            keysyms_per_keycode: 2,
            keysyms,
        }
    }

    fn modifiers() -> ModifierMapping {
        // shift, lock, control, mod1, mod2 (numlock), mod3, mod4, mod5
        ModifierMapping {
            keycodes_per_modifier: 2,
            keycodes: vec![50, 62, 66, 0, 37, 105, 64, 108, 11, 0, 0, 0, 133, 134, 92, 0],
        }
    }

    #[test]
    fn test_keycode_lookup() {
        let kb = keyboard();
        assert_eq!(kb.keycode(keysym::J), Some(10));
        assert_eq!(kb.keycode(keysym::RETURN), Some(12));
        assert_eq!(kb.keycode(keysym::Q), None);
    }

    #[test]
    fn test_numlock_mask_resolved_from_modifier_map() {
        let locks = LockMasks::resolve(&keyboard(), &modifiers());
        assert_eq!(locks.numlock, MOD2);
        assert_eq!(locks.mode_switch, 0);
    }

    #[test]
    fn test_guards_cover_all_lock_combinations() {
        let locks = LockMasks { numlock: MOD2, mode_switch: 1 << 7 };
        let guards = locks.guards();
        let mut unique = guards.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 8);
        assert!(guards.contains(&(LOCK | MOD2 | (1 << 7))));
    }

    #[test]
    fn test_lookup_ignores_lock_modifiers() {
        let mut keymap = Keymap::new(MOD4);
        keymap.refresh(&keyboard(), &modifiers());

        let plain = keymap.lookup(10, MOD4);
        assert_eq!(plain, Some(&Action::Builtin(Builtin::FocusNext)));
        assert_eq!(keymap.lookup(10, MOD4 | LOCK | MOD2), plain);
        assert_eq!(
            keymap.lookup(10, MOD4 | SHIFT),
            Some(&Action::Builtin(Builtin::MoveFocusedNext))
        );
        assert_eq!(keymap.lookup(10, 0), None);
        assert_eq!(keymap.lookup(13, MOD4 | SHIFT), Some(&Action::MoveToWorkspace(0)));
    }

    #[test]
    fn test_grabs_only_resolved_bindings() {
        let mut keymap = Keymap::new(MOD4);
        keymap.refresh(&keyboard(), &modifiers());
        let grabs = keymap.grabs();

        // j: focus_next and move_focused_next; Return: spawn; 1: switch and move.
        assert_eq!(grabs.len(), 5 * 8);
        assert!(grabs.iter().all(|(kc, _)| [10, 12, 13].contains(kc)));
        assert!(grabs.contains(&(12, MOD4 | LOCK | MOD2)));
    }

    #[test]
    fn test_default_table_covers_workspaces() {
        let binds = default_bindings(MOD4);
        for ws in 0..9 {
            assert!(binds.iter().any(|b| b.action == Action::SwitchWorkspace(ws) && b.mods == MOD4));
            assert!(binds
                .iter()
                .any(|b| b.action == Action::MoveToWorkspace(ws) && b.mods == MOD4 | SHIFT));
        }
    }
}
