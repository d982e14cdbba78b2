//! Client records and the nine workspaces that own them.
//!
//! A workspace keeps its clients in a `Vec`; the order is both the tiling
//! order used to rebuild a tree and the focus cycling order. The registry
//! holds no X connection: the manager turns its answers into requests.

use x11rb::protocol::xproto::Window;

use crate::window::bsp::BspTree;
use crate::window::client::Client;

pub const NUM_WORKSPACES: usize = 9;
pub const MAX_CLIENTS: usize = 99;

#[derive(Debug, Default)]
pub struct Workspace {
    pub clients: Vec<Client>,
    pub last_focused: Option<Window>,
    pub tree: BspTree<Window>,
}

impl Workspace {
    pub fn position(&self, window: Window) -> Option<usize> {
        self.clients.iter().position(|c| c.window == window)
    }

    pub fn get(&self, window: Window) -> Option<&Client> {
        self.clients.iter().find(|c| c.window == window)
    }

    /// Tileable clients in list order.
    pub fn tileable(&self) -> Vec<Window> {
        self.clients
            .iter()
            .filter(|c| c.is_tileable())
            .map(|c| c.window)
            .collect()
    }

    pub fn first_mapped(&self) -> Option<Window> {
        self.clients.iter().find(|c| c.is_mapped).map(|c| c.window)
    }

    /// Closest tileable client before `window` in list order.
    pub fn tileable_before(&self, window: Window) -> Option<Window> {
        let pos = self.position(window)?;
        self.clients[..pos]
            .iter()
            .rev()
            .find(|c| c.is_tileable())
            .map(|c| c.window)
    }
}

/// A client that was just unlinked from its workspace.
#[derive(Debug)]
pub struct Removed {
    pub client: Client,
    /// The list neighbour that preceded it, if any.
    pub prev: Option<Window>,
}

#[derive(Debug)]
pub struct Registry {
    workspaces: [Workspace; NUM_WORKSPACES],
    pub current: usize,
    pub focused: Option<Window>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            workspaces: std::array::from_fn(|_| Workspace::default()),
            current: 0,
            focused: None,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workspaces.iter().map(|ws| ws.clients.len()).sum()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= MAX_CLIENTS
    }

    pub fn workspace(&self, index: usize) -> &Workspace {
        &self.workspaces[index]
    }

    pub fn workspace_mut(&mut self, index: usize) -> &mut Workspace {
        &mut self.workspaces[index]
    }

    pub fn current_workspace(&self) -> &Workspace {
        &self.workspaces[self.current]
    }

    pub fn current_workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspaces[self.current]
    }

    pub fn workspace_of(&self, window: Window) -> Option<usize> {
        self.workspaces.iter().position(|ws| ws.position(window).is_some())
    }

    pub fn find(&self, window: Window) -> Option<&Client> {
        self.workspaces.iter().find_map(|ws| ws.get(window))
    }

    pub fn find_mut(&mut self, window: Window) -> Option<&mut Client> {
        self.workspaces
            .iter_mut()
            .find_map(|ws| ws.clients.iter_mut().find(|c| c.window == window))
    }

    pub fn focused_client(&self) -> Option<&Client> {
        self.focused.and_then(|w| self.find(w))
    }

    /// Every managed window, workspace by workspace, in list order.
    pub fn all_windows(&self) -> Vec<Window> {
        self.workspaces
            .iter()
            .flat_map(|ws| ws.clients.iter().map(|c| c.window))
            .collect()
    }

    /// Adds a fully classified client to its workspace.
    ///
    /// It lands right after the focused client when that one lives on the
    /// same workspace, otherwise at the tail. A tileable client splits the
    /// focused client's leaf.
    pub fn insert(&mut self, client: Client) {
        let index = client.workspace;
        let window = client.window;
        let tileable = client.is_tileable();
        let sibling = self
            .focused
            .filter(|&f| self.workspaces[index].position(f).is_some());

        let ws = &mut self.workspaces[index];
        match sibling.and_then(|f| ws.position(f)) {
            Some(pos) => ws.clients.insert(pos + 1, client),
            None => ws.clients.push(client),
        }
        if tileable {
            ws.tree.insert(sibling, window);
        }
        if ws.last_focused.is_none() {
            ws.last_focused = Some(window);
        }

        if index == self.current && self.focused.is_none() {
            self.focused = Some(window);
        }
    }

    /// Unlinks `window` from its workspace and forgets every focus reference
    /// to it, including its tree leaf.
    pub fn remove(&mut self, window: Window) -> Option<Removed> {
        let index = self.workspace_of(window)?;

        for ws in &mut self.workspaces {
            if ws.last_focused == Some(window) {
                ws.last_focused = None;
            }
        }
        if self.focused == Some(window) {
            self.focused = None;
        }

        let ws = &mut self.workspaces[index];
        let pos = ws.position(window)?;
        let prev = pos.checked_sub(1).map(|p| ws.clients[p].window);
        let client = ws.clients.remove(pos);
        ws.tree.remove(window);

        Some(Removed { client, prev })
    }

    /// Next (or previous) mapped client on the current workspace, wrapping
    /// around. `None` when nothing there is mapped.
    pub fn cycle(&self, forward: bool) -> Option<Window> {
        let ws = self.current_workspace();
        let n = ws.clients.len();
        if n == 0 {
            return None;
        }
        // Unfocused: forward starts at the head, backward at the tail.
        let start = match self.focused.and_then(|f| ws.position(f)) {
            Some(pos) => pos,
            None if forward => n - 1,
            None => 0,
        };

        (1..=n)
            .map(|step| {
                if forward {
                    (start + step) % n
                } else {
                    (start + n * step - step) % n
                }
            })
            .map(|i| &ws.clients[i])
            .find(|c| c.is_mapped)
            .map(|c| c.window)
    }

    /// Exchanges the list positions of two clients of the current workspace.
    pub fn swap(&mut self, a: Window, b: Window) -> bool {
        if a == b {
            return false;
        }
        let ws = self.current_workspace_mut();
        match (ws.position(a), ws.position(b)) {
            (Some(pa), Some(pb)) => {
                ws.clients.swap(pa, pb);
                true
            }
            _ => false,
        }
    }

    /// Swaps the focused client with its list neighbour. No wrap-around.
    pub fn move_focused(&mut self, forward: bool) -> bool {
        let Some(focused) = self.focused else {
            return false;
        };
        let ws = self.current_workspace_mut();
        let Some(pos) = ws.position(focused) else {
            return false;
        };
        let other = if forward {
            pos + 1
        } else if pos > 0 {
            pos - 1
        } else {
            return false;
        };
        if other >= ws.clients.len() {
            return false;
        }
        ws.clients.swap(pos, other);
        true
    }

    /// Moves `window` from the current workspace to the front of `target`.
    /// A tileable client joins the target tree with no anchor.
    pub fn move_to_workspace(&mut self, window: Window, target: usize) -> bool {
        if target >= NUM_WORKSPACES || target == self.current {
            return false;
        }
        let source = self.current_workspace_mut();
        let Some(pos) = source.position(window) else {
            return false;
        };
        let mut client = source.clients.remove(pos);
        source.tree.remove(window);

        client.workspace = target;
        let tileable = client.is_tileable();
        let dest = &mut self.workspaces[target];
        if tileable {
            dest.tree.insert(None, window);
        }
        dest.clients.insert(0, client);
        dest.last_focused = Some(window);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::geometry::Rect;

    fn client(window: Window, workspace: usize) -> Client {
        Client::new(window, Rect::new(0, 0, 100, 100), workspace)
    }

    fn registry_with(windows: &[Window]) -> Registry {
        let mut reg = Registry::new();
        for &w in windows {
            reg.insert(client(w, 0));
        }
        reg
    }

    fn order(reg: &Registry, ws: usize) -> Vec<Window> {
        reg.workspace(ws).clients.iter().map(|c| c.window).collect()
    }

    #[test]
    fn test_insert_lands_after_focused() {
        let mut reg = registry_with(&[1, 2]);
        // 1 was adopted as focus, so 2 went right after it.
        assert_eq!(reg.focused, Some(1));
        assert_eq!(order(&reg, 0), vec![1, 2]);

        reg.insert(client(3, 0));
        assert_eq!(order(&reg, 0), vec![1, 3, 2]);
        assert_eq!(reg.workspace(0).tree.leaf_count(), 3);
    }

    #[test]
    fn test_insert_on_other_workspace_appends() {
        let mut reg = registry_with(&[1]);
        reg.insert(client(10, 4));
        reg.insert(client(11, 4));
        assert_eq!(order(&reg, 4), vec![10, 11]);
        assert_eq!(reg.workspace(4).last_focused, Some(10));
        assert_eq!(reg.focused, Some(1));
    }

    #[test]
    fn test_floating_client_stays_out_of_tree() {
        let mut reg = registry_with(&[1]);
        let mut c = client(2, 0);
        c.is_floating = true;
        reg.insert(c);
        assert_eq!(reg.workspace(0).clients.len(), 2);
        assert_eq!(reg.workspace(0).tree.leaf_count(), 1);
    }

    #[test]
    fn test_remove_purges_focus_and_leaf() {
        let mut reg = registry_with(&[1, 2, 3]);
        reg.focused = Some(3);
        reg.workspace_mut(0).last_focused = Some(3);

        let removed = reg.remove(3).unwrap();
        assert_eq!(removed.client.window, 3);
        assert_eq!(removed.prev, Some(1));
        assert_eq!(reg.focused, None);
        assert_eq!(reg.workspace(0).last_focused, None);
        assert!(!reg.workspace(0).tree.contains(3));
        assert!(reg.remove(3).is_none());
    }

    #[test]
    fn test_cycle_visits_every_mapped_client_once() {
        let mut reg = registry_with(&[1, 2, 3, 4]);
        let mut seen = Vec::new();
        for _ in 0..4 {
            let next = reg.cycle(true).unwrap();
            reg.focused = Some(next);
            seen.push(next);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3, 4]);

        reg.focused = Some(1);
        let mut back = Vec::new();
        for _ in 0..4 {
            let prev = reg.cycle(false).unwrap();
            reg.focused = Some(prev);
            back.push(prev);
        }
        assert_eq!(back, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_cycle_skips_unmapped() {
        let mut reg = registry_with(&[1, 2, 3]);
        reg.find_mut(2).unwrap().is_mapped = false;
        reg.focused = Some(1);
        assert_eq!(order(&reg, 0), vec![1, 3, 2]);
        assert_eq!(reg.cycle(true), Some(3));
        assert_eq!(reg.cycle(false), Some(3));
    }

    #[test]
    fn test_cycle_without_focus_starts_at_ends() {
        let mut reg = registry_with(&[1, 2, 3]);
        reg.focused = None;
        assert_eq!(order(&reg, 0), vec![1, 3, 2]);
        assert_eq!(reg.cycle(true), Some(1));
        assert_eq!(reg.cycle(false), Some(2));

        reg.find_mut(1).unwrap().is_mapped = false;
        assert_eq!(reg.cycle(true), Some(3));
    }

    #[test]
    fn test_cycle_with_nothing_mapped() {
        let mut reg = registry_with(&[1, 2]);
        for w in [1, 2] {
            reg.find_mut(w).unwrap().is_mapped = false;
        }
        assert_eq!(reg.cycle(true), None);
        assert_eq!(reg.cycle(false), None);
        assert_eq!(Registry::new().cycle(true), None);
    }

    #[test]
    fn test_swap_adjacent_and_distant() {
        let mut reg = registry_with(&[1]);
        for w in [2, 3, 4] {
            reg.focused = Some(w - 1);
            reg.insert(client(w, 0));
        }
        assert_eq!(order(&reg, 0), vec![1, 2, 3, 4]);

        assert!(reg.swap(2, 3));
        assert_eq!(order(&reg, 0), vec![1, 3, 2, 4]);
        assert!(reg.swap(1, 4));
        assert_eq!(order(&reg, 0), vec![4, 3, 2, 1]);
        assert!(!reg.swap(4, 4));
        assert!(!reg.swap(4, 99));
    }

    #[test]
    fn test_move_focused_stops_at_ends() {
        let mut reg = registry_with(&[1, 2]);
        reg.focused = Some(1);
        assert!(!reg.move_focused(false));
        assert!(reg.move_focused(true));
        assert_eq!(order(&reg, 0), vec![2, 1]);
        assert!(!reg.move_focused(true));
    }

    #[test]
    fn test_move_to_workspace() {
        let mut reg = registry_with(&[1, 2, 3]);
        reg.insert(client(9, 2));

        assert!(reg.move_to_workspace(2, 2));
        assert_eq!(reg.workspace(0).tree.leaf_count(), 2);
        assert_eq!(reg.workspace(2).tree.leaf_count(), 2);
        assert_eq!(order(&reg, 2), vec![2, 9]);
        assert_eq!(reg.workspace(2).last_focused, Some(2));
        assert_eq!(reg.find(2).unwrap().workspace, 2);

        assert!(!reg.move_to_workspace(1, 0));
        assert!(!reg.move_to_workspace(1, NUM_WORKSPACES));
    }

    #[test]
    fn test_move_floating_to_workspace_is_list_only() {
        let mut reg = registry_with(&[1]);
        let mut c = client(2, 0);
        c.is_floating = true;
        reg.insert(c);

        assert!(reg.move_to_workspace(2, 5));
        assert_eq!(reg.workspace(0).tree.leaf_count(), 1);
        assert_eq!(reg.workspace(5).tree.leaf_count(), 0);
        assert_eq!(order(&reg, 5), vec![2]);
    }

    #[test]
    fn test_tileable_before() {
        let mut reg = registry_with(&[1, 2, 3]);
        // order: 1, 3, 2
        reg.find_mut(3).unwrap().is_floating = true;
        assert_eq!(reg.workspace(0).tileable_before(2), Some(1));
        assert_eq!(reg.workspace(0).tileable_before(1), None);
    }

    #[test]
    fn test_capacity() {
        let mut reg = Registry::new();
        for w in 0..MAX_CLIENTS as Window {
            assert!(!reg.is_full());
            reg.insert(client(w + 1, (w as usize) % NUM_WORKSPACES));
        }
        assert!(reg.is_full());
        assert_eq!(reg.all_windows().len(), MAX_CLIENTS);
    }
}
