//! Keyboard shortcut registry.

use tactica_core::ToolKind;

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Tool(ToolKind),
    Undo,
    Redo,
    ToggleOrientation,
    DeleteSelected,
    ClearBoard,
    Save,
    SaveAs,
    Open,
    ExportPng,
    ExportDocument,
    Print,
    Cancel,
}

/// A key binding.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

impl Shortcut {
    const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: ShortcutAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    const fn tool(key: &'static str, tool: ToolKind, description: &'static str) -> Self {
        Self::new(key, false, false, ShortcutAction::Tool(tool), description)
    }

    /// Display form, e.g. "Ctrl+Shift+S".
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    /// Whether this binding matches a key press. Keys compare case-insensitively.
    pub fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.ctrl == ctrl && self.shift == shift && self.key.eq_ignore_ascii_case(key)
    }
}

pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        use ShortcutAction::*;
        vec![
            Shortcut::tool("V", ToolKind::Select, "Select"),
            Shortcut::tool("M", ToolKind::Move, "Move players and objects"),
            Shortcut::tool("P", ToolKind::Pencil, "Pencil"),
            Shortcut::tool("L", ToolKind::Line, "Line"),
            Shortcut::tool("D", ToolKind::DashedLine, "Dashed line (run)"),
            Shortcut::tool("A", ToolKind::Arrow, "Arrow (pass)"),
            Shortcut::tool("C", ToolKind::CurvedArrow, "Curved arrow"),
            Shortcut::tool("R", ToolKind::Rectangle, "Rectangle"),
            Shortcut::tool("O", ToolKind::Circle, "Circle"),
            Shortcut::tool("H", ToolKind::ShadedArea, "Shaded area"),
            Shortcut::tool("T", ToolKind::Text, "Text"),
            Shortcut::tool("E", ToolKind::Eraser, "Eraser"),
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("Z", true, true, Redo, "Redo"),
            Shortcut::new("Y", true, false, Redo, "Redo"),
            Shortcut::new("R", true, true, ToggleOrientation, "Toggle horizontal/vertical"),
            Shortcut::new("Delete", false, false, DeleteSelected, "Delete selected item"),
            Shortcut::new("Backspace", false, false, DeleteSelected, "Delete selected item"),
            Shortcut::new("Delete", true, true, ClearBoard, "Clear board"),
            Shortcut::new("S", true, false, Save, "Save"),
            Shortcut::new("S", true, true, SaveAs, "Save as..."),
            Shortcut::new("O", true, false, Open, "Open..."),
            Shortcut::new("E", true, false, ExportPng, "Export to PNG"),
            Shortcut::new("E", true, true, ExportDocument, "Export board document"),
            Shortcut::new("P", true, false, Print, "Print"),
            Shortcut::new("Escape", false, false, Cancel, "Cancel current action"),
        ]
    }

    /// First binding that matches the key press.
    pub fn lookup(key: &str, ctrl: bool, shift: bool) -> Option<ShortcutAction> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, ctrl, shift))
            .map(|s| s.action)
    }

    /// Table of all shortcuts, one per line.
    pub fn render() -> String {
        let mut out = String::from("=== Keyboard Shortcuts ===\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_format() {
        let redo = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.action == ShortcutAction::Redo)
            .unwrap();
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
    }

    #[test]
    fn test_bindings_are_unique() {
        let mut seen = HashSet::new();
        for s in ShortcutRegistry::all() {
            assert!(seen.insert((s.key, s.ctrl, s.shift)), "duplicate binding {}", s.format());
        }
    }

    #[test]
    fn test_every_tool_has_a_key() {
        let tools: HashSet<ToolKind> = ShortcutRegistry::all()
            .into_iter()
            .filter_map(|s| match s.action {
                ShortcutAction::Tool(tool) => Some(tool),
                _ => None,
            })
            .collect();
        assert_eq!(tools.len(), 12);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(ShortcutRegistry::lookup("z", true, false), Some(ShortcutAction::Undo));
        assert_eq!(
            ShortcutRegistry::lookup("r", false, false),
            Some(ShortcutAction::Tool(ToolKind::Rectangle))
        );
        assert_eq!(ShortcutRegistry::lookup("q", false, false), None);
    }
}
