//! Theme variables and color resolution.
//!
//! Boards reference colors by theme name so the live editor can restyle
//! them. Exports have no live style environment, so every reference is
//! resolved to a concrete color first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tactica_core::board::{BoardState, ColorRef, Rgba};

/// Alias chains longer than this are treated as cycles.
const MAX_ALIAS_DEPTH: usize = 8;

/// Named colors. Values may alias other names (`"primary": "var(--home)"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: BTreeMap<String, ColorRef>,
    /// Used for names the theme does not define.
    pub fallback: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// The stock light theme.
    pub fn light() -> Self {
        let colors = [
            ("home", ColorRef::Rgba(Rgba::opaque(0x1e, 0x5e, 0xc8))),
            ("away", ColorRef::Rgba(Rgba::opaque(0xd6, 0x33, 0x33))),
            ("ink", ColorRef::Rgba(Rgba::opaque(0x1f, 0x1f, 0x1f))),
            ("accent", ColorRef::Rgba(Rgba::opaque(0xf2, 0xb1, 0x34))),
            ("cone", ColorRef::Rgba(Rgba::opaque(0xff, 0x7a, 0x00))),
            ("ball", ColorRef::Rgba(Rgba::WHITE)),
            ("primary", ColorRef::theme("home")),
            ("pitch", ColorRef::Rgba(Rgba::opaque(0x3a, 0x8f, 0x4b))),
            ("pitch-lines", ColorRef::Rgba(Rgba::new(0xff, 0xff, 0xff, 0xcc))),
        ];
        Self {
            colors: colors
                .into_iter()
                .map(|(name, color)| (name.to_string(), color))
                .collect(),
            fallback: Rgba::BLACK,
        }
    }

    /// Define or replace a theme variable.
    pub fn with(mut self, name: impl Into<String>, color: ColorRef) -> Self {
        self.colors.insert(name.into(), color);
        self
    }

    /// Resolve a color to a concrete value.
    pub fn resolve(&self, color: &ColorRef) -> Rgba {
        let mut current = color;
        for _ in 0..MAX_ALIAS_DEPTH {
            match current {
                ColorRef::Rgba(rgba) => return *rgba,
                ColorRef::Theme(name) => match self.colors.get(name) {
                    Some(next) => current = next,
                    None => {
                        log::warn!("Unknown theme color {:?}, using fallback", name);
                        return self.fallback;
                    }
                },
            }
        }
        log::warn!("Theme alias chain for {} is too deep, using fallback", color);
        self.fallback
    }

    /// Copy of `board` with every theme reference replaced by its value.
    pub fn resolve_board(&self, board: &BoardState) -> BoardState {
        let mut board = board.clone();
        for item in &mut board.items {
            if let Some(color) = &mut item.payload.color {
                *color = ColorRef::Rgba(self.resolve(color));
            }
        }
        for drawing in &mut board.drawings {
            drawing.color = ColorRef::Rgba(self.resolve(&drawing.color));
        }
        board
    }
}

/// Whether any color in `board` is still a theme reference.
pub(crate) fn has_theme_refs(board: &BoardState) -> bool {
    board
        .items
        .iter()
        .filter_map(|i| i.payload.color.as_ref())
        .chain(board.drawings.iter().map(|d| &d.color))
        .any(ColorRef::is_theme)
}
