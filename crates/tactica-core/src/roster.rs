//! Team roster collaborator.

use crate::board::ColorRef;
use serde::{Deserialize, Serialize};

/// A squad member as supplied by the roster provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterPlayer {
    pub id: String,
    pub display_name: String,
    pub short_name: String,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub color_preference: Option<ColorRef>,
    #[serde(default)]
    pub avatar_ref: Option<String>,
}

/// Source of the current team's players.
///
/// The board only reads the roster to build its palette.
pub trait RosterProvider {
    fn roster(&self) -> Vec<RosterPlayer>;
}

/// A fixed roster, e.g. loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticRoster(pub Vec<RosterPlayer>);

impl RosterProvider for StaticRoster {
    fn roster(&self) -> Vec<RosterPlayer> {
        self.0.clone()
    }
}
