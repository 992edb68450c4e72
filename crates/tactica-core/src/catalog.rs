//! Diagram catalog: named, persisted boards.
//!
//! Geometry is always written in [`Orientation::CANONICAL`]; the editor's
//! orientation at save time is kept only as metadata.

use crate::board::{BoardState, RawBoard};
use crate::geometry::{Orientation, from_canonical, to_canonical};
use crate::storage::{Storage, StorageError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Unique identifier for diagrams.
pub type DiagramId = Uuid;

/// Longest accepted diagram name, in characters.
pub const MAX_NAME_LEN: usize = 120;

/// A persisted diagram record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: DiagramId,
    pub name: String,
    pub author_id: String,
    #[serde(default)]
    pub author_display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_ref: Option<String>,
    /// Layout the editor was in when the diagram was last saved. The
    /// attached geometry is always stored in [`Orientation::CANONICAL`].
    #[serde(default, alias = "canonicalOrientation")]
    pub saved_orientation: Orientation,
    /// Data URI or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Diagram {
    pub fn new(
        name: impl Into<String>,
        author_id: impl Into<String>,
        author_display_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            author_id: author_id.into(),
            author_display_name: author_display_name.into(),
            team_ref: None,
            saved_orientation: Orientation::CANONICAL,
            preview_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `name` collides with this diagram's name, ignoring case.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid diagram name: {0}")]
    InvalidName(String),
    #[error("a diagram named \"{0}\" already exists")]
    NameExists(String),
    #[error("not allowed to {access} diagram {id}")]
    Forbidden { access: Access, id: DiagramId },
    #[error("cannot save an empty board")]
    EmptyBoard,
    #[error("the board has not been saved as a diagram yet")]
    Unsaved,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// The kinds of access checked before each storage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Load,
    Save,
    Delete,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Access::Load => "load",
            Access::Save => "save",
            Access::Delete => "delete",
        })
    }
}

/// Capability check supplied by the host: may the current actor perform
/// `access` on diagram `id`?
pub trait AccessPolicy: Send + Sync {
    fn allows(&self, access: Access, id: DiagramId) -> bool;
}

/// Policy that permits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn allows(&self, _: Access, _: DiagramId) -> bool {
        true
    }
}

/// Policy that only permits loading.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl AccessPolicy for ReadOnly {
    fn allows(&self, access: Access, _: DiagramId) -> bool {
        access == Access::Load
    }
}

/// The acting user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

/// Counts in-flight operations for the busy indicator.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Load/save/delete named diagrams through a [`Storage`] backend.
pub struct DiagramCatalog {
    storage: Arc<dyn Storage>,
    policy: Arc<dyn AccessPolicy>,
    actor: Actor,
    /// Serializes writes: a second save waits for the first.
    writes: Mutex<()>,
    busy: AtomicUsize,
}

impl DiagramCatalog {
    pub fn new(storage: Arc<dyn Storage>, policy: Arc<dyn AccessPolicy>, actor: Actor) -> Self {
        Self {
            storage,
            policy,
            actor,
            writes: Mutex::new(()),
            busy: AtomicUsize::new(0),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Whether a load or write is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst) > 0
    }

    fn check(&self, access: Access, id: DiagramId) -> CatalogResult<()> {
        if self.policy.allows(access, id) {
            Ok(())
        } else {
            log::warn!("Denied {} of diagram {}", access, id);
            Err(CatalogError::Forbidden { access, id })
        }
    }

    /// Diagrams owned by `owner_id` that the actor may load, most recently
    /// updated first.
    pub async fn list(&self, owner_id: &str) -> CatalogResult<Vec<Diagram>> {
        let _busy = BusyGuard::enter(&self.busy);
        let mut diagrams: Vec<_> = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|d| d.author_id == owner_id && self.policy.allows(Access::Load, d.id))
            .collect();
        diagrams.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(diagrams)
    }

    /// Fetch a diagram and its board, expressed in the `live` orientation.
    ///
    /// Elements that fail to decode are skipped.
    pub async fn load(&self, id: DiagramId, live: Orientation) -> CatalogResult<(Diagram, BoardState)> {
        self.check(Access::Load, id)?;
        let _busy = BusyGuard::enter(&self.busy);

        let diagram = self.storage.load_metadata(id).await?;
        let raw = self.storage.load_board(id).await?;
        let (canonical, skipped) = raw.decode_lenient();
        if skipped > 0 {
            log::warn!("Diagram {} loaded with {} corrupt elements skipped", id, skipped);
        }
        log::info!("Loaded diagram \"{}\" ({})", diagram.name, id);
        Ok((diagram, from_canonical(&canonical, live)))
    }

    /// Save a new diagram. Fails with [`CatalogError::NameExists`] when the
    /// actor already owns a diagram of the same name, ignoring case.
    pub async fn create(
        &self,
        name: &str,
        state: &BoardState,
        orientation: Orientation,
        team_ref: Option<String>,
    ) -> CatalogResult<Diagram> {
        let name = validate_name(name)?;
        if state.is_empty() {
            return Err(CatalogError::EmptyBoard);
        }

        let mut diagram = Diagram::new(name, self.actor.id.clone(), self.actor.display_name.clone());
        diagram.team_ref = team_ref;
        diagram.saved_orientation = orientation;
        self.check(Access::Save, diagram.id)?;

        let _busy = BusyGuard::enter(&self.busy);
        let _write = self.writes.lock().await;

        let taken = self
            .storage
            .list()
            .await?
            .iter()
            .any(|d| d.author_id == self.actor.id && d.name_matches(name));
        if taken {
            return Err(CatalogError::NameExists(name.to_string()));
        }

        let raw = encode(&to_canonical(state, orientation))?;
        self.storage.save(&diagram, &raw).await?;
        log::info!("Created diagram \"{}\" ({})", diagram.name, diagram.id);
        Ok(diagram)
    }

    /// Replace the board of an existing diagram.
    pub async fn overwrite(
        &self,
        id: DiagramId,
        state: &BoardState,
        orientation: Orientation,
    ) -> CatalogResult<Diagram> {
        self.check(Access::Save, id)?;
        let _busy = BusyGuard::enter(&self.busy);
        let _write = self.writes.lock().await;

        let mut diagram = self.storage.load_metadata(id).await?;
        diagram.saved_orientation = orientation;
        diagram.updated_at = Utc::now();

        let raw = encode(&to_canonical(state, orientation))?;
        self.storage.save(&diagram, &raw).await?;
        log::info!("Overwrote diagram \"{}\" ({})", diagram.name, id);
        Ok(diagram)
    }

    /// Delete a diagram and its board.
    pub async fn delete(&self, id: DiagramId) -> CatalogResult<()> {
        self.check(Access::Delete, id)?;
        let _busy = BusyGuard::enter(&self.busy);
        let _write = self.writes.lock().await;

        self.storage.delete(id).await?;
        log::info!("Deleted diagram {}", id);
        Ok(())
    }

    /// Attach a PNG preview to a diagram, stored as a data URI.
    pub async fn set_preview_image(&self, id: DiagramId, png: &[u8]) -> CatalogResult<()> {
        self.check(Access::Save, id)?;
        let _busy = BusyGuard::enter(&self.busy);
        let _write = self.writes.lock().await;

        let mut diagram = self.storage.load_metadata(id).await?;
        diagram.preview_image = Some(png_data_uri(png));
        self.storage.save_metadata(&diagram).await?;
        log::info!("Updated preview of diagram {} ({} bytes)", id, png.len());
        Ok(())
    }
}

fn encode(state: &BoardState) -> CatalogResult<RawBoard> {
    RawBoard::encode(state).map_err(|e| StorageError::Serialization(e.to_string()).into())
}

/// Trim and check a diagram name.
pub fn validate_name(name: &str) -> CatalogResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::InvalidName("name is empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CatalogError::InvalidName(format!(
            "name is longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(CatalogError::InvalidName("name contains control characters".into()));
    }
    Ok(name)
}

/// Encode PNG bytes as a `data:` URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}
