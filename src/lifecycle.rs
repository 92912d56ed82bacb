//! State machine for the upload-then-commit image swap.
//!
//! Posts must never reference an asset id that was not durably uploaded,
//! and a referenced asset must never be deleted before the document stops
//! pointing at it. Encoding the protocol as explicit states makes an
//! out-of-order call a hard error instead of a silent corruption.

use crate::{Error, Result};

/// Progress of one image swap, from nothing uploaded to old asset reclaimed.
///
/// Legal order: `AssetPending` → `AssetReady` → `DocumentCommitted` →
/// `OldAssetReclaimed`. A create flow stops at `DocumentCommitted` (there is
/// no old asset to reclaim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSwap {
    AssetPending,
    AssetReady {
        new_asset: String,
    },
    DocumentCommitted {
        new_asset: String,
        old_asset: Option<String>,
    },
    OldAssetReclaimed {
        new_asset: String,
    },
}

impl ImageSwap {
    pub fn start() -> Self {
        ImageSwap::AssetPending
    }

    /// Records that the replacement asset is durably stored.
    pub fn uploaded(self, new_asset: impl Into<String>) -> Result<Self> {
        match self {
            ImageSwap::AssetPending => Ok(ImageSwap::AssetReady {
                new_asset: new_asset.into(),
            }),
            state => Err(state.invalid_transition("uploaded")),
        }
    }

    /// Records that the document now references the new asset.
    ///
    /// `old_asset` is the id the document referenced before the commit, if
    /// any; it becomes safe to reclaim only from this state on.
    pub fn committed(self, old_asset: Option<String>) -> Result<Self> {
        match self {
            ImageSwap::AssetReady { new_asset } => Ok(ImageSwap::DocumentCommitted {
                new_asset,
                old_asset,
            }),
            state => Err(state.invalid_transition("committed")),
        }
    }

    /// Records that the superseded asset was deleted.
    pub fn reclaimed(self) -> Result<Self> {
        match self {
            ImageSwap::DocumentCommitted { new_asset, .. } => {
                Ok(ImageSwap::OldAssetReclaimed { new_asset })
            }
            state => Err(state.invalid_transition("reclaimed")),
        }
    }

    /// Id of the freshly uploaded asset, once one exists.
    pub fn new_asset(&self) -> Option<&str> {
        match self {
            ImageSwap::AssetPending => None,
            ImageSwap::AssetReady { new_asset }
            | ImageSwap::DocumentCommitted { new_asset, .. }
            | ImageSwap::OldAssetReclaimed { new_asset } => Some(new_asset),
        }
    }

    /// Id of the superseded asset, available only while it awaits reclaim.
    pub fn old_asset(&self) -> Option<&str> {
        match self {
            ImageSwap::DocumentCommitted { old_asset, .. } => old_asset.as_deref(),
            _ => None,
        }
    }

    fn state_name(&self) -> &'static str {
        match self {
            ImageSwap::AssetPending => "AssetPending",
            ImageSwap::AssetReady { .. } => "AssetReady",
            ImageSwap::DocumentCommitted { .. } => "DocumentCommitted",
            ImageSwap::OldAssetReclaimed { .. } => "OldAssetReclaimed",
        }
    }

    fn invalid_transition(&self, transition: &str) -> Error {
        Error::Invariant(format!(
            "image swap transition '{}' is not valid in state {}",
            transition,
            self.state_name()
        ))
    }
}
