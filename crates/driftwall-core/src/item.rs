#![forbid(unsafe_code)]

//! Content item records.
//!
//! A [`TileItem`] is an opaque, immutable content record: an identity, an
//! optional image reference, and style-derivation fields (a hue pair and a
//! glow intensity) computed deterministically from the identity so a lane
//! renders stably across refreshes without any styling data on the wire.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default size of a generated placeholder pool.
pub const PLACEHOLDER_POOL_SIZE: usize = 72;

// ---------------------------------------------------------------------------
// Seed hashing
// ---------------------------------------------------------------------------

/// 31-based rolling hash over UTF-16 code units, folded to a non-negative
/// 32-bit value.
///
/// Stable across runs and platforms; two items with the same identity always
/// derive the same hue pair and glow.
#[must_use]
pub fn seed_hash(value: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in value.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}

// ---------------------------------------------------------------------------
// TileItem
// ---------------------------------------------------------------------------

/// One content record backing a tile.
///
/// Immutable once placed in a pool. `hue_a`/`hue_b` are degrees (`< 360`);
/// `glow` is a small positive intensity in roughly `[0.2, 0.5]`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileItem {
    /// Stable identity, unique within a pool.
    pub id: String,
    /// Cover image to show on the tile, if the item has one.
    pub image_url: Option<String>,
    /// Opaque reference handed back to the host on tile click
    /// (e.g. a playback context URI).
    pub context_ref: String,
    /// First derived hue, degrees.
    pub hue_a: u16,
    /// Second derived hue, degrees.
    pub hue_b: u16,
    /// Derived glow intensity.
    pub glow: f32,
}

impl TileItem {
    /// Build an item, deriving the hue pair and glow from `id`.
    #[must_use]
    pub fn derive(
        id: impl Into<String>,
        image_url: Option<String>,
        context_ref: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let seed = seed_hash(&id);
        Self {
            image_url,
            context_ref: context_ref.into(),
            hue_a: (seed % 360) as u16,
            hue_b: ((u64::from(seed) * 7) % 360) as u16,
            glow: 0.2 + ((seed % 60) as f32) / 200.0,
            id,
        }
    }
}

/// Drop items with empty or duplicate identities, keeping first occurrence
/// and input order.
#[must_use]
pub fn dedupe_items(items: Vec<TileItem>) -> Vec<TileItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.id.is_empty() && seen.insert(item.id.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Placeholder pools
// ---------------------------------------------------------------------------

/// Generate a deterministic placeholder pool for a lane key.
///
/// Lanes are created before any real content arrives; the placeholders give
/// them hue-varied, imageless tiles so the surface is populated from the
/// first frame. Items are named `"{seed}-{n}"` with `n` starting at 1.
#[must_use]
pub fn placeholder_pool(seed: &str, size: usize) -> Vec<TileItem> {
    let base = u64::from(seed_hash(seed));
    (0..size)
        .map(|index| {
            let wave = (((index + 1) as f32) * 0.42).sin();
            TileItem {
                id: format!("{seed}-{}", index + 1),
                image_url: None,
                context_ref: String::new(),
                hue_a: ((base + index as u64 * 19) % 360) as u16,
                hue_b: ((base * 2 + index as u64 * 31) % 360) as u16,
                glow: 0.2 + (wave + 1.0) * 0.15,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Raw record intake (serde)
// ---------------------------------------------------------------------------

/// Loosely-shaped item record as delivered by a data layer.
///
/// Field presence is unreliable by design: identity may arrive as `id` or
/// only as a `uri`, the image may be a direct url or an image list from
/// which the mid-resolution entry (second, then first) is preferred.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItem {
    pub id: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub images: Vec<RawImage>,
    pub context_uri: Option<String>,
}

/// One entry of a raw image list.
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Deserialize)]
pub struct RawImage {
    pub url: String,
}

#[cfg(feature = "serde")]
impl RawItem {
    /// Normalize into a [`TileItem`], or `None` when the record carries no
    /// usable identity.
    #[must_use]
    pub fn normalize(self) -> Option<TileItem> {
        let id = self.id.clone().or_else(|| self.uri.clone())?;
        let image_url = self.image_url.or_else(|| pick_image(&self.images));
        let context_ref = self.context_uri.or(self.uri).unwrap_or_default();
        // Style seed prefers the same source order the identity does, so a
        // record that later gains a uri keeps its colors.
        let source = self.id.or(self.name).unwrap_or_else(|| id.clone());
        let seed = seed_hash(&source);
        Some(TileItem {
            id,
            image_url,
            context_ref,
            hue_a: (seed % 360) as u16,
            hue_b: ((u64::from(seed) * 7) % 360) as u16,
            glow: 0.2 + ((seed % 60) as f32) / 200.0,
        })
    }
}

#[cfg(feature = "serde")]
fn pick_image(images: &[RawImage]) -> Option<String> {
    images
        .get(1)
        .or_else(|| images.first())
        .map(|image| image.url.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
