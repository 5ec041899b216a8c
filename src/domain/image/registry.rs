use super::{entity::ImageAsset, value_objects::ImageId};
use crate::domain::errors::{VisionError, VisionResult};
use std::collections::HashMap;

/// Images registered for one orchestrator, iterated in registration order.
///
/// `order` may hold ids already taken out of `assets`; they are skipped on
/// iteration and compacted away once they outnumber the live entries.
#[derive(Debug, Default)]
pub struct ImageRegistry {
    order: Vec<ImageId>,
    assets: HashMap<ImageId, ImageAsset>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects an asset whose id is already registered, leaving the
    /// registry untouched.
    pub fn insert(&mut self, asset: ImageAsset) -> VisionResult<&ImageAsset> {
        let id = asset.id().clone();
        if self.assets.contains_key(&id) {
            return Err(VisionError::DuplicateImage {
                id,
                name: asset.name().to_string(),
            });
        }
        if self.order.len() != self.assets.len() {
            self.compact();
        }
        self.order.push(id.clone());
        Ok(self.assets.entry(id).or_insert(asset))
    }

    pub fn get(&self, id: &ImageId) -> Option<&ImageAsset> {
        self.assets.get(id)
    }

    pub fn get_mut(&mut self, id: &ImageId) -> Option<&mut ImageAsset> {
        self.assets.get_mut(id)
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.assets.contains_key(id)
    }

    /// Hand an asset over to the caller.
    pub fn take(&mut self, id: &ImageId) -> Option<ImageAsset> {
        let asset = self.assets.remove(id)?;
        if self.order.len() > 2 * self.assets.len() {
            self.compact();
        }
        Some(asset)
    }

    fn compact(&mut self) {
        let assets = &self.assets;
        self.order.retain(|id| assets.contains_key(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageAsset> {
        self.order.iter().filter_map(|id| self.assets.get(id))
    }

    pub fn ids(&self) -> Vec<ImageId> {
        self.order
            .iter()
            .filter(|id| self.assets.contains_key(*id))
            .cloned()
            .collect()
    }

    /// Move every asset out, in registration order.
    pub fn into_assets(mut self) -> impl Iterator<Item = ImageAsset> {
        let order = std::mem::take(&mut self.order);
        order.into_iter().filter_map(move |id| self.assets.remove(&id))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
