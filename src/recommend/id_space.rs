//! Unified id space shared by users and items.
//!
//! Ids `[0, num_user)` are users and `[num_user, num_user + num_item)` are
//! items. Anything indexed per item (content features, generated embeddings)
//! uses the item-local index `id - num_user`.

use serde::{Deserialize, Serialize};

use crate::error::{GarError, Result};

/// Partition of `[0, num_user + num_item)` into users then items.
///
/// ```
/// use garrec::recommend::IdSpace;
///
/// let space = IdSpace::new(3, 4);
/// assert_eq!(space.len(), 7);
/// assert!(space.is_user(2));
/// assert_eq!(space.item_to_unified(0).unwrap(), 3);
/// assert_eq!(space.unified_to_item(6).unwrap(), 3);
/// assert!(space.unified_to_item(1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSpace {
    num_user: usize,
    num_item: usize,
}

impl IdSpace {
    /// Create an id space with the given user and item counts.
    #[must_use]
    pub fn new(num_user: usize, num_item: usize) -> Self {
        Self { num_user, num_item }
    }

    /// Number of users.
    #[must_use]
    pub fn num_user(&self) -> usize {
        self.num_user
    }

    /// Number of items.
    #[must_use]
    pub fn num_item(&self) -> usize {
        self.num_item
    }

    /// Total number of ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_user + self.num_item
    }

    /// True when there are neither users nor items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` lies anywhere in the unified space.
    #[must_use]
    pub fn contains(&self, id: usize) -> bool {
        id < self.len()
    }

    /// Whether `id` is a user id.
    #[must_use]
    pub fn is_user(&self, id: usize) -> bool {
        id < self.num_user
    }

    /// Whether `id` is an item id.
    #[must_use]
    pub fn is_item(&self, id: usize) -> bool {
        id >= self.num_user && id < self.len()
    }

    /// Validate that `id` lies in the unified space.
    pub fn check(&self, id: usize) -> Result<usize> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(GarError::IndexOutOfRange {
                index: id,
                len: self.len(),
            })
        }
    }

    /// Map an item-local index to its unified id.
    pub fn item_to_unified(&self, local: usize) -> Result<usize> {
        if local < self.num_item {
            Ok(local + self.num_user)
        } else {
            Err(GarError::IndexOutOfRange {
                index: local,
                len: self.num_item,
            })
        }
    }

    /// Map a unified item id to its item-local index.
    ///
    /// User ids fail with [`GarError::NotAnItem`]; ids past the end fail with
    /// [`GarError::IndexOutOfRange`].
    pub fn unified_to_item(&self, id: usize) -> Result<usize> {
        if id < self.num_user {
            return Err(GarError::NotAnItem {
                id,
                num_user: self.num_user,
            });
        }
        self.check(id).map(|id| id - self.num_user)
    }

    /// All unified item ids in ascending order.
    pub fn item_ids(&self) -> impl Iterator<Item = usize> {
        self.num_user..self.len()
    }
}
