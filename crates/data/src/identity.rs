//! Identity of stored items and id generation policy.

use std::fmt::Debug;

use uuid::Uuid;

/// Key type of an identifiable item.
///
/// `generate` decides, per key type, whether a store may assign ids on its own.
/// Only string keys are generated; numeric keys must be supplied by the caller.
pub trait IdKey: Clone + PartialEq + Debug + Send + Sync + 'static {
    fn generate() -> Option<Self>;
}

impl IdKey for String {
    fn generate() -> Option<Self> {
        Some(Uuid::new_v4().simple().to_string())
    }
}

macro_rules! caller_assigned_keys {
    ($($t:ty),*) => {
        $(impl IdKey for $t {
            fn generate() -> Option<Self> { None }
        })*
    };
}

caller_assigned_keys!(i32, i64, u32, u64, usize);

/// Item carrying a stable id attribute.
pub trait Identifiable {
    type Key: IdKey;

    /// `None` while the item has not been assigned an id.
    fn id(&self) -> Option<&Self::Key>;

    fn set_id(&mut self, id: Self::Key);
}

/// Assign a generated id when the item has none and the key type allows it.
pub(crate) fn ensure_id<T: Identifiable>(item: &mut T) {
    if item.id().is_none() {
        if let Some(id) = T::Key::generate() {
            item.set_id(id);
        }
    }
}
