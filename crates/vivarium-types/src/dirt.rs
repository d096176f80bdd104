//! Dirty objects that accumulate around the pet.
//!
//! At most [`MAX_DIRTY_OBJECTS`] objects are alive at once, each occupying
//! a unique slot in `1..=MAX_DIRTY_OBJECTS`. Each object carries its own
//! punish time, which acts as its personal ledger entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of live dirty objects.
pub const MAX_DIRTY_OBJECTS: u8 = 3;

/// One live dirty object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirtyObject {
    /// Slot in `1..=MAX_DIRTY_OBJECTS`, unique among live objects.
    pub slot_id: u8,
    /// When the object appeared.
    pub spawn_time: DateTime<Utc>,
    /// When the object last punished the pet; `None` if never.
    pub last_punish_time: Option<DateTime<Utc>>,
}

/// The set of live dirty objects, ordered by slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirtPile {
    objects: Vec<DirtyObject>,
}

impl DirtPile {
    /// Create an empty pile.
    pub const fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Number of live objects.
    pub const fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no objects are alive.
    pub const fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of unused slots.
    pub fn free_slots(&self) -> u8 {
        let used = u8::try_from(self.objects.len()).unwrap_or(MAX_DIRTY_OBJECTS);
        MAX_DIRTY_OBJECTS.saturating_sub(used)
    }

    /// Lowest slot id not taken by a live object.
    pub fn lowest_free_slot(&self) -> Option<u8> {
        (1..=MAX_DIRTY_OBJECTS).find(|slot| !self.objects.iter().any(|obj| obj.slot_id == *slot))
    }

    /// Spawn an object in the lowest free slot. Returns the slot used, or
    /// `None` if the pile is full.
    pub fn spawn(&mut self, at: DateTime<Utc>) -> Option<u8> {
        let slot_id = self.lowest_free_slot()?;
        self.objects.push(DirtyObject {
            slot_id,
            spawn_time: at,
            last_punish_time: None,
        });
        self.objects.sort_by_key(|obj| obj.slot_id);
        Some(slot_id)
    }

    /// Remove the object in `slot_id`. Returns `true` if one was removed.
    pub fn remove(&mut self, slot_id: u8) -> bool {
        let before = self.objects.len();
        self.objects.retain(|obj| obj.slot_id != slot_id);
        self.objects.len() != before
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Live objects, ordered by slot.
    pub fn iter(&self) -> impl Iterator<Item = &DirtyObject> {
        self.objects.iter()
    }

    /// Mutable access to live objects.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DirtyObject> {
        self.objects.iter_mut()
    }

    /// Drop duplicate or out-of-range slots left behind by a damaged save.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.objects
            .retain(|obj| (1..=MAX_DIRTY_OBJECTS).contains(&obj.slot_id));
        self.objects.sort_by_key(|obj| obj.slot_id);
        self.objects.dedup_by_key(|obj| obj.slot_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap_or_default()
    }

    #[test]
    fn spawns_fill_lowest_slots_and_cap_at_three() {
        let mut pile = DirtPile::new();
        assert_eq!(pile.spawn(t0()), Some(1));
        assert_eq!(pile.spawn(t0()), Some(2));
        assert_eq!(pile.spawn(t0()), Some(3));
        assert_eq!(pile.spawn(t0()), None);
        assert_eq!(pile.free_slots(), 0);
    }

    #[test]
    fn removed_slot_is_reused() {
        let mut pile = DirtPile::new();
        pile.spawn(t0());
        pile.spawn(t0());
        pile.spawn(t0());
        assert!(pile.remove(2));
        assert!(!pile.remove(2));
        assert_eq!(pile.lowest_free_slot(), Some(2));
        assert_eq!(pile.spawn(t0()), Some(2));
    }

    #[test]
    fn sanitize_drops_duplicates_and_invalid_slots() {
        let json = r#"[
            {"slotId":1,"spawnTime":"2026-03-01T12:00:00Z","lastPunishTime":null},
            {"slotId":1,"spawnTime":"2026-03-01T12:05:00Z","lastPunishTime":null},
            {"slotId":7,"spawnTime":"2026-03-01T12:05:00Z","lastPunishTime":null}
        ]"#;
        let pile: DirtPile = serde_json::from_str(json).unwrap_or_default();
        let pile = pile.sanitized();
        assert_eq!(pile.len(), 1);
        assert_eq!(pile.free_slots(), 2);
    }
}
