//! Device state record and its field layout.
//!
//! The device reports its state as an opaque blob. Only a handful of bytes
//! are understood, each at a fixed distance from the end of the blob. The
//! blob is resent verbatim in every write command, so edits patch those bytes
//! in place and leave the rest untouched.

use bytes::{Bytes, BytesMut};

use super::{InvalidMessage, Slot};

/// A known field inside the state blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateField {
    /// Preset loaded into slot A
    SlotAPreset,
    /// Preset loaded into slot B
    SlotBPreset,
    /// Preset loaded into slot C
    SlotCPreset,
    /// Active slot
    CurrentSlot,
}

impl StateField {
    /// Preset field backing `slot`
    #[must_use]
    pub const fn preset_of(slot: Slot) -> Self {
        match slot {
            Slot::A => Self::SlotAPreset,
            Slot::B => Self::SlotBPreset,
            Slot::C => Self::SlotCPreset,
        }
    }
}

/// Byte positions of the known fields, counted back from the end of the blob.
///
/// Firmware revisions moved these fields, so the layout is chosen per device
/// rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateLayout {
    /// Distance from the end to the slot A preset byte
    pub slot_a_preset: usize,
    /// Distance from the end to the slot B preset byte
    pub slot_b_preset: usize,
    /// Distance from the end to the slot C preset byte
    pub slot_c_preset: usize,
    /// Distance from the end to the active slot byte
    pub current_slot: usize,
}

impl StateLayout {
    /// Early firmware: presets at -12/-10/-8, slot at -5.
    pub const REVISION_1: Self = Self {
        slot_a_preset: 12,
        slot_b_preset: 10,
        slot_c_preset: 8,
        current_slot: 5,
    };

    /// Current firmware: presets at -18/-16/-14, slot at -11.
    pub const REVISION_2: Self = Self {
        slot_a_preset: 18,
        slot_b_preset: 16,
        slot_c_preset: 14,
        current_slot: 11,
    };

    /// Distance from the end of the blob for `field`
    #[must_use]
    pub const fn offset(&self, field: StateField) -> usize {
        match field {
            StateField::SlotAPreset => self.slot_a_preset,
            StateField::SlotBPreset => self.slot_b_preset,
            StateField::SlotCPreset => self.slot_c_preset,
            StateField::CurrentSlot => self.current_slot,
        }
    }

    /// Smallest blob that holds every field
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.slot_a_preset
            .max(self.slot_b_preset)
            .max(self.slot_c_preset)
            .max(self.current_slot)
    }

    /// Absolute index of `field` in a blob of `len` bytes
    #[must_use]
    pub fn index(&self, field: StateField, len: usize) -> Option<usize> {
        len.checked_sub(self.offset(field)).filter(|_| self.offset(field) > 0)
    }
}

impl Default for StateLayout {
    fn default() -> Self {
        Self::REVISION_2
    }
}

/// Last known device state
///
/// The preset and slot fields are views of bytes inside `raw`; every setter
/// updates both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    slot_a_preset: u8,
    slot_b_preset: u8,
    slot_c_preset: u8,
    current_slot: Slot,
    raw: Bytes,
    layout: StateLayout,
}

impl DeviceState {
    /// Decode the known fields out of a state blob.
    pub fn from_raw(raw: Bytes, layout: StateLayout) -> Result<Self, InvalidMessage> {
        let too_short = InvalidMessage::StateTooShort {
            len: raw.len(),
            needed: layout.min_len(),
        };
        let read = |field| {
            layout
                .index(field, raw.len())
                .map(|index| raw[index])
                .ok_or(too_short)
        };

        let slot_a_preset = read(StateField::SlotAPreset)?;
        let slot_b_preset = read(StateField::SlotBPreset)?;
        let slot_c_preset = read(StateField::SlotCPreset)?;
        let slot_byte = read(StateField::CurrentSlot)?;

        // Unrecognised slot bytes read as A; the byte itself stays in `raw`.
        let current_slot = Slot::from_u8(slot_byte).unwrap_or_else(|| {
            tracing::warn!(slot_byte, "unrecognised active slot byte");
            Slot::default()
        });

        Ok(Self {
            slot_a_preset,
            slot_b_preset,
            slot_c_preset,
            current_slot,
            raw,
            layout,
        })
    }

    /// Preset loaded into slot A
    #[must_use]
    pub const fn slot_a_preset(&self) -> u8 {
        self.slot_a_preset
    }

    /// Preset loaded into slot B
    #[must_use]
    pub const fn slot_b_preset(&self) -> u8 {
        self.slot_b_preset
    }

    /// Preset loaded into slot C
    #[must_use]
    pub const fn slot_c_preset(&self) -> u8 {
        self.slot_c_preset
    }

    /// Preset loaded into `slot`
    #[must_use]
    pub const fn preset(&self, slot: Slot) -> u8 {
        match slot {
            Slot::A => self.slot_a_preset,
            Slot::B => self.slot_b_preset,
            Slot::C => self.slot_c_preset,
        }
    }

    /// Active slot
    #[must_use]
    pub const fn current_slot(&self) -> Slot {
        self.current_slot
    }

    /// Wire representation
    #[must_use]
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Layout used to locate the fields
    #[must_use]
    pub const fn layout(&self) -> StateLayout {
        self.layout
    }

    /// Activate `slot`
    pub fn set_current_slot(&mut self, slot: Slot) {
        self.patch(StateField::CurrentSlot, slot.as_u8());
        self.current_slot = slot;
    }

    /// Load `preset` into `slot`
    pub fn set_preset(&mut self, slot: Slot, preset: u8) {
        self.patch(StateField::preset_of(slot), preset);
        match slot {
            Slot::A => self.slot_a_preset = preset,
            Slot::B => self.slot_b_preset = preset,
            Slot::C => self.slot_c_preset = preset,
        }
    }

    // `from_raw` already proved every field index is in bounds.
    fn patch(&mut self, field: StateField, value: u8) {
        if let Some(index) = self.layout.index(field, self.raw.len()) {
            let mut raw = BytesMut::from(self.raw.as_ref());
            raw[index] = value;
            self.raw = raw.freeze();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(layout: StateLayout, len: usize, presets: [u8; 3], slot: Slot) -> Bytes {
        let mut raw = vec![0xEE; len];
        raw[len - layout.slot_a_preset] = presets[0];
        raw[len - layout.slot_b_preset] = presets[1];
        raw[len - layout.slot_c_preset] = presets[2];
        raw[len - layout.current_slot] = slot.as_u8();
        Bytes::from(raw)
    }

    #[test]
    fn test_decode_revision_2() {
        let layout = StateLayout::REVISION_2;
        let state = DeviceState::from_raw(blob(layout, 40, [3, 7, 1], Slot::B), layout).unwrap();

        assert_eq!(state.slot_a_preset(), 3);
        assert_eq!(state.slot_b_preset(), 7);
        assert_eq!(state.slot_c_preset(), 1);
        assert_eq!(state.current_slot(), Slot::B);
    }

    #[test]
    fn test_decode_revision_1() {
        let layout = StateLayout::REVISION_1;
        let state = DeviceState::from_raw(blob(layout, 12, [4, 5, 6], Slot::C), layout).unwrap();

        assert_eq!(state.preset(Slot::A), 4);
        assert_eq!(state.preset(Slot::B), 5);
        assert_eq!(state.preset(Slot::C), 6);
        assert_eq!(state.current_slot(), Slot::C);
    }

    #[test]
    fn test_too_short_for_layout() {
        let err = DeviceState::from_raw(Bytes::from(vec![0u8; 17]), StateLayout::REVISION_2);
        assert_eq!(
            err,
            Err(InvalidMessage::StateTooShort { len: 17, needed: 18 })
        );
    }

    #[test]
    fn test_set_current_slot_patches_only_slot_byte() {
        let layout = StateLayout::REVISION_2;
        let original = blob(layout, 32, [3, 7, 1], Slot::A);
        let mut state = DeviceState::from_raw(original.clone(), layout).unwrap();

        state.set_current_slot(Slot::B);

        assert_eq!(state.current_slot(), Slot::B);
        let diff: Vec<usize> = (0..32).filter(|&i| state.raw()[i] != original[i]).collect();
        assert_eq!(diff, vec![32 - 11]);
        assert_eq!(state.raw()[32 - 11], 1);
    }

    #[test]
    fn test_set_preset_patches_matching_byte() {
        let layout = StateLayout::REVISION_2;
        let original = blob(layout, 32, [3, 7, 1], Slot::A);
        let mut state = DeviceState::from_raw(original.clone(), layout).unwrap();

        state.set_preset(Slot::C, 19);

        assert_eq!(state.slot_c_preset(), 19);
        assert_eq!(state.raw()[32 - 14], 19);
        assert_eq!(state.slot_a_preset(), 3);
        assert_eq!(state.raw()[32 - 18], 3);
        assert_eq!(original[32 - 14], 1);
    }

    #[test]
    fn test_layout_index() {
        let layout = StateLayout::REVISION_2;
        assert_eq!(layout.index(StateField::CurrentSlot, 40), Some(29));
        assert_eq!(layout.index(StateField::SlotAPreset, 10), None);
        assert_eq!(layout.min_len(), 18);
    }
}
