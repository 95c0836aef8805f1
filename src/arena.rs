//! Width-segregated value storage.
#![allow(clippy::cast_possible_truncation)]

/// Storage width class of a scalar kind.
///
/// Several [`TypeTag`](crate::types::TypeTag)s map onto each width; the
/// arena stores raw bit patterns and never interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// One byte per slot.
    W8,
    /// Two bytes per slot.
    W16,
    /// Four bytes per slot.
    W32,
    /// Eight bytes per slot.
    W64,
    /// Native pointer width per slot.
    Ptr,
}

/// Five appendable buffers, one per storage width.
///
/// Slots are addressed by the `val_idx` recorded in metadata. Buffers
/// only ever grow, so an index stays valid for the table lifetime.
#[derive(Debug, Default)]
pub(crate) struct ValueArenas {
    bits8: Vec<u8>,
    bits16: Vec<u16>,
    bits32: Vec<u32>,
    bits64: Vec<u64>,
    ptrs: Vec<usize>,
}

impl ValueArenas {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append one slot holding `raw` truncated to `width`.
    ///
    /// Returns the new slot's index, or `None` once the 16-bit index
    /// space for that width is exhausted.
    pub(crate) fn append(&mut self, width: Width, raw: u64) -> Option<u16> {
        let len = match width {
            Width::W8 => self.bits8.len(),
            Width::W16 => self.bits16.len(),
            Width::W32 => self.bits32.len(),
            Width::W64 => self.bits64.len(),
            Width::Ptr => self.ptrs.len(),
        };
        if len >= usize::from(u16::MAX) {
            return None;
        }
        match width {
            Width::W8 => self.bits8.push(raw as u8),
            Width::W16 => self.bits16.push(raw as u16),
            Width::W32 => self.bits32.push(raw as u32),
            Width::W64 => self.bits64.push(raw),
            Width::Ptr => self.ptrs.push(raw as usize),
        }
        Some(len as u16)
    }

    /// Read the slot's bit pattern widened to a raw word.
    pub(crate) fn read(&self, width: Width, idx: u16) -> u64 {
        let idx = usize::from(idx);
        match width {
            Width::W8 => u64::from(self.bits8[idx]),
            Width::W16 => u64::from(self.bits16[idx]),
            Width::W32 => u64::from(self.bits32[idx]),
            Width::W64 => self.bits64[idx],
            Width::Ptr => self.ptrs[idx] as u64,
        }
    }

    /// Store `raw` truncated to `width`, reporting whether the stored
    /// bit pattern differs from the previous one.
    ///
    /// The report is what drives change suppression: it compares the
    /// pattern at storage width, not any numeric interpretation.
    pub(crate) fn write(&mut self, width: Width, idx: u16, raw: u64) -> bool {
        let idx = usize::from(idx);
        match width {
            Width::W8 => replace_slot(&mut self.bits8[idx], raw as u8),
            Width::W16 => replace_slot(&mut self.bits16[idx], raw as u16),
            Width::W32 => replace_slot(&mut self.bits32[idx], raw as u32),
            Width::W64 => replace_slot(&mut self.bits64[idx], raw),
            Width::Ptr => replace_slot(&mut self.ptrs[idx], raw as usize),
        }
    }

    /// Best-effort byte count of all owned buffers.
    pub(crate) fn footprint(&self) -> usize {
        self.bits8
            .capacity()
            .saturating_add(self.bits16.capacity().saturating_mul(2))
            .saturating_add(self.bits32.capacity().saturating_mul(4))
            .saturating_add(self.bits64.capacity().saturating_mul(8))
            .saturating_add(
                self.ptrs
                    .capacity()
                    .saturating_mul(core::mem::size_of::<usize>()),
            )
    }
}

fn replace_slot<B: Copy + PartialEq>(slot: &mut B, new: B) -> bool {
    let changed = *slot != new;
    *slot = new;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_hands_out_sequential_indices_per_width() {
        let mut arenas = ValueArenas::new();
        assert_eq!(arenas.append(Width::W32, 1), Some(0));
        assert_eq!(arenas.append(Width::W32, 2), Some(1));
        // Other widths count independently.
        assert_eq!(arenas.append(Width::W8, 3), Some(0));
        assert_eq!(arenas.read(Width::W32, 1), 2);
        assert_eq!(arenas.read(Width::W8, 0), 3);
    }

    #[test]
    fn write_reports_bit_pattern_changes_only() {
        let mut arenas = ValueArenas::new();
        let idx = arenas.append(Width::W64, 7).unwrap();
        assert!(!arenas.write(Width::W64, idx, 7));
        assert!(arenas.write(Width::W64, idx, 8));
        assert!(!arenas.write(Width::W64, idx, 8));
    }

    #[test]
    fn negative_zero_differs_from_zero_at_storage_width() {
        let mut arenas = ValueArenas::new();
        let idx = arenas.append(Width::W32, u64::from(0.0f32.to_bits())).unwrap();
        assert!(arenas.write(Width::W32, idx, u64::from((-0.0f32).to_bits())));
        assert!(!arenas.write(Width::W32, idx, u64::from((-0.0f32).to_bits())));
    }

    #[test]
    fn truncation_keeps_the_narrow_pattern() {
        let mut arenas = ValueArenas::new();
        let idx = arenas.append(Width::W8, 0).unwrap();
        // High bits beyond the width never reach storage, so they can
        // not leak into the changed signal.
        arenas.write(Width::W8, idx, 0xAB_FF);
        assert_eq!(arenas.read(Width::W8, idx), 0xFF);
        assert!(!arenas.write(Width::W8, idx, 0xCD_FF));
    }
}
