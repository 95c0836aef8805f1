//! Table capacity ceilings.

use core::mem;

use crate::meta::Meta;

/// Ids are 16-bit with the top value reserved as the null sentinel.
pub const MAX_PARAM_COUNT: usize = u16::MAX as usize;

/// Calc ids share the 16-bit space and null sentinel of parameter ids.
pub const MAX_CALC_COUNT: usize = u16::MAX as usize;

/// Combined parents + siblings ceiling imposed by the byte-sized
/// adjacency cursors.
pub const MAX_LINKS: usize = u8::MAX as usize;

// Metadata must stay a fixed-size header over the variable adjacency
// region; the arena indirection exists to keep it that way.
static_assertions::const_assert!(mem::size_of::<Meta>() <= 40);

static_assertions::const_assert!(MAX_LINKS < MAX_PARAM_COUNT);
