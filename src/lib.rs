//! Reactive parameter table.
//!
//! A [`ParamTable`](table::ParamTable) stores a directed acyclic graph of
//! typed scalar values. *Root* values are written by the host; *derived*
//! values are recomputed from registered calculations whenever any of
//! their inputs change, with change suppression stopping wavefront
//! branches whose recomputed bit patterns did not move.
//!
//! ```
//! use paratable::prelude::*;
//!
//! let mut table = ParamTable::new(8);
//! let plus_margin = table.register_calc(|c| {
//!     let v: f32 = c.input(0);
//!     c.set_output(0, v + 32.0f32);
//! });
//! let px = table.init_root(100.0f32, false);
//! let bx = table.init_derived::<f32>(false, plus_margin, &[px]);
//! assert_eq!(table.get::<f32>(bx), 132.0);
//!
//! table.set_root(px, 200.0f32);
//! assert_eq!(table.get::<f32>(bx), 232.0);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]
#![deny(
    clippy::arithmetic_side_effects,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::string_slice
)]

pub mod arena;
pub mod calc;
pub mod consts;
pub mod error;
pub mod flags;
mod links;
mod meta;
pub mod table;
pub mod types;

pub mod prelude {
    //! Re-exports of the full public surface.
    #[doc(no_inline)]
    pub use crate::arena::Width;
    #[doc(no_inline)]
    pub use crate::calc::CalcContext;
    #[doc(no_inline)]
    pub use crate::error::{Fault, Region};
    #[doc(no_inline)]
    pub use crate::flags::ParamFlags;
    #[doc(no_inline)]
    pub use crate::table::ParamTable;
    #[doc(no_inline)]
    pub use crate::types::{CalcId, OutputSpec, ParamId, Scalar, TypeTag};
}
