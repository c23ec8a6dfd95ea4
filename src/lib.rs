pub mod libs;

pub use crate::libs::agghash::AggHash;
pub use crate::libs::cnl::*;
pub use crate::libs::collection::*;
pub use crate::libs::contrib::*;
pub use crate::libs::error::*;
pub use crate::libs::fmatch::*;
pub use crate::libs::label::*;
pub use crate::libs::matrix::{RowItem, SparseMatrix};
pub use crate::libs::nmi::*;
pub use crate::libs::num::*;
pub use crate::libs::omega::*;
pub use crate::libs::trace::Trace;

/// Node id
pub type Id = u32;
