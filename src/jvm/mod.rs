//! JVM vocabulary shared by the frame model and its drivers
//!
//! Names and descriptors are validated on the way in (see [`Name`] and [`ParseDescriptor`]) so
//! that the frame model itself never has to reject input: by the time an instruction reaches a
//! [`crate::model::FrameModel`], its operands are known to be well formed and its argument and
//! result widths can be computed directly.

mod access_flags;
mod bytecode;
mod descriptors;
mod errors;
mod names;

pub use access_flags::*;
pub use bytecode::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
