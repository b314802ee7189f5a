//! Tracks where every value on a JVM method's operand stack and in its local variables came
//! from, instruction by instruction.
//!
//! The core is [`model::Frame`], driven either directly through [`model::FrameModel`] by a
//! bytecode visitor or, for whole instructions, through [`model::interpret_instruction`]. The
//! [`trace`] module reads textual method traces and replays them against a frame, which is what
//! the `stackprov` binary does.

pub mod jvm;
pub mod model;
pub mod settings;
pub mod trace;
