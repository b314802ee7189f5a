//! Textual method traces, for driving a frame model without a class file
//!
//! A trace lists the instructions of one or more method bodies in visitation order, along with
//! the other events a bytecode visitor would see: line numbers, local variable scopes, and
//! exception handler entries.
//!
//! ```text
//! # comments take up a whole line
//! .method public static copy ([Ljava/lang/Object;I)Ljava/lang/Object;
//! .limit locals 2
//! .limit stack 2
//! .line 12
//! .var 0 items [Ljava/lang/Object;
//!   aload_0
//!   iload_1
//!   aaload
//! .dump
//!   areturn
//! .end
//! ```
//!
//! Operands are written as follows:
//!
//!   - local slots, `bipush`, `sipush`, and `iinc` take plain integers
//!   - fields are `owner/Class.name descriptor`, methods are `owner/Class.name(args)ret`, and
//!     `invokedynamic` takes `name(args)ret`
//!   - `ldc` takes a quoted string or a tagged constant (`int 3`, `float 1.5`, `class a/B`,
//!     `methodtype (I)V`), and `ldc2_w` takes `long 3` or `double 1.5`
//!   - `new` takes a class name, while `anewarray`, `checkcast`, and `instanceof` also accept
//!     an array descriptor
//!   - `newarray` takes a primitive keyword or `atype` code, and `multianewarray` takes a
//!     descriptor and a count
//!   - branches take a label, and switch operands are ignored

mod errors;
mod parser;
mod replay;

pub use errors::*;
pub use parser::*;
pub use replay::*;
