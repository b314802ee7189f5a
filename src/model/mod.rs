//! Provenance model of the operand stack and local variables of one method body
//!
//! A bytecode rewriter visits a method's instructions in order and, for each one, calls the
//! matching [`FrameModel`] operation. The [`Frame`] implementation keeps a [`StackItem`] in
//! every occupied stack slot and local variable describing where that value came from, so that
//! when the rewriter is about to instrument (say) a `putfield`, it can look at the object
//! reference under the value and tell whether it is `this`, a parameter, or something reached
//! through a chain of field reads and calls.
//!
//! Stack depths are in words, exactly as in the JVM: `long` and `double` take two slots, each
//! holding a `Primitive` item. Every operation must be called with word counts matching the
//! instruction actually being visited; a mismatch is a bug in the caller and panics.
//!
//! [`BogusFrame`] has the same surface and does nothing, for when tracking is switched off.

mod bogus_frame;
mod frame;
mod interpret;
mod stack_item;

pub use bogus_frame::*;
pub use frame::*;
pub use interpret::*;
pub use stack_item::*;

/// Operations a bytecode visitor performs on a frame model, one per instruction category
///
/// Descriptions of the stack effects use `value1` for the top of the stack, `value2` for the
/// word under it, and so on.
pub trait FrameModel {
    /// Forget the identity of a local variable
    fn clear_local_variable(&mut self, index: u16);

    /// Set (or reset) the identity of a local variable
    fn set_local_variable(&mut self, index: u16, name: &str, descriptor: &str);

    /// Local 0 holds the receiver
    fn init_receiver(&mut self);

    /// Local `local_index` holds the incoming argument `arg_index`
    fn init_parameter(&mut self, local_index: u16, arg_index: u16);

    /// Items created from now on are stamped with this line
    fn set_current_source_line(&mut self, line: u32);

    /// `arrayref, index → element`
    fn aaload(&mut self);

    /// `→ value` read from a local
    fn aload(&mut self, local_index: u16);

    /// `arrayref → length`
    fn arraylength(&mut self);

    /// `value →` stored into a local
    fn astore(&mut self, local_index: u16);

    /// `..., exception → exception`
    fn athrow(&mut self);

    fn dup(&mut self);
    fn dup_x1(&mut self);
    fn dup_x2(&mut self);
    fn dup2(&mut self);
    fn dup2_x1(&mut self);
    fn dup2_x2(&mut self);
    fn swap(&mut self);

    /// `objectref → value`, for reference typed fields
    fn getfield_object(&mut self, owner: &str, name: &str, descriptor: &str);

    /// `objectref → value`, for one word primitive fields
    fn getfield_primitive(&mut self);

    /// `objectref → value.1, value.2`, for `long` and `double` fields
    fn getfield_primitive2(&mut self);

    /// `→ value`, for reference typed fields
    fn getstatic_object(&mut self, owner: &str, name: &str, descriptor: &str);

    /// `→ value`, for one word primitive fields
    fn getstatic_primitive(&mut self);

    /// `→ value.1, value.2`, for `long` and `double` fields
    fn getstatic_primitive2(&mut self);

    /// `objectref → result`
    fn instance_of(&mut self);

    fn ldc_string(&mut self, value: &str);
    fn ldc_class(&mut self, class_name: &str);

    /// `count1, [count2, ...] → arrayref`, where `dims` is the number of counts
    fn multianewarray(&mut self, array_type: &str, dims: usize);

    /// `→ objectref`
    fn new_object(&mut self, descriptor: &str);

    /// `count → arrayref`
    fn newarray(&mut self, descriptor: &str);

    /// The stack becomes just the caught exception
    fn exception_handler(&mut self, exception_type: &str);

    /// The stack becomes just the caught `Throwable`
    fn finally_handler(&mut self);

    fn pop(&mut self);
    fn pop2(&mut self);
    fn pop3(&mut self);
    fn pop4(&mut self);

    /// Push a one word value whose provenance is not tracked
    fn push_primitive(&mut self);

    /// Push a two word (`long` or `double`) value
    fn push_primitive2(&mut self);

    /// `arrayref, index → value` for one word primitive arrays
    fn primitive_array_load(&mut self);

    /// `arrayref, index → value.1, value.2` for `long[]` and `double[]`
    fn primitive_array_load2(&mut self);

    /// `objectref, [args...] → result`
    ///
    /// `args_size` is the total width in words of the arguments, without the receiver.
    fn invoke_method_returns_object(
        &mut self,
        opcode: u8,
        args_size: usize,
        owner: &str,
        name: &str,
        descriptor: &str,
    );

    /// `objectref, [args...] →`
    fn invoke_method_returns_void(&mut self, args_size: usize);

    /// `objectref, [args...] → result`
    fn invoke_method_returns_primitive(&mut self, args_size: usize);

    /// `objectref, [args...] → result.1, result.2`
    fn invoke_method_returns_primitive2(&mut self, args_size: usize);

    /// `[args...] → result`
    fn invoke_static_method_returns_object(
        &mut self,
        args_size: usize,
        owner: &str,
        name: &str,
        descriptor: &str,
    );

    /// `[args...] →`
    fn invoke_static_method_returns_void(&mut self, args_size: usize);

    /// `[args...] → result`
    fn invoke_static_method_returns_primitive(&mut self, args_size: usize);

    /// `[args...] → result.1, result.2`
    fn invoke_static_method_returns_primitive2(&mut self, args_size: usize);

    /// Inspect the tracked state, if this model tracks anything
    fn as_frame(&self) -> Option<&Frame>;
}
