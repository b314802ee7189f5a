use super::{FrameModel, LocalVariable, OwnedName, SourceLine, StackItem};
use crate::jvm::{BinaryName, RenderDescriptor};
use std::fmt::{Display, Formatter, Result as FmtResult, Write};
use std::rc::Rc;

/// Provenance of every operand stack slot and local variable at the current instruction
///
/// The stack and locals are fixed size arrays sized from the method's `max_stack` and
/// `max_locals`. The stack grows upwards from index 0 and `top_of_stack` is the index of the top
/// word, or `-1` when the stack is empty. Slots above the top are dead and never read.
#[derive(Debug)]
pub struct Frame {
    /// Identity of the local variables (`Unknown` unless the rewriter has told us otherwise)
    locals: Box<[LocalVariable]>,

    /// Provenance of the values in the local variables
    local_values: Box<[Rc<StackItem>]>,

    /// Operand stack
    stack: Box<[Rc<StackItem>]>,

    top_of_stack: isize,

    /// Kept as state, since line numbers arrive as their own visitor callback
    current_source_line: SourceLine,

    primitive: Rc<StackItem>,
    receiver: Rc<StackItem>,
}

impl Frame {
    pub fn new(max_locals: u16, max_stack: u16) -> Frame {
        let primitive = Rc::new(StackItem::primitive());
        Frame {
            locals: vec![LocalVariable::Unknown; max_locals as usize].into_boxed_slice(),
            local_values: vec![primitive.clone(); max_locals as usize].into_boxed_slice(),
            stack: vec![primitive.clone(); max_stack as usize].into_boxed_slice(),
            top_of_stack: -1,
            current_source_line: None,
            primitive,
            receiver: Rc::new(StackItem::receiver()),
        }
    }

    /// Index of the top word of the stack, or `-1` if the stack is empty
    pub fn top_of_stack(&self) -> isize {
        self.top_of_stack
    }

    /// Number of words on the stack
    pub fn depth(&self) -> usize {
        (self.top_of_stack + 1) as usize
    }

    pub fn stack_capacity(&self) -> usize {
        self.stack.len()
    }

    pub fn max_locals(&self) -> usize {
        self.locals.len()
    }

    pub fn current_source_line(&self) -> SourceLine {
        self.current_source_line
    }

    /// Occupied part of the stack, bottom first
    pub fn stack(&self) -> &[Rc<StackItem>] {
        &self.stack[..self.depth()]
    }

    /// Item at an absolute stack index (0 is the bottom)
    ///
    /// Panics if the slot is not occupied.
    pub fn stack_item(&self, index: usize) -> &Rc<StackItem> {
        &self.stack()[index]
    }

    /// Item `depth` words below the top (0 is the top)
    ///
    /// Panics if the stack is not that deep.
    pub fn peek(&self, depth: usize) -> &Rc<StackItem> {
        &self.stack[self.index_from_top(depth)]
    }

    /// Item on top of the stack
    pub fn top(&self) -> &Rc<StackItem> {
        self.peek(0)
    }

    pub fn local(&self, index: u16) -> &LocalVariable {
        &self.locals[index as usize]
    }

    pub fn local_value(&self, index: u16) -> &Rc<StackItem> {
        &self.local_values[index as usize]
    }

    pub fn dump_locals(&self) -> String {
        let mut out = String::new();
        for (i, (local, value)) in self.locals.iter().zip(self.local_values.iter()).enumerate() {
            let _ = writeln!(out, "{}: {} = {}", i, local, value);
        }
        out
    }

    pub fn dump_stack(&self) -> String {
        let mut out = String::new();
        for (i, item) in self.stack().iter().enumerate() {
            let _ = writeln!(out, "{}: {}", i, item);
        }
        out
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        match self.current_source_line {
            Some(line) => {
                let _ = writeln!(out, "Current line = {}", line);
            }
            None => out.push_str("Current line = unknown\n"),
        }
        out.push_str("Locals:\n");
        out.push_str(&self.dump_locals());
        out.push_str("Stack:\n");
        out.push_str(&self.dump_stack());
        out
    }

    fn index_from_top(&self, depth: usize) -> usize {
        let index = self.top_of_stack - depth as isize;
        assert!(
            index >= 0,
            "operand stack underflow: reaching {} words below the top of a {} word stack",
            depth,
            self.depth()
        );
        index as usize
    }

    fn set_from_top(&mut self, depth: usize, item: Rc<StackItem>) {
        let index = self.index_from_top(depth);
        self.stack[index] = item;
    }

    fn push(&mut self, item: Rc<StackItem>) {
        let index = (self.top_of_stack + 1) as usize;
        assert!(
            index < self.stack.len(),
            "operand stack overflow: pushing onto a full {} word stack",
            self.stack.len()
        );
        self.stack[index] = item;
        self.top_of_stack += 1;
    }

    fn push_item(&mut self, item: StackItem) {
        self.push(Rc::new(item));
    }

    fn drop_words(&mut self, words: usize) {
        assert!(
            words <= self.depth(),
            "operand stack underflow: popping {} words off a {} word stack",
            words,
            self.depth()
        );
        self.top_of_stack -= words as isize;
    }

    fn push_primitive_words(&mut self, words: usize) {
        for _ in 0..words {
            let primitive = self.primitive.clone();
            self.push(primitive);
        }
    }

    /// Collapse the stack to a single item at index 0
    fn reset_stack(&mut self, item: Rc<StackItem>) {
        assert!(
            !self.stack.is_empty(),
            "operand stack overflow: handler entry in a method with no stack"
        );
        self.stack[0] = item;
        self.top_of_stack = 0;
    }
}

impl FrameModel for Frame {
    fn clear_local_variable(&mut self, index: u16) {
        self.locals[index as usize] = LocalVariable::Unknown;
    }

    fn set_local_variable(&mut self, index: u16, name: &str, descriptor: &str) {
        self.locals[index as usize] = LocalVariable::new(name, descriptor);
    }

    fn init_receiver(&mut self) {
        self.local_values[0] = self.receiver.clone();
    }

    fn init_parameter(&mut self, local_index: u16, arg_index: u16) {
        self.local_values[local_index as usize] = Rc::new(StackItem::parameter(arg_index));
    }

    fn set_current_source_line(&mut self, line: u32) {
        self.current_source_line = Some(line);
    }

    fn aaload(&mut self) {
        self.drop_words(1);
        // Ignore the array index for now
        let array = self.peek(0).clone();
        let element = StackItem::array_reference(self.current_source_line, array, -1);
        self.set_from_top(0, Rc::new(element));
    }

    fn aload(&mut self, local_index: u16) {
        let index = local_index as usize;
        let item = StackItem::local_variable(
            self.current_source_line,
            local_index,
            self.locals[index].clone(),
            self.local_values[index].clone(),
        );
        self.push_item(item);
    }

    fn arraylength(&mut self) {
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
    }

    fn astore(&mut self, local_index: u16) {
        let value = self.peek(0).clone();
        self.drop_words(1);
        self.local_values[local_index as usize] = value;
    }

    fn athrow(&mut self) {
        let exception = self.peek(0).clone();
        self.reset_stack(exception);
    }

    fn dup(&mut self) {
        let value1 = self.peek(0).clone();
        self.push(value1);
    }

    fn dup_x1(&mut self) {
        let value2 = self.peek(1).clone();
        let value1 = self.peek(0).clone();
        self.set_from_top(1, value1.clone());
        self.set_from_top(0, value2);
        self.push(value1);
    }

    fn dup_x2(&mut self) {
        let value3 = self.peek(2).clone();
        let value2 = self.peek(1).clone();
        let value1 = self.peek(0).clone();
        self.set_from_top(2, value1.clone());
        self.set_from_top(1, value3);
        self.set_from_top(0, value2);
        self.push(value1);
    }

    fn dup2(&mut self) {
        let value2 = self.peek(1).clone();
        let value1 = self.peek(0).clone();
        self.push(value2);
        self.push(value1);
    }

    fn dup2_x1(&mut self) {
        let value3 = self.peek(2).clone();
        let value2 = self.peek(1).clone();
        let value1 = self.peek(0).clone();
        self.set_from_top(2, value2.clone());
        self.set_from_top(1, value1.clone());
        self.set_from_top(0, value3);
        self.push(value2);
        self.push(value1);
    }

    fn dup2_x2(&mut self) {
        let value4 = self.peek(3).clone();
        let value3 = self.peek(2).clone();
        let value2 = self.peek(1).clone();
        let value1 = self.peek(0).clone();
        self.set_from_top(3, value2.clone());
        self.set_from_top(2, value1.clone());
        self.set_from_top(1, value4);
        self.set_from_top(0, value3);
        self.push(value2);
        self.push(value1);
    }

    fn swap(&mut self) {
        let value2 = self.peek(1).clone();
        let value1 = self.peek(0).clone();
        self.set_from_top(1, value1);
        self.set_from_top(0, value2);
    }

    fn getfield_object(&mut self, owner: &str, name: &str, descriptor: &str) {
        let object = self.peek(0).clone();
        let field = OwnedName::new(owner, name, descriptor);
        let item = StackItem::field_reference(self.current_source_line, object, field);
        self.set_from_top(0, Rc::new(item));
    }

    fn getfield_primitive(&mut self) {
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
    }

    fn getfield_primitive2(&mut self) {
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
        self.push_primitive_words(1);
    }

    fn getstatic_object(&mut self, owner: &str, name: &str, descriptor: &str) {
        let field = OwnedName::new(owner, name, descriptor);
        let item = StackItem::static_field_reference(self.current_source_line, field);
        self.push_item(item);
    }

    fn getstatic_primitive(&mut self) {
        self.push_primitive_words(1);
    }

    fn getstatic_primitive2(&mut self) {
        self.push_primitive_words(2);
    }

    fn instance_of(&mut self) {
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
    }

    fn ldc_string(&mut self, value: &str) {
        let item = StackItem::string_constant(self.current_source_line, value);
        self.push_item(item);
    }

    fn ldc_class(&mut self, class_name: &str) {
        let item = StackItem::class_constant(self.current_source_line, class_name);
        self.push_item(item);
    }

    fn multianewarray(&mut self, array_type: &str, dims: usize) {
        self.drop_words(dims);
        let item = StackItem::new_array(self.current_source_line, array_type);
        self.push_item(item);
    }

    fn new_object(&mut self, descriptor: &str) {
        let item = StackItem::new_object(self.current_source_line, descriptor);
        self.push_item(item);
    }

    fn newarray(&mut self, descriptor: &str) {
        let item = StackItem::new_array(self.current_source_line, descriptor);
        self.set_from_top(0, Rc::new(item));
    }

    fn exception_handler(&mut self, exception_type: &str) {
        if self.top_of_stack > 0 {
            log::debug!(
                "Handler for {} discards {} words of operand stack",
                exception_type,
                self.depth()
            );
        }
        let item = StackItem::exception(self.current_source_line, exception_type);
        self.reset_stack(Rc::new(item));
    }

    fn finally_handler(&mut self) {
        self.exception_handler(&BinaryName::THROWABLE.render());
    }

    fn pop(&mut self) {
        self.drop_words(1);
    }

    fn pop2(&mut self) {
        self.drop_words(2);
    }

    fn pop3(&mut self) {
        self.drop_words(3);
    }

    fn pop4(&mut self) {
        self.drop_words(4);
    }

    fn push_primitive(&mut self) {
        self.push_primitive_words(1);
    }

    fn push_primitive2(&mut self) {
        self.push_primitive_words(2);
    }

    fn primitive_array_load(&mut self) {
        self.drop_words(1);
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
    }

    fn primitive_array_load2(&mut self) {
        let primitive = self.primitive.clone();
        self.set_from_top(1, primitive.clone());
        self.set_from_top(0, primitive);
    }

    fn invoke_method_returns_object(
        &mut self,
        opcode: u8,
        args_size: usize,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) {
        self.drop_words(args_size);
        // The result replaces the receiver
        let receiver = self.peek(0).clone();
        let method = OwnedName::new(owner, name, descriptor);
        let item = StackItem::method_call(self.current_source_line, opcode, receiver, method);
        self.set_from_top(0, Rc::new(item));
    }

    fn invoke_method_returns_void(&mut self, args_size: usize) {
        self.drop_words(args_size + 1);
    }

    fn invoke_method_returns_primitive(&mut self, args_size: usize) {
        self.drop_words(args_size);
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
    }

    fn invoke_method_returns_primitive2(&mut self, args_size: usize) {
        self.drop_words(args_size);
        let primitive = self.primitive.clone();
        self.set_from_top(0, primitive);
        self.push_primitive_words(1);
    }

    fn invoke_static_method_returns_object(
        &mut self,
        args_size: usize,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) {
        self.drop_words(args_size);
        let method = OwnedName::new(owner, name, descriptor);
        let item = StackItem::static_method_call(self.current_source_line, method);
        self.push_item(item);
    }

    fn invoke_static_method_returns_void(&mut self, args_size: usize) {
        self.drop_words(args_size);
    }

    fn invoke_static_method_returns_primitive(&mut self, args_size: usize) {
        self.drop_words(args_size);
        self.push_primitive_words(1);
    }

    fn invoke_static_method_returns_primitive2(&mut self, args_size: usize) {
        self.drop_words(args_size);
        self.push_primitive_words(2);
    }

    fn as_frame(&self) -> Option<&Frame> {
        Some(self)
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.dump())
    }
}
