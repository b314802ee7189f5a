use super::{Frame, FrameModel};

/// Frame model that tracks nothing
///
/// Used when provenance tracking is switched off, so that the visitor driving the model does not
/// need a second code path. Every operation accepts any arguments and does nothing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BogusFrame;

impl BogusFrame {
    pub fn new() -> BogusFrame {
        BogusFrame
    }
}

impl FrameModel for BogusFrame {
    fn clear_local_variable(&mut self, _index: u16) {}
    fn set_local_variable(&mut self, _index: u16, _name: &str, _descriptor: &str) {}
    fn init_receiver(&mut self) {}
    fn init_parameter(&mut self, _local_index: u16, _arg_index: u16) {}
    fn set_current_source_line(&mut self, _line: u32) {}

    fn aaload(&mut self) {}
    fn aload(&mut self, _local_index: u16) {}
    fn arraylength(&mut self) {}
    fn astore(&mut self, _local_index: u16) {}
    fn athrow(&mut self) {}

    fn dup(&mut self) {}
    fn dup_x1(&mut self) {}
    fn dup_x2(&mut self) {}
    fn dup2(&mut self) {}
    fn dup2_x1(&mut self) {}
    fn dup2_x2(&mut self) {}
    fn swap(&mut self) {}

    fn getfield_object(&mut self, _owner: &str, _name: &str, _descriptor: &str) {}
    fn getfield_primitive(&mut self) {}
    fn getfield_primitive2(&mut self) {}
    fn getstatic_object(&mut self, _owner: &str, _name: &str, _descriptor: &str) {}
    fn getstatic_primitive(&mut self) {}
    fn getstatic_primitive2(&mut self) {}

    fn instance_of(&mut self) {}
    fn ldc_string(&mut self, _value: &str) {}
    fn ldc_class(&mut self, _class_name: &str) {}
    fn multianewarray(&mut self, _array_type: &str, _dims: usize) {}
    fn new_object(&mut self, _descriptor: &str) {}
    fn newarray(&mut self, _descriptor: &str) {}

    fn exception_handler(&mut self, _exception_type: &str) {}
    fn finally_handler(&mut self) {}

    fn pop(&mut self) {}
    fn pop2(&mut self) {}
    fn pop3(&mut self) {}
    fn pop4(&mut self) {}
    fn push_primitive(&mut self) {}
    fn push_primitive2(&mut self) {}
    fn primitive_array_load(&mut self) {}
    fn primitive_array_load2(&mut self) {}

    fn invoke_method_returns_object(
        &mut self,
        _opcode: u8,
        _args_size: usize,
        _owner: &str,
        _name: &str,
        _descriptor: &str,
    ) {
    }
    fn invoke_method_returns_void(&mut self, _args_size: usize) {}
    fn invoke_method_returns_primitive(&mut self, _args_size: usize) {}
    fn invoke_method_returns_primitive2(&mut self, _args_size: usize) {}

    fn invoke_static_method_returns_object(
        &mut self,
        _args_size: usize,
        _owner: &str,
        _name: &str,
        _descriptor: &str,
    ) {
    }
    fn invoke_static_method_returns_void(&mut self, _args_size: usize) {}
    fn invoke_static_method_returns_primitive(&mut self, _args_size: usize) {}
    fn invoke_static_method_returns_primitive2(&mut self, _args_size: usize) {}

    fn as_frame(&self) -> Option<&Frame> {
        None
    }
}
