use super::FrameModel;
use crate::jvm::{
    BinaryName, Constant, Error, FieldType, Instruction, MethodAccessFlags, MethodDescriptor,
    Name, RefType, RenderDescriptor, ValueKind, Width,
};

/// Seed the local variables of a frame for the start of a method body
///
/// Local 0 holds the receiver for instance methods. Parameters follow, each taking as many slots
/// as its width, and are numbered from 0 without counting the receiver.
pub fn enter_method<F: FrameModel + ?Sized>(
    frame: &mut F,
    access_flags: MethodAccessFlags,
    descriptor: &MethodDescriptor,
) {
    let mut local_index: u16 = 0;
    if access_flags.has_receiver() {
        frame.init_receiver();
        local_index += 1;
    }
    for (arg_index, parameter) in descriptor.parameters.iter().enumerate() {
        frame.init_parameter(local_index, arg_index as u16);
        local_index += parameter.width() as u16;
    }
    log::debug!(
        "Entering method {} with {} parameter words",
        descriptor.render(),
        local_index
    );
}

/// Apply the stack effect of one instruction to a frame model
///
/// Errors are only returned for operands that no valid class file could contain. Word counts
/// are trusted: an instruction that does not fit the current stack depth is a contract violation
/// and the frame will panic.
pub fn interpret_instruction<F: FrameModel + ?Sized>(
    frame: &mut F,
    instruction: &Instruction,
) -> Result<(), Error> {
    use Instruction::*;
    log::trace!("Interpreting {:?}", instruction);

    match instruction {
        Nop | IInc(_, _) | Goto(_) | Ret(_) | CheckCast(_) => (),

        AConstNull | IConstM1 | IConst0 | IConst1 | IConst2 | IConst3 | IConst4 | IConst5
        | FConst0 | FConst1 | FConst2 | BiPush(_) | SiPush(_) | Jsr(_) => frame.push_primitive(),
        LConst0 | LConst1 | DConst0 | DConst1 => frame.push_primitive2(),

        Ldc(constant) => {
            if constant.width() != 1 {
                return Err(bad_operand(instruction, "two word constant"));
            }
            match constant {
                Constant::String(value) => frame.ldc_string(value),
                Constant::Class(class) => frame.ldc_class(&class_constant_name(class)),
                _ => frame.push_primitive(),
            }
        }
        Ldc2(constant) => {
            if constant.width() != 2 {
                return Err(bad_operand(instruction, "one word constant"));
            }
            frame.push_primitive2();
        }

        ILoad(_) | FLoad(_) => frame.push_primitive(),
        LLoad(_) | DLoad(_) => frame.push_primitive2(),
        ALoad(index) => frame.aload(*index),
        IStore(_) | FStore(_) => frame.pop(),
        LStore(_) | DStore(_) => frame.pop2(),
        AStore(index) => frame.astore(*index),

        IALoad | FALoad | BALoad | CALoad | SALoad => frame.primitive_array_load(),
        LALoad | DALoad => frame.primitive_array_load2(),
        AALoad => frame.aaload(),
        IAStore | FAStore | AAStore | BAStore | CAStore | SAStore => frame.pop3(),
        LAStore | DAStore => frame.pop4(),

        Pop => frame.pop(),
        Pop2 => frame.pop2(),
        Dup => frame.dup(),
        DupX1 => frame.dup_x1(),
        DupX2 => frame.dup_x2(),
        Dup2 => frame.dup2(),
        Dup2X1 => frame.dup2_x1(),
        Dup2X2 => frame.dup2_x2(),
        Swap => frame.swap(),

        IAdd | FAdd | ISub | FSub | IMul | FMul | IDiv | FDiv | IRem | FRem | IAnd | IOr
        | IXor | ISh(_) | FCmp(_) => {
            frame.pop2();
            frame.push_primitive();
        }
        LAdd | DAdd | LSub | DSub | LMul | DMul | LDiv | DDiv | LRem | DRem | LAnd | LOr
        | LXor => {
            frame.pop4();
            frame.push_primitive2();
        }
        LSh(_) => {
            frame.pop3();
            frame.push_primitive2();
        }
        LCmp | DCmp(_) => {
            frame.pop4();
            frame.push_primitive();
        }
        INeg | FNeg | I2F | F2I | I2B | I2C | I2S => {
            frame.pop();
            frame.push_primitive();
        }
        LNeg | DNeg | L2D | D2L => {
            frame.pop2();
            frame.push_primitive2();
        }
        I2L | I2D | F2L | F2D => {
            frame.pop();
            frame.push_primitive2();
        }
        L2I | L2F | D2I | D2F => {
            frame.pop2();
            frame.push_primitive();
        }

        If(_, _) | IfNull(_, _) | TableSwitch | LookupSwitch | MonitorEnter | MonitorExit => {
            frame.pop()
        }
        IfICmp(_, _) | IfACmp(_, _) => frame.pop2(),

        IReturn | FReturn | AReturn => frame.pop(),
        LReturn | DReturn => frame.pop2(),
        Return => (),

        GetStatic(field) => match field.descriptor.value_kind() {
            ValueKind::Object => frame.getstatic_object(
                field.class.as_str(),
                field.name.as_str(),
                &field.descriptor.render(),
            ),
            ValueKind::Primitive2 => frame.getstatic_primitive2(),
            _ => frame.getstatic_primitive(),
        },
        GetField(field) => match field.descriptor.value_kind() {
            ValueKind::Object => frame.getfield_object(
                field.class.as_str(),
                field.name.as_str(),
                &field.descriptor.render(),
            ),
            ValueKind::Primitive2 => frame.getfield_primitive2(),
            _ => frame.getfield_primitive(),
        },
        PutStatic(field) => pop_words(frame, field.descriptor.width()),
        PutField(field) => pop_words(frame, field.descriptor.width() + 1),

        Invoke(invoke_type, method) => {
            let args_size = method.descriptor.parameter_length(false);
            let owner = method.class.as_str();
            let name = method.name.as_str();
            if invoke_type.has_receiver() {
                match method.descriptor.return_kind() {
                    ValueKind::Void => frame.invoke_method_returns_void(args_size),
                    ValueKind::Primitive => frame.invoke_method_returns_primitive(args_size),
                    ValueKind::Primitive2 => frame.invoke_method_returns_primitive2(args_size),
                    ValueKind::Object => frame.invoke_method_returns_object(
                        invoke_type.opcode(),
                        args_size,
                        owner,
                        name,
                        &method.descriptor.render(),
                    ),
                }
            } else {
                invoke_static(frame, args_size, owner, name, &method.descriptor);
            }
        }
        InvokeDynamic(name, descriptor) => {
            let args_size = descriptor.parameter_length(false);
            invoke_static(
                frame,
                args_size,
                BinaryName::CALLSITE.as_str(),
                name.as_str(),
                descriptor,
            );
        }

        New(class) => frame.new_object(&class.render()),
        NewArray(element_type) => {
            let array_type = RefType::array(FieldType::Base(*element_type));
            frame.newarray(&array_type.render());
        }
        ANewArray(element_type) => {
            let array_type = RefType::array(FieldType::Ref(element_type.clone()));
            frame.newarray(&array_type.render());
        }
        MultiANewArray(array_type, dims) => {
            let dimensions = match array_type {
                RefType::Object(_) => 0,
                RefType::ObjectArray(arr) => arr.dimensions(),
                RefType::PrimitiveArray(arr) => arr.dimensions(),
            };
            if *dims == 0 {
                return Err(bad_operand(instruction, "zero dimensions"));
            }
            if *dims as usize > dimensions {
                let message = format!("{} dimensions for {}", dims, array_type.render());
                return Err(bad_operand(instruction, message));
            }
            frame.multianewarray(&array_type.render(), *dims as usize);
        }
        ArrayLength => frame.arraylength(),
        AThrow => frame.athrow(),
        InstanceOf(_) => frame.instance_of(),
    }

    Ok(())
}

fn invoke_static<F: FrameModel + ?Sized>(
    frame: &mut F,
    args_size: usize,
    owner: &str,
    name: &str,
    descriptor: &MethodDescriptor,
) {
    match descriptor.return_kind() {
        ValueKind::Void => frame.invoke_static_method_returns_void(args_size),
        ValueKind::Primitive => frame.invoke_static_method_returns_primitive(args_size),
        ValueKind::Primitive2 => frame.invoke_static_method_returns_primitive2(args_size),
        ValueKind::Object => {
            frame.invoke_static_method_returns_object(args_size, owner, name, &descriptor.render())
        }
    }
}

/// Pop a field value (and maybe its object) off the stack
fn pop_words<F: FrameModel + ?Sized>(frame: &mut F, words: usize) {
    match words {
        1 => frame.pop(),
        2 => frame.pop2(),
        3 => frame.pop3(),
        _ => frame.pop4(),
    }
}

/// Classes are named by internal name, array classes by descriptor
fn class_constant_name(class: &RefType) -> String {
    match class {
        RefType::Object(name) => name.as_str().to_owned(),
        array => array.render(),
    }
}

fn bad_operand(instruction: &Instruction, message: impl Into<String>) -> Error {
    Error::BadOperand {
        mnemonic: instruction.mnemonic(),
        message: message.into(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{
        BaseType, FieldRef, InvokeType, MethodRef, OrdComparison, ParseDescriptor, UnqualifiedName,
        INVOKEINTERFACE,
    };
    use crate::model::{Frame, ItemType, OwnedName};
    use pretty_assertions::assert_eq;

    fn method(class: &str, name: &str, descriptor: &str) -> MethodRef {
        MethodRef {
            class: BinaryName::from_str(class).unwrap(),
            name: UnqualifiedName::from_str(name).unwrap(),
            descriptor: MethodDescriptor::parse(descriptor).unwrap(),
        }
    }

    fn field(class: &str, name: &str, descriptor: &str) -> FieldRef {
        FieldRef {
            class: BinaryName::from_str(class).unwrap(),
            name: UnqualifiedName::from_str(name).unwrap(),
            descriptor: FieldType::parse(descriptor).unwrap(),
        }
    }

    fn run(frame: &mut Frame, instructions: &[Instruction]) {
        for instruction in instructions {
            interpret_instruction(frame, instruction).unwrap();
        }
    }

    #[test]
    fn entering_methods() {
        let descriptor = MethodDescriptor::parse("(JLjava/lang/String;I)V").unwrap();

        let mut frame = Frame::new(5, 0);
        enter_method(&mut frame, MethodAccessFlags::PUBLIC, &descriptor);
        assert_eq!(frame.local_value(0).item_type(), ItemType::Receiver);
        assert_eq!(frame.local_value(1).argument_index(), Some(0));
        assert_eq!(frame.local_value(2).item_type(), ItemType::Primitive);
        assert_eq!(frame.local_value(3).argument_index(), Some(1));
        assert_eq!(frame.local_value(4).argument_index(), Some(2));

        let mut frame = Frame::new(4, 0);
        enter_method(&mut frame, MethodAccessFlags::STATIC, &descriptor);
        assert_eq!(frame.local_value(0).argument_index(), Some(0));
        assert_eq!(frame.local_value(2).argument_index(), Some(1));
        assert_eq!(frame.local_value(3).argument_index(), Some(2));
    }

    #[test]
    fn long_arithmetic() {
        let mut frame = Frame::new(4, 6);
        run(
            &mut frame,
            &[
                Instruction::LLoad(0),
                Instruction::ILoad(2),
                Instruction::LSh(crate::jvm::ShiftType::Left),
                Instruction::LConst1,
                Instruction::LAdd,
                Instruction::L2I,
                Instruction::I2D,
                Instruction::DConst0,
                Instruction::DCmp(crate::jvm::CompareMode::G),
            ],
        );
        assert_eq!(frame.depth(), 1);
        run(&mut frame, &[Instruction::If(OrdComparison::LT, "end".to_owned())]);
        assert_eq!(frame.depth(), 0);
    }

    #[test]
    fn fields_and_calls() {
        let mut frame = Frame::new(1, 4);
        enter_method(
            &mut frame,
            MethodAccessFlags::PUBLIC,
            &MethodDescriptor::parse("()V").unwrap(),
        );
        run(
            &mut frame,
            &[
                Instruction::ALoad(0),
                Instruction::GetField(field("Foo", "map", "Ljava/util/Map;")),
                Instruction::Ldc(Constant::String("key".to_owned())),
                Instruction::Invoke(
                    InvokeType::Interface,
                    method("java/util/Map", "get", "(Ljava/lang/Object;)Ljava/lang/Object;"),
                ),
            ],
        );
        assert_eq!(frame.depth(), 1);
        let call = frame.top().clone();
        assert_eq!(call.item_type(), ItemType::MethodCall);
        assert_eq!(call.opcode(), Some(INVOKEINTERFACE));
        assert_eq!(
            call.method(),
            Some(&OwnedName::new(
                "java/util/Map",
                "get",
                "(Ljava/lang/Object;)Ljava/lang/Object;"
            ))
        );
        let types: Vec<ItemType> = call.chain().map(|item| item.item_type()).collect();
        assert_eq!(
            types,
            vec![
                ItemType::MethodCall,
                ItemType::FieldReference,
                ItemType::LocalVariable,
                ItemType::Receiver
            ]
        );

        run(
            &mut frame,
            &[
                Instruction::GetStatic(field("Foo", "count", "J")),
                Instruction::PutField(field("Foo", "total", "J")),
            ],
        );
        assert_eq!(frame.depth(), 0);
    }

    #[test]
    fn static_and_dynamic_calls() {
        let mut frame = Frame::new(0, 4);
        run(
            &mut frame,
            &[
                Instruction::LConst0,
                Instruction::IConst1,
                Instruction::Invoke(
                    InvokeType::Static,
                    method("Util", "wrap", "(JI)Ljava/lang/Object;"),
                ),
            ],
        );
        assert_eq!(frame.depth(), 1);
        assert_eq!(frame.top().item_type(), ItemType::StaticMethodCall);

        let descriptor = MethodDescriptor::parse("(Ljava/lang/Object;)Ljava/lang/Runnable;");
        run(
            &mut frame,
            &[Instruction::InvokeDynamic(
                UnqualifiedName::from_str("run").unwrap(),
                descriptor.unwrap(),
            )],
        );
        assert_eq!(frame.depth(), 1);
        let call = frame.top();
        assert_eq!(call.item_type(), ItemType::StaticMethodCall);
        assert_eq!(
            call.method().map(OwnedName::owner),
            Some("java/lang/invoke/CallSite")
        );
    }

    #[test]
    fn arrays() {
        let mut frame = Frame::new(0, 4);
        run(
            &mut frame,
            &[
                Instruction::IConst2,
                Instruction::IConst3,
                Instruction::MultiANewArray(RefType::parse("[[[I").unwrap(), 2),
            ],
        );
        assert_eq!(frame.depth(), 1);
        assert_eq!(frame.top().type_descriptor(), Some("[[[I"));

        run(
            &mut frame,
            &[
                Instruction::Pop,
                Instruction::IConst1,
                Instruction::NewArray(BaseType::Long),
                Instruction::IConst0,
                Instruction::LALoad,
            ],
        );
        assert_eq!(frame.depth(), 2);

        run(
            &mut frame,
            &[
                Instruction::Pop2,
                Instruction::IConst1,
                Instruction::ANewArray(RefType::parse("Ljava/lang/String;").unwrap()),
                Instruction::Dup,
                Instruction::ArrayLength,
                Instruction::AALoad,
            ],
        );
        assert_eq!(frame.depth(), 1);
        let element = frame.top();
        assert_eq!(element.item_type(), ItemType::ArrayReference);
        assert_eq!(
            element.object().and_then(|array| array.type_descriptor()),
            Some("[Ljava/lang/String;")
        );
    }

    #[test]
    fn class_constants() {
        let mut frame = Frame::new(0, 2);
        run(
            &mut frame,
            &[
                Instruction::Ldc(Constant::Class(RefType::parse("Ljava/util/List;").unwrap())),
                Instruction::Ldc(Constant::Class(RefType::parse("[I").unwrap())),
            ],
        );
        assert_eq!(frame.peek(1).class_name(), Some("java/util/List"));
        assert_eq!(frame.peek(0).class_name(), Some("[I"));
    }

    #[test]
    fn bad_operands() {
        let mut frame = Frame::new(0, 4);
        let too_many = Instruction::MultiANewArray(RefType::parse("[[I").unwrap(), 3);
        assert!(matches!(
            interpret_instruction(&mut frame, &too_many),
            Err(Error::BadOperand {
                mnemonic: "multianewarray",
                ..
            })
        ));
        let not_array = Instruction::MultiANewArray(RefType::parse("LFoo;").unwrap(), 1);
        assert!(interpret_instruction(&mut frame, &not_array).is_err());
        let zero = Instruction::MultiANewArray(RefType::parse("[I").unwrap(), 0);
        assert!(interpret_instruction(&mut frame, &zero).is_err());
        let wide = Instruction::Ldc(Constant::Long(1));
        assert!(interpret_instruction(&mut frame, &wide).is_err());
        let narrow = Instruction::Ldc2(Constant::Integer(1));
        assert!(interpret_instruction(&mut frame, &narrow).is_err());

        // Rejected operands leave the frame alone
        assert_eq!(frame.depth(), 0);
    }
}
