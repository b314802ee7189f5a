use super::Error;
use crate::jvm::{
    self, BaseType, BinaryName, CompareMode, Constant, EqComparison, FieldRef, FieldType,
    Instruction, InvokeType, MethodAccessFlags, MethodDescriptor, MethodRef, Name,
    OrdComparison, ParseDescriptor, RefType, RenderDescriptor, ShiftType, UnqualifiedName,
};
use std::str::Chars;

/// Method body, as a sequence of visitor events
#[derive(Clone, Debug, PartialEq)]
pub struct MethodTrace {
    pub name: UnqualifiedName,
    pub access_flags: MethodAccessFlags,
    pub descriptor: MethodDescriptor,

    /// Size of the local variable array (0 when the trace doesn't say)
    pub max_locals: u16,

    /// Size of the operand stack (0 when the trace doesn't say)
    pub max_stack: u16,

    pub steps: Vec<Step>,
}

impl MethodTrace {
    /// Name and descriptor (eg. `toString()Ljava/lang/String;`)
    pub fn signature(&self) -> String {
        format!("{}{}", self.name, self.descriptor.render())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    /// Line in the trace source
    pub line: usize,
    pub kind: StepKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepKind {
    Instruction(Instruction),

    /// Line number from the `LineNumberTable`
    SourceLine(u32),

    /// Start of a local variable's scope
    Var {
        slot: u16,
        name: UnqualifiedName,
        descriptor: FieldType,
    },

    /// End of a local variable's scope
    EndVar(u16),

    /// Entry into an exception handler
    Catch(BinaryName),

    /// Entry into a `finally` handler
    Finally,

    /// Print out the frame
    Dump,

    /// Mnemonic that isn't recognized
    Unknown(String),
}

/// Problem on a single line, before the line number is attached
enum LineError {
    Syntax(String),
    Jvm(jvm::Error),
}

impl LineError {
    fn at(self, line: usize) -> Error {
        match self {
            LineError::Syntax(message) => Error::Syntax { line, message },
            LineError::Jvm(error) => Error::Jvm { line, error },
        }
    }
}

impl From<jvm::Error> for LineError {
    fn from(err: jvm::Error) -> LineError {
        LineError::Jvm(err)
    }
}

type LineResult<T> = Result<T, LineError>;

fn syntax<T>(message: impl Into<String>) -> LineResult<T> {
    Err(LineError::Syntax(message.into()))
}

/// Parse every method in a trace
pub fn parse_trace(source: &str) -> Result<Vec<MethodTrace>, Error> {
    let mut methods = vec![];
    let mut current: Option<MethodTrace> = None;
    let mut last_line = 0;

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        last_line = line;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let (word, rest) = match text.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (text, ""),
        };

        match word {
            ".method" => {
                if let Some(open) = &current {
                    let message = format!("'.method' inside of method '{}'", open.signature());
                    return Err(Error::Syntax { line, message });
                }
                current = Some(parse_method_header(rest).map_err(|err| err.at(line))?);
            }
            ".end" => match current.take() {
                Some(method) => {
                    log::debug!(
                        "Parsed method {} with {} steps",
                        method.signature(),
                        method.steps.len()
                    );
                    methods.push(method);
                }
                None => {
                    let message = String::from("'.end' outside of a method");
                    return Err(Error::Syntax { line, message });
                }
            },
            _ => {
                let method = match current.as_mut() {
                    Some(method) => method,
                    None => {
                        let message = format!("'{}' outside of a method", word);
                        return Err(Error::Syntax { line, message });
                    }
                };
                parse_body_line(method, line, word, rest).map_err(|err| err.at(line))?;
            }
        }
    }

    if let Some(method) = current {
        let message = format!("method '{}' is missing '.end'", method.signature());
        return Err(Error::Syntax {
            line: last_line,
            message,
        });
    }
    Ok(methods)
}

fn parse_method_header(header: &str) -> LineResult<MethodTrace> {
    let tokens: Vec<&str> = header.split_whitespace().collect();
    let (flags, name, descriptor) = match tokens.as_slice() {
        [flags @ .., name, descriptor] => (flags, *name, *descriptor),
        _ => return syntax("expected '.method [flags] name descriptor'"),
    };

    let mut access_flags = MethodAccessFlags::empty();
    for flag in flags {
        match MethodAccessFlags::from_keyword(flag) {
            Some(flag) => access_flags |= flag,
            None => return syntax(format!("unknown access flag '{}'", flag)),
        }
    }

    Ok(MethodTrace {
        name: parse_name(name)?,
        access_flags,
        descriptor: parse_descriptor(descriptor)?,
        max_locals: 0,
        max_stack: 0,
        steps: vec![],
    })
}

fn parse_body_line(
    method: &mut MethodTrace,
    line: usize,
    word: &str,
    rest: &str,
) -> LineResult<()> {
    let kind = match word {
        ".limit" => {
            let [what, value] = expect_operands::<2>(word, rest)?;
            let value = parse_number("limit", value)?;
            match what {
                "locals" => method.max_locals = value,
                "stack" => method.max_stack = value,
                _ => return syntax(format!("unknown limit '{}'", what)),
            }
            return Ok(());
        }
        ".line" => {
            let [number] = expect_operands::<1>(word, rest)?;
            StepKind::SourceLine(parse_number("line number", number)?)
        }
        ".var" => {
            let [slot, name, descriptor] = expect_operands::<3>(word, rest)?;
            StepKind::Var {
                slot: parse_number("local slot", slot)?,
                name: parse_name(name)?,
                descriptor: parse_descriptor(descriptor)?,
            }
        }
        ".endvar" => {
            let [slot] = expect_operands::<1>(word, rest)?;
            StepKind::EndVar(parse_number("local slot", slot)?)
        }
        ".catch" => {
            let [class] = expect_operands::<1>(word, rest)?;
            StepKind::Catch(parse_name(class)?)
        }
        ".finally" => {
            expect_operands::<0>(word, rest)?;
            StepKind::Finally
        }
        ".dump" => {
            expect_operands::<0>(word, rest)?;
            StepKind::Dump
        }
        directive if directive.starts_with('.') => {
            return syntax(format!("unknown directive '{}'", directive))
        }
        mnemonic => match parse_instruction(mnemonic, rest)? {
            Some(instruction) => StepKind::Instruction(instruction),
            None => StepKind::Unknown(mnemonic.to_owned()),
        },
    };
    method.steps.push(Step { line, kind });
    Ok(())
}

/// Parse an instruction, returning `None` if the mnemonic is not known
fn parse_instruction(mnemonic: &str, operands: &str) -> LineResult<Option<Instruction>> {
    use Instruction::*;

    if let Some(instruction) = no_operand_instruction(mnemonic) {
        expect_operands::<0>(mnemonic, operands)?;
        return Ok(Some(instruction));
    }
    if let Some(instruction) = implicit_local_instruction(mnemonic) {
        expect_operands::<0>(mnemonic, operands)?;
        return Ok(Some(instruction));
    }

    let instruction = match mnemonic {
        "wide" => {
            let (inner, rest) = operands
                .split_once(char::is_whitespace)
                .unwrap_or((operands, ""));
            if local_instruction(inner, 0).is_none() && inner != "iinc" && inner != "ret" {
                return syntax(format!("'wide' cannot modify '{}'", inner));
            }
            return parse_instruction(inner, rest.trim());
        }

        "iload" | "lload" | "fload" | "dload" | "aload" | "istore" | "lstore" | "fstore"
        | "dstore" | "astore" => {
            let [slot] = expect_operands::<1>(mnemonic, operands)?;
            let slot = parse_number("local slot", slot)?;
            match local_instruction(mnemonic, slot) {
                Some(instruction) => instruction,
                None => return Ok(None),
            }
        }
        "iinc" => {
            let [slot, increment] = expect_operands::<2>(mnemonic, operands)?;
            IInc(
                parse_number("local slot", slot)?,
                parse_number("increment", increment)?,
            )
        }
        "ret" => {
            let [slot] = expect_operands::<1>(mnemonic, operands)?;
            Ret(parse_number("local slot", slot)?)
        }

        "bipush" => {
            let [value] = expect_operands::<1>(mnemonic, operands)?;
            BiPush(parse_number("byte", value)?)
        }
        "sipush" => {
            let [value] = expect_operands::<1>(mnemonic, operands)?;
            SiPush(parse_number("short", value)?)
        }
        "ldc" | "ldc_w" => Ldc(parse_constant(operands)?),
        "ldc2_w" => Ldc2(parse_constant(operands)?),

        "ifeq" => If(OrdComparison::EQ, parse_label(mnemonic, operands)?),
        "ifne" => If(OrdComparison::NE, parse_label(mnemonic, operands)?),
        "iflt" => If(OrdComparison::LT, parse_label(mnemonic, operands)?),
        "ifge" => If(OrdComparison::GE, parse_label(mnemonic, operands)?),
        "ifgt" => If(OrdComparison::GT, parse_label(mnemonic, operands)?),
        "ifle" => If(OrdComparison::LE, parse_label(mnemonic, operands)?),
        "if_icmpeq" => IfICmp(OrdComparison::EQ, parse_label(mnemonic, operands)?),
        "if_icmpne" => IfICmp(OrdComparison::NE, parse_label(mnemonic, operands)?),
        "if_icmplt" => IfICmp(OrdComparison::LT, parse_label(mnemonic, operands)?),
        "if_icmpge" => IfICmp(OrdComparison::GE, parse_label(mnemonic, operands)?),
        "if_icmpgt" => IfICmp(OrdComparison::GT, parse_label(mnemonic, operands)?),
        "if_icmple" => IfICmp(OrdComparison::LE, parse_label(mnemonic, operands)?),
        "if_acmpeq" => IfACmp(EqComparison::EQ, parse_label(mnemonic, operands)?),
        "if_acmpne" => IfACmp(EqComparison::NE, parse_label(mnemonic, operands)?),
        "ifnull" => IfNull(EqComparison::EQ, parse_label(mnemonic, operands)?),
        "ifnonnull" => IfNull(EqComparison::NE, parse_label(mnemonic, operands)?),
        "goto" | "goto_w" => Goto(parse_label(mnemonic, operands)?),
        "jsr" | "jsr_w" => Jsr(parse_label(mnemonic, operands)?),

        // Jump tables don't change the stack beyond the key
        "tableswitch" => TableSwitch,
        "lookupswitch" => LookupSwitch,

        "getstatic" => GetStatic(parse_field(mnemonic, operands)?),
        "putstatic" => PutStatic(parse_field(mnemonic, operands)?),
        "getfield" => GetField(parse_field(mnemonic, operands)?),
        "putfield" => PutField(parse_field(mnemonic, operands)?),

        "invokevirtual" => Invoke(InvokeType::Virtual, parse_method(mnemonic, operands)?),
        "invokespecial" => Invoke(InvokeType::Special, parse_method(mnemonic, operands)?),
        "invokestatic" => Invoke(InvokeType::Static, parse_method(mnemonic, operands)?),
        "invokeinterface" => Invoke(InvokeType::Interface, parse_method(mnemonic, operands)?),
        "invokedynamic" => {
            let [call_site] = expect_operands::<1>(mnemonic, operands)?;
            let (name, descriptor) = split_method_descriptor(call_site)?;
            InvokeDynamic(parse_name(name)?, parse_descriptor(descriptor)?)
        }

        "new" => {
            let [class] = expect_operands::<1>(mnemonic, operands)?;
            New(parse_name(class)?)
        }
        "newarray" => {
            let [element_type] = expect_operands::<1>(mnemonic, operands)?;
            let base_type = BaseType::from_keyword(element_type).or_else(|| {
                let code = element_type.parse::<u8>().ok()?;
                BaseType::from_array_type_code(code)
            });
            match base_type {
                Some(element_type) => NewArray(element_type),
                None => return syntax(format!("'{}' is not a primitive type", element_type)),
            }
        }
        "anewarray" => {
            let [class] = expect_operands::<1>(mnemonic, operands)?;
            ANewArray(parse_class(class)?)
        }
        "checkcast" => {
            let [class] = expect_operands::<1>(mnemonic, operands)?;
            CheckCast(parse_class(class)?)
        }
        "instanceof" => {
            let [class] = expect_operands::<1>(mnemonic, operands)?;
            InstanceOf(parse_class(class)?)
        }
        "multianewarray" => {
            let [array_type, dimensions] = expect_operands::<2>(mnemonic, operands)?;
            MultiANewArray(
                parse_descriptor(array_type)?,
                parse_number("dimension count", dimensions)?,
            )
        }

        _ => return Ok(None),
    };
    Ok(Some(instruction))
}

fn no_operand_instruction(mnemonic: &str) -> Option<Instruction> {
    use Instruction::*;

    let instruction = match mnemonic {
        "nop" => Nop,
        "aconst_null" => AConstNull,
        "iconst_m1" => IConstM1,
        "iconst_0" => IConst0,
        "iconst_1" => IConst1,
        "iconst_2" => IConst2,
        "iconst_3" => IConst3,
        "iconst_4" => IConst4,
        "iconst_5" => IConst5,
        "lconst_0" => LConst0,
        "lconst_1" => LConst1,
        "fconst_0" => FConst0,
        "fconst_1" => FConst1,
        "fconst_2" => FConst2,
        "dconst_0" => DConst0,
        "dconst_1" => DConst1,
        "iaload" => IALoad,
        "laload" => LALoad,
        "faload" => FALoad,
        "daload" => DALoad,
        "aaload" => AALoad,
        "baload" => BALoad,
        "caload" => CALoad,
        "saload" => SALoad,
        "iastore" => IAStore,
        "lastore" => LAStore,
        "fastore" => FAStore,
        "dastore" => DAStore,
        "aastore" => AAStore,
        "bastore" => BAStore,
        "castore" => CAStore,
        "sastore" => SAStore,
        "pop" => Pop,
        "pop2" => Pop2,
        "dup" => Dup,
        "dup_x1" => DupX1,
        "dup_x2" => DupX2,
        "dup2" => Dup2,
        "dup2_x1" => Dup2X1,
        "dup2_x2" => Dup2X2,
        "swap" => Swap,
        "iadd" => IAdd,
        "ladd" => LAdd,
        "fadd" => FAdd,
        "dadd" => DAdd,
        "isub" => ISub,
        "lsub" => LSub,
        "fsub" => FSub,
        "dsub" => DSub,
        "imul" => IMul,
        "lmul" => LMul,
        "fmul" => FMul,
        "dmul" => DMul,
        "idiv" => IDiv,
        "ldiv" => LDiv,
        "fdiv" => FDiv,
        "ddiv" => DDiv,
        "irem" => IRem,
        "lrem" => LRem,
        "frem" => FRem,
        "drem" => DRem,
        "ineg" => INeg,
        "lneg" => LNeg,
        "fneg" => FNeg,
        "dneg" => DNeg,
        "ishl" => ISh(ShiftType::Left),
        "ishr" => ISh(ShiftType::ArithmeticRight),
        "iushr" => ISh(ShiftType::LogicalRight),
        "lshl" => LSh(ShiftType::Left),
        "lshr" => LSh(ShiftType::ArithmeticRight),
        "lushr" => LSh(ShiftType::LogicalRight),
        "iand" => IAnd,
        "land" => LAnd,
        "ior" => IOr,
        "lor" => LOr,
        "ixor" => IXor,
        "lxor" => LXor,
        "i2l" => I2L,
        "i2f" => I2F,
        "i2d" => I2D,
        "l2i" => L2I,
        "l2f" => L2F,
        "l2d" => L2D,
        "f2i" => F2I,
        "f2l" => F2L,
        "f2d" => F2D,
        "d2i" => D2I,
        "d2l" => D2L,
        "d2f" => D2F,
        "i2b" => I2B,
        "i2c" => I2C,
        "i2s" => I2S,
        "lcmp" => LCmp,
        "fcmpl" => FCmp(CompareMode::L),
        "fcmpg" => FCmp(CompareMode::G),
        "dcmpl" => DCmp(CompareMode::L),
        "dcmpg" => DCmp(CompareMode::G),
        "ireturn" => IReturn,
        "lreturn" => LReturn,
        "freturn" => FReturn,
        "dreturn" => DReturn,
        "areturn" => AReturn,
        "return" => Return,
        "arraylength" => ArrayLength,
        "athrow" => AThrow,
        "monitorenter" => MonitorEnter,
        "monitorexit" => MonitorExit,
        _ => return None,
    };
    Some(instruction)
}

fn local_instruction(mnemonic: &str, slot: u16) -> Option<Instruction> {
    use Instruction::*;

    let instruction = match mnemonic {
        "iload" => ILoad(slot),
        "lload" => LLoad(slot),
        "fload" => FLoad(slot),
        "dload" => DLoad(slot),
        "aload" => ALoad(slot),
        "istore" => IStore(slot),
        "lstore" => LStore(slot),
        "fstore" => FStore(slot),
        "dstore" => DStore(slot),
        "astore" => AStore(slot),
        _ => return None,
    };
    Some(instruction)
}

/// Short forms like `aload_0` or `istore_3`
fn implicit_local_instruction(mnemonic: &str) -> Option<Instruction> {
    let (base, slot) = mnemonic.split_once('_')?;
    match slot.parse::<u16>() {
        Ok(slot) if slot <= 3 => local_instruction(base, slot),
        _ => None,
    }
}

/// Split operands on whitespace, checking there are exactly `N` of them
fn expect_operands<'a, const N: usize>(what: &str, operands: &'a str) -> LineResult<[&'a str; N]> {
    let tokens: Vec<&str> = operands.split_whitespace().collect();
    let found = tokens.len();
    match <[&str; N]>::try_from(tokens) {
        Ok(tokens) => Ok(tokens),
        Err(_) => syntax(format!(
            "'{}' takes {} operand(s) but got {}",
            what, N, found
        )),
    }
}

fn parse_number<T: std::str::FromStr>(what: &str, token: &str) -> LineResult<T> {
    match token.parse() {
        Ok(value) => Ok(value),
        Err(_) => syntax(format!("invalid {} '{}'", what, token)),
    }
}

fn parse_name<N: Name>(name: &str) -> LineResult<N> {
    N::from_str(name).map_err(|message| LineError::Jvm(jvm::Error::BadName(message)))
}

fn parse_descriptor<D: ParseDescriptor>(descriptor: &str) -> LineResult<D> {
    D::parse(descriptor).map_err(|err| {
        LineError::Jvm(jvm::Error::BadDescriptor {
            descriptor: descriptor.to_owned(),
            message: err.to_string(),
        })
    })
}

fn parse_label(mnemonic: &str, operands: &str) -> LineResult<String> {
    let [label] = expect_operands::<1>(mnemonic, operands)?;
    Ok(label.to_owned())
}

/// Class name (eg. `java/lang/String`) or array descriptor (eg. `[I`)
fn parse_class(class: &str) -> LineResult<RefType> {
    if class.starts_with('[') {
        parse_descriptor(class)
    } else {
        Ok(RefType::Object(parse_name(class)?))
    }
}

/// Split `owner/Class.member` at the last dot
fn split_member(member: &str) -> LineResult<(&str, &str)> {
    match member.rsplit_once('.') {
        Some(split) => Ok(split),
        None => syntax(format!("expected 'owner.name' but got '{}'", member)),
    }
}

/// Split `name(args)ret` at the opening parenthesis
fn split_method_descriptor(method: &str) -> LineResult<(&str, &str)> {
    match method.find('(') {
        Some(paren) => Ok(method.split_at(paren)),
        None => syntax(format!("missing method descriptor in '{}'", method)),
    }
}

fn parse_field(mnemonic: &str, operands: &str) -> LineResult<FieldRef> {
    let [member, descriptor] = expect_operands::<2>(mnemonic, operands)?;
    let (class, name) = split_member(member)?;
    Ok(FieldRef {
        class: parse_name(class)?,
        name: parse_name(name)?,
        descriptor: parse_descriptor(descriptor)?,
    })
}

fn parse_method(mnemonic: &str, operands: &str) -> LineResult<MethodRef> {
    let [method] = expect_operands::<1>(mnemonic, operands)?;
    let (member, descriptor) = split_method_descriptor(method)?;
    let (class, name) = split_member(member)?;
    Ok(MethodRef {
        class: parse_name(class)?,
        name: parse_name(name)?,
        descriptor: parse_descriptor(descriptor)?,
    })
}

/// Quoted string, or a kind tag followed by a value (eg. `int -3`)
fn parse_constant(operands: &str) -> LineResult<Constant> {
    if operands.starts_with('"') {
        return parse_quoted(operands).map(Constant::String);
    }
    let (kind, value) = match operands.split_once(char::is_whitespace) {
        Some((kind, value)) => (kind, value.trim()),
        None => return syntax(format!("expected a tagged constant but got '{}'", operands)),
    };
    let constant = match kind {
        "int" => Constant::Integer(parse_number("int", value)?),
        "float" => Constant::Float(parse_number("float", value)?),
        "long" => Constant::Long(parse_number("long", value)?),
        "double" => Constant::Double(parse_number("double", value)?),
        "class" => Constant::Class(parse_class(value)?),
        "methodtype" => Constant::MethodType(parse_descriptor(value)?),
        _ => return syntax(format!("unknown constant kind '{}'", kind)),
    };
    Ok(constant)
}

/// String in double quotes, with `\"`, `\\`, `\n`, `\r`, and `\t` escapes
fn parse_quoted(text: &str) -> LineResult<String> {
    let mut chars: Chars = text.chars();
    if chars.next() != Some('"') {
        return syntax("expected '\"' to start a string");
    }

    let mut value = String::new();
    loop {
        match chars.next() {
            None => return syntax("unterminated string"),
            Some('"') => break,
            Some('\\') => match chars.next() {
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some('t') => value.push('\t'),
                Some(c @ ('"' | '\\')) => value.push(c),
                Some(c) => return syntax(format!("unknown escape '\\{}'", c)),
                None => return syntax("unterminated string"),
            },
            Some(c) => value.push(c),
        }
    }

    if !chars.as_str().trim().is_empty() {
        return syntax(format!("unexpected '{}' after string", chars.as_str().trim()));
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn instruction(mnemonic: &str, operands: &str) -> Instruction {
        match parse_instruction(mnemonic, operands) {
            Ok(Some(instruction)) => instruction,
            Ok(None) => panic!("unknown mnemonic {}", mnemonic),
            Err(LineError::Syntax(message)) => panic!("{}", message),
            Err(LineError::Jvm(error)) => panic!("{}", error),
        }
    }

    fn rejects(mnemonic: &str, operands: &str) -> bool {
        parse_instruction(mnemonic, operands).is_err()
    }

    #[test]
    fn locals() {
        assert_eq!(instruction("aload_2", ""), Instruction::ALoad(2));
        assert_eq!(instruction("dstore", "7"), Instruction::DStore(7));
        assert_eq!(instruction("wide", "iload 300"), Instruction::ILoad(300));
        assert_eq!(instruction("wide", "iinc 300 -1000"), Instruction::IInc(300, -1000));
        assert!(matches!(parse_instruction("aload_4", ""), Ok(None)));
        assert!(rejects("wide", "bipush 3"));
        assert!(rejects("aload", ""));
        assert!(rejects("aload_0", "1"));
    }

    #[test]
    fn constants() {
        assert_eq!(
            instruction("ldc", r#""a \"quoted\"\tstring""#),
            Instruction::Ldc(Constant::String("a \"quoted\"\tstring".to_owned()))
        );
        assert_eq!(
            instruction("ldc_w", "int -3"),
            Instruction::Ldc(Constant::Integer(-3))
        );
        assert_eq!(
            instruction("ldc2_w", "double 2.5"),
            Instruction::Ldc2(Constant::Double(2.5))
        );
        assert_eq!(
            instruction("ldc", "class [Ljava/lang/String;"),
            Instruction::Ldc(Constant::Class(
                RefType::parse("[Ljava/lang/String;").unwrap()
            ))
        );
        assert_eq!(instruction("bipush", "-128"), Instruction::BiPush(-128));
        assert!(rejects("bipush", "128"));
        assert!(rejects("ldc", "\"unterminated"));
        assert!(rejects("ldc", "\"trailing\" junk"));
        assert!(rejects("ldc", "char c"));
    }

    #[test]
    fn members() {
        assert_eq!(
            instruction("getfield", "a/B.next La/B;"),
            Instruction::GetField(FieldRef {
                class: BinaryName::from_str("a/B").unwrap(),
                name: UnqualifiedName::from_str("next").unwrap(),
                descriptor: FieldType::parse("La/B;").unwrap(),
            })
        );
        assert_eq!(
            instruction("invokespecial", "java/lang/Object.<init>()V"),
            Instruction::Invoke(
                InvokeType::Special,
                MethodRef {
                    class: BinaryName::OBJECT,
                    name: UnqualifiedName::INIT,
                    descriptor: MethodDescriptor::parse("()V").unwrap(),
                }
            )
        );
        assert!(matches!(
            instruction("invokedynamic", "apply(I)Ljava/util/function/Function;"),
            Instruction::InvokeDynamic(_, _)
        ));
        assert!(rejects("getfield", "noOwner I"));
        assert!(rejects("invokevirtual", "a/B.m"));
        assert!(matches!(
            parse_instruction("getstatic", "a/B.c Q"),
            Err(LineError::Jvm(jvm::Error::BadDescriptor { .. }))
        ));
        assert!(matches!(
            parse_instruction("new", "a.B"),
            Err(LineError::Jvm(jvm::Error::BadName(_)))
        ));
    }

    #[test]
    fn allocation() {
        assert_eq!(
            instruction("newarray", "long"),
            Instruction::NewArray(BaseType::Long)
        );
        assert_eq!(
            instruction("multianewarray", "[[I 2"),
            Instruction::MultiANewArray(RefType::parse("[[I").unwrap(), 2)
        );
        assert_eq!(instruction("newarray", "10"), Instruction::NewArray(BaseType::Int));
        assert!(rejects("newarray", "string"));
        assert!(rejects("newarray", "12"));
    }

    #[test]
    fn mnemonics_round_trip() {
        for mnemonic in ["dup2_x1", "lushr", "fcmpg", "monitorexit", "i2s", "areturn"] {
            assert_eq!(instruction(mnemonic, "").mnemonic(), mnemonic);
        }
        assert_eq!(instruction("ifnonnull", "L1").mnemonic(), "ifnonnull");
        assert_eq!(instruction("if_icmple", "L1").mnemonic(), "if_icmple");
    }

    #[test]
    fn whole_trace() {
        let source = "\
# sample
.method public static main ([Ljava/lang/String;)V
.limit locals 1
.limit stack 2
.line 3
.var 0 args [Ljava/lang/String;
  getstatic java/lang/System.out Ljava/io/PrintStream;
  ldc \"hi\"
  invokevirtual java/io/PrintStream.println(Ljava/lang/String;)V
  breakpoint
.endvar 0
  return
.end
";
        let methods = parse_trace(source).unwrap();
        assert_eq!(methods.len(), 1);
        let method = &methods[0];
        assert_eq!(method.signature(), "main([Ljava/lang/String;)V");
        assert_eq!(
            method.access_flags,
            MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC
        );
        assert_eq!((method.max_locals, method.max_stack), (1, 2));
        assert_eq!(method.steps.len(), 8);
        assert_eq!(method.steps[0].kind, StepKind::SourceLine(3));
        assert_eq!(method.steps[0].line, 5);
        assert_eq!(
            method.steps[5].kind,
            StepKind::Unknown("breakpoint".to_owned())
        );
        assert_eq!(method.steps[6].kind, StepKind::EndVar(0));
    }

    #[test]
    fn trace_structure_errors() {
        let errors = [
            ("  nop\n", 1),
            (".method m ()V\n.method n ()V\n", 2),
            (".end\n", 1),
            (".method m ()V\n  nop\n", 2),
            (".method m ()V\n.limit heap 3\n.end\n", 2),
            (".method m ()V\n.frobnicate\n.end\n", 2),
            (".method weird m ()V\n.end\n", 1),
        ];
        for (source, expected_line) in errors {
            match parse_trace(source) {
                Err(Error::Syntax { line, .. }) => assert_eq!(line, expected_line, "{:?}", source),
                other => panic!("expected a syntax error for {:?}, got {:?}", source, other),
            }
        }

        match parse_trace(".method m ()V\n  new [I\n.end\n") {
            Err(Error::Jvm { line: 2, .. }) => (),
            other => panic!("expected a bad name, got {:?}", other),
        }
    }
}
