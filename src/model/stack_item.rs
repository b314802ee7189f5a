use crate::jvm::{INVOKEINTERFACE, INVOKESPECIAL, INVOKESTATIC, INVOKEVIRTUAL};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::rc::Rc;

/// Line number from the method's `LineNumberTable`, if one has been visited yet
pub type SourceLine = Option<u32>;

/// Field or method, identified by its owning class, name, and descriptor
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnedName {
    owner: String,
    name: String,
    descriptor: String,
}

impl OwnedName {
    pub fn new(owner: &str, name: &str, descriptor: &str) -> OwnedName {
        OwnedName {
            owner: owner.to_owned(),
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    /// Internal name of the owning class (eg. `java/lang/Object`)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

impl Display for OwnedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.descriptor.starts_with('(') {
            write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
        } else {
            write!(f, "{}.{}:{}", self.owner, self.name, self.descriptor)
        }
    }
}

/// Declared identity of a local variable slot
///
/// This comes from the `LocalVariableTable` and is tracked separately from the provenance of the
/// value held in the slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocalVariable {
    Unknown,
    Named { name: String, descriptor: String },
}

impl LocalVariable {
    pub fn new(name: &str, descriptor: &str) -> LocalVariable {
        LocalVariable::Named {
            name: name.to_owned(),
            descriptor: descriptor.to_owned(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            LocalVariable::Unknown => None,
            LocalVariable::Named { name, .. } => Some(name),
        }
    }

    pub fn descriptor(&self) -> Option<&str> {
        match self {
            LocalVariable::Unknown => None,
            LocalVariable::Named { descriptor, .. } => Some(descriptor),
        }
    }
}

impl Default for LocalVariable {
    fn default() -> LocalVariable {
        LocalVariable::Unknown
    }
}

impl Display for LocalVariable {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LocalVariable::Unknown => f.write_str("?"),
            LocalVariable::Named { name, descriptor } => write!(f, "{}:{}", name, descriptor),
        }
    }
}

/// Discriminant of a [`StackItem`], for exhaustive dispatch
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    Primitive,
    Receiver,
    Parameter,
    LocalVariable,
    FieldReference,
    StaticFieldReference,
    ArrayReference,
    MethodCall,
    StaticMethodCall,
    NewObject,
    NewArray,
    StringConstant,
    ClassConstant,
    Exception,
}

/// Where a value on the operand stack or in a local variable came from
///
/// Items are immutable and shared: the same item may sit in several stack slots at once (after a
/// `dup`), in a local variable, and inside the chains of other items. Only the frame model
/// creates them.
#[derive(Debug)]
pub struct StackItem {
    line: SourceLine,
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Primitive,
    Receiver,
    Parameter(u16),
    LocalVariable {
        slot: u16,
        local: LocalVariable,
        value: Rc<StackItem>,
    },
    FieldReference {
        object: Rc<StackItem>,
        field: OwnedName,
    },
    StaticFieldReference(OwnedName),
    ArrayReference {
        array: Rc<StackItem>,
        index: i32,
    },
    MethodCall {
        opcode: u8,
        receiver: Rc<StackItem>,
        method: OwnedName,
    },
    StaticMethodCall(OwnedName),
    NewObject(String),
    NewArray(String),
    StringConstant(String),
    ClassConstant(String),
    Exception(String),
}

impl StackItem {
    fn new(line: SourceLine, kind: Kind) -> StackItem {
        StackItem { line, kind }
    }

    pub(super) fn primitive() -> StackItem {
        StackItem::new(None, Kind::Primitive)
    }

    pub(super) fn receiver() -> StackItem {
        StackItem::new(None, Kind::Receiver)
    }

    pub(super) fn parameter(arg_index: u16) -> StackItem {
        StackItem::new(None, Kind::Parameter(arg_index))
    }

    pub(super) fn local_variable(
        line: SourceLine,
        slot: u16,
        local: LocalVariable,
        value: Rc<StackItem>,
    ) -> StackItem {
        StackItem::new(line, Kind::LocalVariable { slot, local, value })
    }

    pub(super) fn field_reference(
        line: SourceLine,
        object: Rc<StackItem>,
        field: OwnedName,
    ) -> StackItem {
        StackItem::new(line, Kind::FieldReference { object, field })
    }

    pub(super) fn static_field_reference(line: SourceLine, field: OwnedName) -> StackItem {
        StackItem::new(line, Kind::StaticFieldReference(field))
    }

    pub(super) fn array_reference(line: SourceLine, array: Rc<StackItem>, index: i32) -> StackItem {
        StackItem::new(line, Kind::ArrayReference { array, index })
    }

    pub(super) fn method_call(
        line: SourceLine,
        opcode: u8,
        receiver: Rc<StackItem>,
        method: OwnedName,
    ) -> StackItem {
        StackItem::new(
            line,
            Kind::MethodCall {
                opcode,
                receiver,
                method,
            },
        )
    }

    pub(super) fn static_method_call(line: SourceLine, method: OwnedName) -> StackItem {
        StackItem::new(line, Kind::StaticMethodCall(method))
    }

    pub(super) fn new_object(line: SourceLine, descriptor: &str) -> StackItem {
        StackItem::new(line, Kind::NewObject(descriptor.to_owned()))
    }

    pub(super) fn new_array(line: SourceLine, descriptor: &str) -> StackItem {
        StackItem::new(line, Kind::NewArray(descriptor.to_owned()))
    }

    pub(super) fn string_constant(line: SourceLine, value: &str) -> StackItem {
        StackItem::new(line, Kind::StringConstant(value.to_owned()))
    }

    pub(super) fn class_constant(line: SourceLine, class_name: &str) -> StackItem {
        StackItem::new(line, Kind::ClassConstant(class_name.to_owned()))
    }

    pub(super) fn exception(line: SourceLine, exception_type: &str) -> StackItem {
        StackItem::new(line, Kind::Exception(exception_type.to_owned()))
    }

    pub fn item_type(&self) -> ItemType {
        match &self.kind {
            Kind::Primitive => ItemType::Primitive,
            Kind::Receiver => ItemType::Receiver,
            Kind::Parameter(_) => ItemType::Parameter,
            Kind::LocalVariable { .. } => ItemType::LocalVariable,
            Kind::FieldReference { .. } => ItemType::FieldReference,
            Kind::StaticFieldReference(_) => ItemType::StaticFieldReference,
            Kind::ArrayReference { .. } => ItemType::ArrayReference,
            Kind::MethodCall { .. } => ItemType::MethodCall,
            Kind::StaticMethodCall(_) => ItemType::StaticMethodCall,
            Kind::NewObject(_) => ItemType::NewObject,
            Kind::NewArray(_) => ItemType::NewArray,
            Kind::StringConstant(_) => ItemType::StringConstant,
            Kind::ClassConstant(_) => ItemType::ClassConstant,
            Kind::Exception(_) => ItemType::Exception,
        }
    }

    /// Line that was current when the item was created
    ///
    /// Always `None` for primitives, the receiver, and parameters.
    pub fn source_line(&self) -> SourceLine {
        self.line
    }

    /// Argument index of a `Parameter`
    pub fn argument_index(&self) -> Option<u16> {
        match &self.kind {
            Kind::Parameter(arg_index) => Some(*arg_index),
            _ => None,
        }
    }

    /// Slot read by a `LocalVariable`
    pub fn local_slot(&self) -> Option<u16> {
        match &self.kind {
            Kind::LocalVariable { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    /// Identity of the slot read by a `LocalVariable`, as it was at the time of the read
    pub fn local(&self) -> Option<&LocalVariable> {
        match &self.kind {
            Kind::LocalVariable { local, .. } => Some(local),
            _ => None,
        }
    }

    /// Provenance of the value a `LocalVariable` read out of its slot
    pub fn local_value(&self) -> Option<&Rc<StackItem>> {
        match &self.kind {
            Kind::LocalVariable { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Object a `FieldReference` was read from, array an `ArrayReference` was read from, or
    /// receiver of a `MethodCall`
    pub fn object(&self) -> Option<&Rc<StackItem>> {
        match &self.kind {
            Kind::FieldReference { object, .. } => Some(object),
            Kind::ArrayReference { array, .. } => Some(array),
            Kind::MethodCall { receiver, .. } => Some(receiver),
            _ => None,
        }
    }

    /// Field read by a `FieldReference` or `StaticFieldReference`
    pub fn field(&self) -> Option<&OwnedName> {
        match &self.kind {
            Kind::FieldReference { field, .. } | Kind::StaticFieldReference(field) => Some(field),
            _ => None,
        }
    }

    /// Method called for a `MethodCall` or `StaticMethodCall`
    pub fn method(&self) -> Option<&OwnedName> {
        match &self.kind {
            Kind::MethodCall { method, .. } | Kind::StaticMethodCall(method) => Some(method),
            _ => None,
        }
    }

    /// Opcode of the instruction behind a `MethodCall`
    pub fn opcode(&self) -> Option<u8> {
        match &self.kind {
            Kind::MethodCall { opcode, .. } => Some(*opcode),
            _ => None,
        }
    }

    /// Element index of an `ArrayReference` (`-1` when not known)
    pub fn array_index(&self) -> Option<i32> {
        match &self.kind {
            Kind::ArrayReference { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Type descriptor of a `NewObject`, `NewArray`, or `Exception`
    pub fn type_descriptor(&self) -> Option<&str> {
        match &self.kind {
            Kind::NewObject(descriptor)
            | Kind::NewArray(descriptor)
            | Kind::Exception(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Literal of a `StringConstant`
    pub fn string_value(&self) -> Option<&str> {
        match &self.kind {
            Kind::StringConstant(value) => Some(value),
            _ => None,
        }
    }

    /// Class named by a `ClassConstant`
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            Kind::ClassConstant(class_name) => Some(class_name),
            _ => None,
        }
    }

    /// Next link back in the provenance chain
    pub fn origin(&self) -> Option<&Rc<StackItem>> {
        self.object().or_else(|| self.local_value())
    }

    /// Walk the provenance chain, starting from this item
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Item at the very start of the provenance chain
    pub fn root(&self) -> &StackItem {
        let mut item = self;
        while let Some(origin) = item.origin() {
            item = origin;
        }
        item
    }

    /// Was the value reached through something other than the receiver or a parameter?
    ///
    /// Local variable reads are looked through, so `aload 2` of a slot that was stored from
    /// `aload 0` is still direct.
    pub fn is_indirect(&self) -> bool {
        let mut item = self;
        while let Some(value) = item.local_value() {
            item = value;
        }
        !matches!(
            item.kind,
            Kind::Receiver | Kind::Parameter(_) | Kind::Primitive
        )
    }
}

/// Iterator over a provenance chain (see [`StackItem::chain`])
pub struct Chain<'a> {
    next: Option<&'a StackItem>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a StackItem;

    fn next(&mut self) -> Option<&'a StackItem> {
        let item = self.next?;
        self.next = item.origin().map(|origin| origin.as_ref());
        Some(item)
    }
}

fn invoke_mnemonic(opcode: u8) -> &'static str {
    match opcode {
        INVOKEVIRTUAL => "invokevirtual",
        INVOKESPECIAL => "invokespecial",
        INVOKESTATIC => "invokestatic",
        INVOKEINTERFACE => "invokeinterface",
        _ => "invoke",
    }
}

impl StackItem {
    /// Render this item alone, leaving out the item it was derived from
    fn fmt_link(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            Kind::Primitive => f.write_str("primitive"),
            Kind::Receiver => f.write_str("this"),
            Kind::Parameter(arg_index) => write!(f, "parameter {}", arg_index),
            Kind::LocalVariable { slot, local, .. } => {
                write!(f, "local {} ({}) holding", slot, local)
            }
            Kind::FieldReference { field, .. } => write!(f, "field {} of", field),
            Kind::StaticFieldReference(field) => write!(f, "static field {}", field),
            Kind::ArrayReference { index, .. } if *index < 0 => f.write_str("element of"),
            Kind::ArrayReference { index, .. } => write!(f, "element {} of", index),
            Kind::MethodCall { opcode, method, .. } => {
                write!(f, "{} {} on", invoke_mnemonic(*opcode), method)
            }
            Kind::StaticMethodCall(method) => write!(f, "invokestatic {}", method),
            Kind::NewObject(descriptor) => write!(f, "new {}", descriptor),
            Kind::NewArray(descriptor) => write!(f, "new array {}", descriptor),
            Kind::StringConstant(value) => write!(f, "string {:?}", value),
            Kind::ClassConstant(class_name) => write!(f, "class {}", class_name),
            Kind::Exception(exception_type) => write!(f, "exception {}", exception_type),
        }
    }

    /// Detach the next link of the chain, if this item holds one
    fn take_origin(&mut self) -> Option<Rc<StackItem>> {
        match std::mem::replace(&mut self.kind, Kind::Primitive) {
            Kind::LocalVariable { value, .. } => Some(value),
            Kind::FieldReference { object, .. } => Some(object),
            Kind::ArrayReference { array, .. } => Some(array),
            Kind::MethodCall { receiver, .. } => Some(receiver),
            _ => None,
        }
    }
}

fn fmt_line(f: &mut Formatter<'_>, line: SourceLine) -> FmtResult {
    match line {
        Some(line) => write!(f, " @{}", line),
        None => Ok(()),
    }
}

/// Chains nest as `link [origin] @line`
impl Display for StackItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut open_lines = vec![];
        for item in self.chain() {
            item.fmt_link(f)?;
            if item.origin().is_some() {
                f.write_str(" [")?;
                open_lines.push(item.line);
            } else {
                fmt_line(f, item.line)?;
            }
        }
        for line in open_lines.into_iter().rev() {
            f.write_str("]")?;
            fmt_line(f, line)?;
        }
        Ok(())
    }
}

/// Unlinks the chain one item at a time
impl Drop for StackItem {
    fn drop(&mut self) {
        let mut next = self.take_origin();
        while let Some(item) = next {
            next = match Rc::try_unwrap(item) {
                Ok(mut item) => item.take_origin(),
                Err(_) => None,
            };
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn shared(item: StackItem) -> Rc<StackItem> {
        Rc::new(item)
    }

    #[test]
    fn chain_walks_through_locals_and_fields() {
        let receiver = shared(StackItem::receiver());
        let local = shared(StackItem::local_variable(
            Some(3),
            0,
            LocalVariable::new("this", "LFoo;"),
            receiver.clone(),
        ));
        let field = shared(StackItem::field_reference(
            Some(4),
            local.clone(),
            OwnedName::new("Foo", "next", "LFoo;"),
        ));

        let types: Vec<ItemType> = field.chain().map(StackItem::item_type).collect();
        assert_eq!(
            types,
            vec![
                ItemType::FieldReference,
                ItemType::LocalVariable,
                ItemType::Receiver
            ]
        );
        assert!(std::ptr::eq(field.root(), receiver.as_ref()));
        assert!(field.is_indirect());
        assert!(!local.is_indirect());
        assert!(!receiver.is_indirect());
    }

    #[test]
    fn accessors_only_answer_for_their_variant() {
        let call = StackItem::static_method_call(
            Some(10),
            OwnedName::new("Util", "make", "()Ljava/lang/Object;"),
        );
        assert_eq!(call.item_type(), ItemType::StaticMethodCall);
        assert_eq!(call.method().map(OwnedName::name), Some("make"));
        assert!(call.field().is_none());
        assert!(call.object().is_none());
        assert!(call.opcode().is_none());
        assert_eq!(call.source_line(), Some(10));
        assert!(call.is_indirect());

        let parameter = StackItem::parameter(2);
        assert_eq!(parameter.argument_index(), Some(2));
        assert_eq!(parameter.source_line(), None);
    }

    #[test]
    fn rendering() {
        let string = shared(StackItem::string_constant(Some(7), "a \"b\""));
        assert_eq!(string.to_string(), "string \"a \\\"b\\\"\" @7");

        let call = StackItem::method_call(
            None,
            INVOKEVIRTUAL,
            string,
            OwnedName::new("java/lang/String", "trim", "()Ljava/lang/String;"),
        );
        assert_eq!(
            call.to_string(),
            "invokevirtual java/lang/String.trim()Ljava/lang/String; on [string \"a \\\"b\\\"\" @7]"
        );

        let element = StackItem::array_reference(Some(1), Rc::new(StackItem::parameter(0)), -1);
        assert_eq!(element.to_string(), "element of [parameter 0] @1");

        assert_eq!(LocalVariable::Unknown.to_string(), "?");
        assert_eq!(LocalVariable::new("count", "I").to_string(), "count:I");
    }
}
