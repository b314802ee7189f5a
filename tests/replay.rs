use pretty_assertions::assert_eq;
use stackprov::jvm::INVOKEVIRTUAL;
use stackprov::model::{enter_method, interpret_instruction, Frame, FrameModel, ItemType};
use stackprov::settings::Settings;
use stackprov::trace::{self, MethodTrace, StepKind};
use std::fs;
use std::path::Path;

fn load(name: &str) -> Vec<MethodTrace> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("traces")
        .join(name);
    let source = fs::read_to_string(&path).unwrap();
    trace::parse_trace(&source).unwrap()
}

/// Drive a frame the way a rewriter would, up to the first `.dump` step
fn run_to_dump(method: &MethodTrace) -> Frame {
    let mut frame = Frame::new(method.max_locals, method.max_stack);
    enter_method(&mut frame, method.access_flags, &method.descriptor);
    for step in &method.steps {
        match &step.kind {
            StepKind::Instruction(instruction) => {
                interpret_instruction(&mut frame, instruction).unwrap()
            }
            StepKind::SourceLine(line) => frame.set_current_source_line(*line),
            StepKind::Dump => break,
            _ => (),
        }
    }
    frame
}

#[test]
fn call_chain_provenance() {
    let methods = load("describe.trace");
    let frame = run_to_dump(&methods[0]);

    // `aload 4` of the `toString()` result
    assert_eq!(frame.depth(), 1);
    let top = frame.top();
    assert_eq!(top.item_type(), ItemType::LocalVariable);
    assert_eq!(top.source_line(), Some(11));
    assert!(top.is_indirect());

    let calls: Vec<&str> = top
        .chain()
        .filter_map(|item| item.method())
        .map(|method| method.name())
        .collect();
    assert_eq!(calls, vec!["toString", "append", "append"]);

    let root = top.root();
    assert_eq!(root.item_type(), ItemType::NewObject);
    assert_eq!(root.type_descriptor(), Some("Ljava/lang/StringBuilder;"));
    assert_eq!(root.source_line(), Some(10));

    let to_string = top.local_value().unwrap();
    assert_eq!(to_string.opcode(), Some(INVOKEVIRTUAL));

    // Parameters sit at their word offsets
    assert_eq!(frame.local_value(1).argument_index(), Some(0));
    assert_eq!(frame.local_value(2).item_type(), ItemType::Primitive);
    assert_eq!(frame.local_value(3).argument_index(), Some(1));
}

#[test]
fn replaying_handlers() {
    let methods = load("describe.trace");
    let mut out = vec![];
    let summaries = trace::replay_all(&methods, &Settings::default(), &mut out).unwrap();
    assert_eq!(summaries.len(), 2);

    let describe = &summaries[0];
    assert_eq!(describe.method, "describe(JLjava/lang/String;)Ljava/lang/String;");
    assert_eq!(describe.instructions, 18);
    assert_eq!(describe.max_depth, Some(3));
    assert_eq!(describe.final_depth, Some(0));
    let final_dump = describe.final_dump.as_deref().unwrap();
    assert!(
        final_dump.contains("4: ? = exception Ljava/lang/IllegalStateException; @12\n"),
        "{}",
        final_dump
    );

    let locked = &summaries[1];
    assert_eq!(locked.instructions, 10);
    assert_eq!(locked.max_depth, Some(2));
    assert_eq!(locked.final_depth, Some(1));
    let final_dump = locked.final_dump.as_deref().unwrap();
    assert!(
        final_dump.ends_with("Stack:\n0: exception Ljava/lang/Throwable;\n"),
        "{}",
        final_dump
    );

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("-- describe(JLjava/lang/String;)Ljava/lang/String; (line 23)\n"));
    assert!(out.contains("\nCurrent line = 11\n"));
}

#[test]
fn two_word_shuffles() {
    let methods = load("shuffle.trace");
    let mut out = vec![];
    let summary = trace::replay(&methods[0], &Settings::default(), &mut out).unwrap();
    assert_eq!(summary.instructions, 13);
    assert_eq!(summary.max_depth, Some(6));
    assert_eq!(summary.final_depth, Some(2));
    assert_eq!(
        summary.final_dump.unwrap(),
        "\
Current line = unknown
Locals:
0: ? = parameter 0
1: ? = primitive
2: ? = local 2 (?) holding [parameter 1]
Stack:
0: primitive
1: primitive
"
    );
    assert!(out.is_empty());
}

#[test]
fn broken_traces() {
    let methods = load("broken.trace");
    let mut out = vec![];

    match trace::replay(&methods[0], &Settings::default(), &mut out) {
        Err(trace::Error::ContractViolation { method, .. }) => assert_eq!(method, "broken()V"),
        other => panic!("expected a contract violation, got {:?}", other),
    }

    // Without tracking there is nothing to violate
    let settings = Settings {
        track_provenance: false,
        ..Settings::default()
    };
    let summary = trace::replay(&methods[0], &settings, &mut out).unwrap();
    assert_eq!(summary.instructions, 3);
    assert_eq!(summary.final_dump, None);
}

#[test]
fn same_calls_on_either_model() {
    // A driver that never inspects the stack can't tell the models apart
    fn drive(frame: &mut dyn FrameModel) {
        for method in load("shuffle.trace") {
            enter_method(&mut *frame, method.access_flags, &method.descriptor);
            for step in &method.steps {
                if let StepKind::Instruction(instruction) = &step.kind {
                    interpret_instruction(&mut *frame, instruction).unwrap();
                }
            }
        }
    }

    let tracking = Settings::default();
    let mut frame = tracking.new_frame(3, 8);
    drive(frame.as_mut());
    assert_eq!(frame.as_frame().map(Frame::depth), Some(2));

    let not_tracking = Settings {
        track_provenance: false,
        ..Settings::default()
    };
    let mut frame = not_tracking.new_frame(3, 8);
    drive(frame.as_mut());
    assert!(frame.as_frame().is_none());
}
