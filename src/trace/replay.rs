use super::{Error, MethodTrace, StepKind};
use crate::jvm::{Name, RenderDescriptor};
use crate::model::{enter_method, interpret_instruction, Frame};
use crate::settings::Settings;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Outcome of replaying one method
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Name and descriptor of the method
    pub method: String,

    /// Instructions applied to the frame
    pub instructions: usize,

    /// Unknown mnemonics skipped over
    pub skipped: usize,

    /// Stack depth in words after the last step (`None` when provenance isn't tracked)
    pub final_depth: Option<usize>,

    /// Deepest the stack got (`None` when provenance isn't tracked)
    pub max_depth: Option<usize>,

    /// Dump of the frame after the last step (`None` when provenance isn't tracked)
    pub final_dump: Option<String>,
}

/// Drive a fresh frame model through every step of a method
///
/// Frame dumps (from `.dump` steps, or after every instruction if the settings ask for it) are
/// written to `out`. A frame that panics because the trace over or underflows it is reported as
/// a contract violation.
pub fn replay<W: Write>(
    method: &MethodTrace,
    settings: &Settings,
    out: &mut W,
) -> Result<ReplaySummary, Error> {
    let signature = method.signature();
    log::info!("Replaying {} ({} steps)", signature, method.steps.len());

    let replay_result = catch_unwind(AssertUnwindSafe(|| {
        replay_steps(method, settings, &signature, out)
    }));
    match replay_result {
        Ok(res) => res,
        Err(e) => {
            let message: String = if let Some(e) = e.downcast_ref::<&'static str>() {
                String::from(*e)
            } else if let Some(e) = e.downcast_ref::<String>() {
                String::from(e)
            } else {
                String::from("unknown error")
            };
            Err(Error::ContractViolation {
                method: signature,
                message,
            })
        }
    }
}

/// Replay methods in order, stopping at the first failure
pub fn replay_all<W: Write>(
    methods: &[MethodTrace],
    settings: &Settings,
    out: &mut W,
) -> Result<Vec<ReplaySummary>, Error> {
    let mut summaries = Vec::with_capacity(methods.len());
    for method in methods {
        summaries.push(replay(method, settings, out)?);
    }
    Ok(summaries)
}

fn replay_steps<W: Write>(
    method: &MethodTrace,
    settings: &Settings,
    signature: &str,
    out: &mut W,
) -> Result<ReplaySummary, Error> {
    let mut frame = settings.new_frame(method.max_locals, method.max_stack);
    enter_method(frame.as_mut(), method.access_flags, &method.descriptor);

    let mut summary = ReplaySummary {
        method: signature.to_owned(),
        instructions: 0,
        skipped: 0,
        final_depth: None,
        max_depth: frame.as_frame().map(Frame::depth),
        final_dump: None,
    };

    for step in &method.steps {
        match &step.kind {
            StepKind::Instruction(instruction) => {
                interpret_instruction(frame.as_mut(), instruction).map_err(|error| Error::Jvm {
                    line: step.line,
                    error,
                })?;
                summary.instructions += 1;
                if let Some(tracked) = frame.as_frame() {
                    log::trace!("{} leaves {} words", instruction.mnemonic(), tracked.depth());
                    summary.max_depth = summary.max_depth.max(Some(tracked.depth()));
                    if settings.dump_each_instruction {
                        writeln!(out, "-- {} (line {})", instruction.mnemonic(), step.line)?;
                        write!(out, "{}", tracked)?;
                    }
                }
            }
            StepKind::SourceLine(line) => frame.set_current_source_line(*line),
            StepKind::Var {
                slot,
                name,
                descriptor,
            } => frame.set_local_variable(*slot, name.as_str(), &descriptor.render()),
            StepKind::EndVar(slot) => frame.clear_local_variable(*slot),
            StepKind::Catch(class) => frame.exception_handler(&class.render()),
            StepKind::Finally => frame.finally_handler(),
            StepKind::Dump => {
                if let Some(tracked) = frame.as_frame() {
                    writeln!(out, "-- {} (line {})", signature, step.line)?;
                    write!(out, "{}", tracked)?;
                }
            }
            StepKind::Unknown(mnemonic) => {
                if settings.stop_on_unknown_mnemonic {
                    return Err(Error::UnknownMnemonic {
                        line: step.line,
                        mnemonic: mnemonic.clone(),
                    });
                }
                log::warn!("Line {}: skipping unknown mnemonic '{}'", step.line, mnemonic);
                summary.skipped += 1;
            }
        }
    }

    if let Some(tracked) = frame.as_frame() {
        summary.final_depth = Some(tracked.depth());
        summary.final_dump = Some(tracked.dump());
    }
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trace::parse_trace;
    use pretty_assertions::assert_eq;

    fn replay_source(source: &str, settings: &Settings) -> (Result<ReplaySummary, Error>, String) {
        let methods = parse_trace(source).unwrap();
        assert_eq!(methods.len(), 1);
        let mut out = vec![];
        let result = replay(&methods[0], settings, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    const GETTER: &str = "\
.method public getName ()Ljava/lang/String;
.limit locals 1
.limit stack 1
.line 4
  aload_0
  getfield Person.name Ljava/lang/String;
.dump
  areturn
.end
";

    #[test]
    fn summary_and_dump() {
        let (result, out) = replay_source(GETTER, &Settings::default());
        let summary = result.unwrap();
        assert_eq!(
            summary,
            ReplaySummary {
                method: "getName()Ljava/lang/String;".to_owned(),
                instructions: 3,
                skipped: 0,
                final_depth: Some(0),
                max_depth: Some(1),
                final_dump: Some("Current line = 4\nLocals:\n0: ? = this\nStack:\n".to_owned()),
            }
        );
        assert_eq!(
            out,
            "\
-- getName()Ljava/lang/String; (line 7)
Current line = 4
Locals:
0: ? = this
Stack:
0: field Person.name:Ljava/lang/String; of [local 0 (?) holding [this] @4] @4
"
        );
    }

    #[test]
    fn untracked() {
        let settings = Settings {
            track_provenance: false,
            ..Settings::default()
        };
        let (result, out) = replay_source(GETTER, &settings);
        let summary = result.unwrap();
        assert_eq!(summary.instructions, 3);
        assert_eq!(summary.final_depth, None);
        assert_eq!(summary.final_dump, None);
        assert_eq!(out, "");
    }

    #[test]
    fn unknown_mnemonics() {
        let source = ".method static m ()V\n.limit stack 1\n  iconst_0\n  frob\n  pop\n  return\n.end\n";

        let (result, _) = replay_source(source, &Settings::default());
        match result {
            Err(Error::UnknownMnemonic { line: 4, mnemonic }) => assert_eq!(mnemonic, "frob"),
            other => panic!("expected unknown mnemonic, got {:?}", other),
        }

        let lenient = Settings {
            stop_on_unknown_mnemonic: false,
            ..Settings::default()
        };
        let (result, _) = replay_source(source, &lenient);
        let summary = result.unwrap();
        assert_eq!((summary.instructions, summary.skipped), (3, 1));
    }

    #[test]
    fn underflow_is_a_contract_violation() {
        let source = ".method static m ()V\n.limit stack 1\n  pop\n.end\n";
        let (result, _) = replay_source(source, &Settings::default());
        match result {
            Err(Error::ContractViolation { method, message }) => {
                assert_eq!(method, "m()V");
                assert!(message.contains("underflow"), "{}", message);
            }
            other => panic!("expected a contract violation, got {:?}", other),
        }

        // Nothing is counted when tracking is off
        let settings = Settings {
            track_provenance: false,
            ..Settings::default()
        };
        assert!(replay_source(source, &settings).0.is_ok());
    }

    #[test]
    fn dump_each_instruction() {
        let settings = Settings {
            dump_each_instruction: true,
            ..Settings::default()
        };
        let source = ".method static m ()V\n.limit stack 1\n  iconst_1\n  pop\n.end\n";
        let (result, out) = replay_source(source, &settings);
        assert!(result.is_ok());
        assert_eq!(
            out,
            "\
-- iconst_1 (line 3)
Current line = unknown
Locals:
Stack:
0: primitive
-- pop (line 4)
Current line = unknown
Locals:
Stack:
"
        );
    }
}
