use stackprov::settings::Settings;
use stackprov::trace;

use clap::{crate_version, Arg, ArgAction, Command};
use std::fs;
use std::io::{self, Write};

fn main() -> Result<(), trace::Error> {
    env_logger::init();

    let matches = Command::new("JVM stack provenance replayer")
        .version(crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Replay method traces and report where each stack value came from")
        .arg(
            Arg::new("no-tracking")
                .long("no-tracking")
                .action(ArgAction::SetTrue)
                .help("Replay against a frame that tracks nothing"),
        )
        .arg(
            Arg::new("dump-each")
                .long("dump-each")
                .action(ArgAction::SetTrue)
                .help("Print the frame after every instruction"),
        )
        .arg(
            Arg::new("lenient")
                .long("lenient")
                .action(ArgAction::SetTrue)
                .help("Skip unknown mnemonics instead of failing"),
        )
        .arg(
            Arg::new("INPUT")
                .help("Sets the input trace file to use")
                .required(true)
                .index(1),
        )
        .get_matches();

    let settings = Settings {
        track_provenance: !matches.get_flag("no-tracking"),
        dump_each_instruction: matches.get_flag("dump-each"),
        stop_on_unknown_mnemonic: !matches.get_flag("lenient"),
    };

    let trace_file = matches
        .get_one::<String>("INPUT")
        .expect("INPUT is a required argument");
    log::info!("Reading and replaying '{}'", trace_file);
    let source = fs::read_to_string(trace_file)?;
    let methods = trace::parse_trace(&source)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for summary in trace::replay_all(&methods, &settings, &mut out)? {
        writeln!(
            out,
            "== {}: {} instructions, {} skipped",
            summary.method, summary.instructions, summary.skipped
        )?;
        if let Some(dump) = summary.final_dump {
            write!(out, "{}", dump)?;
        }
    }

    Ok(())
}
