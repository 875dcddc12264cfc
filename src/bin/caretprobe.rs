//! Caret position probe demo
//!
//! Asks the terminal where its cursor is, prints text whose on-screen width
//! cannot be guessed from its length, and asks again. Each stage compares the
//! column advance the terminal actually performed with the advance predicted
//! from Unicode width tables.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::time::Duration;

use caretprobe::error::ProbeResult;
use caretprobe::probe::CursorProbe;
use caretprobe::report::CaretPosition;
use caretprobe::tty::{FdTty, Tty};
use caretprobe::width::{column_advance, TextMetrics, ZALGO_SAMPLE};

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Parse command line arguments
    let mut timeout_ms = 100u64;
    let mut sample: Option<String> = None;
    let mut output_format = OutputFormat::Text;
    let mut show_help = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-t" | "--timeout-ms" => {
                i += 1;
                if i < args.len() {
                    timeout_ms = args[i].parse().unwrap_or(100);
                }
            },
            "-s" | "--sample" => {
                i += 1;
                if i < args.len() {
                    sample = Some(args[i].clone());
                }
            },
            "-j" | "--json" => {
                output_format = OutputFormat::Json;
            },
            "-h" | "--help" => {
                show_help = true;
            },
            _ => {
                // Treat as the sample text if no flag
                if sample.is_none() && !args[i].starts_with('-') {
                    sample = Some(args[i].clone());
                }
            },
        }
        i += 1;
    }

    if show_help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if !io::stdin().is_terminal() {
        eprintln!("stdin is not a terminal; there is nothing to probe");
        return ExitCode::FAILURE;
    }

    let sample = sample.unwrap_or_else(|| ZALGO_SAMPLE.to_string());
    let probe = CursorProbe::with_timeout(Duration::from_millis(timeout_ms));
    let mut tty = FdTty::stdio();

    let outcome = run_demo(&probe, &mut tty, &sample, timeout_ms, output_format);
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

/// One print-and-measure stage of the demo.
#[derive(Serialize)]
struct StageReport<'a> {
    text: &'a str,
    metrics: TextMetrics,
    before: Option<CaretPosition>,
    after: Option<CaretPosition>,
    /// Columns the cursor actually moved; absent when a probe went
    /// unanswered or the row changed under the text.
    advance: Option<i32>,
}

#[derive(Serialize)]
struct SessionReport<'a> {
    timeout_ms: u64,
    initial: Option<CaretPosition>,
    digits: StageReport<'a>,
    sample: StageReport<'a>,
}

fn run_demo<T: Tty>(
    probe: &CursorProbe,
    tty: &mut T,
    sample: &str,
    timeout_ms: u64,
    output_format: OutputFormat,
) -> ProbeResult<()> {
    let text_mode = matches!(output_format, OutputFormat::Text);

    let initial = probe.probe(tty)?;
    if text_mode {
        match initial {
            Some(pos) => println!("Current caret position: {}", pos),
            None => println!("Current caret position: no answer from the terminal"),
        }
    }

    // Plain digits first: every way of measuring "123" agrees on 3.
    let digits = run_stage(probe, tty, "123", text_mode)?;

    if text_mode {
        let metrics = TextMetrics::of(sample);
        println!(
            "Sample length: {} bytes, {} codepoints, {} graphemes, {} columns predicted",
            metrics.bytes, metrics.codepoints, metrics.graphemes, metrics.columns
        );
    }

    // Now text where bytes, codepoints and columns all disagree.
    let sample_stage = run_stage(probe, tty, sample, text_mode)?;

    if let OutputFormat::Json = output_format {
        let report = SessionReport {
            timeout_ms,
            initial,
            digits,
            sample: sample_stage,
        };
        let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
        println!("{}", json);
    }

    Ok(())
}

/// Probe, print `text` without a newline, probe again, and annotate the line
/// the way the probed terminal saw it.
fn run_stage<'a, T: Tty>(
    probe: &CursorProbe,
    tty: &mut T,
    text: &'a str,
    text_mode: bool,
) -> ProbeResult<StageReport<'a>> {
    let metrics = TextMetrics::of(text);

    let before = probe.probe(tty)?;
    print_flushed(text)?;
    let after = probe.probe(tty)?;

    let advance = match (&before, &after) {
        (Some(b), Some(a)) => column_advance(b, a),
        _ => None,
    };

    if text_mode {
        match (after, advance) {
            (Some(pos), Some(moved)) => println!(
                " <-- Current caret position: {} (advanced {} columns, {} predicted)",
                pos, moved, metrics.columns
            ),
            (Some(pos), None) => println!(
                " <-- Current caret position: {} (advance not comparable)",
                pos
            ),
            (None, _) => println!(" <-- no answer from the terminal"),
        }
    } else {
        println!();
    }

    Ok(StageReport {
        text,
        metrics,
        before,
        after,
        advance,
    })
}

fn print_flushed(text: &str) -> ProbeResult<()> {
    let mut out = io::stdout();
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn print_help() {
    println!("Caret position probe");
    println!();
    println!("Usage: caretprobe [OPTIONS] [SAMPLE]");
    println!();
    println!("Options:");
    println!("  -t, --timeout-ms <N>  Wait N ms for each reply byte (default: 100)");
    println!("  -s, --sample <TEXT>   Demo text to measure (default: combining-marks sample)");
    println!("  -j, --json            Emit a JSON session report instead of annotations");
    println!("  -h, --help            Show this help message");
    println!();
    println!("The probe writes ESC[6n to the terminal and reads the cursor position");
    println!("report back. Set RUST_LOG=debug for protocol-level logging on stderr.");
    println!();
    println!("Examples:");
    println!("  caretprobe");
    println!("  caretprobe --json");
    println!("  caretprobe -s \"日本語\"");
}
