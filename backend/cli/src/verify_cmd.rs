//! `aoiguard verify`: catalog check only, no classifier and no history.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use aoiguard_core::{FusedVerdict, VerificationResult};
use aoiguard_logging::{ScanEvent, ScanEventLogger};

use crate::runtime::{read_readings, Runtime};
use crate::terminal_output::{dim, note_info, note_warn, verdict_badge};

#[derive(Args)]
pub struct VerifyArgs {
    /// OCR marking text; use `\n` or quote a multi-line string
    text: Option<String>,

    /// Read the marking text from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct VerifyOutput<'a> {
    result: &'a VerificationResult,
    verdict: &'a FusedVerdict,
}

pub fn run(args: VerifyArgs, runtime: &Runtime) -> Result<()> {
    let files: Vec<PathBuf> = args.file.into_iter().collect();
    let text = read_readings(args.text.into_iter().collect(), &files)?.join("\n");

    let result = runtime.verifier.verify(&text);
    let verdict = runtime.fusion.resolve(&result, None);

    ScanEventLogger::log_event(
        "verify",
        ScanEvent::Verified {
            part_number: result.part_number.clone(),
            discrepancies: result.discrepancies.len(),
            confidence: result.confidence,
            ocr_text: text.clone(),
        },
    );

    if args.json {
        let output = VerifyOutput { result: &result, verdict: &verdict };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_result(&result, &verdict);
    Ok(())
}

fn print_result(result: &VerificationResult, verdict: &FusedVerdict) {
    println!("{}  confidence {}", verdict_badge(verdict.verdict), result.confidence);
    match (&result.part_number, result.manufacturer()) {
        (Some(part), Some(manufacturer)) => println!("Part: {part} ({manufacturer})"),
        _ => note_info("No catalog part number found in the reading"),
    }
    if result.matched && result.is_clean() {
        println!("{}", dim("All markings match the OEM reference."));
    }
    if result.matched {
        for discrepancy in &result.discrepancies {
            note_warn(discrepancy);
        }
    }
    println!("{}", dim(&verdict.reasoning));
}
