//! `aoiguard scan`: the full pipeline with an optional known classifier
//! assessment, recorded to the configured history.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use aoiguard_core::{ExternalAssessment, Verdict};
use aoiguard_engine::{FixedClassifier, ScanInput, ScanOutcome, ScanPipeline};
use aoiguard_logging::{ScanEvent, ScanEventLogger};

use crate::runtime::{read_readings, Runtime};
use crate::terminal_output::{
    dim, note_error, note_warn, render_table, verdict_badge, Column,
};

#[derive(Args)]
pub struct ScanArgs {
    /// OCR marking text, one argument per image
    texts: Vec<String>,

    /// Read marking text from files, one file per image
    #[arg(short, long)]
    file: Vec<PathBuf>,

    /// Classifier verdict (genuine | suspicious | fake)
    #[arg(long, requires = "external_score")]
    external_verdict: Option<Verdict>,

    /// Classifier authenticity score, 0-100
    #[arg(long, requires = "external_verdict")]
    external_score: Option<f64>,

    /// Classifier explanation
    #[arg(long, default_value = "")]
    external_reasoning: String,

    /// JSON file with a classifier response (verdict, authenticityScore, ...)
    #[arg(long, conflicts_with = "external_verdict")]
    assessment: Option<PathBuf>,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl ScanArgs {
    fn classifier(&self) -> Result<Option<FixedClassifier>> {
        if let Some(path) = &self.assessment {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read assessment: {}", path.display()))?;
            let classifier = FixedClassifier::from_json(&raw)
                .with_context(|| format!("Invalid assessment JSON: {}", path.display()))?;
            return Ok(Some(classifier));
        }
        match (self.external_verdict, self.external_score) {
            (Some(verdict), Some(score)) => Ok(Some(FixedClassifier::new(
                ExternalAssessment::new(verdict, score, self.external_reasoning.clone()),
            ))),
            (None, None) => Ok(None),
            _ => bail!("--external-verdict and --external-score must be given together"),
        }
    }
}

pub async fn run(args: ScanArgs, runtime: &Runtime) -> Result<()> {
    let classifier = args.classifier()?;
    let readings = read_readings(args.texts.clone(), &args.file)?;

    let mut pipeline = ScanPipeline::new(runtime.verifier.clone(), runtime.history.clone())
        .with_fusion_policy(runtime.fusion)
        .with_operator(runtime.config.operator());
    if let Some(classifier) = classifier {
        pipeline = pipeline.with_classifier(Arc::new(classifier));
    }

    let inputs = readings.into_iter().map(ScanInput::from_text).collect();
    let outcomes = pipeline.scan_batch(inputs).await;

    for outcome in &outcomes {
        for event in outcome_events(outcome) {
            ScanEventLogger::log_event(&outcome.report.batch_id, event);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    for outcome in &outcomes {
        print_outcome(outcome);
    }
    Ok(())
}

/// Scan events for one outcome, in pipeline order.
fn outcome_events(outcome: &ScanOutcome) -> Vec<ScanEvent> {
    let mut events = vec![ScanEvent::Verified {
        part_number: outcome.verification.part_number.clone(),
        discrepancies: outcome.verification.discrepancies.len(),
        confidence: outcome.verification.confidence,
        ocr_text: outcome.report.ocr_markings.clone(),
    }];
    if let Some(failure) = &outcome.classifier_failure {
        events.push(ScanEvent::ClassifierFallback {
            classifier: failure.classifier.clone(),
            error: failure.error.clone(),
        });
    }
    events.push(ScanEvent::Fused {
        verdict: outcome.fused.verdict.to_string(),
        score: outcome.fused.score,
        with_classifier: outcome.external.is_some(),
    });
    events.push(ScanEvent::Stored { stored: outcome.stored });
    events
}

fn print_outcome(outcome: &ScanOutcome) {
    let report = &outcome.report;
    println!(
        "{}  {}  score {:.0}  {}",
        report.batch_id,
        verdict_badge(report.verdict),
        report.authenticity_score,
        report.part_number.as_deref().unwrap_or("unknown part"),
    );
    println!("{}", dim(&report.reasoning));

    if let Some(comparison) = &outcome.comparison {
        let rows: Vec<Vec<String>> = comparison
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.observed.clone().unwrap_or_default(),
                    row.expected.clone().unwrap_or_default(),
                    if row.matches { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        let columns = [
            Column::left("Extracted").max_width(32),
            Column::left("Expected").max_width(32),
            Column::left("Match"),
        ];
        print!("{}", render_table(&columns, &rows));
        if !comparison.identical {
            note_warn("Extracted markings differ from the OEM reference");
        }
    }

    if !outcome.stored {
        note_error("Scan could not be saved to history");
    }
    println!();
}
