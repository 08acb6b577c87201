use aoiguard_core::{confidence_for, Verdict, PART_NOT_FOUND};
use aoiguard_engine::{fuse, fuse_verifier_only, verify, Catalog};

#[test]
fn genuine_atmega_is_genuine() {
    let result = verify("ATMEL\nATMEGA328P\nAU 1004");
    assert!(result.matched);
    assert_eq!(result.part_number.as_deref(), Some("ATMEGA328P"));
    assert!(result.discrepancies.is_empty());
    assert_eq!(result.confidence, 100);

    let fused = fuse(&result, Verdict::Suspicious, 64.0, "Slight glare on logo");
    assert_eq!(fused.verdict, Verdict::Genuine);
}

#[test]
fn remarked_atmega_is_fake() {
    let result = verify("ATMEL\nATMEGA328P\n20AU 0729");
    assert_eq!(result.part_number.as_deref(), Some("ATMEGA328P"));
    assert_eq!(result.discrepancies.len(), 2, "{:?}", result.discrepancies);
    assert!(result.discrepancies.iter().any(|d| d.contains("20AU")));
    assert!(result.discrepancies.iter().any(|d| d.contains("0729")));
    assert_eq!(result.confidence, 40);

    let fused = fuse(&result, Verdict::Genuine, 95.0, "");
    assert_eq!(fused.verdict, Verdict::Fake);
    assert_eq!(fused.score, 40.0);
}

#[test]
fn remarked_pdip_variant_is_still_fake() {
    let result = verify("ATMEL\nATMEGA328P-PU\n20AU 0729");
    assert_eq!(result.part_number.as_deref(), Some("ATMEGA328P-PU"));
    assert_eq!(result.discrepancies.len(), 2, "{:?}", result.discrepancies);
    assert!(result.discrepancies[0].contains("20AU"));
    assert!(result.discrepancies[1].contains("0729"));

    let fused = fuse(&result, Verdict::Fake, 20.0, "");
    assert_eq!(fused.verdict, Verdict::Fake);
}

#[test]
fn date_code_in_non_ascii_digits_is_missing() {
    let result = verify("ATMEL\nATMEGA328P\nAU \u{661}\u{660}\u{660}\u{664}");
    assert_eq!(
        result.discrepancies,
        vec!["Date code not found or invalid format".to_string()]
    );
    assert_eq!(result.confidence, 70);
}

#[test]
fn lookalike_ti_logo_from_china_is_fake() {
    let result = verify("Tl LM358N\n2BF H58K\nCHINA");
    assert_eq!(result.part_number.as_deref(), Some("LM358N"));
    assert!(result.discrepancies.len() >= 2);
    assert_eq!(result.discrepancies[0], "Manufacturer marking mismatch. Expected: TI");
    assert_eq!(
        result.discrepancies[1],
        "Invalid country of origin: CHINA. Expected: MALAYSIA, PHILIPPINES, USA"
    );

    let fused = fuse(&result, Verdict::Suspicious, 55.0, "Logo font looks off.");
    assert_eq!(fused.verdict, Verdict::Fake);
    assert!(fused.reasoning.contains("Logo font looks off."));
}

#[test]
fn unknown_part_defers_to_classifier() {
    let result = verify("RANDOMJUNK12345");
    assert!(!result.matched);
    assert_eq!(result.confidence, 0);
    assert_eq!(result.discrepancies, vec![PART_NOT_FOUND.to_string()]);

    for verdict in [Verdict::Genuine, Verdict::Suspicious, Verdict::Fake] {
        let fused = fuse(&result, verdict, 73.0, "model says so");
        assert_eq!(fused.verdict, verdict);
        assert_eq!(fused.score, 73.0);
        assert_eq!(fused.reasoning, "model says so");
    }
}

#[test]
fn single_country_discrepancy_is_suspicious() {
    let result = verify("TI\nLM358N\n2347 H58K\nCHN");
    assert_eq!(result.discrepancies.len(), 1, "{:?}", result.discrepancies);
    assert!(result.discrepancies[0].starts_with("Invalid country of origin"));

    let fused = fuse(&result, Verdict::Fake, 10.0, "");
    assert_eq!(fused.verdict, Verdict::Suspicious);
    assert_eq!(fused.score, 70.0);
}

#[test]
fn every_catalog_key_looks_up_itself() {
    let catalog = Catalog::embedded();
    for record in catalog.iter() {
        let found = catalog.lookup(&record.part_number).unwrap();
        assert_eq!(found.part_number, record.part_number);
        assert!(!found.valid_countries.is_empty());
    }
}

#[test]
fn confidence_strictly_decreases_until_zero() {
    let mut previous = confidence_for(0);
    assert_eq!(previous, 100);
    for n in 1..=3 {
        let current = confidence_for(n);
        assert!(current < previous);
        previous = current;
    }
    assert_eq!(confidence_for(4), 0);
    assert_eq!(confidence_for(10), 0);
}

#[test]
fn verify_is_idempotent() {
    let inputs = [
        "",
        "   \n\t",
        "ATMEL\nATMEGA328P\n20AU 0729",
        "Tl LM358N\n2BF H58K\nCHINA",
        "STM32F103C8T6\nCHN 1825",
        "\u{1F600} NE555P ??? TI",
    ];
    for input in inputs {
        assert_eq!(verify(input), verify(input));
    }
}

#[test]
fn fusion_is_monotonic_in_discrepancies() {
    let readings = [
        "ATMEL\nATMEGA328P\nAU 1004",     // 0
        "TI\nLM358N\n2347\nCHINA",        // 1
        "ATMEL\nATMEGA328P\n20AU 0729",   // 2
        "Tl ATMEGA328P\n20AU 0729\nUSA", // 4
    ];
    let mut last = Verdict::Genuine;
    let mut last_count = 0;
    for text in readings {
        let result = verify(text);
        assert!(result.matched);
        assert!(result.discrepancies.len() >= last_count);
        for external in [Verdict::Genuine, Verdict::Fake] {
            let verdict = fuse(&result, external, 50.0, "").verdict;
            assert!(verdict >= last, "{text:?} gave {verdict} after {last}");
            assert_eq!(verdict, fuse_verifier_only(&result, 50.0).verdict);
        }
        last = fuse(&result, Verdict::Genuine, 50.0, "").verdict;
        last_count = result.discrepancies.len();
    }
    assert_eq!(last, Verdict::Fake);
}

#[test]
fn garbage_input_never_panics() {
    let long = "X".repeat(10_000);
    for input in ["\0\0\0", "ÄÖÜ ß 中文", long.as_str()] {
        let result = verify(input);
        assert!(result.confidence <= 100);
    }
}
