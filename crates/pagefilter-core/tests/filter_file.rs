//! End-to-end runs: PDF on disk in, filtered PDF on disk out

use pagefilter_core::testing::{create_test_pdf, TestPage};
use pagefilter_core::{
    filter_file, FilterConfig, FilterReport, HeaderRegion, PageFilterError, PdfDocument,
    RegionExtractor, RegionTextSource, WORK_ADDRESS_HEADER,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn write_input(dir: &Path, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join("payroll.pdf");
    std::fs::write(&path, bytes).unwrap();
    path
}

fn header_texts(path: &Path) -> Vec<String> {
    let doc = PdfDocument::load(path).unwrap();
    let extractor = RegionExtractor::new(&doc, HeaderRegion::default());
    (0..extractor.page_count())
        .map(|page| extractor.extract(page).unwrap())
        .collect()
}

fn header(text: &str) -> TestPage {
    TestPage::header(text).with_body("payslip details")
}

fn continuation() -> TestPage {
    TestPage::body("payslip details, continued")
}

fn work_address(term: &str) -> FilterConfig {
    FilterConfig::new(term, Some(WORK_ADDRESS_HEADER.to_string()))
}

#[test]
fn test_scenario_a_whole_record_written() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &create_test_pdf(&[
            header("INDIRIZZO SEDE DI LAVORO: MILAN"),
            continuation(),
            continuation(),
        ]),
    );
    let output = dir.path().join("out.pdf");

    let report = filter_file(&input, &output, &work_address("Milan")).unwrap();

    match report {
        FilterReport::Written {
            page_count, kept, ..
        } => {
            assert_eq!(page_count, 3);
            assert_eq!(kept.as_slice(), &[0, 1, 2]);
        }
        other => panic!("unexpected report: {:?}", other),
    }
    assert_eq!(PdfDocument::load(&output).unwrap().page_count(), 3);
}

#[test]
fn test_scenario_b_no_match_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &create_test_pdf(&[
            header("INDIRIZZO SEDE DI LAVORO: ROME"),
            continuation(),
            continuation(),
        ]),
    );
    let output = dir.path().join("out.pdf");

    let report = filter_file(&input, &output, &work_address("milan")).unwrap();

    assert_eq!(
        report,
        FilterReport::NoMatch {
            search_term: "MILAN".into()
        }
    );
    assert!(!output.exists());
}

#[test]
fn test_scenario_c_records_filtered_as_units() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &create_test_pdf(&[
            header("INDIRIZZO SEDE DI LAVORO: MILAN"),
            continuation(),
            header("INDIRIZZO SEDE DI LAVORO: ROME"),
            continuation(),
            header("INDIRIZZO SEDE DI LAVORO: MILAN 2"),
        ]),
    );
    let output = dir.path().join("out.pdf");

    filter_file(&input, &output, &work_address("milan")).unwrap();

    assert_eq!(
        header_texts(&output),
        vec![
            "INDIRIZZO SEDE DI LAVORO: MILAN".to_string(),
            String::new(),
            "INDIRIZZO SEDE DI LAVORO: MILAN 2".to_string(),
        ]
    );
}

#[test]
fn test_scenario_d_every_page_mode() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &create_test_pdf(&[
            header("SITE MILAN"),
            header("SITE ROME"),
            continuation(),
            header("site milan"),
        ]),
    );
    let output = dir.path().join("out.pdf");

    let report = filter_file(&input, &output, &FilterConfig::new("MILAN", None)).unwrap();

    match report {
        FilterReport::Written { kept, .. } => assert_eq!(kept.page_numbers(), vec![1, 4]),
        other => panic!("unexpected report: {:?}", other),
    }
    assert_eq!(
        header_texts(&output),
        vec!["SITE MILAN".to_string(), "site milan".to_string()]
    );
}

#[test]
fn test_missing_input_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = filter_file(
        dir.path().join("missing.pdf"),
        dir.path().join("out.pdf"),
        &work_address("milan"),
    );
    assert!(matches!(result, Err(PageFilterError::LoadError(_))));
}

#[test]
fn test_unwritable_output_is_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &create_test_pdf(&[header("INDIRIZZO SEDE DI LAVORO: MILAN")]),
    );
    let result = filter_file(
        &input,
        dir.path().join("no-such-dir").join("out.pdf"),
        &work_address("milan"),
    );
    assert!(matches!(result, Err(PageFilterError::WriteError(_))));
}

#[test]
fn test_custom_region_changes_what_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        dir.path(),
        &create_test_pdf(&[header("INDIRIZZO SEDE DI LAVORO: MILAN"), continuation()]),
    );
    let output = dir.path().join("out.pdf");

    // A region over the body text never sees the header keyword
    let config = work_address("milan")
        .with_region(HeaderRegion::new(0.0, 380.0, 612.0, 20.0).unwrap());
    let report = filter_file(&input, &output, &config).unwrap();

    assert!(matches!(report, FilterReport::NoMatch { .. }));
}
