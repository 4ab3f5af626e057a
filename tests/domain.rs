use assert_matches::assert_matches;

use refseq_gb::domain::{extract_accession, FetchRange, RecordType, RecordTypes};
use refseq_gb::error::FetchError;

#[test]
fn extract_is_identity_on_canonical_accessions() {
    for raw in ["NM_000546.6", "NG_008847.2", "NM_007294"] {
        let acc = extract_accession(raw).unwrap();
        assert_eq!(acc.as_str(), raw);
        // and again on its own output
        let again = extract_accession(acc.as_str()).unwrap();
        assert_eq!(again, acc);
    }
}

#[test]
fn extract_handles_nuccore_urls() {
    let acc = extract_accession("https://www.ncbi.nlm.nih.gov/nuccore/NG_123456.7?from=1&to=2")
        .unwrap();
    assert_eq!(acc.as_str(), "NG_123456.7");
    assert_eq!(acc.record_type(), Some(RecordType::Ng));
}

#[test]
fn extract_handles_id_query_parameter() {
    let acc = extract_accession("https://host/path?db=nuccore&Id=ng_008847.2&retmode=text")
        .unwrap();
    assert_eq!(acc.as_str(), "NG_008847.2");
}

#[test]
fn extract_returns_none_for_gene_symbols() {
    assert_eq!(extract_accession("TP53"), None);
    assert_eq!(extract_accession("XM_011545.2"), None);
}

#[test]
fn record_types_default_to_both() {
    let types = RecordTypes::default();
    assert!(types.contains(RecordType::Nm));
    assert!(types.contains(RecordType::Ng));
}

#[test]
fn record_types_parse_and_reject() {
    let types: RecordTypes = "NG".parse().unwrap();
    assert!(!types.contains(RecordType::Nm));
    assert!(types.contains(RecordType::Ng));

    let err = "mrna".parse::<RecordTypes>().unwrap_err();
    assert_matches!(err, FetchError::InvalidRecordType(_));
}

#[test]
fn half_specified_range_is_never_used() {
    assert_eq!(FetchRange::from_bounds(Some(13732), None), None);
    assert_eq!(FetchRange::from_bounds(None, Some(58896)), None);
}
