use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use clap::ValueEnum;
use regex::Regex;
use serde::Serialize;

use crate::error::FetchError;

/// How the input file is interpreted. `Auto` is resolved to one of the
/// other two before any network activity; a run never mixes modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputMode {
    Auto,
    #[value(alias = "gene", alias = "symbols")]
    Genes,
    #[value(alias = "acc", alias = "accession")]
    Accessions,
}

/// The mode an `Auto` run settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Genes,
    Accessions,
}

/// RefSeq record family handled by this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordType {
    Nm,
    Ng,
}

impl RecordType {
    pub fn prefix(self) -> &'static str {
        match self {
            RecordType::Nm => "NM_",
            RecordType::Ng => "NG_",
        }
    }

    /// ELink relation selecting this family's nuccore targets. The
    /// relation is only an approximate predictor of the prefix, so
    /// callers still filter traversal results by `prefix()`.
    pub fn link_name(self) -> &'static str {
        match self {
            RecordType::Nm => "gene_nuccore_refseqrna",
            RecordType::Ng => "gene_nuccore_refseqgene",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Nm => write!(f, "NM"),
            RecordType::Ng => write!(f, "NG"),
        }
    }
}

impl FromStr for RecordType {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "NM" => Ok(RecordType::Nm),
            "NG" => Ok(RecordType::Ng),
            _ => Err(FetchError::InvalidRecordType(value.to_string())),
        }
    }
}

/// Non-empty subset of record families a run operates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTypes {
    nm: bool,
    ng: bool,
}

impl RecordTypes {
    pub const BOTH: Self = Self { nm: true, ng: true };

    pub fn contains(self, record_type: RecordType) -> bool {
        match record_type {
            RecordType::Nm => self.nm,
            RecordType::Ng => self.ng,
        }
    }

    pub fn iter(self) -> impl Iterator<Item = RecordType> {
        [(self.nm, RecordType::Nm), (self.ng, RecordType::Ng)]
            .into_iter()
            .filter_map(|(selected, record_type)| selected.then_some(record_type))
    }
}

impl Default for RecordTypes {
    fn default() -> Self {
        Self::BOTH
    }
}

impl fmt::Display for RecordTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for record_type in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{record_type}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for RecordTypes {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut types = Self { nm: false, ng: false };
        for token in value.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            match token.parse::<RecordType>()? {
                RecordType::Nm => types.nm = true,
                RecordType::Ng => types.ng = true,
            }
        }
        if !types.nm && !types.ng {
            return Err(FetchError::EmptyRecordTypes);
        }
        Ok(types)
    }
}

/// An accession.version string as produced by extraction or link
/// traversal. URL-derived values are accepted verbatim, so the family
/// may be unknown; callers filter on `record_type()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Accession(String);

impl Accession {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn record_type(&self) -> Option<RecordType> {
        if self.0.starts_with("NM_") {
            Some(RecordType::Nm)
        } else if self.0.starts_with("NG_") {
            Some(RecordType::Ng)
        } else {
            None
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.gb", self.0)
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based inclusive sub-sequence window, applied to NG_ fetches only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchRange {
    pub start: u32,
    pub stop: u32,
}

impl FetchRange {
    /// Both bounds or neither. A half-specified pair is ambiguous and
    /// is dropped with a warning rather than guessed at.
    pub fn from_bounds(start: Option<u32>, stop: Option<u32>) -> Option<Self> {
        match (start, stop) {
            (Some(start), Some(stop)) => Some(Self { start, stop }),
            (None, None) => None,
            _ => {
                tracing::warn!("both --ng-from and --ng-to must be set; ignoring range");
                None
            }
        }
    }
}

fn accession_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^(NM|NG)_\d+(\.\d+)?$").unwrap())
}

/// Extracts an accession.version from a raw token or an NCBI nuccore
/// URL. Examples:
///   NG_008847.2
///   https://www.ncbi.nlm.nih.gov/nuccore/NG_008847.2?report=gbwithparts
/// Returns `None` if nothing looks like an accession; the caller must
/// treat that as "not an accession", not as an error.
pub fn extract_accession(raw: &str) -> Option<Accession> {
    let token = raw.trim();
    if token.is_empty() {
        return None;
    }

    // nuccore URL: take the path segment after /nuccore/
    if let Some(idx) = token.find("/nuccore/") {
        let tail = &token[idx + "/nuccore/".len()..];
        let tail = tail.split('?').next().unwrap_or(tail).trim();
        if !tail.is_empty() {
            return Some(Accession::new(tail.to_uppercase()));
        }
    }

    // id=... query parameter, key matched case-insensitively
    if let Some(idx) = token
        .as_bytes()
        .windows(3)
        .position(|window| window.eq_ignore_ascii_case(b"id="))
    {
        let tail = &token[idx + 3..];
        let tail = tail.split('&').next().unwrap_or(tail).trim();
        if !tail.is_empty() {
            return Some(Accession::new(tail.to_uppercase()));
        }
    }

    // Otherwise accept only a bare NM_/NG_ accession, optionally versioned
    let upper = token.to_uppercase();
    if accession_shape().is_match(&upper) {
        return Some(Accession::new(upper));
    }
    None
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn extract_bare_accession_uppercases() {
        let acc = extract_accession("nm_000546.6").unwrap();
        assert_eq!(acc.as_str(), "NM_000546.6");
        assert_eq!(acc.record_type(), Some(RecordType::Nm));
    }

    #[test]
    fn extract_canonical_accession_is_identity() {
        let acc = extract_accession("NG_008847.2").unwrap();
        assert_eq!(acc.as_str(), "NG_008847.2");
    }

    #[test]
    fn extract_unversioned_accession() {
        let acc = extract_accession("NM_000546").unwrap();
        assert_eq!(acc.as_str(), "NM_000546");
    }

    #[test]
    fn extract_nuccore_url_strips_query() {
        let acc =
            extract_accession("https://www.ncbi.nlm.nih.gov/nuccore/NG_008847.2?from=1&to=2")
                .unwrap();
        assert_eq!(acc.as_str(), "NG_008847.2");
    }

    #[test]
    fn extract_id_parameter() {
        let acc = extract_accession("efetch.fcgi?db=nuccore&ID=NM_000546.6&retmode=text").unwrap();
        assert_eq!(acc.as_str(), "NM_000546.6");
    }

    #[test]
    fn extract_rejects_gene_symbol() {
        assert_eq!(extract_accession("BRCA1"), None);
        assert_eq!(extract_accession("NR_003287.4"), None);
        assert_eq!(extract_accession(""), None);
    }

    #[test]
    fn record_types_parse_separators() {
        let types: RecordTypes = "nm;NG".parse().unwrap();
        assert!(types.contains(RecordType::Nm));
        assert!(types.contains(RecordType::Ng));
        assert_eq!(types.to_string(), "NM,NG");
    }

    #[test]
    fn record_types_parse_single() {
        let types: RecordTypes = "NM".parse().unwrap();
        assert!(types.contains(RecordType::Nm));
        assert!(!types.contains(RecordType::Ng));
        assert_eq!(types.iter().collect::<Vec<_>>(), vec![RecordType::Nm]);
    }

    #[test]
    fn record_types_reject_unknown() {
        let err = "NM,XR".parse::<RecordTypes>().unwrap_err();
        assert_matches!(err, FetchError::InvalidRecordType(_));
    }

    #[test]
    fn record_types_reject_empty() {
        let err = " , ".parse::<RecordTypes>().unwrap_err();
        assert_matches!(err, FetchError::EmptyRecordTypes);
    }

    #[test]
    fn half_range_is_dropped() {
        assert_eq!(FetchRange::from_bounds(Some(100), None), None);
        assert_eq!(FetchRange::from_bounds(None, Some(200)), None);
        assert_eq!(
            FetchRange::from_bounds(Some(100), Some(200)),
            Some(FetchRange {
                start: 100,
                stop: 200
            })
        );
        assert_eq!(FetchRange::from_bounds(None, None), None);
    }
}
