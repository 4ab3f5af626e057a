use std::collections::HashSet;
use std::fs;

use camino::Utf8Path;

use crate::domain::{extract_accession, InputMode, RunMode};
use crate::error::FetchError;

/// Reads a simple list file. Supports comments (#...), blank lines,
/// and separators (comma, semicolon, whitespace). An empty result is
/// a user-visible error, not an empty success.
pub fn read_list_file(path: &Utf8Path) -> Result<Vec<String>, FetchError> {
    let content =
        fs::read_to_string(path).map_err(|_| FetchError::InputRead(path.to_owned()))?;
    let tokens = normalize(content.lines());
    if tokens.is_empty() {
        return Err(FetchError::EmptyInput(path.to_owned()));
    }
    Ok(tokens)
}

/// Uppercased tokens, deduplicated by first occurrence, in input order.
pub fn normalize<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for piece in line.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            if piece.is_empty() {
                continue;
            }
            let token = piece.to_uppercase();
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }
    }
    tokens
}

/// Settles an `Auto` run on one mode: accessions iff any token
/// extracts to an NM_/NG_ form, gene symbols otherwise.
pub fn resolve_mode(mode: InputMode, tokens: &[String]) -> RunMode {
    match mode {
        InputMode::Genes => RunMode::Genes,
        InputMode::Accessions => RunMode::Accessions,
        InputMode::Auto => {
            let any_accession = tokens.iter().any(|token| {
                extract_accession(token)
                    .is_some_and(|acc| acc.record_type().is_some())
            });
            if any_accession {
                RunMode::Accessions
            } else {
                RunMode::Genes
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_skips_comments_and_blanks() {
        let tokens = normalize(["BRCA1", "# comment", "", "  brca2  "]);
        assert_eq!(tokens, vec!["BRCA1", "BRCA2"]);
    }

    #[test]
    fn normalize_splits_on_separators() {
        let tokens = normalize(["tp53, brca1;egfr\tkras"]);
        assert_eq!(tokens, vec!["TP53", "BRCA1", "EGFR", "KRAS"]);
    }

    #[test]
    fn normalize_dedupes_first_seen() {
        let tokens = normalize(["BRCA1 brca1", "TP53", "BRCA1"]);
        assert_eq!(tokens, vec!["BRCA1", "TP53"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let tokens = normalize(["tp53, brca1", "# x", "tp53"]);
        let lines: Vec<&str> = tokens.iter().map(String::as_str).collect();
        assert_eq!(normalize(lines), tokens);
    }

    #[test]
    fn auto_mode_resolves_to_genes_for_symbols() {
        let tokens = normalize(["BRCA1", "TP53"]);
        assert_eq!(resolve_mode(InputMode::Auto, &tokens), RunMode::Genes);
    }

    #[test]
    fn auto_mode_resolves_to_accessions_for_nuccore_url() {
        let tokens = normalize([
            "https://www.ncbi.nlm.nih.gov/nuccore/NG_008847.2?report=gbwithparts",
        ]);
        assert_eq!(resolve_mode(InputMode::Auto, &tokens), RunMode::Accessions);
    }

    #[test]
    fn explicit_mode_wins() {
        let tokens = normalize(["NM_000546.6"]);
        assert_eq!(resolve_mode(InputMode::Genes, &tokens), RunMode::Genes);
    }
}
