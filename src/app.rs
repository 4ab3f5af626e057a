use std::collections::HashSet;
use std::fs;
use std::thread;
use std::time::Duration;

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::domain::{extract_accession, Accession, FetchRange, RecordType, RecordTypes, RunMode};
use crate::error::FetchError;
use crate::eutils::EutilsClient;
use crate::input;

#[derive(Debug, Clone, Serialize, Default)]
pub struct RunReport {
    pub mode: String,
    pub genes: Vec<GeneOutcome>,
    pub accessions: Vec<AccessionOutcome>,
}

impl RunReport {
    pub fn fetched_count(&self) -> usize {
        self.genes
            .iter()
            .flat_map(|gene| gene.fetched.iter())
            .chain(self.accessions.iter())
            .filter(|outcome| outcome.error.is_none())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        let fetch_failures = self
            .genes
            .iter()
            .flat_map(|gene| gene.fetched.iter())
            .chain(self.accessions.iter())
            .filter(|outcome| outcome.error.is_some())
            .count();
        let gene_failures = self
            .genes
            .iter()
            .filter(|gene| gene.error.is_some())
            .count();
        fetch_failures + gene_failures
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneOutcome {
    pub symbol: String,
    pub gene_id: Option<String>,
    pub fetched: Vec<AccessionOutcome>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessionOutcome {
    pub accession: String,
    pub path: Option<String>,
    pub error: Option<String>,
}

pub struct App<C: EutilsClient> {
    client: C,
    delay: Duration,
}

impl<C: EutilsClient> App<C> {
    pub fn new(client: C, delay: Duration) -> Self {
        Self { client, delay }
    }

    /// Drives one full run: read and normalize the input list, settle
    /// the mode, then fetch sequentially with per-entity failure
    /// isolation. Errors returned here occurred before entity
    /// iteration began; everything later lands in the report.
    pub fn run(&self, config: &RunConfig) -> Result<RunReport, FetchError> {
        let tokens = input::read_list_file(&config.input_file)?;
        let mode = input::resolve_mode(config.mode, &tokens);
        fs::create_dir_all(config.out_dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("create {}: {err}", config.out_dir)))?;

        match mode {
            RunMode::Genes => self.run_genes(config, &tokens),
            RunMode::Accessions => self.run_accessions(config, &tokens),
        }
    }

    fn run_genes(&self, config: &RunConfig, symbols: &[String]) -> Result<RunReport, FetchError> {
        info!(
            tax_id = %config.tax_id,
            types = %config.types,
            "input mode: genes (symbols)"
        );
        if let Some(range) = config.ng_range {
            info!(from = range.start, to = range.stop, "NG_ range (1-based, inclusive)");
        }

        let mut report = RunReport {
            mode: "genes".to_string(),
            ..RunReport::default()
        };
        for symbol in symbols {
            report.genes.push(self.fetch_gene(config, symbol));
        }
        Ok(report)
    }

    fn fetch_gene(&self, config: &RunConfig, symbol: &str) -> GeneOutcome {
        info!(symbol, "processing gene");
        let mut outcome = GeneOutcome {
            symbol: symbol.to_string(),
            gene_id: None,
            fetched: Vec::new(),
            error: None,
        };

        let gene_dir = config.out_dir.join(symbol);
        if let Err(err) = fs::create_dir_all(gene_dir.as_std_path()) {
            outcome.error = Some(format!("create {gene_dir}: {err}"));
            return outcome;
        }

        let gene_id = match self.client.find_gene_id(symbol, &config.tax_id) {
            Ok(Some(gene_id)) => gene_id,
            Ok(None) => {
                warn!(symbol, "GeneID not found");
                return outcome;
            }
            Err(err) => {
                warn!(symbol, %err, "gene search failed");
                outcome.error = Some(err.to_string());
                return outcome;
            }
        };
        info!(symbol, %gene_id, "resolved GeneID");
        outcome.gene_id = Some(gene_id.clone());

        for record_type in config.types.iter() {
            let linked = match self.client.link_accessions(&gene_id, record_type) {
                Ok(linked) => linked,
                Err(err) => {
                    warn!(symbol, family = %record_type, %err, "link traversal failed");
                    outcome.error = Some(err.to_string());
                    continue;
                }
            };
            let accessions = filter_family(linked, record_type);
            info!(symbol, family = %record_type, count = accessions.len(), "linked accessions");
            for accession in &accessions {
                let range = match record_type {
                    RecordType::Ng => config.ng_range,
                    RecordType::Nm => None,
                };
                outcome.fetched.push(self.fetch_one(accession, &gene_dir, range));
            }
        }
        outcome
    }

    fn run_accessions(
        &self,
        config: &RunConfig,
        tokens: &[String],
    ) -> Result<RunReport, FetchError> {
        info!(types = %config.types, "input mode: accessions (ACC.V or NCBI URLs)");
        if let Some(range) = config.ng_range {
            info!(from = range.start, to = range.stop, "NG_ range (1-based, inclusive)");
        }

        let out_dir = config.out_dir.join("accessions");
        fs::create_dir_all(out_dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("create {out_dir}: {err}")))?;

        let accessions = select_accessions(tokens, config.types);
        info!(count = accessions.len(), "accessions to download");

        let mut report = RunReport {
            mode: "accessions".to_string(),
            ..RunReport::default()
        };
        for accession in &accessions {
            let range = match accession.record_type() {
                Some(RecordType::Ng) => config.ng_range,
                _ => None,
            };
            report
                .accessions
                .push(self.fetch_one(accession, &out_dir, range));
        }
        Ok(report)
    }

    fn fetch_one(
        &self,
        accession: &Accession,
        dir: &Utf8Path,
        range: Option<FetchRange>,
    ) -> AccessionOutcome {
        let destination = dir.join(accession.file_name());
        let result = self.client.fetch_genbank(accession, &destination, range);
        // the only throttling mechanism in the whole tool
        thread::sleep(self.delay);
        match result {
            Ok(bytes) => {
                info!(accession = accession.as_str(), bytes, path = %destination, "fetched");
                AccessionOutcome {
                    accession: accession.as_str().to_string(),
                    path: Some(destination.into_string()),
                    error: None,
                }
            }
            Err(err) => {
                warn!(accession = accession.as_str(), %err, "fetch failed");
                AccessionOutcome {
                    accession: accession.as_str().to_string(),
                    path: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Narrows link-traversal results to one prefix family and dedupes
/// preserving first-seen order.
fn filter_family(linked: Vec<Accession>, record_type: RecordType) -> Vec<Accession> {
    let mut seen = HashSet::new();
    linked
        .into_iter()
        .filter(|accession| accession.as_str().starts_with(record_type.prefix()))
        .filter(|accession| seen.insert(accession.clone()))
        .collect()
}

/// Extracts accessions from raw tokens, silently dropping non-matches,
/// keeps only the requested families, and dedupes first-seen.
pub fn select_accessions(tokens: &[String], types: RecordTypes) -> Vec<Accession> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter_map(|token| extract_accession(token))
        .filter(|accession| {
            accession
                .record_type()
                .is_some_and(|record_type| types.contains(record_type))
        })
        .filter(|accession| seen.insert(accession.clone()))
        .collect()
}
