use std::io::{self, Write};

use serde::Serialize;

use crate::app::RunReport;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn print_summary(report: &RunReport) {
    println!("mode: {}", report.mode);
    for gene in &report.genes {
        match &gene.gene_id {
            Some(gene_id) => {
                let fetched = gene
                    .fetched
                    .iter()
                    .filter(|outcome| outcome.error.is_none())
                    .count();
                println!("  {} (GeneID {}): {} file(s)", gene.symbol, gene_id, fetched);
            }
            None => match &gene.error {
                Some(err) => println!("  {}: error: {err}", gene.symbol),
                None => println!("  {}: GeneID not found", gene.symbol),
            },
        }
        if gene.gene_id.is_some() {
            if let Some(err) = &gene.error {
                println!("    warning: {err}");
            }
        }
    }
    for outcome in &report.accessions {
        match &outcome.error {
            None => println!(
                "  {} -> {}",
                outcome.accession,
                outcome.path.as_deref().unwrap_or("-")
            ),
            Some(err) => println!("  {}: error: {err}", outcome.accession),
        }
    }
    println!(
        "fetched {}, failed {}",
        report.fetched_count(),
        report.failed_count()
    );
}
