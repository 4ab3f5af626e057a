//! RefSeq GenBank fetcher built on the NCBI E-utilities.
//!
//! Gene symbols are resolved to GeneIDs (esearch), GeneIDs are linked
//! to NM_/NG_ accession.versions (elink), and each accession is fetched
//! as a GenBank flat file (efetch) into a deterministic directory
//! layout. Accession input skips the first two steps. Everything is
//! sequential with a polite inter-request delay.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod eutils;
pub mod input;
pub mod output;
pub mod xml;
