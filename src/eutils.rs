use std::fs::File;
use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use tracing::debug;

use crate::config::ClientIdentity;
use crate::domain::{Accession, FetchRange, RecordType};
use crate::error::FetchError;
use crate::xml;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";
const SNIPPET_LIMIT: usize = 400;
const ESEARCH_RETMAX: &str = "5";

/// Fair-use pacing applied after every fetch. NCBI allows roughly 3
/// requests per second without an API key and 10 with one.
pub fn polite_delay(has_api_key: bool) -> Duration {
    if has_api_key {
        Duration::from_millis(150)
    } else {
        Duration::from_millis(400)
    }
}

/// The three chained E-utilities operations the pipeline is built on.
pub trait EutilsClient: Send + Sync {
    /// esearch: gene symbol + organism filter -> first GeneID, if any.
    /// Taking only the first hit accepts ambiguous symbols silently;
    /// known limitation.
    fn find_gene_id(&self, symbol: &str, tax_id: &str) -> Result<Option<String>, FetchError>;

    /// elink: GeneID -> linked nuccore accession.version strings,
    /// verbatim. The relation returns a superset of the wanted family;
    /// callers filter by prefix.
    fn link_accessions(
        &self,
        gene_id: &str,
        record_type: RecordType,
    ) -> Result<Vec<Accession>, FetchError>;

    /// efetch: GenBank flat file (gbwithparts) streamed to
    /// `destination`, truncating prior content. Returns bytes written.
    fn fetch_genbank(
        &self,
        accession: &Accession,
        destination: &Utf8Path,
        range: Option<FetchRange>,
    ) -> Result<u64, FetchError>;
}

#[derive(Clone)]
pub struct EutilsHttpClient {
    xml_client: Client,
    fetch_client: Client,
    base_url: String,
    identity: ClientIdentity,
}

impl EutilsHttpClient {
    pub fn new(identity: ClientIdentity) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("{} ({})", identity.tool, identity.email))
                .map_err(|err| FetchError::Http(err.to_string()))?,
        );

        // Short deadline for the small XML calls, a longer one for
        // flat-file fetches, whose payloads can run to megabytes.
        let xml_client = Client::builder()
            .default_headers(headers.clone())
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| FetchError::Http(err.to_string()))?;
        let fetch_client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(20))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| FetchError::Http(err.to_string()))?;

        Ok(Self {
            xml_client,
            fetch_client,
            base_url: EUTILS_BASE.to_string(),
            identity,
        })
    }

    fn identified(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("tool", self.identity.tool.clone()));
        params.push(("email", self.identity.email.clone()));
        if let Some(api_key) = self.identity.api_key.as_deref() {
            if !api_key.trim().is_empty() {
                params.push(("api_key", api_key.trim().to_string()));
            }
        }
        params
    }

    fn get_xml(
        &self,
        endpoint: &'static str,
        params: &[(&'static str, String)],
    ) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, "eutils request");
        let response = self
            .xml_client
            .get(&url)
            .query(params)
            .header(ACCEPT, "application/xml")
            .send()
            .map_err(|err| FetchError::Http(err.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .map_err(|err| FetchError::Http(err.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status: status.as_u16(),
                snippet: snippet(&body),
            });
        }
        // An HTML interstitial parsed as empty XML would hide failures
        if !content_type.to_lowercase().contains("xml") {
            return Err(FetchError::ContentType {
                endpoint,
                content_type,
                snippet: snippet(&body),
            });
        }
        Ok(body)
    }
}

impl EutilsClient for EutilsHttpClient {
    fn find_gene_id(&self, symbol: &str, tax_id: &str) -> Result<Option<String>, FetchError> {
        let term = format!("{symbol}[Gene Name] AND txid{tax_id}[Organism]");
        let params = self.identified(vec![
            ("db", "gene".to_string()),
            ("term", term),
            ("retmode", "xml".to_string()),
            ("retmax", ESEARCH_RETMAX.to_string()),
        ]);
        let body = self.get_xml("esearch.fcgi", &params)?;
        let ids = xml::extract_text_values(&body, &["IdList", "Id"])?;
        Ok(ids.into_iter().next())
    }

    fn link_accessions(
        &self,
        gene_id: &str,
        record_type: RecordType,
    ) -> Result<Vec<Accession>, FetchError> {
        // idtype=acc makes ELink return accession.version strings
        let params = self.identified(vec![
            ("dbfrom", "gene".to_string()),
            ("db", "nuccore".to_string()),
            ("id", gene_id.to_string()),
            ("linkname", record_type.link_name().to_string()),
            ("idtype", "acc".to_string()),
            ("retmode", "xml".to_string()),
        ]);
        let body = self.get_xml("elink.fcgi", &params)?;
        let values = xml::extract_text_values(&body, &["LinkSetDb", "Link", "Id"])?;
        Ok(values
            .into_iter()
            .map(|value| Accession::new(value.trim().to_string()))
            .collect())
    }

    fn fetch_genbank(
        &self,
        accession: &Accession,
        destination: &Utf8Path,
        range: Option<FetchRange>,
    ) -> Result<u64, FetchError> {
        let mut params = vec![
            ("db", "nuccore".to_string()),
            ("id", accession.as_str().to_string()),
            ("rettype", "gbwithparts".to_string()),
            ("retmode", "text".to_string()),
        ];
        // 1-based window, same semantics as from/to on the website
        if let Some(range) = range {
            params.push(("seq_start", range.start.to_string()));
            params.push(("seq_stop", range.stop.to_string()));
        }
        let params = self.identified(params);

        let url = format!("{}efetch.fcgi", self.base_url);
        debug!(accession = accession.as_str(), "efetch request");
        let mut response = self
            .fetch_client
            .get(&url)
            .query(&params)
            .send()
            .map_err(|err| FetchError::Http(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|_| "EFetch request failed".to_string());
            return Err(FetchError::Status {
                endpoint: "efetch.fcgi",
                status,
                snippet: snippet(&body),
            });
        }

        let mut file = File::create(destination.as_std_path()).map_err(|err| {
            FetchError::Filesystem(format!("create {destination}: {err}"))
        })?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| FetchError::Filesystem(err.to_string()))
    }
}

fn snippet(body: &str) -> String {
    let mut end = body.len().min(SNIPPET_LIMIT);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}
