use camino::Utf8PathBuf;

use crate::domain::{FetchRange, InputMode, RecordTypes};

/// Identification sent with every E-utilities request. NCBI asks
/// callers to send tool + email; an api_key raises the allowed
/// request rate.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub tool: String,
    pub email: String,
    pub api_key: Option<String>,
}

impl ClientIdentity {
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Immutable, fully resolved configuration for one run. Constructed
/// once by the CLI from flags and environment defaults; the pipeline
/// itself never reads ambient environment state.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_file: Utf8PathBuf,
    pub mode: InputMode,
    pub types: RecordTypes,
    pub tax_id: String,
    pub ng_range: Option<FetchRange>,
    pub out_dir: Utf8PathBuf,
    pub identity: ClientIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_counts_as_absent() {
        let identity = ClientIdentity {
            tool: "refseq-gb".to_string(),
            email: "dev@example.org".to_string(),
            api_key: Some("   ".to_string()),
        };
        assert!(!identity.has_api_key());

        let identity = ClientIdentity {
            api_key: Some("abc123".to_string()),
            ..identity
        };
        assert!(identity.has_api_key());
    }
}
