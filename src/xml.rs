//! Path-based text extraction over untrusted E-utilities XML.
//!
//! Security invariant: responses come from a remote service and must
//! never trigger external entity or external DTD resolution. The
//! streaming reader used here performs no IO of its own, DOCTYPE
//! declarations are tolerated but skipped unresolved, and entity
//! references beyond the XML built-ins are replaced with an empty
//! substitute instead of being expanded.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FetchError;

/// Returns the text content of every element whose open-element path
/// ends with `path`, in document order. `&["IdList", "Id"]` behaves
/// like the XPath `//IdList/Id/text()`.
pub fn extract_text_values(xml: &str, path: &[&str]) -> Result<Vec<String>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut capture = false;
    let mut values = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                stack.push(String::from_utf8_lossy(element.name().as_ref()).into_owned());
                capture = path_matches(&stack, path);
            }
            Ok(Event::End(_)) => {
                stack.pop();
                capture = path_matches(&stack, path);
            }
            Ok(Event::Text(text)) if capture => {
                // Unknown entities resolve to nothing rather than erroring
                let text = text.unescape().unwrap_or_default();
                let text = text.trim();
                if !text.is_empty() {
                    values.push(text.to_string());
                }
            }
            Ok(Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(FetchError::Xml(err.to_string())),
        }
    }
    Ok(values)
}

fn path_matches(stack: &[String], path: &[&str]) -> bool {
    stack.len() >= path.len()
        && stack
            .iter()
            .rev()
            .zip(path.iter().rev())
            .all(|(open, wanted)| open == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESEARCH: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN"
  "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult>
  <Count>1</Count>
  <IdList>
    <Id>672</Id>
  </IdList>
</eSearchResult>"#;

    const ELINK: &str = r#"<?xml version="1.0"?>
<eLinkResult>
  <LinkSet>
    <DbFrom>gene</DbFrom>
    <LinkSetDb>
      <DbTo>nuccore</DbTo>
      <LinkName>gene_nuccore_refseqrna</LinkName>
      <Link><Id>NM_007294.4</Id></Link>
      <Link><Id>NM_007297.4</Id></Link>
      <Link><Id>NR_027676.2</Id></Link>
    </LinkSetDb>
  </LinkSet>
</eLinkResult>"#;

    #[test]
    fn extracts_id_under_doctype() {
        let ids = extract_text_values(ESEARCH, &["IdList", "Id"]).unwrap();
        assert_eq!(ids, vec!["672"]);
    }

    #[test]
    fn extracts_link_ids_in_document_order() {
        let ids = extract_text_values(ELINK, &["LinkSetDb", "Link", "Id"]).unwrap();
        assert_eq!(ids, vec!["NM_007294.4", "NM_007297.4", "NR_027676.2"]);
    }

    #[test]
    fn path_is_a_suffix_not_a_full_path() {
        // Count sits under eSearchResult directly, not under IdList
        let counts = extract_text_values(ESEARCH, &["Count"]).unwrap();
        assert_eq!(counts, vec!["1"]);
        let ids = extract_text_values(ESEARCH, &["eSearchResult", "Id"]).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn empty_document_yields_no_values() {
        let ids = extract_text_values("<eSearchResult><IdList/></eSearchResult>", &["Id"]);
        assert_eq!(ids.unwrap(), Vec::<String>::new());
    }

    #[test]
    fn undeclared_entity_becomes_empty_substitute() {
        let xml = "<r><Id>&bogus;</Id><Id>17</Id></r>";
        let ids = extract_text_values(xml, &["Id"]).unwrap();
        assert_eq!(ids, vec!["17"]);
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let err = extract_text_values("<a><b>text</c></a>", &["b"]).unwrap_err();
        assert!(matches!(err, FetchError::Xml(_)));
    }
}
