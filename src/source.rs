//! One-time fetch of the initial chain document.

use crate::chain::ChainDocument;
use crate::error::SourceError;
use reqwest::blocking::Client;
use std::path::Path;
use tracing::info;

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Raw text of the document at `source`, a file path or an http(s) URL
pub fn fetch_text(source: &str) -> Result<String, SourceError> {
    if is_url(source) {
        let resp = Client::new().get(source).send()?;
        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status()));
        }
        Ok(resp.text()?)
    } else {
        let path = Path::new(source);
        std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fetch and parse the initial chain. Returns the document and its text.
pub fn fetch_chain(source: &str) -> Result<(ChainDocument, String), SourceError> {
    let text = fetch_text(source)?;
    let doc = ChainDocument::from_json(&text)?;
    info!(source, nodes = doc.nodes.len(), links = doc.links.len(), "fetched chain document");
    Ok((doc, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("markov-flow-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_chain_from_file() {
        let path = temp_file("ok.json", r#"{"nodes":[{"name":"A","value":1}],"links":[]}"#);
        let (doc, text) = fetch_chain(path.to_str().unwrap()).unwrap();
        assert_eq!(doc.nodes[0].name, "A");
        assert!(text.contains("\"A\""));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = fetch_chain("/definitely/not/here/markov.json").unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let path = temp_file("bad.json", "{ nodes: oops");
        let err = fetch_chain(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SourceError::Chain(ChainError::Parse(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com/markov.json"));
        assert!(!is_url("markov.json"));
    }
}
