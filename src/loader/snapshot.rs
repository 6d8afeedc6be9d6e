use std::{fs, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{Error, Result},
    loader::Loaded,
    normalize::normalize,
    record::Record,
    session::Origin,
};

/// A pre-baked publication list: either a bare array or `{"publications": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Wrapped { publications: Vec<Record> },
    Bare(Vec<Record>),
}

impl Snapshot {
    fn into_records(self) -> Vec<Record> {
        match self {
            Snapshot::Wrapped { publications } => publications,
            Snapshot::Bare(records) => records,
        }
    }
}

pub fn parse(body: &str, origin: &str) -> Result<Loaded> {
    let snapshot: Snapshot = serde_json::from_str(body).map_err(|source| Error::Payload {
        origin: origin.to_string(),
        source,
    })?;
    let records = normalize(snapshot.into_records());
    log::info!("read {} publications from {origin}", records.len());
    Ok(Loaded {
        records,
        origin: Origin::Snapshot,
        version: None,
    })
}

pub fn from_file(path: &Path) -> Result<Loaded> {
    let body = fs::read_to_string(path).map_err(|source| Error::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&body, &path.display().to_string())
}

pub fn from_url(url: &Url) -> Result<Loaded> {
    let body: String = ureq::get(url.as_str())
        .header("Accept", "application/json")
        .call()
        .map_err(|e| Error::http(url.as_str(), e))?
        .body_mut()
        .read_to_string()
        .map_err(|e| Error::http(url.as_str(), e))?;
    parse(&body, url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WRAPPED: &str = r#"{"publications": [
        {"id": "A1", "type": "journalArticle", "year": 2021, "title": "Older", "tags": ["ir"]},
        {"id": "B2", "type": "presentation", "year": 2023, "title": "Newer", "presentationType": "Lecture"},
        {"id": "C3", "type": "attachment", "year": 2023, "title": "slides.pdf"}
    ]}"#;

    #[test]
    fn wrapped_snapshot_is_normalized() {
        let loaded = parse(WRAPPED, "test").unwrap();
        assert_eq!(loaded.origin, Origin::Snapshot);
        assert!(!loaded.needs_tags());
        let keys: Vec<&str> = loaded.records.iter().map(|r| r.human_key.as_str()).collect();
        assert_eq!(keys, vec!["2023-newer", "2021-older"]);
        assert_eq!(loaded.records[1].tags, vec!["ir"]);
    }

    #[test]
    fn bare_array_from_file() {
        let mut tmp = NamedTempFile::new().expect("tmp file");
        write!(
            tmp,
            r#"[{{"key": "K", "itemType": "thesis", "date": "2019-06-01", "title": "Thesis"}}]"#
        )
        .unwrap();
        let loaded = from_file(tmp.path()).unwrap();
        assert_eq!(loaded.records[0].human_key, "2019-thesis");
    }

    #[test]
    fn archive_shape_with_plain_authors() {
        let body = r#"[{"id": "2020-x-thesis", "type": "thesis", "year": 2020, "month": null,
            "day": null, "title": "X", "authors": ["Ivan Petrov"], "tags": ["nlp"],
            "url": null, "language": "english"}]"#;
        let loaded = parse(body, "archive").unwrap();
        let record = &loaded.records[0];
        assert_eq!(record.human_key, "2020-x");
        assert_eq!(record.creators[0].to_string(), "Ivan Petrov");
        assert_eq!(record.tags, vec!["nlp"]);
        assert_eq!(record.link(), None);
        assert_eq!(record.language.as_deref(), Some("english"));
    }

    #[test]
    fn garbage_is_a_payload_error() {
        let err = parse("{\"publications\": 3}", "test").err().unwrap();
        assert!(matches!(err, Error::Payload { .. }));
    }
}
