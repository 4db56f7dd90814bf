//! Crawl result data structure.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Serialize, Serializer};

use crate::error::AppError;

/// Outcome of one crawl: every URL that was fetched and every URL that failed.
#[derive(Debug, Default, Serialize)]
pub struct CrawlResult {
    /// URLs successfully downloaded
    #[serde(serialize_with = "sorted_set")]
    downloaded: HashSet<String>,

    /// URL → reason for every URL that failed
    #[serde(serialize_with = "error_messages")]
    errors: HashMap<String, AppError>,
}

impl CrawlResult {
    pub fn new(downloaded: HashSet<String>, errors: HashMap<String, AppError>) -> Self {
        Self { downloaded, errors }
    }

    pub fn downloaded(&self) -> &HashSet<String> {
        &self.downloaded
    }

    pub fn errors(&self) -> &HashMap<String, AppError> {
        &self.errors
    }

    /// `true` when nothing was downloaded and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.downloaded.is_empty() && self.errors.is_empty()
    }

    pub fn into_parts(self) -> (HashSet<String>, HashMap<String, AppError>) {
        (self.downloaded, self.errors)
    }
}

fn sorted_set<S: Serializer>(set: &HashSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(set.iter().collect::<BTreeSet<_>>())
}

fn error_messages<S: Serializer>(
    errors: &HashMap<String, AppError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let messages: BTreeMap<_, _> = errors
        .iter()
        .map(|(url, err)| (url, err.to_string()))
        .collect();
    serializer.collect_map(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_is_sorted_and_stringified() {
        let downloaded: HashSet<_> = ["https://b.test/", "https://a.test/"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut errors = HashMap::new();
        errors.insert(
            "https://c.test/".to_string(),
            AppError::download("https://c.test/", "HTTP 500"),
        );

        let result = CrawlResult::new(downloaded, errors);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json["downloaded"],
            serde_json::json!(["https://a.test/", "https://b.test/"])
        );
        assert_eq!(
            json["errors"]["https://c.test/"],
            "Download failed for https://c.test/: HTTP 500"
        );
    }

    #[test]
    fn test_default_is_empty() {
        assert!(CrawlResult::default().is_empty());
    }
}
