//! JSON-Schema-Test-Suite loading.
//!
//! Suites are mirrored under a local directory that follows the upstream
//! repository's relative layout. A missing suite is downloaded once, written to
//! its mirror path and then read back from disk.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use jsonnetunit_fetch::Transport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::SuiteLoadError;

/// One schema with the cases that exercise it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub description: String,
    pub schema: Value,
    pub tests: Vec<TestCase>,
}

/// A single instance and whether it should validate against the suite schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub description: String,
    pub data: Value,
    pub valid: bool,
}

/// Loads suites from the local mirror, syncing from the remote on a miss.
pub struct SuiteLoader {
    suites_dir: PathBuf,
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl SuiteLoader {
    pub fn new(suites_dir: impl AsRef<Path>, base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            suites_dir: suites_dir.as_ref().to_path_buf(),
            base_url: base_url.to_string(),
            transport,
        }
    }

    /// Local mirror path for `name`.
    pub fn local_path(&self, name: &str) -> Result<PathBuf, SuiteLoadError> {
        let rel = Path::new(name);
        let valid = !name.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !valid {
            return Err(SuiteLoadError::InvalidName(name.to_string()));
        }
        Ok(self.suites_dir.join(rel))
    }

    /// Load the suites stored under `name` (e.g. `draft2020-12/type.json`).
    ///
    /// At most one network request is made per call, and only when the local
    /// mirror has no copy yet.
    pub fn load(&self, name: &str) -> Result<Vec<TestSuite>, SuiteLoadError> {
        let path = self.local_path(name)?;

        let data = match read_local(&path)? {
            Some(data) => data,
            None => {
                self.sync(name, &path)?;
                read_local(&path)?.ok_or_else(|| SuiteLoadError::Missing {
                    name: name.to_string(),
                    path: path.clone(),
                })?
            }
        };

        serde_json::from_slice(&data).map_err(|source| SuiteLoadError::Decode {
            name: name.to_string(),
            source,
        })
    }

    fn sync(&self, name: &str, path: &Path) -> Result<(), SuiteLoadError> {
        let url = format!("{}{}", self.base_url, name);
        info!(suite = %name, url = %url, "syncing suite");

        let data = self
            .transport
            .get(&url)
            .map_err(|source| SuiteLoadError::Sync {
                url: url.clone(),
                source,
            })?;

        let io_err = |source| SuiteLoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, &data).map_err(io_err)
    }
}

fn read_local(path: &Path) -> Result<Option<Vec<u8>>, SuiteLoadError> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SuiteLoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonnetunit_fetch::fakes::RecordingTransport;
    use serde_json::json;

    #[test]
    fn test_suite_decodes_upstream_shape() {
        let raw = json!([{
            "description": "integer type matches integers",
            "schema": {"type": "integer"},
            "tests": [
                {"description": "an integer is an integer", "data": 1, "valid": true},
                {"description": "a float is not an integer", "data": 1.1, "valid": false}
            ]
        }]);
        let suites: Vec<TestSuite> = serde_json::from_value(raw).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].tests.len(), 2);
        assert!(suites[0].tests[0].valid);
        assert!(!suites[0].tests[1].valid);
    }

    #[test]
    fn test_local_path_rejects_escapes() {
        let loader = SuiteLoader::new("/suites", "https://x/", Arc::new(RecordingTransport::new()));
        assert!(loader.local_path("../secrets.json").is_err());
        assert!(loader.local_path("/etc/passwd").is_err());
        assert!(loader.local_path("").is_err());
        assert_eq!(
            loader.local_path("draft2020-12/type.json").unwrap(),
            PathBuf::from("/suites/draft2020-12/type.json")
        );
    }
}
