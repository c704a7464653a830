use crate::error::{ConductorError, ConductorResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// Build the file name for a report: `<report_id>_<YYYYmmdd_HHMMSS>.json`.
pub fn report_file_name(report_id: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.json", report_id, at.format(STAMP_FORMAT))
}

/// Split a report file name back into its id and timestamp.
fn parse_report_file_name(name: &str) -> Option<(&str, NaiveDateTime)> {
    let stem = name.strip_suffix(".json")?;
    let split = stem.len().checked_sub(STAMP_LEN)?;
    let stamp = stem.get(split..)?;
    let report_id = stem.get(..split)?.strip_suffix('_')?;
    if report_id.is_empty() {
        return None;
    }
    let at = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some((report_id, at))
}

/// JSON-based persistence for orchestration and monitoring reports.
///
/// A report written twice within the same second under the same id
/// overwrites the earlier file.
pub struct JsonReportStore {
    base_dir: PathBuf,
}

impl JsonReportStore {
    /// Create a store rooted at `base_dir`. The directory is created lazily.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory reports are written to.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Save a report as a JSON file.
    /// Returns the path where the report was written.
    pub async fn save<T: Serialize>(&self, report_id: &str, report: &T) -> ConductorResult<PathBuf> {
        if report_id.is_empty() || report_id.contains(['/', '\\']) {
            return Err(ConductorError::Config(format!(
                "Invalid report id '{report_id}'"
            )));
        }

        tokio::fs::create_dir_all(&self.base_dir).await?;

        let path = self.base_dir.join(report_file_name(report_id, Utc::now()));
        let json = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&path, json).await?;

        Ok(path)
    }

    /// Load the most recent report saved under `report_id`.
    pub async fn load_latest<T: DeserializeOwned>(
        &self,
        report_id: &str,
    ) -> ConductorResult<Option<T>> {
        let reports = self.list_for(report_id).await?;

        match reports.last() {
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                let report: T = serde_json::from_str(&content)?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    /// List all report files, oldest first.
    pub async fn list(&self) -> ConductorResult<Vec<PathBuf>> {
        self.list_matching(|_| true).await
    }

    /// List report files saved under exactly `report_id`, oldest first.
    async fn list_for(&self, report_id: &str) -> ConductorResult<Vec<PathBuf>> {
        self.list_matching(|id| id == report_id).await
    }

    /// Files named `<id>_<stamp>.json` whose id passes `keep`. Anything else
    /// in the directory is ignored.
    async fn list_matching(&self, keep: impl Fn(&str) -> bool) -> ConductorResult<Vec<PathBuf>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let parsed = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_report_file_name)
                .filter(|&(id, _)| keep(id))
                .map(|(_, at)| at);
            if let Some(at) = parsed {
                entries.push((at, path));
            }
        }

        entries.sort();
        Ok(entries.into_iter().map(|(_, path)| path).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct SampleReport {
        summary: String,
        assigned: u32,
    }

    fn sample_report() -> SampleReport {
        SampleReport {
            summary: "Test report".to_string(),
            assigned: 2,
        }
    }

    #[test]
    fn test_report_file_name_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            report_file_name("orchestration", at),
            "orchestration_20260304_050607.json"
        );
    }

    #[tokio::test]
    async fn test_save_and_load_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());

        let path = store.save("orchestration", &sample_report()).await.unwrap();
        assert!(path.exists());
        assert!(path.to_str().unwrap().contains("orchestration_"));

        let loaded: Option<SampleReport> = store.load_latest("orchestration").await.unwrap();
        assert_eq!(loaded, Some(sample_report()));
    }

    #[test]
    fn test_parse_report_file_name() {
        let (id, at) = parse_report_file_name("orchestration_status_20260304_050607.json").unwrap();
        assert_eq!(id, "orchestration_status");
        assert_eq!(at.format(STAMP_FORMAT).to_string(), "20260304_050607");
        assert!(parse_report_file_name("orchestration_20260304_0506.json").is_none());
        assert!(parse_report_file_name("_20260304_050607.json").is_none());
        assert!(parse_report_file_name("notes.json").is_none());
    }

    #[tokio::test]
    async fn test_longer_sibling_id_not_matched() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());

        store.save("orchestration_status", &sample_report()).await.unwrap();
        store
            .save("orchestration_performance_report", &sample_report())
            .await
            .unwrap();

        let loaded: Option<SampleReport> = store.load_latest("orchestration").await.unwrap();
        assert!(loaded.is_none());
        let status: Option<SampleReport> =
            store.load_latest("orchestration_status").await.unwrap();
        assert_eq!(status, Some(sample_report()));
    }

    #[tokio::test]
    async fn test_latest_is_newest_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let older = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let newer = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        for (at, assigned) in [(newer, 7), (older, 1)] {
            let report = SampleReport {
                summary: "Test report".to_string(),
                assigned,
            };
            tokio::fs::write(
                dir.path().join(report_file_name("monitor", at)),
                serde_json::to_string(&report).unwrap(),
            )
            .await
            .unwrap();
        }
        tokio::fs::write(dir.path().join("monitor_notes.json"), "{}")
            .await
            .unwrap();

        let store = JsonReportStore::new(dir.path());
        assert_eq!(store.list().await.unwrap().len(), 2);
        let latest: SampleReport = store.load_latest("monitor").await.unwrap().unwrap();
        assert_eq!(latest.assigned, 7);
    }

    #[tokio::test]
    async fn test_load_latest_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());

        let result: Option<SampleReport> = store.load_latest("monitor").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_reports() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());

        store.save("orchestration", &sample_report()).await.unwrap();
        store.save("monitor", &sample_report()).await.unwrap();

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());
        assert!(store.save("../escape", &sample_report()).await.is_err());
        assert!(store.save("", &sample_report()).await.is_err());
    }

    #[tokio::test]
    async fn test_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonReportStore::new(dir.path().join("not-created"));
        let reports = store.list().await.unwrap();
        assert!(reports.is_empty());
    }
}
