//! Flat-file job store
//!
//! One pretty-printed JSON file per [`JobRecord`] under a single directory.
//! The file stem (`slug(title)_slug(company)`, plus `_2`, `_3`... on collision)
//! is the record's identifier.
//!
//! Lookup operations return display text rather than records because they
//! feed plan steps directly. A miss is a normal result string; only I/O and
//! corrupt files are errors.

pub mod extractor;
pub mod parsing;

pub use extractor::JobExtractor;
pub use parsing::{build_filename, parse_job_text, slugify};

use sdk::errors::EngineError;
use sdk::JobRecord;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Shortest title word considered by the fuzzy title fallback
const MIN_FUZZY_WORD_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Open the store at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            EngineError::JobStore(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `(stem, path)` of every `*.json` file, sorted by stem
    async fn entries(&self) -> Result<Vec<(String, PathBuf)>, EngineError> {
        let mut read_dir = fs::read_dir(&self.dir).await.map_err(|e| {
            EngineError::JobStore(format!("Failed to list {}: {}", self.dir.display(), e))
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                entries.push((stem.to_string(), path.clone()));
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    async fn read_record(path: &Path) -> Result<JobRecord, EngineError> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            EngineError::JobStore(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            EngineError::JobStore(format!("Corrupt job file {}: {}", path.display(), e))
        })
    }

    /// Load a job whose filename matches `title`.
    ///
    /// A stem containing the lowercase title (or its slug) wins. Failing that,
    /// the stem sharing the most title words of 4+ characters is used.
    pub async fn load_by_title(&self, title: &str) -> Result<String, EngineError> {
        let entries = self.entries().await?;
        let needle = title.to_lowercase();
        let slug = slugify(title);

        let direct = entries.iter().find(|(stem, _)| {
            let stem = stem.to_lowercase();
            stem.contains(&needle) || (!slug.is_empty() && stem.contains(&slug))
        });

        let chosen = match direct {
            Some(entry) => Some(entry),
            None => {
                let words: Vec<String> = slug
                    .split('_')
                    .filter(|w| w.len() >= MIN_FUZZY_WORD_LEN)
                    .map(str::to_string)
                    .collect();

                let mut best: Option<(&(String, PathBuf), usize)> = None;
                for entry in &entries {
                    let stem = entry.0.to_lowercase();
                    let score = words.iter().filter(|w| stem.contains(w.as_str())).count();
                    if score > 0 && best.map_or(true, |(_, s)| score > s) {
                        best = Some((entry, score));
                    }
                }
                if let Some((entry, score)) = best {
                    debug!(title, stem = %entry.0, score, "Fuzzy title match");
                }
                best.map(|(entry, _)| entry)
            }
        };

        match chosen {
            Some((_, path)) => Ok(format_record(&Self::read_record(path).await?)),
            None => Ok(format!("Job with title '{}' not found in directory", title)),
        }
    }

    /// Jobs whose title contains `term`, case-insensitive
    pub async fn search_by_title(&self, term: &str) -> Result<String, EngineError> {
        let needle = term.to_lowercase();
        let mut matches = Vec::new();

        for (stem, path) in self.entries().await? {
            let job = Self::read_record(&path).await?;
            if job.title.to_lowercase().contains(&needle) {
                matches.push(summary_line(&job, &stem));
            }
        }

        Ok(matches_or_none(term, matches))
    }

    /// One summary line per stored job
    pub async fn list_all(&self) -> Result<String, EngineError> {
        let entries = self.entries().await?;
        if entries.is_empty() {
            return Ok("No jobs found in directory".to_string());
        }

        let mut lines = Vec::with_capacity(entries.len());
        for (stem, path) in &entries {
            let job = Self::read_record(path).await?;
            lines.push(summary_line(&job, stem));
        }

        Ok(format!("Available jobs:\n{}", lines.join("\n")))
    }

    /// Job stored as `<filename>.json`
    pub async fn get_by_filename(&self, filename: &str) -> Result<String, EngineError> {
        match self.load_record(filename).await? {
            Some(job) => Ok(format_record(&job)),
            None => Ok(format!("Job file '{}.json' not found", filename)),
        }
    }

    /// Jobs whose title, description, location, requirements or
    /// responsibilities contain any whitespace-separated word of `criteria`
    pub async fn search_by_criteria(&self, criteria: &str) -> Result<String, EngineError> {
        let keywords: Vec<String> = criteria.split_whitespace().map(str::to_lowercase).collect();
        let mut matches = Vec::new();

        for (stem, path) in self.entries().await? {
            let job = Self::read_record(&path).await?;
            let text = job.searchable_text();
            if keywords.iter().any(|k| text.contains(k.as_str())) {
                matches.push(summary_line(&job, &stem));
            }
        }

        Ok(matches_or_none(criteria, matches))
    }

    /// Write `job` to a fresh file and return its stem.
    ///
    /// Never overwrites: an existing `<base>.json` moves on to `<base>_2.json`,
    /// `<base>_3.json` and so on. Files are created with create-new semantics so
    /// concurrent saves of the same job land in distinct files.
    pub async fn save(&self, job: &JobRecord) -> Result<String, EngineError> {
        let base = build_filename(job);
        let contents = serde_json::to_string_pretty(job)
            .map_err(|e| EngineError::JobStore(format!("Failed to serialize job: {}", e)))?;

        let mut n = 1u32;
        loop {
            let stem = if n == 1 {
                base.clone()
            } else {
                format!("{}_{}", base, n)
            };
            let path = self.dir.join(format!("{}.json", stem));

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    file.write_all(contents.as_bytes()).await?;
                    file.flush().await?;
                    info!(filename = %stem, "Saved job");
                    return Ok(stem);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => {
                    return Err(EngineError::JobStore(format!(
                        "Failed to create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
    }

    /// The record stored as `<filename>.json`, if any.
    ///
    /// Names that would escape the store directory are treated as missing.
    pub async fn load_record(&self, filename: &str) -> Result<Option<JobRecord>, EngineError> {
        if !is_plain_filename(filename) {
            return Ok(None);
        }

        let path = self.dir.join(format!("{}.json", filename));
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_record(&path).await.map(Some)
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c| c == '/' || c == '\\')
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "Unknown"
    } else {
        value
    }
}

fn or_not_specified(value: &str) -> &str {
    if value.trim().is_empty() {
        "Not specified"
    } else {
        value
    }
}

fn summary_line(job: &JobRecord, stem: &str) -> String {
    format!(
        "- {} at {} (File: {})",
        or_unknown(&job.title),
        or_unknown(&job.company),
        stem
    )
}

fn matches_or_none(query: &str, matches: Vec<String>) -> String {
    if matches.is_empty() {
        format!("No jobs found matching '{}'", query)
    } else {
        format!("Jobs matching '{}':\n{}", query, matches.join("\n"))
    }
}

/// Multi-line detail view used by the title and filename lookups
pub fn format_record(job: &JobRecord) -> String {
    let mut out = format!(
        "Job: {}\nCompany: {}\nLocation: {}\nDescription: {}\nRequirements: {}\nResponsibilities: {}\nSalary: {}\nEmployment Type: {}",
        or_unknown(&job.title),
        or_unknown(&job.company),
        or_unknown(&job.location),
        job.description,
        job.requirements.join(", "),
        job.responsibilities.join(", "),
        or_not_specified(&job.salary),
        or_not_specified(&job.job_type),
    );
    if !job.posted_date.trim().is_empty() {
        out.push_str(&format!("\nPosted: {}", job.posted_date));
    }
    if !job.benefits.is_empty() {
        out.push_str(&format!("\nBenefits: {}", job.benefits.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record_defaults() {
        let mut job = JobRecord::new("Data Scientist", "");
        job.requirements = vec!["Python".into(), "SQL".into()];

        let text = format_record(&job);
        assert!(text.starts_with("Job: Data Scientist\nCompany: Unknown\nLocation: Unknown"));
        assert!(text.contains("Requirements: Python, SQL"));
        assert!(text.contains("Salary: Not specified"));
        assert!(text.ends_with("Employment Type: Not specified"));
    }

    #[test]
    fn test_summary_line() {
        let job = JobRecord::new("ML Engineer", "Acme");
        assert_eq!(
            summary_line(&job, "ml_engineer_acme"),
            "- ML Engineer at Acme (File: ml_engineer_acme)"
        );
    }

    #[test]
    fn test_plain_filename() {
        assert!(is_plain_filename("data_scientist_acme"));
        assert!(!is_plain_filename("../secrets"));
        assert!(!is_plain_filename(""));
        assert!(!is_plain_filename(".."));
    }

    #[test]
    fn test_matches_or_none() {
        assert_eq!(matches_or_none("rust", vec![]), "No jobs found matching 'rust'");
        assert_eq!(
            matches_or_none("rust", vec!["- a at b (File: a_b)".into()]),
            "Jobs matching 'rust':\n- a at b (File: a_b)"
        );
    }
}
