// ============================================================
// Layer 4 — HTML Loader
// ============================================================
// Enumerates the downloader's output and reads it back.
//
// Expected layout under the downloads directory:
//
//   fomc/
//     minutes/January-28-29-fomcminutes20140129.htm
//     statement/monetary20140129a.htm
//     press_conference/FOMCpresconf20140319.htm
//   speeches/
//     Powell/2019-05-20-powell20190520a.htm
//
// The first directory below fomc/ is the doc kind, the first
// directory below speeches/ is the speaker. Dates come from the
// file name (YYYY-MM-DD prefix, or an embedded YYYYMMDD run).
//
// Listing is cheap and sorted by path so runs are reproducible;
// content is only read for documents the corpus does not have yet.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ignore::WalkBuilder;
use regex::Regex;

use crate::domain::document::{
    DocumentHandle, DocumentId, DocumentMetadata, RawDocument, SourceType,
};
use crate::domain::traits::DocumentSource;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"((?:19|20)\d{2})-(\d{2})-(\d{2})").unwrap());
static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"((?:19|20)\d{2})(\d{2})(\d{2})").unwrap());

/// Loads downloaded .htm/.html files for a set of source types.
pub struct HtmlLoader {
    root: PathBuf,
    sources: Vec<SourceType>,
}

impl HtmlLoader {
    pub fn new(root: impl Into<PathBuf>, sources: &[SourceType]) -> Self {
        Self {
            root: root.into(),
            sources: sources.to_vec(),
        }
    }

    fn list_source(&self, source: SourceType) -> Result<Vec<DocumentHandle>> {
        let dir = self.root.join(source.dir_name());

        // A missing source directory just means nothing was downloaded
        if !dir.is_dir() {
            tracing::warn!(
                "Source directory '{}' does not exist, nothing to load for {}",
                dir.display(),
                source
            );
            return Ok(Vec::new());
        }

        let walker = WalkBuilder::new(&dir)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut handles = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under '{}': {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !is_html(path) {
                continue;
            }

            match handle_for(source, &dir, path) {
                Some(handle) => handles.push(handle),
                None => tracing::warn!("Skipping '{}': not under {}", path.display(), dir.display()),
            }
        }

        tracing::info!("Found {} {} documents", handles.len(), source);
        Ok(handles)
    }
}

impl DocumentSource for HtmlLoader {
    fn list(&self) -> Result<Vec<DocumentHandle>> {
        let mut all = Vec::new();
        for source in &self.sources {
            all.extend(self.list_source(*source)?);
        }
        for (id, paths) in shared_ids(&all) {
            tracing::warn!(
                "{} files map to document id {}; only '{}' will be cleaned: {:?}",
                paths.len(),
                id,
                paths[0].display(),
                paths
            );
        }
        Ok(all)
    }

    fn read(&self, handle: &DocumentHandle) -> Result<RawDocument> {
        let bytes = fs::read(&handle.path)
            .with_context(|| format!("Cannot read '{}'", handle.path.display()))?;
        let html = String::from_utf8_lossy(&bytes).into_owned();
        Ok(RawDocument::from_handle(handle.clone(), html))
    }
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("htm") | Some("html")
    )
}

/// Ids claimed by more than one file ("x.htm" next to "x.html"),
/// with the clashing paths in listing order
fn shared_ids(handles: &[DocumentHandle]) -> Vec<(&DocumentId, Vec<&Path>)> {
    let mut by_id: HashMap<&DocumentId, Vec<&Path>> = HashMap::new();
    for h in handles {
        by_id.entry(&h.id).or_default().push(&h.path);
    }
    let mut shared: Vec<_> = by_id.into_iter().filter(|(_, p)| p.len() > 1).collect();
    shared.sort_by(|a, b| a.0.cmp(b.0));
    shared
}

/// Build a handle from a file path relative to its source directory
fn handle_for(source: SourceType, source_dir: &Path, path: &Path) -> Option<DocumentHandle> {
    let relative = path.strip_prefix(source_dir).ok()?;
    let stem = relative.with_extension("");
    let components: Vec<String> = stem
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let file_name = path.file_name()?.to_string_lossy();

    // Only files inside a subdirectory carry a kind / speaker
    let group = (components.len() > 1).then(|| components[0].clone());
    let (doc_kind, speaker) = match source {
        SourceType::Fomc => (group, None),
        SourceType::Speech => (None, group),
    };

    Some(DocumentHandle {
        id: DocumentId::new(source, &components.join("/")),
        source,
        path: path.to_path_buf(),
        metadata: DocumentMetadata {
            date: date_from_file_name(&file_name),
            doc_kind,
            speaker,
            title: None,
        },
    })
}

/// First valid calendar date in a file name, ISO form preferred.
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    [&*ISO_DATE, &*COMPACT_DATE].into_iter().find_map(|re| {
        re.captures_iter(name).find_map(|caps| {
            let y = caps[1].parse().ok()?;
            let m = caps[2].parse().ok()?;
            let d = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(y, m, d)
        })
    })
}
