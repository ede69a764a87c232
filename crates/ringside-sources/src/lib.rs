//! Input collaborators: event CSV datasets, leaderboards, logo assets, the page template
//! and the site config.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ringside_core::{sanitize_file_stem, BeltImages, CanonicalField, HeaderSynonyms, Record};
use serde::Deserialize;
use tracing::debug;

pub const LOGOS_SUBDIR: &str = "assets/logos";

/// Parse CSV text into records keyed by the header row. A leading UTF-8 BOM is ignored.
pub fn records_from_str(text: &str) -> Result<Vec<Record>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().context("reading CSV header row")?.clone();

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("reading CSV row {}", idx + 2))?;
        let cells: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        records.push(Record::new(cells));
    }
    Ok(records)
}

pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records = records_from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), rows = records.len(), "loaded CSV dataset");
    Ok(records)
}

/// Per-event leaderboard CSV files, addressed by EventID.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    dir: PathBuf,
}

impl LeaderboardStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate files in lookup order: exact id, sanitized id, lowercase id.
    pub fn candidates(&self, event_id: &str) -> Vec<PathBuf> {
        let cleaned = event_id.trim();
        if cleaned.is_empty() {
            return Vec::new();
        }
        let mut out: Vec<PathBuf> = Vec::new();
        for stem in [
            cleaned.to_string(),
            sanitize_file_stem(cleaned),
            cleaned.to_lowercase(),
        ] {
            let path = self.dir.join(format!("{stem}.csv"));
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }

    /// `Ok(None)` when the event has no leaderboard file.
    pub fn load(&self, event_id: &str) -> Result<Option<Vec<Record>>> {
        let Some(path) = self.candidates(event_id).into_iter().find(|p| p.is_file()) else {
            debug!(event_id, dir = %self.dir.display(), "no leaderboard dataset");
            return Ok(None);
        };
        load_records(&path).map(Some)
    }
}

/// Event logo lookup under `<root>/assets/logos`.
#[derive(Debug, Clone)]
pub struct LogoLookup {
    root: PathBuf,
}

impl LogoLookup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Relative `assets/logos/<id>.png` path of the first existing candidate
    /// (exact case, then lowercase).
    pub fn find(&self, event_id: &str) -> Option<String> {
        let cleaned = event_id.trim();
        if cleaned.is_empty() {
            return None;
        }
        [cleaned.to_string(), cleaned.to_lowercase()]
            .into_iter()
            .map(|stem| format!("{LOGOS_SUBDIR}/{stem}.png"))
            .find(|rel| self.root.join(rel).is_file())
    }
}

pub fn load_page_template(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("reading template {}", path.display()))
}

#[derive(Debug, Clone, Deserialize)]
struct SiteConfigFile {
    #[serde(default)]
    belts: Option<BeltImages>,
    #[serde(default)]
    headers: BTreeMap<CanonicalField, Vec<String>>,
}

/// Lookup tables shared by resolution and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteConfig {
    pub belts: BeltImages,
    pub header_synonyms: HeaderSynonyms,
}

pub fn site_config_from_str(yaml: &str) -> Result<SiteConfig> {
    let file: SiteConfigFile = serde_yaml::from_str(yaml).context("parsing site config")?;
    Ok(SiteConfig {
        belts: file.belts.unwrap_or_default(),
        header_synonyms: HeaderSynonyms::default().with_overrides(file.headers),
    })
}

/// Missing file means built-in defaults.
pub fn load_site_config(path: impl AsRef<Path>) -> Result<SiteConfig> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "no site config; using defaults");
        return Ok(SiteConfig::default());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    site_config_from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringside_core::DEFAULT_BELT_IMAGE;
    use tempfile::tempdir;

    #[test]
    fn bom_is_stripped_from_first_header() {
        let records = records_from_str("\u{feff}EventID,Odds\nEC2026,+150\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("EventID"), Some("EC2026"));
        assert_eq!(records[0].get("Odds"), Some("+150"));
    }

    #[test]
    fn short_rows_lack_trailing_cells_and_quotes_are_honoured() {
        let text = "Match,Wrestler,Odds\n\"Tag, Team\",\"The \"\"Usos\"\"\"\nSolo,Cena,-300\n";
        let records = records_from_str(text).unwrap();
        assert_eq!(records[0].get("Match"), Some("Tag, Team"));
        assert_eq!(records[0].get("Wrestler"), Some("The \"Usos\""));
        assert_eq!(records[0].get("Odds"), None);
        assert_eq!(records[1].get("Odds"), Some("-300"));
    }

    #[test]
    fn header_only_file_has_no_records() {
        assert!(records_from_str("EventID,Odds\n").unwrap().is_empty());
        assert!(records_from_str("").unwrap().is_empty());
    }

    #[test]
    fn leaderboard_lookup_falls_back_to_lowercase_and_tolerates_absence() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ec2026.csv"), "Player,Score\nalice,10\n").unwrap();
        let store = LeaderboardStore::new(dir.path());

        let rows = store.load("EC2026").unwrap().expect("lowercase file found");
        assert_eq!(rows[0].get("Player"), Some("alice"));
        assert!(store.load("WM42").unwrap().is_none());
        assert!(store.load("  ").unwrap().is_none());
    }

    #[test]
    fn leaderboard_candidates_are_deduplicated() {
        let store = LeaderboardStore::new("boards");
        assert_eq!(
            store.candidates("wm42"),
            vec![PathBuf::from("boards").join("wm42.csv")]
        );
        assert_eq!(store.candidates("WM 42").len(), 3);
    }

    #[test]
    fn logo_lookup_falls_back_to_lowercase_file() {
        let dir = tempdir().unwrap();
        let logos = dir.path().join(LOGOS_SUBDIR);
        fs::create_dir_all(&logos).unwrap();
        fs::write(logos.join("wm42.png"), b"png").unwrap();
        let lookup = LogoLookup::new(dir.path());

        assert_eq!(lookup.find("WM42").as_deref(), Some("assets/logos/wm42.png"));
        assert_eq!(lookup.find("EC2026"), None);
        assert_eq!(lookup.find(""), None);
    }

    #[test]
    fn site_config_merges_with_defaults() {
        let yaml = r#"
belts:
  by_match:
    "Tag Team Championship": assets/belts/tag.png
headers:
  odds: ["Line"]
"#;
        let config = site_config_from_str(yaml).unwrap();
        assert_eq!(config.belts.image_for("Tag Team Championship"), "assets/belts/tag.png");
        assert_eq!(config.belts.image_for("World Heavyweight Championship"), DEFAULT_BELT_IMAGE);
        assert_eq!(config.header_synonyms.synonyms(CanonicalField::Odds), ["Line".to_string()]);
        assert_eq!(
            config.header_synonyms.synonyms(CanonicalField::StartTime),
            ["StartTime".to_string(), "Start Time".to_string()]
        );
    }

    #[test]
    fn missing_site_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_site_config(dir.path().join("ringside.yaml")).unwrap();
        assert_eq!(config, SiteConfig::default());
    }
}
