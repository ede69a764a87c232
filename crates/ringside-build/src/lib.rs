//! Build pipeline: load inputs, resolve events, render and write pages.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use ringside_core::{
    available_event_ids, build_event, normalize, Event, FieldKeys, Leaderboard, Record,
};
use ringside_render::{
    sort_summaries, EventSummary, PageLinks, PageTemplate, SiteRenderer, INDEX_FILE_NAME,
};
use ringside_sources::{
    load_page_template, load_records, load_site_config, LeaderboardStore, LogoLookup, SiteConfig,
};
use ringside_storage::{OutputStore, StoredPage};
use tracing::{debug, info, info_span, warn};

pub const DEFAULT_DATA_CSV: &str = "data.csv";
pub const FALLBACK_DATA_CSV: &str = "WrestleGame_db - Sheet1.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub data_csv: PathBuf,
    pub template: PathBuf,
    pub out_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub leaderboard_dir: PathBuf,
    pub config_path: PathBuf,
}

impl BuildConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str, default: &str| {
            PathBuf::from(var(key).unwrap_or_else(|| default.to_string()))
        };
        Self {
            data_csv: var("RINGSIDE_DATA_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_csv),
            template: path("RINGSIDE_TEMPLATE", "template.html"),
            out_dir: path("RINGSIDE_OUT_DIR", "."),
            assets_dir: path("RINGSIDE_ASSETS_DIR", "."),
            leaderboard_dir: path("RINGSIDE_LEADERBOARD_DIR", "leaderboards"),
            config_path: path("RINGSIDE_CONFIG", "ringside.yaml"),
        }
    }
}

fn default_data_csv() -> PathBuf {
    let primary = PathBuf::from(DEFAULT_DATA_CSV);
    let fallback = PathBuf::from(FALLBACK_DATA_CSV);
    if !primary.exists() && fallback.exists() {
        fallback
    } else {
        primary
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEvent {
    pub event_id: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct BuildRunSummary {
    pub generated_at: NaiveDateTime,
    pub events_rendered: usize,
    pub files_written: Vec<StoredPage>,
    pub failed_events: Vec<FailedEvent>,
}

pub struct BuildPipeline {
    config: BuildConfig,
    template: PageTemplate,
    site: SiteConfig,
    records: Vec<Record>,
    keys: FieldKeys,
    store: OutputStore,
    leaderboards: LeaderboardStore,
    logos: LogoLookup,
}

impl BuildPipeline {
    /// Loads the template, site config and dataset and resolves the header mapping.
    /// Nothing is written until a run method is called.
    pub fn new(config: BuildConfig) -> Result<Self> {
        let template = PageTemplate::new(load_page_template(&config.template)?);
        let site = load_site_config(&config.config_path)?;
        let records = load_records(&config.data_csv)?;
        let keys = FieldKeys::from_records(&records, &site.header_synonyms)?;
        debug!(
            data = %config.data_csv.display(),
            rows = records.len(),
            has_result = keys.result.is_some(),
            "resolved dataset headers"
        );

        Ok(Self {
            store: OutputStore::new(config.out_dir.clone()),
            leaderboards: LeaderboardStore::new(config.leaderboard_dir.clone()),
            logos: LogoLookup::new(config.assets_dir.clone()),
            config,
            template,
            site,
            records,
            keys,
        })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn out_dir(&self) -> &Path {
        self.store.root()
    }

    pub fn list_event_ids(&self) -> Result<Vec<String>> {
        Ok(available_event_ids(&self.records, &self.keys)?)
    }

    pub fn event(&self, event_id: &str) -> Result<Event> {
        Ok(build_event(&self.records, &self.keys, event_id)?)
    }

    pub fn run_all(&self) -> Result<BuildRunSummary> {
        self.run_all_at(Local::now().naive_local())
    }

    /// Every detected event, then the index. EventIDs differing only in case select the
    /// same rows, so only the first spelling is built.
    pub fn run_all_at(&self, generated_at: NaiveDateTime) -> Result<BuildRunSummary> {
        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for id in self.list_event_ids()? {
            if !seen.insert(normalize(&id)) {
                debug!(event_id = %id, "skipping case variant of an earlier EventID");
                continue;
            }
            events.push(self.event(&id)?);
        }
        info!(events = events.len(), out_dir = %self.out_dir().display(), "building event pages");

        let renderer = SiteRenderer::new(&self.template, &self.site.belts, generated_at);
        let mut summary = BuildRunSummary {
            generated_at,
            events_rendered: 0,
            files_written: Vec::new(),
            failed_events: Vec::new(),
        };
        let mut summaries = Vec::new();

        for event in &events {
            match self.write_event(&renderer, event) {
                Ok((pages, event_summary)) => {
                    summary.events_rendered += 1;
                    summary.files_written.extend(pages);
                    summaries.push(event_summary);
                }
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(event_id = %event.event_id, %error, "event failed");
                    summary.failed_events.push(FailedEvent {
                        event_id: event.event_id.clone(),
                        error,
                    });
                }
            }
        }

        sort_summaries(&mut summaries);
        let index_html = renderer.index_page(&summaries)?;
        summary
            .files_written
            .push(self.store.write_page(INDEX_FILE_NAME, &index_html)?);

        info!(
            rendered = summary.events_rendered,
            failed = summary.failed_events.len(),
            files = summary.files_written.len(),
            "build complete"
        );
        Ok(summary)
    }

    pub fn run_event(&self, event_id: &str) -> Result<BuildRunSummary> {
        self.run_event_at(event_id, Local::now().naive_local())
    }

    /// One requested event's two pages; the index is left alone.
    pub fn run_event_at(
        &self,
        event_id: &str,
        generated_at: NaiveDateTime,
    ) -> Result<BuildRunSummary> {
        let event = self.event(event_id)?;
        let renderer = SiteRenderer::new(&self.template, &self.site.belts, generated_at);
        let (files_written, _) = self.write_event(&renderer, &event)?;
        Ok(BuildRunSummary {
            generated_at,
            events_rendered: 1,
            files_written,
            failed_events: Vec::new(),
        })
    }

    fn write_event(
        &self,
        renderer: &SiteRenderer<'_>,
        event: &Event,
    ) -> Result<(Vec<StoredPage>, EventSummary)> {
        let span = info_span!("render_event", event_id = %event.event_id);
        let _guard = span.enter();

        let leaderboard = match self.leaderboards.load(&event.event_id)? {
            Some(records) => Leaderboard::from_records(&records),
            None => Leaderboard::default(),
        };
        let logo = self.logos.find(&event.event_id);
        if logo.is_none() {
            debug!("no logo found; using heading");
        }

        let pages = renderer
            .render_event(event, &leaderboard, logo.as_deref())
            .with_context(|| format!("rendering event {}", event.event_id))?;
        let PageLinks { picks, live } = &pages.links;
        let written = vec![
            self.store.write_page(picks, &pages.picks_html)?,
            self.store.write_page(live, &pages.live_html)?,
        ];
        info!(
            matches = event.matches.len(),
            standings = leaderboard.rows().len(),
            "wrote event pages"
        );
        Ok((written, pages.summary))
    }
}

pub fn run_build_from_env() -> Result<BuildRunSummary> {
    let config = BuildConfig::from_env();
    let pipeline = BuildPipeline::new(config).context("preparing build")?;
    pipeline.run_all()
}
