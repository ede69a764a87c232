//! Core event model, header resolution and value normalization for Ringside.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const UNKNOWN_EVENT: &str = "Unknown Event";
pub const UNKNOWN_MATCH: &str = "Unknown Match";
pub const UNKNOWN_WRESTLER: &str = "Unknown Wrestler";
pub const UNKNOWN_TIME: &str = "Unknown";
pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const ODDS_TBD: &str = "TBD";

pub const DEFAULT_BELT_IMAGE: &str = "assets/belts/default.png";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("missing required CSV columns for: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("CSV file is empty")]
    EmptyDataset,
    #[error("no EventID values found")]
    NoEventIds,
    #[error("no rows found for EventID '{0}'")]
    NoRowsForEventId(String),
}

/// One raw dataset row: header text mapped to cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    cells: BTreeMap<String, String>,
}

impl Record {
    pub fn new(cells: BTreeMap<String, String>) -> Self {
        Self { cells }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.cells.contains_key(header)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Cell text for `header`, or empty when the row has no such cell.
    pub fn text(&self, header: &str) -> &str {
        self.get(header).unwrap_or_default()
    }
}

/// Semantic columns of the event dataset, independent of the literal header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    EventId,
    Event,
    Date,
    StartTime,
    Country,
    Location,
    Venue,
    Match,
    Wrestler,
    Champion,
    Odds,
    Result,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::EventId,
        CanonicalField::Event,
        CanonicalField::Date,
        CanonicalField::StartTime,
        CanonicalField::Country,
        CanonicalField::Location,
        CanonicalField::Venue,
        CanonicalField::Match,
        CanonicalField::Wrestler,
        CanonicalField::Champion,
        CanonicalField::Odds,
        CanonicalField::Result,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::EventId => "event_id",
            CanonicalField::Event => "event",
            CanonicalField::Date => "date",
            CanonicalField::StartTime => "start_time",
            CanonicalField::Country => "country",
            CanonicalField::Location => "location",
            CanonicalField::Venue => "venue",
            CanonicalField::Match => "match",
            CanonicalField::Wrestler => "wrestler",
            CanonicalField::Champion => "champion",
            CanonicalField::Odds => "odds",
            CanonicalField::Result => "result",
        }
    }

    pub fn is_required(self) -> bool {
        self != CanonicalField::Result
    }

    fn default_synonyms(self) -> &'static [&'static str] {
        match self {
            CanonicalField::EventId => &["EventID"],
            CanonicalField::Event => &["Event"],
            CanonicalField::Date => &["Date"],
            CanonicalField::StartTime => &["StartTime", "Start Time"],
            CanonicalField::Country => &["Country"],
            CanonicalField::Location => &["Location"],
            CanonicalField::Venue => &["Venue"],
            CanonicalField::Match => &["Match"],
            CanonicalField::Wrestler => &["Wrestler"],
            CanonicalField::Champion => &["CurrentChamp", "Current Champ (Y/N)"],
            CanonicalField::Odds => &["Odds"],
            CanonicalField::Result => &["Result"],
        }
    }
}

/// Ordered header-name synonyms per canonical field. First match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSynonyms {
    by_field: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for HeaderSynonyms {
    fn default() -> Self {
        Self {
            by_field: CanonicalField::ALL
                .iter()
                .map(|field| {
                    (
                        *field,
                        field
                            .default_synonyms()
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

impl HeaderSynonyms {
    /// Replace the synonym list of every field named in `overrides`.
    pub fn with_overrides(mut self, overrides: BTreeMap<CanonicalField, Vec<String>>) -> Self {
        for (field, names) in overrides {
            self.by_field.insert(field, names);
        }
        self
    }

    pub fn synonyms(&self, field: CanonicalField) -> &[String] {
        self.by_field
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// First candidate header present in `sample`, skipping blank candidates.
pub fn pick_first_key(sample: &Record, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .filter(|c| !c.is_empty())
        .find(|c| sample.has_header(c))
        .cloned()
}

/// Resolved header name per canonical field for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldKeys {
    pub event_id: String,
    pub event: String,
    pub date: String,
    pub start_time: String,
    pub country: String,
    pub location: String,
    pub venue: String,
    pub match_name: String,
    pub wrestler: String,
    pub champion: String,
    pub odds: String,
    pub result: Option<String>,
}

impl FieldKeys {
    /// Resolve against the header shape of `sample`. Reports every missing required field.
    pub fn resolve(sample: &Record, synonyms: &HeaderSynonyms) -> Result<Self, PipelineError> {
        let mut resolved = BTreeMap::new();
        let mut missing = Vec::new();
        for field in CanonicalField::ALL {
            match pick_first_key(sample, synonyms.synonyms(field)) {
                Some(header) => {
                    resolved.insert(field, header);
                }
                None if field.is_required() => missing.push(field.key().to_string()),
                None => {}
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns(missing));
        }

        let result = resolved.remove(&CanonicalField::Result);
        let mut take = |field: CanonicalField| resolved.remove(&field).unwrap_or_default();
        Ok(Self {
            event_id: take(CanonicalField::EventId),
            event: take(CanonicalField::Event),
            date: take(CanonicalField::Date),
            start_time: take(CanonicalField::StartTime),
            country: take(CanonicalField::Country),
            location: take(CanonicalField::Location),
            venue: take(CanonicalField::Venue),
            match_name: take(CanonicalField::Match),
            wrestler: take(CanonicalField::Wrestler),
            champion: take(CanonicalField::Champion),
            odds: take(CanonicalField::Odds),
            result,
        })
    }

    /// Resolve from the first record of a dataset.
    pub fn from_records(
        records: &[Record],
        synonyms: &HeaderSynonyms,
    ) -> Result<Self, PipelineError> {
        let sample = records.first().ok_or(PipelineError::EmptyDataset)?;
        Self::resolve(sample, synonyms)
    }

    pub fn extract(&self, record: &Record) -> EventRow {
        EventRow {
            event_id: record.text(&self.event_id).to_string(),
            event: record.text(&self.event).to_string(),
            date: record.text(&self.date).to_string(),
            start_time: record.text(&self.start_time).to_string(),
            country: record.text(&self.country).to_string(),
            location: record.text(&self.location).to_string(),
            venue: record.text(&self.venue).to_string(),
            match_name: record.text(&self.match_name).to_string(),
            wrestler: record.text(&self.wrestler).to_string(),
            champion: record.text(&self.champion).to_string(),
            odds: record.text(&self.odds).to_string(),
            result: self
                .result
                .as_deref()
                .map(|key| record.text(key).to_string())
                .unwrap_or_default(),
        }
    }
}

/// A record projected onto the canonical fields. Cell text is kept raw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRow {
    pub event_id: String,
    pub event: String,
    pub date: String,
    pub start_time: String,
    pub country: String,
    pub location: String,
    pub venue: String,
    pub match_name: String,
    pub wrestler: String,
    pub champion: String,
    pub odds: String,
    pub result: String,
}

/* ---------------- value normalizers ---------------- */

/// Trimmed, lowercased text for comparisons.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn text_or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn is_current_champion(value: &str) -> bool {
    matches!(normalize(value).as_str(), "y" | "yes" | "true" | "1")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultFlag {
    Win,
    Loss,
    #[default]
    Unknown,
}

impl ResultFlag {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "W" => ResultFlag::Win,
            "L" => ResultFlag::Loss,
            _ => ResultFlag::Unknown,
        }
    }
}

/// American odds such as `150`, `+150` or `-200`. Blank or malformed text is unknown.
pub fn parse_american_odds(text: &str) -> Option<i64> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

pub fn format_odds(odds: Option<i64>) -> String {
    match odds {
        None => ODDS_TBD.to_string(),
        Some(value) if value > 0 => format!("+{value}"),
        Some(value) => value.to_string(),
    }
}

/// `HH:MM` (24-hour) to `h:mmam EST`. Text that does not look like a time is returned as-is.
pub fn format_start_time(text: &str) -> String {
    let raw = text.trim();
    if raw.is_empty() {
        return UNKNOWN_TIME.to_string();
    }

    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() < 2 {
        return raw.to_string();
    }

    let (Ok(hour_24), Ok(minute)) = (
        parts[0].trim().parse::<i64>(),
        parts[1].trim().parse::<i64>(),
    ) else {
        return raw.to_string();
    };

    let suffix = if hour_24 < 12 { "am" } else { "pm" };
    let hour_12 = match hour_24.rem_euclid(12) {
        0 => 12,
        h => h,
    };
    format!("{hour_12}:{minute:02}{suffix} EST")
}

pub fn day_ordinal(day: u32) -> String {
    let suffix = if (11..=13).contains(&(day % 100)) {
        "th"
    } else {
        match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{day}{suffix}")
}

// (format, digits required after the last '/')
const DATE_FORMATS: [(&str, Option<usize>); 3] = [
    ("%m/%d/%Y", Some(4)),
    ("%m/%d/%y", Some(2)),
    ("%Y-%m-%d", None),
];

/// Tries `m/d/yyyy`, `m/d/yy`, then ISO `yyyy-mm-dd`.
pub fn parse_event_date(text: &str) -> Option<NaiveDate> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }
    let slash_year_digits = raw.rsplit_once('/').map(|(_, year)| year.len());
    DATE_FORMATS
        .iter()
        .filter(|(_, digits)| digits.is_none() || *digits == slash_year_digits)
        .find_map(|(fmt, _)| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// `2/28/2026` to `Saturday, February 28th, 2026`.
pub fn format_event_date(text: &str) -> String {
    let raw = text.trim();
    if raw.is_empty() {
        return UNKNOWN_DATE.to_string();
    }
    match parse_event_date(raw) {
        Some(date) => format!(
            "{}, {} {}, {}",
            date.format("%A"),
            date.format("%B"),
            day_ordinal(date.day()),
            date.year()
        ),
        None => raw.to_string(),
    }
}

/// Unparseable dates rank as the oldest possible date.
pub fn date_sort_key(text: &str) -> NaiveDate {
    parse_event_date(text).unwrap_or(NaiveDate::MIN)
}

pub fn sanitize_file_stem(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/* ---------------- belt table ---------------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeltImages {
    #[serde(default = "default_belt_image")]
    pub default: String,
    #[serde(default)]
    pub by_match: BTreeMap<String, String>,
}

fn default_belt_image() -> String {
    DEFAULT_BELT_IMAGE.to_string()
}

impl Default for BeltImages {
    fn default() -> Self {
        let by_match = [
            ("World Heavyweight Championship", "assets/belts/world_heavyweight.png"),
            ("Women's Intercontinental Championship", "assets/belts/womens_ic.png"),
            ("Women's Intercontinental Champion", "assets/belts/womens_ic.png"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            default: default_belt_image(),
            by_match,
        }
    }
}

impl BeltImages {
    pub fn image_for(&self, match_name: &str) -> &str {
        self.by_match
            .get(match_name.trim())
            .filter(|path| !path.is_empty())
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

/* ---------------- event model ---------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrestlerEntry {
    pub name: String,
    pub odds_text: String,
    pub odds: Option<i64>,
    pub champion: bool,
    pub result: ResultFlag,
}

impl WrestlerEntry {
    pub fn from_row(row: &EventRow) -> Self {
        Self {
            name: text_or_default(&row.wrestler, UNKNOWN_WRESTLER),
            odds_text: row.odds.clone(),
            odds: parse_american_odds(&row.odds),
            champion: is_current_champion(&row.champion),
            result: ResultFlag::parse(&row.result),
        }
    }

    pub fn odds_display(&self) -> String {
        format_odds(self.odds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Pending,
    Final,
}

impl MatchStatus {
    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::Pending => "Pending",
            MatchStatus::Final => "Final",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Pending,
    Live,
    Final,
}

impl EventStatus {
    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Pending => "Pending",
            EventStatus::Live => "Live",
            EventStatus::Final => "Final",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub name: String,
    pub entries: Vec<WrestlerEntry>,
}

impl Match {
    pub fn status(&self) -> MatchStatus {
        if self.entries.iter().any(|e| e.result == ResultFlag::Win) {
            MatchStatus::Final
        } else {
            MatchStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventProgress {
    pub completed: usize,
    pub total: usize,
    pub status: EventStatus,
}

pub fn event_progress(matches: &[Match]) -> EventProgress {
    let total = matches.len();
    let completed = matches
        .iter()
        .filter(|m| m.status() == MatchStatus::Final)
        .count();
    let status = if completed == 0 {
        EventStatus::Pending
    } else if completed == total {
        EventStatus::Final
    } else {
        EventStatus::Live
    };
    EventProgress {
        completed,
        total,
        status,
    }
}

/// Group rows by trimmed match name, keeping first-seen order of matches and of rows.
pub fn group_matches(rows: &[EventRow]) -> Vec<Match> {
    let mut matches: Vec<Match> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let name = text_or_default(&row.match_name, UNKNOWN_MATCH);
        let slot = *index.entry(name.clone()).or_insert_with(|| {
            matches.push(Match {
                name,
                entries: Vec::new(),
            });
            matches.len() - 1
        });
        matches[slot].entries.push(WrestlerEntry::from_row(row));
    }
    matches
}

/// One event; descriptive fields come from its first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_id: String,
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub country: String,
    pub location: String,
    pub venue: String,
    pub matches: Vec<Match>,
}

impl Event {
    /// `None` when `rows` is empty.
    pub fn from_rows(rows: &[EventRow]) -> Option<Self> {
        let first = rows.first()?;
        Some(Self {
            event_id: first.event_id.trim().to_string(),
            name: text_or_default(&first.event, UNKNOWN_EVENT),
            date: first.date.trim().to_string(),
            start_time: first.start_time.trim().to_string(),
            country: first.country.trim().to_string(),
            location: first.location.trim().to_string(),
            venue: first.venue.trim().to_string(),
            matches: group_matches(rows),
        })
    }

    pub fn formatted_date(&self) -> String {
        format_event_date(&self.date)
    }

    pub fn formatted_start_time(&self) -> String {
        format_start_time(&self.start_time)
    }

    pub fn date_sort_key(&self) -> NaiveDate {
        date_sort_key(&self.date)
    }

    pub fn file_stem(&self) -> String {
        sanitize_file_stem(&self.event_id)
    }

    pub fn match_names(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn progress(&self) -> EventProgress {
        event_progress(&self.matches)
    }
}

/* ---------------- dataset selection ---------------- */

/// Distinct trimmed EventIDs in first-appearance order. Distinctness is case-sensitive.
pub fn event_ids(records: &[Record], keys: &FieldKeys) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        let event_id = record.text(&keys.event_id).trim();
        if !event_id.is_empty() && seen.insert(event_id) {
            out.push(event_id.to_string());
        }
    }
    out
}

pub fn available_event_ids(
    records: &[Record],
    keys: &FieldKeys,
) -> Result<Vec<String>, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    let ids = event_ids(records, keys);
    if ids.is_empty() {
        return Err(PipelineError::NoEventIds);
    }
    Ok(ids)
}

/// Rows whose EventID matches `event_id` after trimming and lowercasing both sides.
/// A blank `event_id` never matches.
pub fn select_event_rows(
    records: &[Record],
    keys: &FieldKeys,
    event_id: &str,
) -> Result<Vec<EventRow>, PipelineError> {
    let target = normalize(event_id);
    if target.is_empty() {
        return Err(PipelineError::NoRowsForEventId(String::new()));
    }
    let rows: Vec<EventRow> = records
        .iter()
        .filter(|record| normalize(record.text(&keys.event_id)) == target)
        .map(|record| keys.extract(record))
        .collect();
    if rows.is_empty() {
        return Err(PipelineError::NoRowsForEventId(event_id.trim().to_string()));
    }
    Ok(rows)
}

pub fn build_event(
    records: &[Record],
    keys: &FieldKeys,
    event_id: &str,
) -> Result<Event, PipelineError> {
    let rows = select_event_rows(records, keys, event_id)?;
    Event::from_rows(&rows)
        .ok_or_else(|| PipelineError::NoRowsForEventId(event_id.trim().to_string()))
}

/* ---------------- leaderboard ---------------- */

const PLAYER_HEADERS: &[&str] = &["Player"];
const SCORE_HEADERS: &[&str] = &["Score", "Net"];
const PENDING_WAGER_HEADERS: &[&str] = &["PendingWager"];
const MAX_POSSIBLE_HEADERS: &[&str] = &["MaxPossiblePoints"];
const WINS_HEADERS: &[&str] = &["Wins"];
const LOSSES_HEADERS: &[&str] = &["Losses"];

fn first_present<'a>(record: &'a Record, headers: &[&str]) -> &'a str {
    headers
        .iter()
        .find_map(|h| record.get(h))
        .unwrap_or_default()
}

/// Decimal text truncated to an integer; blank or malformed text is 0.
pub fn parse_points(text: &str) -> i64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

/// Leaderboard standing. Numeric fields are clamped to zero at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub player: String,
    pub score: i64,
    pub pending_wager: i64,
    pub max_possible_points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl LeaderboardRow {
    pub fn from_record(record: &Record) -> Option<Self> {
        let player = first_present(record, PLAYER_HEADERS).trim();
        if player.is_empty() {
            return None;
        }
        let points = |headers: &[&str]| parse_points(first_present(record, headers)).max(0);
        Some(Self {
            player: player.to_string(),
            score: points(SCORE_HEADERS),
            pending_wager: points(PENDING_WAGER_HEADERS),
            max_possible_points: points(MAX_POSSIBLE_HEADERS),
            wins: points(WINS_HEADERS),
            losses: points(LOSSES_HEADERS),
        })
    }

    pub fn max_output(&self) -> i64 {
        self.score.saturating_add(self.max_possible_points)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    rows: Vec<LeaderboardRow>,
}

impl Leaderboard {
    /// Drops rows without a player and ranks by score, descending, keeping ties in source order.
    pub fn from_records(records: &[Record]) -> Self {
        let mut rows: Vec<LeaderboardRow> = records
            .iter()
            .filter_map(LeaderboardRow::from_record)
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        Self { rows }
    }

    pub fn rows(&self) -> &[LeaderboardRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn leading_score(&self) -> Option<i64> {
        self.rows.iter().map(|r| r.score).max()
    }

    pub fn is_leading(&self, row: &LeaderboardRow) -> bool {
        self.leading_score() == Some(row.score)
    }
}
