//! HTML rendering for Ringside picks, live-tracker and index pages.

use askama::Template;
use chrono::{NaiveDate, NaiveDateTime};
use ringside_core::{BeltImages, Event, Leaderboard, Match, MatchStatus, ResultFlag};
use thiserror::Error;

pub const INDEX_FILE_NAME: &str = "index.html";
pub const INDEX_TITLE: &str = "Event Pages";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("rendering template: {0}")]
    Template(#[from] askama::Error),
}

/// Escape a scalar placeholder value with askama's HTML escaper.
fn escape(text: &str) -> Result<String, RenderError> {
    Ok(askama::filters::escape(askama::Html, text)?.to_string())
}

/* ---------------- page template ---------------- */

/// Values for the page template's placeholders. Every value must already be HTML-safe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageValues {
    pub page_title: String,
    pub event_header: String,
    pub event_id_plain: String,
    pub event_name_plain: String,
    pub event_name: String,
    pub start_time: String,
    pub event_date: String,
    pub country: String,
    pub location: String,
    pub venue: String,
    pub last_updated: String,
    pub match_sections: String,
}

impl PageValues {
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "page_title" => &self.page_title,
            "event_header" => &self.event_header,
            "event_id_plain" => &self.event_id_plain,
            "event_name_plain" => &self.event_name_plain,
            "event_name" => &self.event_name,
            "start_time" => &self.start_time,
            "event_date" => &self.event_date,
            "country" => &self.country,
            "location" => &self.location,
            "venue" => &self.venue,
            "last_updated" => &self.last_updated,
            "match_sections" => &self.match_sections,
            _ => return None,
        };
        Some(value)
    }
}

/// Page body with `$name` / `${name}` placeholders. `$$` is a literal dollar sign;
/// unknown names and stray `$` are left as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    body: String,
}

fn identifier_len(text: &str) -> usize {
    let mut len = 0;
    for (i, c) in text.char_indices() {
        let ok = c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit());
        if !ok {
            break;
        }
        len = i + c.len_utf8();
    }
    len
}

impl PageTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn substitute(&self, values: &PageValues) -> String {
        let mut out = String::with_capacity(self.body.len() + values.match_sections.len());
        let mut rest = self.body.as_str();

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(tail) = after.strip_prefix('$') {
                out.push('$');
                rest = tail;
                continue;
            }

            if let Some(inner) = after.strip_prefix('{') {
                let len = identifier_len(inner);
                if len > 0 && inner[len..].starts_with('}') {
                    let name = &inner[..len];
                    match values.get(name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str("${");
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &inner[len + 1..];
                    continue;
                }
                out.push('$');
                rest = after;
                continue;
            }

            let len = identifier_len(after);
            if len > 0 {
                let name = &after[..len];
                match values.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('$');
                        out.push_str(name);
                    }
                }
                rest = &after[len..];
                continue;
            }

            out.push('$');
            rest = after;
        }

        out.push_str(rest);
        out
    }
}

/* ---------------- links ---------------- */

/// Output file names of an event's two pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub picks: String,
    pub live: String,
}

impl PageLinks {
    pub fn for_event(event: &Event) -> Self {
        let stem = event.file_stem();
        Self {
            picks: format!("{stem}.html"),
            live: format!("{stem}_live.html"),
        }
    }
}

/* ---------------- view models ---------------- */

#[derive(Debug, Clone)]
struct WrestlerCardView {
    name: String,
    css_class: &'static str,
    champion: bool,
    belt_src: String,
    odds_text: String,
    odds_data: String,
    odds_known: bool,
    has_result: bool,
    result_label: &'static str,
    result_class: &'static str,
}

#[derive(Debug, Clone)]
struct MatchSectionView {
    name: String,
    status: &'static str,
    status_class: &'static str,
    cards: Vec<WrestlerCardView>,
}

fn match_section_view(m: &Match, belts: &BeltImages) -> MatchSectionView {
    let cards = m
        .entries
        .iter()
        .map(|entry| {
            let (has_result, result_label, result_class) = match entry.result {
                ResultFlag::Win => (true, "Winner", "result-win"),
                ResultFlag::Loss => (true, "Lost", "result-loss"),
                ResultFlag::Unknown => (false, "", ""),
            };
            WrestlerCardView {
                name: entry.name.clone(),
                css_class: if entry.champion { "wrestler champion" } else { "wrestler" },
                champion: entry.champion,
                belt_src: belts.image_for(&m.name).to_string(),
                odds_text: entry.odds_display(),
                odds_data: entry.odds.map(|o| o.to_string()).unwrap_or_default(),
                odds_known: entry.odds.is_some(),
                has_result,
                result_label,
                result_class,
            }
        })
        .collect();
    let status = m.status();
    MatchSectionView {
        name: m.name.clone(),
        status: status.label(),
        status_class: match status {
            MatchStatus::Pending => "pending",
            MatchStatus::Final => "final",
        },
        cards,
    }
}

#[derive(Debug, Clone)]
struct LeaderboardRowView {
    player: String,
    score: i64,
    wins: i64,
    losses: i64,
    pending_wager: i64,
    max_possible_points: i64,
    max_output: i64,
    leading: bool,
}

#[derive(Template)]
#[template(path = "event_header.html")]
struct EventHeaderTemplate<'a> {
    name: &'a str,
    logo: &'a str,
    has_logo: bool,
}

#[derive(Template)]
#[template(path = "match_sections.html")]
struct MatchSectionsTemplate<'a> {
    sections: &'a [MatchSectionView],
    live: bool,
}

#[derive(Template)]
#[template(path = "tracker_panel.html")]
struct TrackerPanelTemplate<'a> {
    picks_href: &'a str,
    live_href: &'a str,
    status: &'a str,
    status_class: &'a str,
    completed: usize,
    total: usize,
    rows: Vec<LeaderboardRowView>,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    events: &'a [EventSummary],
    generated_at: &'a str,
}

/* ---------------- renderer ---------------- */

/// Index entry for one rendered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub event_id: String,
    pub name: String,
    pub date: String,
    pub location: String,
    pub links: PageLinks,
    pub sort_key: NaiveDate,
}

impl EventSummary {
    pub fn from_event(event: &Event) -> Self {
        Self {
            event_id: event.event_id.clone(),
            name: event.name.clone(),
            date: event.formatted_date(),
            location: event.location.clone(),
            links: PageLinks::for_event(event),
            sort_key: event.date_sort_key(),
        }
    }
}

/// Most recent first; events on the same date keep their order.
pub fn sort_summaries(summaries: &mut [EventSummary]) {
    summaries.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
}

#[derive(Debug, Clone)]
pub struct EventPages {
    pub links: PageLinks,
    pub picks_html: String,
    pub live_html: String,
    pub summary: EventSummary,
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%B %-d, %Y %-I:%M %p").to_string()
}

/// Renders pages for a whole site run with shared template, belt table and timestamp.
pub struct SiteRenderer<'a> {
    template: &'a PageTemplate,
    belts: &'a BeltImages,
    last_updated: String,
}

impl<'a> SiteRenderer<'a> {
    pub fn new(
        template: &'a PageTemplate,
        belts: &'a BeltImages,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            template,
            belts,
            last_updated: format_timestamp(generated_at),
        }
    }

    pub fn last_updated(&self) -> &str {
        &self.last_updated
    }

    fn page_values(
        &self,
        event: &Event,
        logo: Option<&str>,
        title: &str,
        match_sections: String,
    ) -> Result<PageValues, RenderError> {
        let event_header = EventHeaderTemplate {
            name: &event.name,
            logo: logo.unwrap_or_default(),
            has_logo: logo.is_some(),
        }
        .render()?;
        Ok(PageValues {
            page_title: escape(title)?,
            event_header,
            event_id_plain: escape(&event.event_id)?,
            event_name_plain: escape(&event.name)?,
            event_name: escape(&event.name)?,
            start_time: escape(&event.formatted_start_time())?,
            event_date: escape(&event.formatted_date())?,
            country: escape(&event.country)?,
            location: escape(&event.location)?,
            venue: escape(&event.venue)?,
            last_updated: escape(&self.last_updated)?,
            match_sections,
        })
    }

    fn match_sections(&self, event: &Event, live: bool) -> Result<String, RenderError> {
        let sections: Vec<MatchSectionView> = event
            .matches
            .iter()
            .map(|m| match_section_view(m, self.belts))
            .collect();
        Ok(MatchSectionsTemplate {
            sections: &sections,
            live,
        }
        .render()?)
    }

    pub fn picks_page(&self, event: &Event, logo: Option<&str>) -> Result<String, RenderError> {
        let sections = self.match_sections(event, false)?;
        let title = format!("{} ({})", event.name, event.event_id);
        let values = self.page_values(event, logo, &title, sections)?;
        Ok(self.template.substitute(&values))
    }

    pub fn live_page(
        &self,
        event: &Event,
        leaderboard: &Leaderboard,
        logo: Option<&str>,
    ) -> Result<String, RenderError> {
        let links = PageLinks::for_event(event);
        let progress = event.progress();
        let leading_score = leaderboard.leading_score();
        let rows = leaderboard
            .rows()
            .iter()
            .map(|row| LeaderboardRowView {
                player: row.player.clone(),
                score: row.score,
                wins: row.wins,
                losses: row.losses,
                pending_wager: row.pending_wager,
                max_possible_points: row.max_possible_points,
                max_output: row.max_output(),
                leading: leading_score == Some(row.score),
            })
            .collect();
        let status_class = progress.status.label().to_lowercase();
        let panel = TrackerPanelTemplate {
            picks_href: &links.picks,
            live_href: &links.live,
            status: progress.status.label(),
            status_class: &status_class,
            completed: progress.completed,
            total: progress.total,
            rows,
        }
        .render()?;
        let sections = self.match_sections(event, true)?;

        let title = format!("{} ({}) Live Tracker", event.name, event.event_id);
        let values = self.page_values(event, logo, &title, format!("{panel}\n{sections}"))?;
        Ok(self.template.substitute(&values))
    }

    pub fn render_event(
        &self,
        event: &Event,
        leaderboard: &Leaderboard,
        logo: Option<&str>,
    ) -> Result<EventPages, RenderError> {
        Ok(EventPages {
            links: PageLinks::for_event(event),
            picks_html: self.picks_page(event, logo)?,
            live_html: self.live_page(event, leaderboard, logo)?,
            summary: EventSummary::from_event(event),
        })
    }

    /// `summaries` are rendered in the given order; see [`sort_summaries`].
    pub fn index_page(&self, summaries: &[EventSummary]) -> Result<String, RenderError> {
        Ok(IndexTemplate {
            title: INDEX_TITLE,
            events: summaries,
            generated_at: &self.last_updated,
        }
        .render()?)
    }
}
