use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use ringside_build::{BuildConfig, BuildPipeline};
use tempfile::tempdir;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_config(out_dir: &Path) -> BuildConfig {
    let root = workspace_root();
    BuildConfig {
        data_csv: root.join("fixtures/events.csv"),
        template: root.join("templates/page.html"),
        out_dir: out_dir.to_path_buf(),
        assets_dir: root.join("fixtures"),
        leaderboard_dir: root.join("fixtures/leaderboards"),
        config_path: root.join("ringside.yaml"),
    }
}

fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(21, 5, 0)
        .unwrap()
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap_or_else(|e| panic!("reading {name}: {e}"))
}

#[test]
fn batch_run_writes_every_event_and_the_index() {
    let out = tempdir().unwrap();
    let pipeline = BuildPipeline::new(fixture_config(out.path())).unwrap();

    assert_eq!(pipeline.list_event_ids().unwrap(), vec!["EC2026", "WM42", "TBA1"]);

    let summary = pipeline.run_all_at(generated_at()).unwrap();
    assert_eq!(summary.events_rendered, 3);
    assert!(summary.failed_events.is_empty());
    assert_eq!(summary.files_written.len(), 7);
    for name in [
        "EC2026.html",
        "EC2026_live.html",
        "WM42.html",
        "WM42_live.html",
        "TBA1.html",
        "TBA1_live.html",
        "index.html",
    ] {
        assert!(out.path().join(name).is_file(), "{name} missing");
    }

    let index = read(out.path(), "index.html");
    let wm = index.find("WM42.html").unwrap();
    let ec = index.find("EC2026.html").unwrap();
    let tba = index.find("TBA1.html").unwrap();
    assert!(wm < ec && ec < tba, "index should list newest events first");
    assert!(index.contains("Generated March 1, 2026 9:05 PM"));
}

#[test]
fn picks_page_uses_logo_odds_and_champion_belts() {
    let out = tempdir().unwrap();
    let pipeline = BuildPipeline::new(fixture_config(out.path())).unwrap();
    pipeline.run_all_at(generated_at()).unwrap();

    let ec = read(out.path(), "EC2026.html");
    assert!(ec.contains("<title>Elimination Chamber (EC2026)</title>"));
    assert!(ec.contains(r#"src="assets/logos/ec2026.png""#));
    assert!(ec.contains("Saturday, February 28th, 2026 &middot; 7:00pm EST"));
    assert!(ec.contains("Rogers Centre, Toronto, ON, Canada"));
    assert!(ec.contains(r#"src="assets/belts/womens_ic.png""#));
    assert!(ec.contains("Odds: +200"));
    assert!(ec.contains(r#"placeholder="TBD" disabled"#));
    assert!(ec.contains("Last updated March 1, 2026 9:05 PM"));
    assert!(!ec.contains("$match_sections"));

    let wm = read(out.path(), "WM42.html");
    assert!(wm.contains("<h1>WrestleMania 42</h1>"));
    assert!(wm.contains(r#"src="assets/belts/world_heavyweight.png""#));

    let tba = read(out.path(), "TBA1.html");
    assert!(tba.contains("<title>Saturday Night&#x27;s Main Event (TBA1)</title>"));
    assert!(tba.contains("TBD &middot; Unknown"));
    assert!(tba.contains("Odds: TBD"));
}

#[test]
fn live_page_ranks_clamped_standings() {
    let out = tempdir().unwrap();
    let pipeline = BuildPipeline::new(fixture_config(out.path())).unwrap();
    pipeline.run_all_at(generated_at()).unwrap();

    let live = read(out.path(), "EC2026_live.html");
    assert!(live.contains("<title>Elimination Chamber (EC2026) Live Tracker</title>"));
    assert!(live.contains("1 / 2 matches completed"));
    assert!(live.contains(r#"<span class="status-label">Live</span>"#));
    assert!(live.contains(r#"<span class="result-pill result-win">Winner</span>"#));
    assert_eq!(live.matches(r#"<tr class="leader">"#).count(), 2);

    let order: Vec<usize> = ["jordan", "alex", "sam", "riley"]
        .iter()
        .map(|p| live.find(&format!("<td>{p}</td>")).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
    assert!(!live.contains("<td>-40</td>"));
    assert!(live.contains("<td>195</td>"));

    let wm_live = read(out.path(), "WM42_live.html");
    assert!(wm_live.contains("No leaderboard data yet."));
    assert!(wm_live.contains("0 / 1 matches completed"));
    assert!(wm_live.contains(r#"<span class="status-label">Pending</span>"#));
}

#[test]
fn single_event_run_matches_case_insensitively_and_skips_index() {
    let out = tempdir().unwrap();
    let pipeline = BuildPipeline::new(fixture_config(out.path())).unwrap();

    let event = pipeline.event(" ec2026 ").unwrap();
    assert_eq!(
        event.match_names(),
        vec!["Women's Intercontinental Championship", "Men's Elimination Chamber"]
    );

    let summary = pipeline.run_event_at("ec2026", generated_at()).unwrap();
    assert_eq!(summary.files_written.len(), 2);
    assert!(out.path().join("EC2026.html").is_file());
    assert!(out.path().join("EC2026_live.html").is_file());
    assert!(!out.path().join("index.html").exists());
}

#[test]
fn unknown_event_fails_without_writing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("site");
    let pipeline = BuildPipeline::new(fixture_config(&out)).unwrap();

    let err = pipeline.run_event_at("NOPE", generated_at()).unwrap_err();
    assert!(format!("{err:#}").contains("no rows found for EventID 'NOPE'"));
    assert!(!out.exists());
}

#[test]
fn missing_columns_are_all_reported() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("events.csv");
    fs::write(
        &data,
        "EventID,Event,Date,Country,Location,Venue,Match,Wrestler\n\
         EC2026,EC,2/28/2026,CA,Toronto,Arena,Main,Cody\n",
    )
    .unwrap();
    let mut config = fixture_config(&dir.path().join("site"));
    config.data_csv = data;

    let err = BuildPipeline::new(config).err().expect("missing columns rejected");
    let message = format!("{err:#}");
    assert!(message.contains("missing required CSV columns for: start_time, champion, odds"));
}

#[test]
fn header_only_dataset_is_empty() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("events.csv");
    fs::write(&data, "EventID,Event,Odds\n").unwrap();
    let mut config = fixture_config(&dir.path().join("site"));
    config.data_csv = data;

    let err = BuildPipeline::new(config).err().expect("empty dataset rejected");
    assert!(format!("{err:#}").contains("CSV file is empty"));
}

#[test]
fn failing_event_does_not_block_the_rest() {
    let dir = tempdir().unwrap();
    let boards = dir.path().join("boards");
    fs::create_dir_all(&boards).unwrap();
    fs::write(boards.join("WM42.csv"), [0xff_u8, 0xfe, 0x00]).unwrap();

    let out = dir.path().join("site");
    let mut config = fixture_config(&out);
    config.leaderboard_dir = boards;
    let pipeline = BuildPipeline::new(config).unwrap();

    let summary = pipeline.run_all_at(generated_at()).unwrap();
    assert_eq!(summary.events_rendered, 2);
    assert_eq!(summary.failed_events.len(), 1);
    assert_eq!(summary.failed_events[0].event_id, "WM42");
    assert!(!out.join("WM42.html").exists());

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert!(index.contains("EC2026.html"));
    assert!(!index.contains("WM42.html"));
}

fn write_dataset(dir: &Path, rows: &[&str]) -> PathBuf {
    let path = dir.join("events.csv");
    let mut text = String::from(
        "EventID,Event,Date,StartTime,Country,Location,Venue,Match,Wrestler,CurrentChamp,Odds\n",
    );
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn case_variants_of_an_event_id_are_built_once() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("site");
    let mut config = fixture_config(&out);
    config.data_csv = write_dataset(
        dir.path(),
        &[
            "EC2026,Elimination Chamber,2/28/2026,19:00,Canada,Toronto,Arena,Main,Cody,N,+150",
            "ec2026,Elimination Chamber,2/28/2026,19:00,Canada,Toronto,Arena,Main,Drew,N,-150",
        ],
    );
    let pipeline = BuildPipeline::new(config).unwrap();
    assert_eq!(pipeline.list_event_ids().unwrap(), vec!["EC2026", "ec2026"]);

    let summary = pipeline.run_all_at(generated_at()).unwrap();
    assert_eq!(summary.events_rendered, 1);
    let names: Vec<_> = summary
        .files_written
        .iter()
        .map(|p| p.relative_path.display().to_string())
        .collect();
    assert_eq!(names, vec!["EC2026.html", "EC2026_live.html", "index.html"]);

    let index = fs::read_to_string(out.join("index.html")).unwrap();
    assert_eq!(index.matches(r#"href="EC2026.html""#).count(), 1);
    let picks = fs::read_to_string(out.join("EC2026.html")).unwrap();
    assert!(picks.contains("Cody") && picks.contains("Drew"));
}

#[test]
fn blank_event_id_selects_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("site");
    let mut config = fixture_config(&out);
    config.data_csv = write_dataset(
        dir.path(),
        &[
            "EC2026,Elimination Chamber,2/28/2026,19:00,Canada,Toronto,Arena,Main,Cody,N,+150",
            ",Unlisted Show,,,,,,Dark Match,Nobody,N,",
        ],
    );
    let pipeline = BuildPipeline::new(config).unwrap();

    for blank in ["", "  "] {
        let err = pipeline.run_event_at(blank, generated_at()).unwrap_err();
        assert!(format!("{err:#}").contains("no rows found for EventID ''"));
    }
    assert!(!out.exists());
}
