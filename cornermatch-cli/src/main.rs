use clap::Parser;
use cornermatch::io::load_gray_image;
use cornermatch::{selected_backend, Corner, CornerMatcher, Correspondence, MatchConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Corner matching CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct MatchConfigJson {
    match_sz: u8,
    search_radius: usize,
    min_score: f64,
    mutual: bool,
    parallel: bool,
}

impl Default for MatchConfigJson {
    fn default() -> Self {
        let cfg = MatchConfig::default();
        Self {
            match_sz: cfg.match_sz,
            search_radius: cfg.search_radius,
            min_score: cfg.min_score,
            mutual: cfg.mutual,
            parallel: cfg.parallel,
        }
    }
}

impl From<MatchConfigJson> for MatchConfig {
    fn from(value: MatchConfigJson) -> Self {
        Self {
            match_sz: value.match_sz,
            search_radius: value.search_radius,
            min_score: value.min_score,
            mutual: value.mutual,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct Config {
    frame_a_path: String,
    frame_b_path: String,
    corners_a_path: String,
    corners_b_path: String,
    output_path: Option<String>,
    #[serde(rename = "match")]
    match_cfg: MatchConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_a_path: String::new(),
            frame_b_path: String::new(),
            corners_a_path: String::new(),
            corners_b_path: String::new(),
            output_path: None,
            match_cfg: MatchConfigJson::default(),
        }
    }
}

fn example_config() -> Config {
    Config {
        frame_a_path: "frame_a.png".into(),
        frame_b_path: "frame_b.png".into(),
        corners_a_path: "corners_a.json".into(),
        corners_b_path: "corners_b.json".into(),
        output_path: Some("correspondences.json".into()),
        match_cfg: MatchConfigJson::default(),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
struct CornerRecord {
    x: usize,
    y: usize,
}

#[derive(Debug, Serialize)]
struct CorrespondenceRecord {
    ax: usize,
    ay: usize,
    bx: usize,
    by: usize,
    score: f64,
}

impl From<Correspondence> for CorrespondenceRecord {
    fn from(value: Correspondence) -> Self {
        Self {
            ax: value.a.x,
            ay: value.a.y,
            bx: value.b.x,
            by: value.b.y,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    backend: String,
    matched: usize,
    correspondences: Vec<CorrespondenceRecord>,
}

fn load_corners(path: &str) -> Result<Vec<Corner>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let records: Vec<CornerRecord> = serde_json::from_str(&text)?;
    Ok(records.into_iter().map(|c| Corner::new(c.x, c.y)).collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("cornermatch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{}", serde_json::to_string_pretty(&example_config())?);
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frame_a_path.is_empty() || config.frame_b_path.is_empty() {
        return Err("frame_a_path and frame_b_path must be set in the config".into());
    }
    if config.corners_a_path.is_empty() || config.corners_b_path.is_empty() {
        return Err("corners_a_path and corners_b_path must be set in the config".into());
    }

    let frame_a = load_gray_image(&config.frame_a_path)?;
    let frame_b = load_gray_image(&config.frame_b_path)?;
    let corners_a = load_corners(&config.corners_a_path)?;
    let corners_b = load_corners(&config.corners_b_path)?;

    let matcher = CornerMatcher::new(config.match_cfg.into())?;
    let matches = matcher.match_corners(frame_a.view(), &corners_a, frame_b.view(), &corners_b);

    tracing::info!(
        backend = ?selected_backend(),
        corners_a = corners_a.len(),
        corners_b = corners_b.len(),
        matched = matches.len(),
        "corner matching complete"
    );

    let output = Output {
        backend: format!("{:?}", selected_backend()),
        matched: matches.len(),
        correspondences: matches.into_iter().map(CorrespondenceRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
