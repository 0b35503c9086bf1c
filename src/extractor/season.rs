//! Season listing extraction.
//!
//! Season pages link each game as `showgame.php?game_id=<id>`; the season
//! index links each season as `showseason.php?season=<id>`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

use super::{ExtractError, ExtractResult};

static GAME_LINK_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="showgame.php?game_id="]"#).expect("valid selector")
});
static SEASON_LINK_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="showseason.php?season="]"#).expect("valid selector")
});
static GAME_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"game_id=(\d+)").expect("valid regex"));
static SEASON_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"season=([A-Za-z0-9]+)").expect("valid regex"));

/// Extract game ids from a season page, in document order, deduplicated.
pub fn extract_game_ids(bytes: &[u8]) -> ExtractResult<Vec<u32>> {
    let html = std::str::from_utf8(bytes).map_err(|e| ExtractError::Utf8Error(e.to_string()))?;
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for link in doc.select(&GAME_LINK_SEL) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(caps) = GAME_ID_RE.captures(href) {
            if let Ok(id) = caps[1].parse::<u32>() {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
        }
    }
    Ok(ids)
}

/// Extract season ids from the season index page, in document order,
/// deduplicated.
pub fn extract_season_ids(bytes: &[u8]) -> ExtractResult<Vec<String>> {
    let html = std::str::from_utf8(bytes).map_err(|e| ExtractError::Utf8Error(e.to_string()))?;
    let doc = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for link in doc.select(&SEASON_LINK_SEL) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(caps) = SEASON_ID_RE.captures(href) {
            let id = caps[1].to_string();
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }
    Ok(ids)
}
