//! Game page extraction.
//!
//! The archive's game pages are table soup: two `table.round` boards, one
//! `table.final_round`, a `#contestants_table`, and metadata spread over
//! the `<title>` and `<h6>` elements. Selectors and patterns below mirror
//! that structure.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::{Clue, Contestant, GameRecord, Round, RoundKind};

use super::{ExtractError, ExtractResult, GameExtractor};

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static H6_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h6").expect("valid selector"));
static BOARD_ROUND_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.round").expect("valid selector"));
static FINAL_ROUND_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.final_round").expect("valid selector"));
static CATEGORY_NAME_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.category td.category_name").expect("valid selector"));
static CLUE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.clue").expect("valid selector"));
static CLUE_VALUE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.clue_value").expect("valid selector"));
static CLUE_ORDER_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.clue_order_number").expect("valid selector"));
static CLUE_TEXT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.clue_text").expect("valid selector"));
static CORRECT_RESPONSE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.clue_text em.correct_response").expect("valid selector"));
static CORRECT_CONTESTANT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td.clue_text table td.right").expect("valid selector"));
static CONTESTANT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#contestants_table p.contestants").expect("valid selector"));
static CONTESTANT_LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("valid selector"));

static SHOW_NUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Show #(\d+)").expect("valid regex"));
static AIR_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"aired (\d{4}-\d{2}-\d{2})").expect("valid regex"));
static TAPE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Game tape date: (\d{4}-\d{2}-\d{2})").expect("valid regex"));
static CLUE_POSITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"clue_((?:J|DJ|FJ)(?:_\d+_\d+)?)").expect("valid regex"));
static PLAYER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"player_id=(\d+)").expect("valid regex"));

/// Extractor for archive game pages.
#[derive(Debug, Default, Clone)]
pub struct HtmlGameExtractor;

impl HtmlGameExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }
}

impl GameExtractor for HtmlGameExtractor {
    fn parse(&self, season_id: &str, game_id: u32, bytes: &[u8]) -> ExtractResult<GameRecord> {
        let html = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::Utf8Error(e.to_string()))?;
        let doc = Html::parse_document(html);

        let title = doc
            .select(&TITLE_SEL)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();

        let show_num = SHOW_NUM_RE
            .captures(&title)
            .and_then(|c| c[1].parse::<u32>().ok());
        let air_date = AIR_DATE_RE
            .captures(&title)
            .and_then(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok());

        let tape_date = doc.select(&H6_SEL).find_map(|h6| {
            let text = h6.text().collect::<String>();
            TAPE_DATE_RE
                .captures(&text)
                .and_then(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
        });

        let mut rounds = Vec::new();
        for (index, table) in doc.select(&BOARD_ROUND_SEL).enumerate() {
            let kind = if index == 0 {
                RoundKind::Single
            } else {
                RoundKind::Double
            };
            rounds.push(parse_round(table, kind));
        }
        if let Some(table) = doc.select(&FINAL_ROUND_SEL).next() {
            rounds.push(parse_round(table, RoundKind::Final));
        }

        let contestants = doc.select(&CONTESTANT_SEL).map(parse_contestant).collect();

        if show_num.is_none() && rounds.is_empty() {
            return Err(ExtractError::MissingContent(format!(
                "game {game_id}: no show number and no round tables"
            )));
        }

        let record = GameRecord {
            game_id,
            season_id: season_id.to_string(),
            show_num,
            air_date,
            tape_date,
            rounds,
            contestants,
        };
        record.validate().map_err(ExtractError::InvalidRecord)?;

        debug!(
            season = season_id,
            game_id,
            rounds = record.rounds.len(),
            contestants = record.contestants.len(),
            "Parsed game"
        );
        Ok(record)
    }
}

fn parse_round(table: ElementRef<'_>, kind: RoundKind) -> Round {
    let categories = table
        .select(&CATEGORY_NAME_SEL)
        .map(|c| c.text().collect::<String>().trim().to_string())
        .collect();

    let clues = table.select(&CLUE_SEL).map(parse_clue).collect();

    Round {
        kind,
        categories,
        clues,
    }
}

fn parse_clue(cell: ElementRef<'_>) -> Clue {
    let inner = cell.inner_html();
    let position = CLUE_POSITION_RE
        .captures(&inner)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let value = cell
        .select(&CLUE_VALUE_SEL)
        .next()
        .map(|v| v.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let order_number = cell
        .select(&CLUE_ORDER_SEL)
        .next()
        .and_then(|o| o.text().collect::<String>().trim().parse::<u32>().ok());

    let text = cell
        .select(&CLUE_TEXT_SEL)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let correct_response = cell
        .select(&CORRECT_RESPONSE_SEL)
        .next()
        .map(|r| r.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let correct_contestant = cell
        .select(&CORRECT_CONTESTANT_SEL)
        .next()
        .map(|r| r.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    Clue {
        position,
        value,
        order_number,
        text,
        correct_response,
        correct_contestant,
    }
}

fn parse_contestant(p: ElementRef<'_>) -> Contestant {
    let name = p
        .select(&CONTESTANT_LINK_SEL)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let nickname = name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();
    let player_id = PLAYER_ID_RE
        .captures(&p.inner_html())
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    // Everything in the paragraph that is not the linked name is bio text
    let bio = p
        .text()
        .filter(|t| !t.contains(name.as_str()) || name.is_empty())
        .collect::<String>()
        .trim_start_matches(", ")
        .trim()
        .to_string();

    Contestant {
        player_id,
        name,
        nickname,
        bio,
    }
}
