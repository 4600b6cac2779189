//! Season and episode grouping for series cards.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Item;

static EPISODE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"s(?P<season>[0-9]{1,2})e(?P<episode>[0-9]{1,2})")
        .expect("episode marker regex should compile")
});

/// Parse `SxxEyy` (any case) into `(season, episode)`.
pub fn parse_marker(marker: &str) -> Option<(u32, u32)> {
    let lowered = marker.to_lowercase();
    let caps = EPISODE_MARKER.captures(&lowered)?;
    let season = caps.name("season")?.as_str().parse().ok()?;
    let episode = caps.name("episode")?.as_str().parse().ok()?;
    Some((season, episode))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub number: u32,
    pub item: Arc<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Season {
    pub number: u32,
    pub name: String,
    pub episodes: Vec<Episode>,
}

/// Group items by season (ascending), episodes ascending within a season.
/// Items without a parsable marker are left out.
pub fn group_seasons(items: &[Arc<Item>]) -> Vec<Season> {
    let mut seasons: BTreeMap<u32, Vec<Episode>> = BTreeMap::new();
    for item in items {
        let Some((season, number)) = item.episode().and_then(parse_marker) else {
            tracing::debug!(id = %item.id, "no episode marker, left out of season listing");
            continue;
        };
        seasons.entry(season).or_default().push(Episode {
            number,
            item: item.clone(),
        });
    }
    seasons
        .into_iter()
        .map(|(number, mut episodes)| {
            episodes.sort_by_key(|e| e.number);
            Season {
                number,
                name: format!("Season {}", number),
                episodes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(id: &str, marker: &str) -> Arc<Item> {
        Arc::new(Item::new(id, id).with_meta("episode", marker))
    }

    #[test]
    fn parse_marker_any_case() {
        assert_eq!(parse_marker("S01E02"), Some((1, 2)));
        assert_eq!(parse_marker("s10e7"), Some((10, 7)));
        assert_eq!(parse_marker("Show.S2E13.1080p"), Some((2, 13)));
    }

    #[test]
    fn parse_marker_rejects_other_text() {
        assert_eq!(parse_marker("Episode 4"), None);
        assert_eq!(parse_marker(""), None);
    }

    #[test]
    fn seasons_and_episodes_ascending() {
        let items = vec![
            episode("c", "S02E01"),
            episode("b", "S01E03"),
            episode("a", "S01E01"),
            episode("junk", "special"),
        ];
        let seasons = group_seasons(&items);
        assert_eq!(seasons.len(), 2);
        assert_eq!(seasons[0].name, "Season 1");
        let numbers: Vec<u32> = seasons[0].episodes.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(seasons[1].number, 2);
        assert_eq!(seasons[1].episodes[0].item.id, "c");
    }
}
