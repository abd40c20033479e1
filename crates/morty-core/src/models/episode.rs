use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: i64,
    pub name: String,
    /// Free-form air date, e.g. "December 2, 2013".
    pub air_date: String,
    /// Season/episode code, e.g. "S01E01".
    pub episode: String,
    #[serde(default)]
    pub characters: Vec<String>,
    pub url: String,
    pub created: DateTime<Utc>,
}

/// Digits immediately following the first `marker` in `code` that is
/// followed by at least one digit.
fn number_after(code: &str, marker: char) -> Option<u32> {
    for (i, c) in code.char_indices() {
        if c != marker {
            continue;
        }
        let digits: String = code[i + c.len_utf8()..]
            .chars()
            .take_while(|d| d.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
    }
    None
}

impl Episode {
    /// Season number parsed from the code ("S02E03" → 2).
    pub fn season(&self) -> Option<u32> {
        number_after(&self.episode, 'S')
    }

    /// Episode number within the season ("S02E03" → 3).
    pub fn number(&self) -> Option<u32> {
        number_after(&self.episode, 'E')
    }
}

/// Season heading. Episodes whose code carries no season sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeasonLabel {
    Number(u32),
    Unknown,
}

impl std::fmt::Display for SeasonLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonLabel::Number(n) => write!(f, "{}", n),
            SeasonLabel::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Season<'a> {
    pub label: SeasonLabel,
    pub episodes: Vec<&'a Episode>,
}

/// Group episodes by season, seasons ascending and episodes ascending by
/// their number within the season (missing numbers sort as 0).
pub fn group_by_season(episodes: &[Episode]) -> Vec<Season<'_>> {
    let mut groups: BTreeMap<SeasonLabel, Vec<&Episode>> = BTreeMap::new();
    for episode in episodes {
        let label = episode
            .season()
            .map(SeasonLabel::Number)
            .unwrap_or(SeasonLabel::Unknown);
        groups.entry(label).or_default().push(episode);
    }

    groups
        .into_iter()
        .map(|(label, mut episodes)| {
            episodes.sort_by_key(|e| e.number().unwrap_or(0));
            Season { label, episodes }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn episode(id: i64, code: &str) -> Episode {
        Episode {
            id,
            name: format!("Episode {}", id),
            air_date: "December 2, 2013".to_string(),
            episode: code.to_string(),
            characters: vec!["https://rickandmortyapi.com/api/character/1".to_string()],
            url: format!("https://rickandmortyapi.com/api/episode/{}", id),
            created: "2017-11-10T12:56:33.798Z".parse().expect("valid timestamp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::episode;
    use super::*;

    #[test]
    fn test_parse_episode() {
        let json = r#"{
            "id": 28,
            "name": "The Ricklantis Mixup",
            "air_date": "September 10, 2017",
            "episode": "S03E07",
            "characters": ["https://rickandmortyapi.com/api/character/1"],
            "url": "https://rickandmortyapi.com/api/episode/28",
            "created": "2017-11-10T12:56:36.618Z"
        }"#;
        let e: Episode = serde_json::from_str(json).expect("valid episode JSON");
        assert_eq!(e.id, 28);
        assert_eq!(e.season(), Some(3));
        assert_eq!(e.number(), Some(7));
    }

    #[test]
    fn test_season_and_number_parsing() {
        assert_eq!(episode(1, "S01E01").season(), Some(1));
        assert_eq!(episode(1, "S10E12").number(), Some(12));
        assert_eq!(episode(1, "Special").season(), None);
        assert_eq!(episode(1, "Special").number(), None);
    }

    #[test]
    fn test_group_by_season_sorts_seasons_and_episodes() {
        let episodes = vec![
            episode(13, "S02E02"),
            episode(2, "S01E02"),
            episode(90, "Pilot"),
            episode(12, "S02E01"),
            episode(1, "S01E01"),
            episode(22, "S10E01"),
        ];

        let seasons = group_by_season(&episodes);
        let labels: Vec<SeasonLabel> = seasons.iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec![
                SeasonLabel::Number(1),
                SeasonLabel::Number(2),
                SeasonLabel::Number(10),
                SeasonLabel::Unknown,
            ]
        );

        let season_two: Vec<i64> = seasons[1].episodes.iter().map(|e| e.id).collect();
        assert_eq!(season_two, vec![12, 13]);
        assert_eq!(seasons[3].label.to_string(), "Unknown");
    }

    #[test]
    fn test_group_by_season_empty() {
        assert!(group_by_season(&[]).is_empty());
    }
}
