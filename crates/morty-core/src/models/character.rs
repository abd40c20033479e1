use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Life status as reported by the API. Unrecognized values map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterStatus {
    Alive,
    Dead,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl std::fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CharacterStatus::Alive => write!(f, "Alive"),
            CharacterStatus::Dead => write!(f, "Dead"),
            CharacterStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Female => write!(f, "Female"),
            Gender::Male => write!(f, "Male"),
            Gender::Genderless => write!(f, "Genderless"),
            Gender::Unknown => write!(f, "unknown"),
        }
    }
}

/// Location reference embedded in a character. `url` is empty for
/// locations the API does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub gender: Gender,
    pub origin: Location,
    pub location: Location,
    pub image: String,
    /// Episode URLs in airing order.
    #[serde(default)]
    pub episode: Vec<String>,
    pub url: String,
    pub created: DateTime<Utc>,
}

impl Character {
    pub fn episode_count(&self) -> usize {
        self.episode.len()
    }

    /// "Alive - Human", the one-line summary shown under the name.
    pub fn status_line(&self) -> String {
        format!("{} - {}", self.status, self.species)
    }
}

/// Pagination block returned with every list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageInfo {
    pub count: u32,
    pub pages: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        self.prev.is_some()
    }
}

/// Response of `GET /character`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CharactersPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

impl CharactersPage {
    pub fn find(&self, id: i64) -> Option<&Character> {
        self.results.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A character shaped like the API's record for Rick Sanchez.
    pub fn character(id: i64, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            status: CharacterStatus::Alive,
            species: "Human".to_string(),
            kind: String::new(),
            gender: Gender::Male,
            origin: Location {
                name: "Earth (C-137)".to_string(),
                url: "https://rickandmortyapi.com/api/location/1".to_string(),
            },
            location: Location {
                name: "Citadel of Ricks".to_string(),
                url: "https://rickandmortyapi.com/api/location/3".to_string(),
            },
            image: format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", id),
            episode: vec![
                "https://rickandmortyapi.com/api/episode/1".to_string(),
                "https://rickandmortyapi.com/api/episode/2".to_string(),
            ],
            url: format!("https://rickandmortyapi.com/api/character/{}", id),
            created: "2017-11-04T18:48:46.250Z".parse().expect("valid timestamp"),
        }
    }
}
