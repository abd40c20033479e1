//! Data models for the Rick and Morty API.
//!
//! - `Character`, `Location`: character records and their embedded locations
//! - `Episode`, `Season`: episode records and season grouping
//! - `PageInfo`, `CharactersPage`: paginated list responses
//! - `CharacterFilters`: query parameters for the character list

pub mod character;
pub mod episode;
pub mod filters;

pub use character::{CharacterStatus, Character, CharactersPage, Gender, Location, PageInfo};
pub use episode::{group_by_season, Episode, Season, SeasonLabel};
pub use filters::{CharacterFilters, GenderFilter, StatusFilter};
