use serde::{Deserialize, Serialize};

use crate::api::client::QueryParams;

/// Status values accepted by `GET /character?status=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Alive,
    Dead,
    Unknown,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Alive => "alive",
            StatusFilter::Dead => "dead",
            StatusFilter::Unknown => "unknown",
        }
    }
}

/// Gender values accepted by `GET /character?gender=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderFilter {
    Female,
    Male,
    Genderless,
    Unknown,
}

impl GenderFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenderFilter::Female => "female",
            GenderFilter::Male => "male",
            GenderFilter::Genderless => "genderless",
            GenderFilter::Unknown => "unknown",
        }
    }
}

/// Query parameters for the character list.
///
/// Values are normalized on the way in: blank strings become absent and
/// page numbers below 1 are dropped, so two filter sets that would send the
/// same query compare equal and hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterFilters {
    name: Option<String>,
    status: Option<StatusFilter>,
    species: Option<String>,
    kind: Option<String>,
    gender: Option<GenderFilter>,
    page: Option<u32>,
}

fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl CharacterFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = normalize(name);
        self
    }

    pub fn with_status(mut self, status: Option<StatusFilter>) -> Self {
        self.status = status;
        self
    }

    pub fn with_species(mut self, species: &str) -> Self {
        self.species = normalize(species);
        self
    }

    pub fn with_type(mut self, kind: &str) -> Self {
        self.kind = normalize(kind);
        self
    }

    pub fn with_gender(mut self, gender: Option<GenderFilter>) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = (page >= 1).then_some(page);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn status(&self) -> Option<StatusFilter> {
        self.status
    }

    pub fn species(&self) -> Option<&str> {
        self.species.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn gender(&self) -> Option<GenderFilter> {
        self.gender
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Query string pairs; absent filters are omitted entirely.
    pub fn query_params(&self) -> QueryParams {
        let mut params = Vec::new();
        if let Some(ref name) = self.name {
            params.push(("name", name.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(ref species) = self.species {
            params.push(("species", species.clone()));
        }
        if let Some(ref kind) = self.kind {
            params.push(("type", kind.clone()));
        }
        if let Some(gender) = self.gender {
            params.push(("gender", gender.as_str().to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params
    }
}
