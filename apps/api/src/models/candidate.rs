use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{null_as_default, StoredEmbedding};
use crate::embedding::text::compose_candidate_text;
use crate::store::Document;

/// Candidate skills arrive either as a flat list or grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Skills {
    List(Vec<String>),
    Categorized(BTreeMap<String, Vec<String>>),
}

impl Default for Skills {
    fn default() -> Self {
        Skills::List(Vec::new())
    }
}

impl Skills {
    /// All skill names, category order first, then item order. Names are
    /// trimmed and blank ones dropped.
    pub fn flatten(&self) -> Vec<&str> {
        let items: Box<dyn Iterator<Item = &String>> = match self {
            Skills::List(list) => Box::new(list.iter()),
            Skills::Categorized(groups) => Box::new(groups.values().flatten()),
        };
        items
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn to_set(&self) -> HashSet<&str> {
        self.flatten().into_iter().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Work history: free text, a single position, or a list of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Experience {
    Summary(String),
    Positions(Vec<Position>),
    Position(Position),
}

impl Experience {
    pub fn positions(&self) -> &[Position] {
        match self {
            Experience::Summary(_) => &[],
            Experience::Positions(list) => list,
            Experience::Position(single) => std::slice::from_ref(single),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Education {
    Summary(String),
    Entries(Vec<Qualification>),
    Entry(Qualification),
}

impl Education {
    pub fn entries(&self) -> &[Qualification] {
        match self {
            Education::Summary(_) => &[],
            Education::Entries(list) => list,
            Education::Entry(single) => std::slice::from_ref(single),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    /// Opaque reference to the owning account; never interpreted here.
    #[serde(default)]
    pub owner_id: Option<serde_json::Value>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Skills,
    #[serde(default)]
    pub experience: Option<Experience>,
    #[serde(default)]
    pub education: Option<Education>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(flatten)]
    pub embedding: StoredEmbedding,
}

impl Candidate {
    pub const TEXT_FIELDS: &'static [&'static str] = &[
        "headline",
        "summary",
        "skills",
        "experience",
        "education",
        "location",
    ];

    pub fn from_document(document: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(document.data.clone())
    }

    pub fn searchable_text(&self) -> String {
        compose_candidate_text(self)
    }
}
