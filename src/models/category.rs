//! Statistic categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// One of the three published statistic tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Units,
    Traits,
    Augments,
}

impl Category {
    /// Publication order.
    pub const ALL: [Category; 3] = [Category::Units, Category::Traits, Category::Augments];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Units => "units",
            Category::Traits => "traits",
            Category::Augments => "augments",
        }
    }

    /// File name of the published document.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Category of a published document file name.
    pub fn from_file_name(name: &str) -> Option<Category> {
        name.strip_suffix(".json")?.parse().ok()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}
