//! Merchant / budget categories. Fixed allow-list shared by merchants, budget
//! limits and cashback rule matching. Cashback rules may additionally use the
//! wildcard category "any", which is not a merchant category and therefore not
//! part of this enum.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    Groceries,
    Cafe,
    Restaurant,
    Transport,
    Entertainment,
    Shopping,
    Utilities,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Groceries,
        Category::Cafe,
        Category::Restaurant,
        Category::Transport,
        Category::Entertainment,
        Category::Shopping,
        Category::Utilities,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Groceries => "groceries",
            Category::Cafe => "cafe",
            Category::Restaurant => "restaurant",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Utilities => "utilities",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groceries" => Some(Category::Groceries),
            "cafe" => Some(Category::Cafe),
            "restaurant" => Some(Category::Restaurant),
            "transport" => Some(Category::Transport),
            "entertainment" => Some(Category::Entertainment),
            "shopping" => Some(Category::Shopping),
            "utilities" => Some(Category::Utilities),
            "health" => Some(Category::Health),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
