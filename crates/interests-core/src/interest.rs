use std::fmt;

use serde::{Deserialize, Serialize};

/// A content category a visitor can declare interest in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interest(String);

impl Interest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Interest {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Interest {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Categories offered during onboarding
pub const DEFAULT_INTEREST_CATALOG: &[&str] = &[
    "Спорт",
    "Музыка",
    "Искусство",
    "Технологии",
    "Путешествия",
    "Кулинария",
    "Чтение",
    "Фотография",
    "Наука",
    "Фильмы",
];

pub fn default_catalog() -> Vec<Interest> {
    DEFAULT_INTEREST_CATALOG
        .iter()
        .copied()
        .map(Interest::from)
        .collect()
}

/// Ordered set of selected interests, in the order they were picked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestSelection(Vec<Interest>);

impl InterestSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, interest: &Interest) -> bool {
        self.0.contains(interest)
    }

    /// Select `interest` if not selected, deselect it otherwise
    ///
    /// Returns whether it is selected afterwards.
    pub fn toggle(&mut self, interest: Interest) -> bool {
        if let Some(pos) = self.0.iter().position(|i| *i == interest) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(interest);
            true
        }
    }

    pub fn as_slice(&self) -> &[Interest] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Interest>> for InterestSelection {
    fn from(mut value: Vec<Interest>) -> Self {
        let mut seen = Vec::with_capacity(value.len());
        value.retain(|i| {
            if seen.contains(i) {
                false
            } else {
                seen.push(i.clone());
                true
            }
        });
        Self(value)
    }
}
