use std::collections::BTreeMap;
use std::{fmt, str};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::ItemId;

/// A visitor's reaction to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
        }
    }

    /// Color of this kind's button when it is the selected vote
    pub fn selected_color(self) -> VoteColor {
        match self {
            VoteKind::Like => VoteColor::Affirmative,
            VoteKind::Dislike => VoteColor::Negative,
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown vote kind: {value}"))]
pub struct VoteKindParseError {
    value: String,
}

impl str::FromStr for VoteKind {
    type Err = VoteKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteKind::Like),
            "dislike" => Ok(VoteKind::Dislike),
            _ => VoteKindParseSnafu { value: s }.fail(),
        }
    }
}

/// Display color of a vote button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteColor {
    Affirmative,
    Negative,
    Neutral,
}

impl VoteColor {
    pub fn css_name(self) -> &'static str {
        match self {
            VoteColor::Affirmative => "green",
            VoteColor::Negative => "red",
            VoteColor::Neutral => "gray",
        }
    }
}

/// Votes cast by the visitor, at most one per item
///
/// Serializes as a plain JSON object keyed by item id, e.g.
/// `{"17":"like","a1":"dislike"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteRecord(BTreeMap<ItemId, VoteKind>);

impl VoteRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of `self` with `item_id` mapped to `kind`, replacing any
    /// previous vote on the same item
    #[must_use]
    pub fn with_vote(&self, item_id: ItemId, kind: VoteKind) -> Self {
        let mut votes = self.0.clone();
        votes.insert(item_id, kind);
        Self(votes)
    }

    pub fn get(&self, item_id: &ItemId) -> Option<VoteKind> {
        self.0.get(item_id).copied()
    }

    /// Color of the `button` vote button for `item_id`
    ///
    /// Only the button matching the stored vote is colored.
    pub fn color(&self, item_id: &ItemId, button: VoteKind) -> VoteColor {
        match self.get(item_id) {
            Some(kind) if kind == button => kind.selected_color(),
            _ => VoteColor::Neutral,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, VoteKind)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }
}
