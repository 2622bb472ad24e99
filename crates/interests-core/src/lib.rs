pub mod interest;
pub mod item;
pub mod page;
pub mod vote;

use std::{cmp, convert, fmt, hash, str};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use self::interest::{Interest, InterestSelection};
pub use self::item::FeedItem;
pub use self::page::{DEFAULT_PAGE_SIZE, FeedPage};
pub use self::vote::{VoteColor, VoteKind, VoteRecord};

/// Anonymous, self-assigned token identifying one visitor profile
///
/// Not a credential. It is only used to correlate requests to the
/// recommendation service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    /// Generate a fresh random (UUID v4) identity
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VisitorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for VisitorId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a [`FeedItem`], as assigned by the recommendation service
///
/// The service may send either JSON strings or integers. Both are
/// normalized to the same textual form for comparisons and storage, but
/// the original JSON shape is remembered, so the id can be echoed back
/// in the same form it arrived in.
#[derive(Clone, Debug)]
pub struct ItemId {
    text: String,
    numeric: bool,
}

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The id as it should appear in a request body
    pub fn to_wire(&self) -> serde_json::Value {
        if self.numeric {
            if let Ok(n) = self.text.parse::<u64>() {
                return serde_json::Value::from(n);
            }
        }
        serde_json::Value::from(self.text.clone())
    }
}

impl From<String> for ItemId {
    fn from(text: String) -> Self {
        Self {
            text,
            numeric: false,
        }
    }
}

impl From<&str> for ItemId {
    fn from(text: &str) -> Self {
        Self::from(text.to_owned())
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        Self {
            text: n.to_string(),
            numeric: true,
        }
    }
}

/// Parses typed-in ids: canonical decimal numbers become numeric ids,
/// anything else is kept as text
impl str::FromStr for ItemId {
    type Err = convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = !s.starts_with('0') || s == "0";
        Ok(match s.parse::<u64>() {
            Ok(n) if canonical && !s.starts_with('+') => Self::from(n),
            _ => Self::from(s),
        })
    }
}

impl PartialEq for ItemId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for ItemId {}

impl hash::Hash for ItemId {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.text.cmp(&other.text)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for ItemId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ItemIdVisitor;

        impl Visitor<'_> for ItemIdVisitor {
            type Value = ItemId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or non-negative integer item id")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ItemId::from(v))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ItemId::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(ItemId::from(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(v)
                    .map(ItemId::from)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }
        }

        d.deserialize_any(ItemIdVisitor)
    }
}
