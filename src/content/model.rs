use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identity of a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A catalogue/data source, keyed by its canonical key (e.g. `bbc.co.uk`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Publisher(String);

impl Publisher {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Publisher {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One transmission of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub transmission_start: DateTime<Utc>,
    pub transmission_end: DateTime<Utc>,
}

impl Broadcast {
    pub fn new(transmission_start: DateTime<Utc>, transmission_end: DateTime<Utc>) -> Self {
        Self {
            transmission_start,
            transmission_end,
        }
    }
}

/// Structural type of a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentKind {
    Item,
    Episode,
    Film,
    Song,
    Brand,
    Series {
        #[serde(default)]
        parent: Option<ContentId>,
    },
}

impl ContentKind {
    pub fn is_container(&self) -> bool {
        matches!(self, ContentKind::Brand | ContentKind::Series { .. })
    }
}

/// Position of a piece of content in the item -> series -> brand hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hierarchy {
    Item,
    /// A brand, or a series with no parent brand.
    TopLevelContainer,
    /// A series that belongs to a brand.
    NonTopLevelContainer,
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Hierarchy::Item => "item",
            Hierarchy::TopLevelContainer => "top_level_container",
            Hierarchy::NonTopLevelContainer => "non_top_level_container",
        };
        f.write_str(label)
    }
}

/// What the decision pipeline needs to know about a candidate or subject.
pub trait EquivalenceContent: Clone + Send + Sync + 'static {
    fn id(&self) -> &ContentId;

    fn publisher(&self) -> &Publisher;

    fn kind(&self) -> &ContentKind;

    fn broadcasts(&self) -> &[Broadcast];

    /// Container (brand or series) an item belongs to, if any.
    fn container(&self) -> Option<&ContentId>;

    fn is_container(&self) -> bool {
        self.kind().is_container()
    }

    fn hierarchy(&self) -> Hierarchy {
        match self.kind() {
            ContentKind::Brand | ContentKind::Series { parent: None } => {
                Hierarchy::TopLevelContainer
            }
            ContentKind::Series { parent: Some(_) } => Hierarchy::NonTopLevelContainer,
            _ => Hierarchy::Item,
        }
    }
}

/// Plain catalogue record used by the binary driver and tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub publisher: Publisher,
    pub kind: ContentKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub broadcasts: Vec<Broadcast>,
    #[serde(default)]
    pub container: Option<ContentId>,
}

impl Content {
    pub fn new(id: impl Into<String>, publisher: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: ContentId::new(id),
            publisher: Publisher::new(publisher),
            kind,
            title: None,
            broadcasts: Vec::new(),
            container: None,
        }
    }

    pub fn item(id: impl Into<String>, publisher: impl Into<String>) -> Self {
        Self::new(id, publisher, ContentKind::Item)
    }

    pub fn brand(id: impl Into<String>, publisher: impl Into<String>) -> Self {
        Self::new(id, publisher, ContentKind::Brand)
    }

    pub fn series(
        id: impl Into<String>,
        publisher: impl Into<String>,
        parent: Option<ContentId>,
    ) -> Self {
        Self::new(id, publisher, ContentKind::Series { parent })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_broadcast(mut self, broadcast: Broadcast) -> Self {
        self.broadcasts.push(broadcast);
        self
    }

    pub fn with_container(mut self, container: ContentId) -> Self {
        self.container = Some(container);
        self
    }
}

impl EquivalenceContent for Content {
    fn id(&self) -> &ContentId {
        &self.id
    }

    fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    fn kind(&self) -> &ContentKind {
        &self.kind
    }

    fn broadcasts(&self) -> &[Broadcast] {
        &self.broadcasts
    }

    fn container(&self) -> Option<&ContentId> {
        self.container.as_ref()
    }
}
