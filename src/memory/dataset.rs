use std::fmt;

pub const SHARED_LINK_PREFIX: &str = "shared:";
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Identity,
    Project,
    Session,
    Task,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Identity, Layer::Project, Layer::Session, Layer::Task];

    pub fn label(self) -> &'static str {
        match self {
            Self::Identity => "IDENTITY",
            Self::Project => "PROJECT",
            Self::Session => "SESSION",
            Self::Task => "TASK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|layer| layer.label().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawMemoryNode {
    pub id: String,
    pub layer: Layer,
    pub raw_text: String,
    pub extraction_summary: Option<String>,
    pub importance: f32,
    pub source: String,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntity {
    pub name: String,
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    pub link_type: String,
    pub confidence: f32,
}

impl RawEdge {
    /// Entity name for `shared:<name>` co-mention edges.
    pub fn shared_entity(&self) -> Option<&str> {
        self.link_type.strip_prefix(SHARED_LINK_PREFIX)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawDataset {
    pub nodes: Vec<RawMemoryNode>,
    pub edges: Vec<RawEdge>,
    pub entities: Vec<RawEntity>,
}

impl RawDataset {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn entity_id(&self, name: &str) -> Option<&str> {
        self.entities
            .iter()
            .filter(|entity| entity.name == name)
            .find_map(|entity| entity.id.as_deref())
    }

    /// Keeps the first `limit` memories. Edges and entities pass through; the
    /// graph builder drops edges whose endpoints are gone.
    pub fn truncate_nodes(&mut self, limit: usize) {
        self.nodes.truncate(limit);
    }
}
