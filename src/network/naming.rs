/// Hands out default names for nodes and networks created without one.
///
/// Each factory keeps its own counters, so two factories never influence
/// each other's numbering.
#[derive(Debug, Default)]
pub struct NameFactory {
    node_count: usize,
    net_count: usize,
}

impl NameFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Node1`, `Node2`, ...
    pub fn next_node_name(&mut self) -> String {
        self.node_count += 1;
        format!("Node{}", self.node_count)
    }

    /// `Net1`, `Net2`, ...
    pub fn next_net_name(&mut self) -> String {
        self.net_count += 1;
        format!("Net{}", self.net_count)
    }

    /// Returns `name` when given and non-empty, otherwise the next node name.
    pub fn node_name(&mut self, name: Option<&str>) -> String {
        match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.next_node_name(),
        }
    }

    /// Returns `title` when given and non-empty, otherwise the next net name.
    pub fn net_title(&mut self, title: Option<&str>) -> String {
        match title {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.next_net_name(),
        }
    }
}
