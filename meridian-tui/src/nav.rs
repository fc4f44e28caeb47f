//! Navigation and view switching utilities.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Graph,
    Timeline,
    Agents,
    Citations,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Graph => "Graph",
            View::Timeline => "Timeline",
            View::Agents => "Agents",
            View::Citations => "Citations",
        }
    }

    pub fn all() -> &'static [View] {
        &[View::Graph, View::Timeline, View::Agents, View::Citations]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<View> {
        Self::all().get(index).copied()
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }

    pub fn previous(&self) -> View {
        let idx = self.index();
        let all = Self::all();
        let prev = if idx == 0 { all.len() - 1 } else { idx - 1 };
        all[prev]
    }
}
