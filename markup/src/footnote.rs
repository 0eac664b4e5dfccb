use crate::tags;

/// Document-wide, append-only list of footnote bodies.
///
/// A footnote's index is its position in the registry, assigned when its
/// marker is rendered. Bodies are stored exactly as the author wrote them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footnotes {
    bodies: Vec<String>,
}

impl Footnotes {
    pub fn new() -> Self {
        Footnotes::default()
    }

    /// Register a footnote body and return its index.
    pub fn next_footnote_index(&mut self, body: impl Into<String>) -> usize {
        self.bodies.push(body.into());
        self.bodies.len() - 1
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.bodies.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.bodies.iter()
    }

    /// Render every registered footnote as a body entry linking back to its
    /// anchor.
    pub fn render(&self) -> Vec<String> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(index, body)| {
                tags::footnote(index, &html_escape::encode_quoted_attribute(body))
            })
            .collect()
    }
}
