/// Numbering state for one section: fixed chapter/section numbers plus the
/// running heading and code-listing ordinals.
///
/// A fresh `Index` is created for every section; it is never shared between
/// sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    chapter: u32,
    section: u32,
    heading: u32,
    code: u32,
}

impl Index {
    pub fn new(chapter: u32, section: u32) -> Self {
        Index {
            chapter,
            section,
            heading: 0,
            code: 0,
        }
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn section(&self) -> u32 {
        self.section
    }

    /// Label for the next heading, e.g. `"2.1.0 "`. Advances the heading
    /// ordinal.
    pub fn next_heading(&mut self) -> String {
        let label = format!("{}.{}.{} ", self.chapter, self.section, self.heading);
        self.heading += 1;
        label
    }

    /// Ordinal for the next numbered code listing. Advances the listing
    /// ordinal.
    pub fn next_code_index(&mut self) -> u32 {
        let index = self.code;
        self.code += 1;
        index
    }
}
