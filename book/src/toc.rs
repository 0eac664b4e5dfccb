use html_escape::encode_text;

/// A chapter or section title, as it appears in the table of contents and
/// above the section body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocEntry {
    Chapter {
        index: u32,
        title: String,
    },
    Section {
        chapter: u32,
        index: u32,
        title: String,
    },
}

impl TocEntry {
    pub fn chapter(index: u32, title: impl Into<String>) -> Self {
        TocEntry::Chapter {
            index,
            title: title.into(),
        }
    }

    pub fn section(chapter: u32, index: u32, title: impl Into<String>) -> Self {
        TocEntry::Section {
            chapter,
            index,
            title: title.into(),
        }
    }

    /// Fragment id shared by the body heading and the TOC link.
    pub fn anchor(&self) -> String {
        match self {
            TocEntry::Chapter { index, .. } => format!("c-{}", index),
            TocEntry::Section { chapter, index, .. } => format!("c-{}-{}", chapter, index),
        }
    }

    /// `1. Title` or `1.2. Title`, escaped.
    pub fn label(&self) -> String {
        match self {
            TocEntry::Chapter { index, title } => format!("{}. {}", index, encode_text(title)),
            TocEntry::Section {
                chapter,
                index,
                title,
            } => format!("{}.{}. {}", chapter, index, encode_text(title)),
        }
    }

    fn level(&self) -> u8 {
        match self {
            TocEntry::Chapter { .. } => 1,
            TocEntry::Section { .. } => 2,
        }
    }

    pub fn toc_html(&self) -> String {
        format!(
            "<div class='toc-h{level}'><a href='#{anchor}'>{label}</a></div>",
            level = self.level(),
            anchor = self.anchor(),
            label = self.label()
        )
    }

    pub fn heading_html(&self) -> String {
        format!(
            "<h{level} id='{anchor}' class='title'>{label}</h{level}>",
            level = self.level(),
            anchor = self.anchor(),
            label = self.label()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toc {
    entries: Vec<TocEntry>,
}

impl Toc {
    pub fn new() -> Self {
        Toc::default()
    }

    pub fn push(&mut self, entry: TocEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<nav class='toc'>");
        for entry in &self.entries {
            out.push_str(&entry.toc_html());
        }
        out.push_str("</nav>");
        out
    }
}
