use std::fmt;

/// Mark type tag, used where the attributes of a mark do not matter
/// (removing a colour, checking exclusions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkType {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Subscript,
    Superscript,
    TextColor,
    Highlight,
    Link,
}

impl MarkType {
    /// Name used on the JSON wire format
    pub fn name(self) -> &'static str {
        match self {
            MarkType::Bold => "bold",
            MarkType::Italic => "italic",
            MarkType::Underline => "underline",
            MarkType::Strike => "strike",
            MarkType::Code => "code",
            MarkType::Subscript => "subscript",
            MarkType::Superscript => "superscript",
            MarkType::TextColor => "textColor",
            MarkType::Highlight => "highlight",
            MarkType::Link => "link",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let mark_type = match name {
            "bold" => MarkType::Bold,
            "italic" => MarkType::Italic,
            "underline" => MarkType::Underline,
            "strike" => MarkType::Strike,
            "code" => MarkType::Code,
            "subscript" => MarkType::Subscript,
            "superscript" => MarkType::Superscript,
            "textColor" => MarkType::TextColor,
            "highlight" => MarkType::Highlight,
            "link" => MarkType::Link,
            _ => return None,
        };
        Some(mark_type)
    }

    /// Mark types that cannot coexist with this one on the same run
    fn excludes(self, other: MarkType) -> bool {
        self == other
            || matches!(
                (self, other),
                (MarkType::Subscript, MarkType::Superscript)
                    | (MarkType::Superscript, MarkType::Subscript)
            )
    }
}

impl fmt::Display for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formatting attribute attached to a run of text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Subscript,
    Superscript,
    /// Foreground colour as `#rgb` or `#rrggbb`
    TextColor(String),
    /// Background colour as `#rgb` or `#rrggbb`
    Highlight(String),
    Link { href: String },
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Underline => MarkType::Underline,
            Mark::Strike => MarkType::Strike,
            Mark::Code => MarkType::Code,
            Mark::Subscript => MarkType::Subscript,
            Mark::Superscript => MarkType::Superscript,
            Mark::TextColor(_) => MarkType::TextColor,
            Mark::Highlight(_) => MarkType::Highlight,
            Mark::Link { .. } => MarkType::Link,
        }
    }

    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link { href: href.into() }
    }
}

/// Canonical, ordered set of marks on a text run.
///
/// At most one mark per [`MarkType`] is kept and marks are ordered by type, so two
/// runs carry equal sets exactly when they render the same. Structural equality of
/// documents relies on this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut set = Self::new();
        for mark in marks {
            set.add(mark);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    pub fn has_type(&self, mark_type: MarkType) -> bool {
        self.0.iter().any(|m| m.mark_type() == mark_type)
    }

    /// Add a mark, replacing any mark it excludes (same type, or the opposite
    /// script position)
    pub fn add(&mut self, mark: Mark) {
        let mark_type = mark.mark_type();
        self.0.retain(|m| !mark_type.excludes(m.mark_type()));
        let at = self.0.partition_point(|m| m.mark_type() < mark_type);
        self.0.insert(at, mark);
    }

    pub fn remove(&mut self, mark_type: MarkType) {
        self.0.retain(|m| m.mark_type() != mark_type);
    }

    pub fn with(&self, mark: Mark) -> Self {
        let mut set = self.clone();
        set.add(mark);
        set
    }

    pub fn without(&self, mark_type: MarkType) -> Self {
        let mut set = self.clone();
        set.remove(mark_type);
        set
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_marks_are_kept_in_type_order() {
        let set = MarkSet::from_marks([Mark::link("a"), Mark::Italic, Mark::Bold]);
        let types: Vec<_> = set.iter().map(Mark::mark_type).collect();
        assert_eq!(types, vec![MarkType::Bold, MarkType::Italic, MarkType::Link]);
    }

    #[test]
    fn test_adding_same_type_replaces_attributes() {
        let mut set = MarkSet::from_marks([Mark::TextColor("#ff0000".into())]);
        set.add(Mark::TextColor("#00ff00".into()));
        assert_eq!(set, MarkSet::from_marks([Mark::TextColor("#00ff00".into())]));
    }

    #[test]
    fn test_subscript_excludes_superscript() {
        let mut set = MarkSet::from_marks([Mark::Superscript, Mark::Bold]);
        set.add(Mark::Subscript);
        assert!(set.contains(&Mark::Subscript));
        assert!(!set.has_type(MarkType::Superscript));
        assert!(set.contains(&Mark::Bold));
    }
}
