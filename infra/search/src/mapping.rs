use serde::Serialize;
use std::collections::BTreeMap;

/// How a field is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Analyzed into tokens; searchable by term, phrase and prefix; not sortable.
    Text,
    /// Matched and sorted as an exact string.
    Keyword,
    Long,
    Double,
    /// RFC 3339 instant; also matches on a `YYYY-MM-DD` prefix.
    Date,
    Boolean,
}

impl FieldKind {
    #[must_use]
    pub const fn is_sortable(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Field name to [`FieldKind`] for one index.
///
/// Fields absent from the mapping are stored in the source but never searched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexMapping {
    fields: BTreeMap<String, FieldKind>,
}

impl IndexMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub(crate) fn text_fields(&self) -> impl Iterator<Item = &str> {
        self.fields().filter(|(_, kind)| *kind == FieldKind::Text).map(|(name, _)| name)
    }
}
