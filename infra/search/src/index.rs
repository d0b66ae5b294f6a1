use crate::analyzer::analyze;
use crate::error::SearchError;
use crate::mapping::{FieldKind, IndexMapping};
use crate::query::{Clause, Occur, Query, Term};
use chrono::DateTime;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Reserved field holding the document id.
const ID_FIELD: &str = "id";
const DEFAULT_LIMIT: usize = 20;

/// One sort criterion of a [`SearchRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub ascending: bool,
}

impl SortField {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: true }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), ascending: false }
    }
}

/// Query string plus the window and ordering of the hits to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub offset: usize,
    pub limit: usize,
    pub sort: Vec<SortField>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), offset: 0, limit: DEFAULT_LIMIT, sort: Vec::new() }
    }

    #[must_use]
    pub const fn window(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: i64,
    pub score: u32,
    pub source: Value,
}

/// A page of hits and the number of documents matching the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<Hit>,
}

#[derive(Debug)]
struct StoredDocument {
    source: Map<String, Value>,
    /// Analyzed tokens per text field, kept so postings can be removed.
    tokens: FxHashMap<String, Vec<String>>,
}

/// field -> token -> document id -> term frequency
type Postings = FxHashMap<String, FxHashMap<String, FxHashMap<i64, u32>>>;

#[derive(Debug)]
struct Index {
    mapping: IndexMapping,
    documents: BTreeMap<i64, StoredDocument>,
    postings: Postings,
}

/// Thread-safe registry of named in-memory indices.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    indices: Arc<RwLock<FxHashMap<String, Index>>>,
}

impl SearchIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `name` with `mapping`. Creating an existing index with an identical
    /// mapping is a no-op.
    ///
    /// # Errors
    /// [`SearchError::MappingConflict`] when the index exists with a different mapping.
    pub fn create_index(&self, name: &str, mapping: IndexMapping) -> Result<(), SearchError> {
        let mut indices = self.indices.write();
        if let Some(existing) = indices.get(name) {
            if existing.mapping == mapping {
                return Ok(());
            }
            return Err(SearchError::MappingConflict { index: name.to_owned(), context: None });
        }

        debug!(index = name, fields = mapping.fields().count(), "Created search index");
        indices.insert(
            name.to_owned(),
            Index { mapping, documents: BTreeMap::new(), postings: Postings::default() },
        );
        Ok(())
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.indices.read().contains_key(name)
    }

    /// Returns the mapping `name` was created with.
    #[must_use]
    pub fn mapping(&self, name: &str) -> Option<IndexMapping> {
        self.indices.read().get(name).map(|index| index.mapping.clone())
    }

    /// Adds or replaces the document `id`.
    ///
    /// # Errors
    /// * [`SearchError::IndexNotFound`] for an unknown index.
    /// * [`SearchError::InvalidDocument`] when `source` is not an object or a mapped
    ///   field holds a value of the wrong type.
    pub fn index(&self, name: &str, id: i64, source: Value) -> Result<(), SearchError> {
        let Value::Object(mut source) = source else {
            return Err(SearchError::InvalidDocument {
                message: "document source must be a JSON object".into(),
                context: Some(format!("{name}/{id}").into()),
            });
        };
        source.insert(ID_FIELD.to_owned(), Value::from(id));

        let mut indices = self.indices.write();
        let index = indices.get_mut(name).ok_or_else(|| not_found(name))?;
        validate(&index.mapping, &source)?;

        index.remove(id);
        let tokens: FxHashMap<String, Vec<String>> = index
            .mapping
            .text_fields()
            .filter_map(|field| source.get(field).and_then(Value::as_str).map(|s| (field, s)))
            .map(|(field, text)| (field.to_owned(), analyze(text)))
            .collect();

        for (field, field_tokens) in &tokens {
            let by_token = index.postings.entry(field.clone()).or_default();
            for token in field_tokens {
                *by_token.entry(token.clone()).or_default().entry(id).or_default() += 1;
            }
        }
        index.documents.insert(id, StoredDocument { source, tokens });
        trace!(index = name, id, "Indexed document");
        Ok(())
    }

    /// # Errors
    /// [`SearchError::IndexNotFound`] for an unknown index.
    pub fn get(&self, name: &str, id: i64) -> Result<Option<Value>, SearchError> {
        let indices = self.indices.read();
        let index = indices.get(name).ok_or_else(|| not_found(name))?;
        Ok(index.documents.get(&id).map(|doc| Value::Object(doc.source.clone())))
    }

    /// Removes document `id`; returns whether it was present.
    ///
    /// # Errors
    /// [`SearchError::IndexNotFound`] for an unknown index.
    pub fn delete(&self, name: &str, id: i64) -> Result<bool, SearchError> {
        let mut indices = self.indices.write();
        let index = indices.get_mut(name).ok_or_else(|| not_found(name))?;
        Ok(index.remove(id))
    }

    /// # Errors
    /// [`SearchError::IndexNotFound`] for an unknown index.
    pub fn count(&self, name: &str) -> Result<u64, SearchError> {
        let indices = self.indices.read();
        let index = indices.get(name).ok_or_else(|| not_found(name))?;
        Ok(index.documents.len() as u64)
    }

    /// Removes every document but keeps the index and its mapping.
    ///
    /// # Errors
    /// [`SearchError::IndexNotFound`] for an unknown index.
    pub fn clear(&self, name: &str) -> Result<(), SearchError> {
        let mut indices = self.indices.write();
        let index = indices.get_mut(name).ok_or_else(|| not_found(name))?;
        index.documents.clear();
        index.postings.clear();
        debug!(index = name, "Cleared search index");
        Ok(())
    }

    /// Runs `request` against `name`.
    ///
    /// Without sort fields hits come back by descending score, then ascending id.
    /// With sort fields, missing values sort last and ties break by ascending id.
    ///
    /// # Errors
    /// * [`SearchError::IndexNotFound`] for an unknown index.
    /// * [`SearchError::UnsortableField`] when sorting on a text field.
    /// * [`SearchError::UnknownField`] when sorting on an unmapped field.
    pub fn search(&self, name: &str, request: &SearchRequest) -> Result<SearchHits, SearchError> {
        let query = Query::parse(&request.query);
        let indices = self.indices.read();
        let index = indices.get(name).ok_or_else(|| not_found(name))?;

        let sort_kinds = request
            .sort
            .iter()
            .map(|sort| sort_kind(&index.mapping, &sort.field).map(|kind| (sort, kind)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut matches: Vec<(i64, u32, &StoredDocument)> = index
            .documents
            .iter()
            .filter_map(|(&id, doc)| index.score(&query, id, doc).map(|score| (id, score, doc)))
            .collect();

        if sort_kinds.is_empty() {
            matches.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        } else {
            matches.sort_by(|a, b| {
                sort_kinds
                    .iter()
                    .map(|(sort, kind)| {
                        let left = SortKey::extract(a.0, a.2, &sort.field, *kind);
                        let right = SortKey::extract(b.0, b.2, &sort.field, *kind);
                        SortKey::compare(&left, &right, sort.ascending)
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
        }

        let total = matches.len() as u64;
        let hits = matches
            .into_iter()
            .skip(request.offset)
            .take(request.limit)
            .map(|(id, score, doc)| Hit { id, score, source: Value::Object(doc.source.clone()) })
            .collect();

        trace!(index = name, query = %query, total, "Search executed");
        Ok(SearchHits { total, hits })
    }
}

impl Index {
    fn remove(&mut self, id: i64) -> bool {
        let Some(doc) = self.documents.remove(&id) else {
            return false;
        };
        for (field, tokens) in doc.tokens {
            let Some(by_token) = self.postings.get_mut(&field) else {
                continue;
            };
            for token in tokens {
                if let Some(docs) = by_token.get_mut(&token) {
                    docs.remove(&id);
                    if docs.is_empty() {
                        by_token.remove(&token);
                    }
                }
            }
        }
        true
    }

    /// `None` when the document does not match, otherwise its score.
    fn score(&self, query: &Query, id: i64, doc: &StoredDocument) -> Option<u32> {
        if query.is_match_all() {
            return Some(0);
        }

        let mut score = 0;
        let mut matched_should = false;
        let mut has_should = false;

        for clause in &query.clauses {
            let clause_score = self.clause_score(clause, id, doc);
            match clause.occur {
                Occur::Must => score += clause_score?,
                Occur::MustNot if clause_score.is_some() => return None,
                Occur::MustNot => {},
                Occur::Should => {
                    has_should = true;
                    if let Some(s) = clause_score {
                        matched_should = true;
                        score += s;
                    }
                },
            }
        }

        let satisfied = query.has_must() || !has_should || matched_should;
        satisfied.then_some(score)
    }

    fn clause_score(&self, clause: &Clause, id: i64, doc: &StoredDocument) -> Option<u32> {
        match clause.field.as_deref() {
            Some(ID_FIELD) => match_id(&clause.term, id),
            Some(field) => {
                let kind = self.mapping.kind(field)?;
                self.field_score(field, kind, &clause.term, id, doc)
            },
            None if clause.term == Term::Any => Some(1),
            None => self
                .mapping
                .fields()
                .filter_map(|(field, kind)| self.field_score(field, kind, &clause.term, id, doc))
                .reduce(|a, b| a + b),
        }
    }

    fn field_score(
        &self,
        field: &str,
        kind: FieldKind,
        term: &Term,
        id: i64,
        doc: &StoredDocument,
    ) -> Option<u32> {
        if kind == FieldKind::Text {
            return self.text_score(field, term, id, doc);
        }

        let value = doc.source.get(field).filter(|v| !v.is_null())?;
        let matched = match (term, kind) {
            (Term::Any, _) => true,
            (Term::Word(raw) | Term::Phrase(raw), FieldKind::Keyword) => {
                value.as_str() == Some(raw.as_str())
            },
            (Term::Prefix(prefix), FieldKind::Keyword | FieldKind::Date) => {
                value.as_str().is_some_and(|v| v.starts_with(prefix.as_str()))
            },
            (Term::Word(raw) | Term::Phrase(raw), FieldKind::Date) => {
                value.as_str().is_some_and(|v| v == raw || v.starts_with(raw.as_str()))
            },
            (Term::Word(raw), FieldKind::Long | FieldKind::Double) => {
                raw.parse::<f64>().ok().zip(value.as_f64()).is_some_and(|(t, v)| t == v)
            },
            (Term::Word(raw), FieldKind::Boolean) => {
                raw.to_ascii_lowercase().parse::<bool>().is_ok_and(|t| value.as_bool() == Some(t))
            },
            _ => false,
        };
        matched.then_some(1)
    }

    fn text_score(&self, field: &str, term: &Term, id: i64, doc: &StoredDocument) -> Option<u32> {
        let by_token = self.postings.get(field);
        let frequency = |token: &str| -> Option<u32> {
            by_token?.get(token)?.get(&id).copied()
        };

        match term {
            Term::Any => doc.tokens.get(field).filter(|t| !t.is_empty()).map(|_| 1),
            Term::Word(raw) | Term::Phrase(raw) => {
                let tokens = analyze(raw);
                if tokens.is_empty() {
                    return None;
                }
                tokens.iter().map(|token| frequency(token)).sum()
            },
            Term::Prefix(raw) => {
                let prefix = raw.to_lowercase();
                let total: u32 = by_token?
                    .iter()
                    .filter(|(token, _)| token.starts_with(prefix.as_str()))
                    .filter_map(|(_, docs)| docs.get(&id))
                    .sum();
                (total > 0).then_some(total)
            },
        }
    }
}

fn match_id(term: &Term, id: i64) -> Option<u32> {
    let matched = match term {
        Term::Any => true,
        Term::Word(raw) | Term::Phrase(raw) => raw.trim().parse::<i64>().ok() == Some(id),
        Term::Prefix(prefix) => id.to_string().starts_with(prefix.as_str()),
    };
    matched.then_some(1)
}

fn not_found(name: &str) -> SearchError {
    SearchError::IndexNotFound { index: name.to_owned(), context: None }
}

fn validate(mapping: &IndexMapping, source: &Map<String, Value>) -> Result<(), SearchError> {
    for (field, kind) in mapping.fields() {
        let Some(value) = source.get(field).filter(|v| !v.is_null()) else {
            continue;
        };
        let valid = match kind {
            FieldKind::Text | FieldKind::Keyword => value.is_string(),
            FieldKind::Long => value.is_i64() || value.is_u64(),
            FieldKind::Double => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Date => value.as_str().is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
        };
        if !valid {
            return Err(SearchError::InvalidDocument {
                message: format!("field '{field}' does not hold a {kind:?} value").into(),
                context: None,
            });
        }
    }
    Ok(())
}

fn sort_kind(mapping: &IndexMapping, field: &str) -> Result<FieldKind, SearchError> {
    if field == ID_FIELD {
        return Ok(FieldKind::Long);
    }
    match mapping.kind(field) {
        Some(kind) if kind.is_sortable() => Ok(kind),
        Some(_) => Err(SearchError::UnsortableField { field: field.to_owned(), context: None }),
        None => Err(SearchError::UnknownField { field: field.to_owned(), context: None }),
    }
}

#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey<'a> {
    Integer(i64),
    Number(f64),
    Text(&'a str),
    Flag(bool),
    Missing,
}

impl<'a> SortKey<'a> {
    fn extract(id: i64, doc: &'a StoredDocument, field: &str, kind: FieldKind) -> Self {
        if field == ID_FIELD {
            return Self::Integer(id);
        }
        let Some(value) = doc.source.get(field) else {
            return Self::Missing;
        };
        let key = match kind {
            FieldKind::Long => value.as_i64().map(Self::Integer),
            FieldKind::Double => value.as_f64().map(Self::Number),
            FieldKind::Keyword | FieldKind::Text => value.as_str().map(Self::Text),
            FieldKind::Date => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| Self::Integer(dt.timestamp_micros())),
            FieldKind::Boolean => value.as_bool().map(Self::Flag),
        };
        key.unwrap_or(Self::Missing)
    }

    /// Missing values sort last in both directions.
    fn compare(left: &Self, right: &Self, ascending: bool) -> Ordering {
        match (left, right) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Greater,
            (_, Self::Missing) => Ordering::Less,
            _ => {
                let ordering = left.partial_cmp(right).unwrap_or(Ordering::Equal);
                if ascending { ordering } else { ordering.reverse() }
            },
        }
    }
}
