//! Page requests and page results shared by every repository kind.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Ordering on a single (JSON) property, e.g. `firstName,desc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

impl Sort {
    #[must_use]
    pub fn asc(property: impl Into<String>) -> Self {
        Self { property: property.into(), direction: Direction::Asc }
    }

    #[must_use]
    pub fn desc(property: impl Into<String>) -> Self {
        Self { property: property.into(), direction: Direction::Desc }
    }

    /// Parses `property[,asc|desc]`. Returns `None` for an empty property or an
    /// unknown direction.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(2, ',');
        let property = parts.next().map(str::trim).filter(|p| !p.is_empty())?;
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()).as_deref() {
            None | Some("" | "asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(_) => return None,
        };
        Some(Self { property: property.to_owned(), direction })
    }

    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::Asc
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        write!(f, "{},{direction}", self.property)
    }
}

/// A zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    page: u32,
    size: u32,
    sort: Vec<Sort>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self { page: 0, size: DEFAULT_PAGE_SIZE, sort: Vec::new() }
    }
}

impl Pageable {
    /// Creates a request; `size` is clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size: size.clamp(1, MAX_PAGE_SIZE), sort: Vec::new() }
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    #[must_use]
    pub fn with_sorts(mut self, sorts: impl IntoIterator<Item = Sort>) -> Self {
        self.sort.extend(sorts);
        self
    }

    /// Same page and size, different ordering.
    #[must_use]
    pub fn replace_sort(&self, sorts: Vec<Sort>) -> Self {
        Self { page: self.page, size: self.size, sort: sorts }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    #[must_use]
    pub fn sort(&self) -> &[Sort] {
        &self.sort
    }

    /// Index of the first element of this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results plus the total number of matching elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        Self { content, page: pageable.page(), size: pageable.size(), total_elements }
    }

    /// Cuts the requested page out of an already ordered, complete result set.
    #[must_use]
    pub fn from_ordered(all: Vec<T>, pageable: &Pageable) -> Self {
        let total = all.len() as u64;
        let offset = usize::try_from(pageable.offset()).unwrap_or(usize::MAX);
        let content = all.into_iter().skip(offset).take(pageable.size() as usize).collect();
        Self::new(content, pageable, total)
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 { 0 } else { self.total_elements.div_ceil(u64::from(self.size)) }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}
