//! Query-string parsing.
//!
//! Grammar, one clause per whitespace separated chunk:
//!
//! ```text
//! clause := ["+" | "-"] [field ":"] (word | "\"" phrase "\"" | prefix "*" | "*")
//! ```
//!
//! Parsing never fails: stray characters degrade into plain words and an
//! unterminated quote runs to the end of the input.

use std::fmt;

/// How a clause takes part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    /// At least one should clause must match unless a must clause exists.
    Should,
    Must,
    MustNot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Word(String),
    Phrase(String),
    Prefix(String),
    /// `*`: the field has a value (any document when unfielded).
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub occur: Occur,
    pub field: Option<String>,
    pub term: Term,
}

/// A parsed query string. No clauses means "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut clauses = Vec::new();
        let mut rest = input.trim_start();

        while !rest.is_empty() {
            let (chunk, tail) = next_chunk(rest);
            rest = tail.trim_start();
            if let Some(clause) = parse_clause(chunk) {
                clauses.push(clause);
            }
        }

        // A lone `*` is the match-all query.
        if clauses.iter().all(|c| c.field.is_none() && c.term == Term::Any && c.occur != Occur::MustNot)
        {
            clauses.clear();
        }

        Self { clauses }
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    pub(crate) fn has_must(&self) -> bool {
        self.clauses.iter().any(|c| c.occur == Occur::Must)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("*");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match clause.occur {
                Occur::Should => {},
                Occur::Must => f.write_str("+")?,
                Occur::MustNot => f.write_str("-")?,
            }
            if let Some(field) = &clause.field {
                write!(f, "{field}:")?;
            }
            match &clause.term {
                Term::Word(w) => f.write_str(w)?,
                Term::Phrase(p) => write!(f, "\"{p}\"")?,
                Term::Prefix(p) => write!(f, "{p}*")?,
                Term::Any => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

/// Splits off the next clause; whitespace inside quotes does not end it.
fn next_chunk(input: &str) -> (&str, &str) {
    let mut in_quotes = false;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => return (&input[..i], &input[i..]),
            _ => {},
        }
    }
    (input, "")
}

fn parse_clause(chunk: &str) -> Option<Clause> {
    let (occur, body) = match chunk.as_bytes().first()? {
        b'+' => (Occur::Must, &chunk[1..]),
        b'-' => (Occur::MustNot, &chunk[1..]),
        _ => (Occur::Should, chunk),
    };

    let (field, raw) = split_field(body);
    let term = parse_term(raw)?;
    Some(Clause { occur, field: field.map(str::to_owned), term })
}

/// `field:rest` when the part before the first `:` looks like a field name
/// and no quote precedes the colon.
fn split_field(body: &str) -> (Option<&str>, &str) {
    let Some(colon) = body.find(':') else {
        return (None, body);
    };
    let (name, rest) = (&body[..colon], &body[colon + 1..]);
    let is_field = !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !rest.is_empty();
    if is_field { (Some(name), rest) } else { (None, body) }
}

fn parse_term(raw: &str) -> Option<Term> {
    if raw.is_empty() {
        return None;
    }
    if raw == "*" {
        return Some(Term::Any);
    }
    if let Some(quoted) = raw.strip_prefix('"') {
        let phrase = quoted.strip_suffix('"').unwrap_or(quoted).trim();
        return (!phrase.is_empty()).then(|| Term::Phrase(phrase.to_owned()));
    }
    if let Some(prefix) = raw.strip_suffix('*')
        && !prefix.is_empty()
    {
        return Some(Term::Prefix(prefix.to_owned()));
    }
    Some(Term::Word(raw.to_owned()))
}
