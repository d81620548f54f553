use crate::helper::error_chain_fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use typed_builder::TypedBuilder;

/// Upper bound accepted by the vector index for `top_k`
pub const MAX_TOP_K: u32 = 30;

/// A non-empty natural-language query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText(String);

impl QueryText {
    pub fn parse(s: &str) -> Result<QueryText, SearchRequestError> {
        if s.trim().is_empty() {
            return Err(SearchRequestError::EmptyQueryText);
        }
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for QueryText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Number of nearest vectors to return, in `1..=MAX_TOP_K`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopK(u32);

impl TopK {
    pub fn parse(value: i64) -> Result<TopK, SearchRequestError> {
        if value < 1 || value > MAX_TOP_K as i64 {
            return Err(SearchRequestError::TopKOutOfBounds(value));
        }
        Ok(Self(value as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Categorical selections, ex: `city -> {hangzhou, beijing}`.
///
/// An absent facet and a facet with an empty set both mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facets(BTreeMap<String, BTreeSet<String>>);

impl Facets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or extends) the selection of a facet
    pub fn with<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0
            .entry(name.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, BTreeSet<String>)> for Facets {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        let mut facets = Facets::new();
        for (name, values) in iter {
            facets = facets.with(&name, values);
        }
        facets
    }
}

/// A validated search request: once built, the pipeline can run without further checks
#[derive(Debug, Clone, TypedBuilder)]
pub struct SearchRequest {
    pub text: QueryText,
    pub top_k: TopK,
    #[builder(default)]
    pub facets: Facets,
    #[builder(default = true)]
    pub return_metadata: bool,
    #[builder(default = true)]
    pub return_distance: bool,
}

/// Search request as received from a client, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequestData {
    pub text: String,
    pub top_k: i64,
    #[serde(default)]
    pub facets: Option<Facets>,
    #[serde(default = "default_true")]
    pub return_metadata: bool,
    #[serde(default = "default_true")]
    pub return_distance: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<SearchRequestData> for SearchRequest {
    type Error = SearchRequestError;

    fn try_from(data: SearchRequestData) -> Result<Self, Self::Error> {
        Ok(SearchRequest::builder()
            .text(QueryText::parse(&data.text)?)
            .top_k(TopK::parse(data.top_k)?)
            .facets(data.facets.unwrap_or_default())
            .return_metadata(data.return_metadata)
            .return_distance(data.return_distance)
            .build())
    }
}

#[derive(thiserror::Error)]
pub enum SearchRequestError {
    #[error("The query text should not be empty")]
    EmptyQueryText,
    #[error("top_k should be between 1 and {max}, got {0}", max = MAX_TOP_K)]
    TopKOutOfBounds(i64),
}

impl std::fmt::Debug for SearchRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
