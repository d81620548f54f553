use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

/// Boolean filter understood by the vector index query language.
///
/// Only conjunctions of "field in set" clauses are supported.
/// Serialized as `{"$and": [{field: {"$in": [values...]}}, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    And(Vec<Predicate>),
    In { field: String, values: Vec<String> },
}

impl Predicate {
    /// Clauses of the predicate as `field -> accepted values`, regardless of their order.
    ///
    /// Two predicates with the same clauses are semantically equal.
    pub fn clauses(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut clauses = BTreeMap::new();
        self.collect_clauses(&mut clauses);
        clauses
    }

    fn collect_clauses<'a>(&'a self, clauses: &mut BTreeMap<&'a str, BTreeSet<&'a str>>) {
        match self {
            Predicate::And(predicates) => predicates
                .iter()
                .for_each(|predicate| predicate.collect_clauses(clauses)),
            Predicate::In { field, values } => {
                clauses
                    .entry(field.as_str())
                    .or_default()
                    .extend(values.iter().map(String::as_str));
            }
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Predicate::And(predicates) => map.serialize_entry("$and", predicates)?,
            Predicate::In { field, values } => {
                map.serialize_entry(field, &json!({ "$in": values }))?
            }
        }
        map.end()
    }
}
