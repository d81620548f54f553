use crate::domain::entities::{predicate::Predicate, search_request::Facets};

/// Builds the vector index filter from facet selections.
///
/// One "in set" clause per facet with at least one selected value, all AND-ed together.
/// Facets with an empty selection add no clause.
///
/// # Returns
/// `None` when no facet restricts the search: the query should be sent without any filter.
pub fn build_filter(facets: &Facets) -> Option<Predicate> {
    let clauses: Vec<Predicate> = facets
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(field, values)| Predicate::In {
            field: field.clone(),
            values: values.iter().cloned().collect(),
        })
        .collect();

    if clauses.is_empty() {
        return None;
    }

    Some(Predicate::And(clauses))
}
