//! Read-only filtered views over a collection.
//!
//! Filtering never mutates or reorders the source: results come back in
//! insertion order. A [`Query`] ANDs its predicates together, and a blank
//! filter value matches everything for that dimension.

/// Extracts one textual field from a record. `None` means the field is unset.
pub type FieldFn<T> = fn(&T) -> Option<&str>;

/// Returns the records matching `predicate`, in source order.
pub fn filter<'a, T, P>(collection: &'a [T], predicate: P) -> Vec<&'a T>
where
    P: Fn(&T) -> bool,
{
    collection.iter().filter(|item| predicate(item)).collect()
}

/// A conjunction of predicates.
pub struct Query<T> {
    predicates: Vec<Box<dyn Fn(&T) -> bool>>,
}

impl<T: 'static> Query<T> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Case-insensitive substring search: matches if any of `fields` contains `needle`.
    pub fn text(mut self, needle: &str, fields: &[FieldFn<T>]) -> Self {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return self;
        }
        let fields = fields.to_vec();
        self.predicates.push(Box::new(move |item: &T| {
            fields
                .iter()
                .filter_map(|field| field(item))
                .any(|value| value.to_lowercase().contains(&needle))
        }));
        self
    }

    /// Case-insensitive equality on one field.
    pub fn equals(mut self, field: FieldFn<T>, value: &str) -> Self {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            return self;
        }
        self.predicates.push(Box::new(move |item: &T| {
            field(item).is_some_and(|v| v.to_lowercase() == value)
        }));
        self
    }

    /// Like [`equals`](Self::equals) but skips the filter when `value` is `None`.
    pub fn equals_opt(self, field: FieldFn<T>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.equals(field, v),
            None => self,
        }
    }

    /// Adds an arbitrary predicate.
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + 'static,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, item: &T) -> bool {
        self.predicates.iter().all(|p| p(item))
    }

    pub fn apply<'a>(&self, collection: &'a [T]) -> Vec<&'a T> {
        filter(collection, |item| self.matches(item))
    }
}

impl<T: 'static> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        name: &'static str,
        email: &'static str,
        status: &'static str,
        dept: Option<&'static str>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Ada Park", email: "ada@corp.io", status: "Active", dept: Some("Engineering") },
            Row { name: "Ben Ode", email: "ben@corp.io", status: "Inactive", dept: None },
            Row { name: "Cy Lin", email: "cy.park@corp.io", status: "Active", dept: Some("Sales") },
        ]
    }

    fn name(r: &Row) -> Option<&str> {
        Some(r.name)
    }
    fn email(r: &Row) -> Option<&str> {
        Some(r.email)
    }
    fn status(r: &Row) -> Option<&str> {
        Some(r.status)
    }
    fn dept(r: &Row) -> Option<&str> {
        r.dept
    }

    #[test]
    fn text_search_is_case_insensitive_and_order_preserving() {
        let data = rows();
        let hits = Query::new().text("PARK", &[name, email]).apply(&data);
        assert_eq!(hits.iter().map(|r| r.name).collect::<Vec<_>>(), vec!["Ada Park", "Cy Lin"]);
    }

    #[test]
    fn blank_filters_match_all() {
        let data = rows();
        let query = Query::new().text("   ", &[name]).equals(status, "");
        assert!(query.is_unfiltered());
        assert_eq!(query.apply(&data).len(), 3);
    }

    #[test]
    fn dimensions_are_anded() {
        let data = rows();
        let hits = Query::new()
            .text("corp", &[email])
            .equals(status, "active")
            .equals(dept, "sales")
            .apply(&data);
        assert_eq!(hits, vec![&data[2]]);
    }

    #[test]
    fn equality_and_text_fold_case_alike() {
        let data = vec![Row { name: "Émile Roux", email: "emile@corp.io", status: "ÉTUDIANT", dept: None }];
        assert_eq!(Query::new().equals(status, "étudiant").apply(&data).len(), 1);
        assert_eq!(Query::new().text("étudiant", &[status]).apply(&data).len(), 1);
        assert_eq!(Query::new().equals(name, "émile roux").apply(&data).len(), 1);
    }

    #[test]
    fn unset_fields_never_match_equality() {
        let data = rows();
        let hits = Query::new().equals_opt(dept, Some("Engineering")).apply(&data);
        assert_eq!(hits.len(), 1);
        assert!(Query::new().equals_opt(dept, None).matches(&data[1]));
    }

    #[test]
    fn plain_filter_keeps_source_untouched() {
        let data = rows();
        let active = filter(&data, |r| r.status == "Active");
        assert_eq!(active.len(), 2);
        assert_eq!(data.len(), 3);
    }
}
