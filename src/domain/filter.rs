use crate::domain::ticket::{Category, Priority, Status};

/// Listing constraints. Absent fields place no constraint on the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub search: Option<String>,
}

/// Change to a single filter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

impl<T: PartialEq> FieldUpdate<T> {
    fn apply(self, target: &mut Option<T>) -> bool {
        let next = match self {
            FieldUpdate::Keep => return false,
            FieldUpdate::Set(value) => Some(value),
            FieldUpdate::Clear => None,
        };
        if *target == next {
            return false;
        }
        *target = next;
        true
    }
}

/// Partial filter change; untouched fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdate {
    pub category: FieldUpdate<Category>,
    pub priority: FieldUpdate<Priority>,
    pub status: FieldUpdate<Status>,
    pub search: FieldUpdate<String>,
}

impl FilterUpdate {
    pub fn category(mut self, category: Option<Category>) -> Self {
        self.category = category.map_or(FieldUpdate::Clear, FieldUpdate::Set);
        self
    }

    pub fn priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority.map_or(FieldUpdate::Clear, FieldUpdate::Set);
        self
    }

    pub fn status(mut self, status: Option<Status>) -> Self {
        self.status = status.map_or(FieldUpdate::Clear, FieldUpdate::Set);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.is_empty() {
            FieldUpdate::Clear
        } else {
            FieldUpdate::Set(search)
        };
        self
    }
}

impl FilterCriteria {
    /// Applies `update` and reports whether any field changed.
    pub fn apply(&mut self, update: FilterUpdate) -> bool {
        let search = match update.search {
            FieldUpdate::Set(value) if value.is_empty() => FieldUpdate::Clear,
            other => other,
        };

        let mut changed = update.category.apply(&mut self.category);
        changed |= update.priority.apply(&mut self.priority);
        changed |= update.status.apply(&mut self.status);
        changed |= search.apply(&mut self.search);
        changed
    }

    /// Resets to "no filter", reporting whether anything was set before.
    pub fn clear(&mut self) -> bool {
        let changed = self.is_active();
        *self = Self::default();
        changed
    }

    pub fn is_active(&self) -> bool {
        self.category.is_some()
            || self.priority.is_some()
            || self.status.is_some()
            || self.search.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Query parameters for the listing request. Only set, non-empty fields appear.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}
