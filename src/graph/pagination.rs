use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entities::{Class, GeneralStatement, Literal, Predicate, Resource};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortProperty {
    CreatedAt,
    Id,
    Label,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub property: SortProperty,
    pub direction: Direction,
}

impl Sort {
    #[must_use]
    pub fn by(property: SortProperty, direction: Direction) -> Self {
        Self {
            property,
            direction,
        }
    }

    /// Oldest first; the order of every paged lookup without explicit sort.
    #[must_use]
    pub fn created_at_asc() -> Self {
        Self::by(SortProperty::CreatedAt, Direction::Asc)
    }

    /// Newest first; the default order of bundles.
    #[must_use]
    pub fn created_at_desc() -> Self {
        Self::by(SortProperty::CreatedAt, Direction::Desc)
    }
}

/// Page request: zero based page number, page size and optional order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pageable {
    pub page: usize,
    pub size: usize,
    pub sort: Option<Sort>,
}

impl Pageable {
    #[must_use]
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    /// A single page holding every element.
    #[must_use]
    pub fn unpaged() -> Self {
        Self::new(0, usize::MAX)
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for Pageable {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
}

impl<T> Page<T> {
    /// Slices already ordered items. The total always counts every item, so
    /// content and count derive from the same selection.
    #[must_use]
    pub fn from_ordered(items: Vec<T>, pageable: &Pageable) -> Self {
        let total_elements = items.len();
        let content = items
            .into_iter()
            .skip(pageable.offset())
            .take(pageable.size)
            .collect();
        Self {
            content,
            number: pageable.page,
            size: pageable.size,
            total_elements,
        }
    }

    #[must_use]
    pub fn empty(pageable: &Pageable) -> Self {
        Self::from_ordered(Vec::new(), pageable)
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.size)
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

impl<T: Sortable> Page<T> {
    /// Orders `items` by the requested sort (oldest first without one), then
    /// slices them.
    #[must_use]
    pub fn sorted(mut items: Vec<T>, pageable: &Pageable) -> Self {
        sort_items(&mut items, pageable.sort.unwrap_or_else(Sort::created_at_asc));
        Self::from_ordered(items, pageable)
    }
}

/// Orders `items` in place; ties fall back to ascending id.
pub fn sort_items<T: Sortable>(items: &mut [T], sort: Sort) {
    items.sort_by(|a, b| {
        let ordering = match sort.property {
            SortProperty::CreatedAt => a.created_at().cmp(&b.created_at()),
            SortProperty::Id => a.sort_id().cmp(b.sort_id()),
            SortProperty::Label => a.sort_label().cmp(b.sort_label()),
        };
        let ordering = match sort.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.sort_id().cmp(b.sort_id()))
    });
}

/// Properties every sortable entity exposes.
pub trait Sortable {
    fn created_at(&self) -> DateTime<Utc>;
    fn sort_id(&self) -> &str;
    fn sort_label(&self) -> &str;
}

macro_rules! sortable {
    ($($entity:ty),*) => {
        $(
            impl Sortable for $entity {
                fn created_at(&self) -> DateTime<Utc> {
                    self.created_at
                }

                fn sort_id(&self) -> &str {
                    self.id.as_str()
                }

                fn sort_label(&self) -> &str {
                    &self.label
                }
            }
        )*
    };
}

sortable!(Resource, Literal, Predicate, Class);

impl Sortable for GeneralStatement {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn sort_id(&self) -> &str {
        self.id.as_str()
    }

    fn sort_label(&self) -> &str {
        self.object.label()
    }
}
