use crate::{ItemId, MemoryCatalog, Predicate, catalog::filetype};
use serde::Serialize;
use std::{cmp::Ordering, fmt, time::Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderKey {
    #[default]
    Name,
    Rating,
    Width,
    Height,
    Size,
    Id,
}

impl OrderKey {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "name" => OrderKey::Name,
            "rating" => OrderKey::Rating,
            "width" => OrderKey::Width,
            "height" => OrderKey::Height,
            "size" => OrderKey::Size,
            "id" => OrderKey::Id,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// One row of a result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub name: String,
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub rating: u8,
    pub nsfw: bool,
    pub filetype: String,
    pub tags: Vec<String>,
}

impl fmt::Display for ItemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}x{}, rating {})",
            self.path, self.width, self.height, self.rating
        )
    }
}

/// Compiled query over a [`MemoryCatalog`]. Ordering and paging are chosen
/// by the caller; the predicate is fixed.
#[derive(Debug, Clone)]
pub struct ItemQuery<'a> {
    catalog: &'a MemoryCatalog,
    predicate: Predicate,
    order: (OrderKey, Direction),
    offset: usize,
    limit: Option<usize>,
}

impl<'a> ItemQuery<'a> {
    pub(crate) fn new(catalog: &'a MemoryCatalog, predicate: Predicate) -> Self {
        Self {
            catalog,
            predicate,
            order: (OrderKey::Name, Direction::Ascending),
            offset: 0,
            limit: None,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn order_by(mut self, key: OrderKey, direction: Direction) -> Self {
        self.order = (key, direction);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Page `page` (starting at 0) of `per_page` items.
    pub fn page(self, page: usize, per_page: usize) -> Self {
        self.offset(page.saturating_mul(per_page)).limit(per_page)
    }

    /// Number of matching items, ignoring offset and limit.
    pub fn count(&self) -> usize {
        self.matching().len()
    }

    /// Matching item ids in result order, after offset and limit.
    pub fn ids(&self) -> Vec<ItemId> {
        let search_time = Instant::now();
        let mut ids = self.matching();
        let total = ids.len();
        let (key, direction) = self.order;
        ids.sort_by(|a, b| {
            let ordering = self.compare(key, *a, *b).then_with(|| a.cmp(b));
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
        let page: Vec<_> = ids
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();
        info!(
            "Search time: {:?}, {} matched, {} returned",
            search_time.elapsed(),
            total,
            page.len()
        );
        page
    }

    pub fn execute(&self) -> Vec<ItemView> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.view(id))
            .collect()
    }

    fn matching(&self) -> Vec<ItemId> {
        self.catalog
            .evaluate(&self.predicate, self.catalog.item_ids().collect())
    }

    fn compare(&self, key: OrderKey, a: ItemId, b: ItemId) -> Ordering {
        let (Some(left), Some(right)) = (self.catalog.item(a), self.catalog.item(b)) else {
            return Ordering::Equal;
        };
        match key {
            OrderKey::Name => left.name.cmp(&right.name),
            OrderKey::Rating => left.rating.cmp(&right.rating),
            OrderKey::Width => left.width.cmp(&right.width),
            OrderKey::Height => left.height.cmp(&right.height),
            OrderKey::Size => left.size.cmp(&right.size),
            OrderKey::Id => Ordering::Equal,
        }
    }

    fn view(&self, id: ItemId) -> Option<ItemView> {
        let item = self.catalog.item(id)?;
        Some(ItemView {
            id,
            name: item.name.clone(),
            path: self.catalog.item_path(id)?,
            width: item.width,
            height: item.height,
            rating: item.rating,
            nsfw: self.catalog.is_nsfw(item),
            filetype: filetype(&item.name),
            tags: self.catalog.tag_names(item).map(str::to_string).collect(),
        })
    }
}
