use crate::model::CategoryPath;

/// Per-branch traversal state carried alongside a pending fetch
///
/// A context is never mutated once attached to a request. Follow-up requests
/// get a derived copy, so sibling branches never observe each other's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlContext {
    category_path: Option<CategoryPath>,
    page: Option<u32>,
}

impl CrawlContext {
    /// Context with no inherited state
    pub fn root() -> Self {
        Self::default()
    }

    /// Context for the first page of a paginated listing branch
    pub fn first_page() -> Self {
        Self {
            page: Some(1),
            ..Self::default()
        }
    }

    /// Context for a product request that inherits a category path
    pub fn for_product(category_path: CategoryPath) -> Self {
        Self {
            category_path: Some(category_path),
            ..Self::default()
        }
    }

    /// Derives the context of the following listing page
    ///
    /// A context without a counter is treated as page 1.
    pub fn next_page(&self) -> Self {
        Self {
            category_path: self.category_path.clone(),
            page: Some(self.current_page() + 1),
        }
    }

    /// Category path inherited from the listing page, if any
    pub fn category_path(&self) -> Option<&CategoryPath> {
        self.category_path.as_ref()
    }

    /// Page counter, if this is a paginated branch
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Page counter, defaulting to 1
    pub fn current_page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}
