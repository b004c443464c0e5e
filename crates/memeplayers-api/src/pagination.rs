use memeplayers_db::{Listing, Window};
use memeplayers_types::api::Paginated;

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    /// Oversized pages are capped and a zero size falls back to the default.
    /// Page zero does not exist.
    pub fn new(number: Option<u32>, size: Option<u32>) -> Result<Self, ApiError> {
        let number = number.unwrap_or(1);
        if number == 0 {
            return Err(ApiError::NotFound("invalid page".into()));
        }
        let size = match size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(n) => n.min(MAX_PAGE_SIZE),
        };
        Ok(Self { number, size })
    }

    pub fn window(self) -> Window {
        Window {
            limit: self.size,
            offset: u64::from(self.number - 1) * u64::from(self.size),
        }
    }

    /// Wrap a windowed listing. The first page is always valid, even when
    /// empty; any later page must contain rows.
    pub fn wrap<T>(self, listing: Listing<T>) -> Result<Paginated<T>, ApiError> {
        if self.number > 1 && listing.items.is_empty() {
            return Err(ApiError::NotFound("invalid page".into()));
        }

        let seen = u64::from(self.number) * u64::from(self.size);
        Ok(Paginated {
            count: listing.total,
            next: (seen < listing.total).then(|| self.number + 1),
            previous: (self.number > 1).then(|| self.number - 1),
            results: listing.items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(n: usize, total: u64) -> Listing<u32> {
        Listing {
            items: (0..n as u32).collect(),
            total,
        }
    }

    #[test]
    fn defaults_and_caps() {
        assert_eq!(Page::new(None, None).unwrap(), Page { number: 1, size: 10 });
        assert_eq!(Page::new(Some(3), Some(500)).unwrap().size, MAX_PAGE_SIZE);
        assert_eq!(Page::new(None, Some(0)).unwrap().size, DEFAULT_PAGE_SIZE);
        assert!(Page::new(Some(0), None).is_err());

        let w = Page::new(Some(3), Some(20)).unwrap().window();
        assert_eq!(w.limit, 20);
        assert_eq!(w.offset, 40);
    }

    #[test]
    fn next_and_previous_links() {
        let page = Page::new(Some(1), Some(10)).unwrap();
        let p = page.wrap(listing(10, 25)).unwrap();
        assert_eq!((p.count, p.next, p.previous), (25, Some(2), None));

        let page = Page::new(Some(3), Some(10)).unwrap();
        let p = page.wrap(listing(5, 25)).unwrap();
        assert_eq!((p.next, p.previous), (None, Some(2)));
    }

    #[test]
    fn empty_first_page_is_fine_but_past_the_end_is_not() {
        let first = Page::new(None, None).unwrap();
        let p = first.wrap(listing(0, 0)).unwrap();
        assert_eq!(p.count, 0);
        assert!(p.results.is_empty());

        let past = Page::new(Some(4), Some(10)).unwrap();
        assert!(matches!(past.wrap(listing(0, 25)), Err(ApiError::NotFound(_))));
    }
}
