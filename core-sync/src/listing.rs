//! Paginated child listings and single-name lookups

use bridge_traits::remote::{ChildQuery, RemoteObject, RemoteStore};
use core_runtime::config::ResolutionMode;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Children collected from one or more pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub objects: Vec<RemoteObject>,
    /// Set when the item limit stopped collection before the last page
    pub truncated: bool,
}

impl Listing {
    /// Every object in the listing named `name`
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RemoteObject> + 'a {
        self.objects.iter().filter(move |object| object.name == name)
    }
}

/// Follow `nextPageToken` until exhausted or `limit` objects are collected.
pub async fn collect_children(
    store: &dyn RemoteStore,
    query: &ChildQuery,
    limit: Option<usize>,
) -> Result<Listing> {
    let mut listing = Listing::default();
    let mut page_token = None;
    let mut pages = 0usize;

    loop {
        let page = store.list_children(query, page_token.take()).await?;
        pages += 1;
        listing.objects.extend(page.objects);

        if let Some(limit) = limit {
            let more_pending = page.next_page_token.is_some();
            if listing.objects.len() > limit || (listing.objects.len() == limit && more_pending) {
                listing.objects.truncate(limit);
                listing.truncated = true;
                warn!(
                    parent_id = %query.parent_id,
                    limit,
                    "Listing truncated at item limit"
                );
                break;
            }
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    debug!(
        parent_id = %query.parent_id,
        count = listing.objects.len(),
        pages,
        "Collected children"
    );
    Ok(listing)
}

/// Choose one object among same-named candidates.
///
/// `FirstMatch` takes the first in store order; `Strict` refuses to choose.
pub fn select_candidate(
    mut candidates: Vec<RemoteObject>,
    mode: ResolutionMode,
    parent_id: &str,
    name: &str,
) -> Result<Option<RemoteObject>> {
    if candidates.len() > 1 {
        match mode {
            ResolutionMode::Strict => {
                return Err(SyncError::AmbiguousMatch {
                    parent_id: parent_id.to_string(),
                    name: name.to_string(),
                    count: candidates.len(),
                })
            }
            ResolutionMode::FirstMatch => {
                debug!(parent_id, name, count = candidates.len(), "Duplicate names, using first match");
            }
        }
    }

    if candidates.is_empty() {
        Ok(None)
    } else {
        Ok(Some(candidates.swap_remove(0)))
    }
}

/// Look up one name under a parent.
///
/// A page may be empty and still carry a continuation token, so pages are
/// followed until a candidate shows up. Strict mode keeps going until a
/// second candidate appears or the token runs out.
pub async fn find_child(
    store: &dyn RemoteStore,
    query: &ChildQuery,
    mode: ResolutionMode,
) -> Result<Option<RemoteObject>> {
    let wanted = match mode {
        ResolutionMode::FirstMatch => 1,
        ResolutionMode::Strict => 2,
    };
    let mut candidates = Vec::new();
    let mut page_token = None;

    loop {
        let page = store.list_children(query, page_token.take()).await?;
        candidates.extend(page.objects);

        match page.next_page_token {
            Some(token) if candidates.len() < wanted => page_token = Some(token),
            _ => break,
        }
    }

    let name = query.name.as_deref().unwrap_or_default();
    select_candidate(candidates, mode, &query.parent_id, name)
}
