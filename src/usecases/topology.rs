//! Pool Topology Use Case - Locate the two order-book collections of a pool
//!
//! Resolution walks a fixed chain of wrappers:
//! 1. Root pool object (optionally a `Versioned` wrapper in `inner`)
//! 2. Inner object children, selecting the dynamic field keyed by `u64` 1
//! 3. That child's `value.book` container
//! 4. `bids` / `asks` BigVector ids

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::domain::decode::{lookup, object_id_of};
use crate::domain::order::ObjectId;
use crate::domain::pool::BookCollections;
use crate::ports::object_gateway::{ChildRef, GatewayError, ObjectGateway};

/// Key of the versioned payload under the inner object.
pub const PAYLOAD_VERSION_KEY: u64 = 1;

/// Children requested per page while searching for the payload.
const CHILD_PAGE_SIZE: usize = 50;

/// Pool structure could not be resolved.
#[derive(Debug, Error)]
pub enum TopologyError {
  #[error("failed to fetch {object_id}: {source}")]
  Fetch {
    object_id: ObjectId,
    #[source]
    source: GatewayError,
  },
  #[error("object {object_id} is malformed: {detail}")]
  Malformed { object_id: ObjectId, detail: String },
}

/// Resolves a pool root into its bid and ask collections.
pub struct PoolTopologyResolver<G: ObjectGateway> {
  gateway: Arc<G>,
  max_pages: Option<usize>,
}

impl<G: ObjectGateway> PoolTopologyResolver<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self {
      gateway,
      max_pages: None,
    }
  }

  /// Stop searching the inner object's children after `max_pages` pages.
  pub fn with_max_pages(mut self, max_pages: usize) -> Self {
    self.max_pages = Some(max_pages);
    self
  }

  /// Resolve `pool_id`.
  ///
  /// Returns `Ok(None)` when the pool has no versioned payload yet.
  #[instrument(skip(self))]
  pub async fn resolve(&self, pool_id: &str) -> Result<Option<BookCollections>, TopologyError> {
    let root = self
      .gateway
      .get_object(pool_id)
      .await
      .map_err(|source| TopologyError::Fetch {
        object_id: pool_id.to_string(),
        source,
      })?;

    let inner_id = inner_object_id(&root.content).unwrap_or_else(|| root.object_id.clone());
    debug!(pool_id, inner_id = %inner_id, "Resolved inner object");

    let Some(child) = self.find_payload_child(&inner_id).await? else {
      info!(pool_id, "Pool has no versioned payload");
      return Ok(None);
    };

    let payload = self
      .gateway
      .get_object(&child.object_id)
      .await
      .map_err(|source| TopologyError::Fetch {
        object_id: child.object_id.clone(),
        source,
      })?;

    let collections = book_collections(&payload.content).map_err(|detail| TopologyError::Malformed {
      object_id: child.object_id.clone(),
      detail,
    })?;

    debug!(
      pool_id,
      bids = %collections.bids_id,
      asks = %collections.asks_id,
      "Resolved book collections"
    );
    Ok(Some(collections))
  }

  /// Page through `inner_id`'s children until the payload key shows up.
  ///
  /// Ends with `None` when pages run out, a cursor repeats anywhere in the
  /// walk, or the page cap is reached.
  async fn find_payload_child(&self, inner_id: &str) -> Result<Option<ChildRef>, TopologyError> {
    let mut seen_cursors: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
      if self.max_pages.is_some_and(|cap| pages >= cap) {
        warn!(inner_id, pages, "Page cap reached before payload was found");
        return Ok(None);
      }

      let page = self
        .gateway
        .get_children(inner_id, cursor.as_deref(), CHILD_PAGE_SIZE)
        .await
        .map_err(|source| TopologyError::Fetch {
          object_id: inner_id.to_string(),
          source,
        })?;
      pages += 1;

      if let Some(child) = page.items.into_iter().find(is_payload_key) {
        return Ok(Some(child));
      }

      if !page.has_more {
        return Ok(None);
      }
      match page.next_cursor {
        Some(next) if seen_cursors.insert(next.clone()) => cursor = Some(next),
        Some(next) => {
          warn!(inner_id, cursor = %next, pages, "Cursor repeated, ending payload search");
          return Ok(None);
        }
        None => return Ok(None),
      }
    }
  }
}

/// Id held by a `Versioned` wrapper, if present and non-empty.
fn inner_object_id(content: &Value) -> Option<String> {
  lookup(Some(content), &["fields", "inner", "fields", "id"])
    .and_then(object_id_of)
    .filter(|id| !id.is_empty())
}

fn is_payload_key(child: &ChildRef) -> bool {
  if child.name_type != "u64" {
    return false;
  }
  match &child.name_value {
    Value::String(s) => s.parse::<u64>().ok() == Some(PAYLOAD_VERSION_KEY),
    Value::Number(n) => n.as_u64() == Some(PAYLOAD_VERSION_KEY),
    _ => false,
  }
}

fn book_collections(content: &Value) -> Result<BookCollections, String> {
  let book = lookup(Some(content), &["fields", "value", "fields", "book", "fields"])
    .ok_or_else(|| "missing value.book".to_string())?;

  let side_id = |side: &str| {
    lookup(Some(book), &[side, "fields", "id"])
      .and_then(object_id_of)
      .filter(|id| !id.is_empty())
      .ok_or_else(|| format!("missing book.{side}.id"))
  };

  Ok(BookCollections {
    bids_id: side_id("bids")?,
    asks_id: side_id("asks")?,
  })
}
