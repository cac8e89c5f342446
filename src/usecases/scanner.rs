//! Order Book Scanner Use Case - Drain, fetch and decode both book sides
//!
//! Scan flow per side:
//! 1. Drain the collection's children via cursor pagination
//! 2. Fetch the children in sequential multi-get groups
//! 3. Decode every returned object with the tagged decoder
//!
//! Read-side failures shrink the result, they never abort it: a failed
//! page ends the drain with what was collected, a failed group contributes
//! nothing, an undecodable object is dropped.

use std::collections::HashSet;
use std::ops::AddAssign;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::decode::decode_object;
use crate::domain::order::{ObjectId, Order, Side};
use crate::domain::pool::BookCollections;
use crate::ports::object_gateway::ObjectGateway;

/// Default children per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default ids per multi-get group.
pub const DEFAULT_MULTI_GET_SIZE: usize = 50;

/// Page and group sizing.
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
  pub page_size: usize,
  pub multi_get_size: usize,
}

impl Default for ScanSettings {
  fn default() -> Self {
    Self {
      page_size: DEFAULT_PAGE_SIZE,
      multi_get_size: DEFAULT_MULTI_GET_SIZE,
    }
  }
}

/// Counters describing how complete a scan was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
  /// Distinct child ids discovered.
  pub children: usize,
  /// Objects returned by multi-gets.
  pub objects_fetched: usize,
  /// Ids a multi-get reported as absent.
  pub objects_missing: usize,
  /// Objects or slice elements that did not decode.
  pub decode_failures: usize,
  /// Multi-get groups that failed outright.
  pub failed_groups: usize,
  /// Page fetches that failed (ends that side's drain).
  pub failed_pages: usize,
}

impl ScanStats {
  /// Whether any portion of the scan was lost to a fetch failure.
  pub fn is_partial(&self) -> bool {
    self.failed_groups > 0 || self.failed_pages > 0
  }
}

impl AddAssign for ScanStats {
  fn add_assign(&mut self, rhs: Self) {
    self.children += rhs.children;
    self.objects_fetched += rhs.objects_fetched;
    self.objects_missing += rhs.objects_missing;
    self.decode_failures += rhs.decode_failures;
    self.failed_groups += rhs.failed_groups;
    self.failed_pages += rhs.failed_pages;
  }
}

/// Result of draining one collection.
#[derive(Debug, Default)]
pub struct Drain {
  pub child_ids: Vec<ObjectId>,
  pub pages: usize,
  pub failed: bool,
}

/// Orders gathered from one side.
#[derive(Debug, Default)]
pub struct SideScan {
  pub orders: Vec<Order>,
  pub stats: ScanStats,
}

/// Orders gathered from both sides, bids first.
#[derive(Debug, Default)]
pub struct BookScan {
  pub reference_time_ms: u64,
  pub orders: Vec<Order>,
  pub stats: ScanStats,
}

impl BookScan {
  /// Orders expired at the scan's reference time, in discovery order.
  pub fn expired(&self) -> Vec<&Order> {
    self
      .orders
      .iter()
      .filter(|o| o.is_expired_at(self.reference_time_ms))
      .collect()
  }
}

/// Reconstructs outstanding orders from a pool's book collections.
pub struct OrderBookScanner<G: ObjectGateway> {
  gateway: Arc<G>,
  settings: ScanSettings,
}

impl<G: ObjectGateway> OrderBookScanner<G> {
  pub fn new(gateway: Arc<G>, settings: ScanSettings) -> Self {
    Self {
      gateway,
      settings: ScanSettings {
        page_size: settings.page_size.max(1),
        multi_get_size: settings.multi_get_size.max(1),
      },
    }
  }

  /// Drain every child id of `collection_id`.
  ///
  /// Stops when the gateway reports no more pages, the cursor is absent
  /// or repeats, or after `max_pages` pages when a cap is given.
  pub async fn drain_collection(&self, collection_id: &str, max_pages: Option<usize>) -> Drain {
    let mut drain = Drain::default();
    let mut seen_ids: HashSet<ObjectId> = HashSet::new();
    let mut seen_cursors: HashSet<String> = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
      if max_pages.is_some_and(|cap| drain.pages >= cap) {
        break;
      }

      let page = match self
        .gateway
        .get_children(collection_id, cursor.as_deref(), self.settings.page_size)
        .await
      {
        Ok(page) => page,
        Err(e) => {
          warn!(collection_id, pages = drain.pages, error = %e, "Page fetch failed, keeping collected ids");
          drain.failed = true;
          break;
        }
      };
      drain.pages += 1;

      for item in page.items {
        if seen_ids.insert(item.object_id.clone()) {
          drain.child_ids.push(item.object_id);
        }
      }

      if !page.has_more {
        break;
      }
      match page.next_cursor {
        Some(next) if seen_cursors.insert(next.clone()) => cursor = Some(next),
        Some(next) => {
          warn!(collection_id, cursor = %next, "Cursor repeated, ending drain");
          break;
        }
        None => break,
      }
    }

    debug!(collection_id, pages = drain.pages, children = drain.child_ids.len(), "Collection drained");
    drain
  }

  /// Scan one side: drain, fetch in groups, decode.
  #[instrument(skip(self), fields(side = %side))]
  pub async fn scan_side(&self, collection_id: &str, side: Side, reference_time_ms: u64) -> SideScan {
    let drain = self.drain_collection(collection_id, None).await;
    let mut scan = SideScan {
      orders: Vec::new(),
      stats: ScanStats {
        children: drain.child_ids.len(),
        failed_pages: usize::from(drain.failed),
        ..ScanStats::default()
      },
    };

    for group in drain.child_ids.chunks(self.settings.multi_get_size) {
      let objects = match self.gateway.multi_get_objects(group).await {
        Ok(objects) => objects,
        Err(e) => {
          warn!(collection_id, group_size = group.len(), error = %e, "Multi-get group failed");
          scan.stats.failed_groups += 1;
          continue;
        }
      };

      for (id, object) in group.iter().zip(objects) {
        let Some(object) = object else {
          scan.stats.objects_missing += 1;
          continue;
        };
        scan.stats.objects_fetched += 1;

        match decode_object(&object.content, &object.object_id, object.storage_rebate, side) {
          Ok(decoded) => {
            scan.stats.decode_failures += decoded.dropped;
            scan.orders.extend(decoded.orders);
          }
          Err(e) => {
            debug!(object_id = %id, error = %e, "Dropping undecodable object");
            scan.stats.decode_failures += 1;
          }
        }
      }
    }

    let expired = scan.orders.iter().filter(|o| o.is_expired_at(reference_time_ms)).count();
    info!(
      collection_id,
      orders = scan.orders.len(),
      expired,
      partial = scan.stats.is_partial(),
      "Side scanned"
    );
    scan
  }

  /// Scan both sides concurrently and concatenate bids then asks.
  #[instrument(skip(self, collections))]
  pub async fn scan_book(&self, collections: &BookCollections, reference_time_ms: u64) -> BookScan {
    let (bids, asks) = tokio::join!(
      self.scan_side(&collections.bids_id, Side::Bid, reference_time_ms),
      self.scan_side(&collections.asks_id, Side::Ask, reference_time_ms),
    );

    let mut stats = bids.stats;
    stats += asks.stats;

    let mut orders = bids.orders;
    orders.extend(asks.orders);

    BookScan {
      reference_time_ms,
      orders,
      stats,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::order::NEVER_EXPIRES;

  fn order(id: u128, expire: u64) -> Order {
    Order {
      order_id: id,
      owner: "0xowner".to_string(),
      side: Side::Bid,
      price: 1,
      quantity: 1,
      expire_timestamp: expire,
      source_object_id: "0xobj".to_string(),
      incentive_mist: None,
    }
  }

  #[test]
  fn test_book_scan_expired_filter() {
    let scan = BookScan {
      reference_time_ms: 1_000,
      orders: vec![order(1, 999), order(2, NEVER_EXPIRES), order(3, 0), order(4, 1_000)],
      stats: ScanStats::default(),
    };
    let ids: Vec<u128> = scan.expired().iter().map(|o| o.order_id).collect();
    assert_eq!(ids, vec![1]);
  }

  #[test]
  fn test_stats_accumulate() {
    let mut a = ScanStats {
      children: 2,
      failed_groups: 1,
      ..ScanStats::default()
    };
    a += ScanStats {
      children: 3,
      decode_failures: 4,
      ..ScanStats::default()
    };
    assert_eq!(a.children, 5);
    assert_eq!(a.decode_failures, 4);
    assert!(a.is_partial());
  }
}
