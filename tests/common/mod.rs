//! Shared test fixtures: an in-memory object gateway and content builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use deepbook_expiry_sweeper::domain::batch::BatchDescriptor;
use deepbook_expiry_sweeper::domain::order::NEVER_EXPIRES;
use deepbook_expiry_sweeper::ports::object_gateway::{
    ChildRef, CostBreakdown, ExecutionStatus, GatewayError, ObjectData, ObjectGateway, Page,
    SubmissionOutcome,
};
use deepbook_expiry_sweeper::ports::signer::TransactionSigner;

/// In-memory ledger with explicit page layouts and injectable failures.
#[derive(Default)]
pub struct FakeGateway {
    objects: HashMap<String, ObjectData>,
    pages: HashMap<String, Vec<Vec<ChildRef>>>,
    failing_pages: HashSet<(String, usize)>,
    failing_ids: HashSet<String>,
    looping: HashSet<String>,
    cycling: HashSet<String>,
    submit_delay: Option<Duration>,
    submit_results: Mutex<VecDeque<Result<SubmissionOutcome, GatewayError>>>,
    pub submitted: Mutex<Vec<BatchDescriptor>>,
    pub multi_get_sizes: Mutex<Vec<usize>>,
    pub page_requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_object(&mut self, id: &str, content: Value, storage_rebate: Option<u64>) {
        self.objects.insert(
            id.to_string(),
            ObjectData {
                object_id: id.to_string(),
                version: 1,
                type_tag: None,
                content,
                storage_rebate,
            },
        );
    }

    /// Children of `parent`, one inner vec per page.
    pub fn set_pages(&mut self, parent: &str, pages: Vec<Vec<ChildRef>>) {
        self.pages.insert(parent.to_string(), pages);
    }

    /// Register `ids` as plain children of `parent`, split into pages of `page_size`.
    pub fn set_children(&mut self, parent: &str, ids: &[String], page_size: usize) {
        let pages = ids
            .chunks(page_size.max(1))
            .map(|chunk| chunk.iter().map(|id| child(id)).collect())
            .collect();
        self.set_pages(parent, pages);
    }

    pub fn fail_page(&mut self, parent: &str, index: usize) {
        self.failing_pages.insert((parent.to_string(), index));
    }

    /// Every page of `parent` claims more data behind the cursor `page-1`.
    pub fn loop_cursor(&mut self, parent: &str) {
        self.looping.insert(parent.to_string());
    }

    /// The last page of `parent` points back at the first, so cursors run
    /// `page-1`, `page-2`, ..., `page-0`, `page-1` forever.
    pub fn cycle_cursor(&mut self, parent: &str) {
        self.cycling.insert(parent.to_string());
    }

    /// Any multi-get group containing `id` fails.
    pub fn fail_multi_get_for(&mut self, id: &str) {
        self.failing_ids.insert(id.to_string());
    }

    /// Each submission is recorded as executed, then the result takes `delay` to come back.
    pub fn delay_submit(&mut self, delay: Duration) {
        self.submit_delay = Some(delay);
    }

    pub fn push_submit_result(&self, result: Result<SubmissionOutcome, GatewayError>) {
        self.submit_results.lock().unwrap().push_back(result);
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectGateway for FakeGateway {
    async fn get_object(&self, id: &str) -> Result<ObjectData, GatewayError> {
        self.objects
            .get(id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))
    }

    async fn get_children(
        &self,
        parent_id: &str,
        cursor: Option<&str>,
        _limit: usize,
    ) -> Result<Page, GatewayError> {
        self.page_requests
            .lock()
            .unwrap()
            .push((parent_id.to_string(), cursor.map(str::to_string)));

        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| GatewayError::Malformed(format!("bad cursor {c}")))?,
        };

        if self.failing_pages.contains(&(parent_id.to_string(), index)) {
            return Err(GatewayError::Transport("page fetch failed".to_string()));
        }

        let Some(pages) = self.pages.get(parent_id) else {
            return Ok(Page::default());
        };
        let items = pages.get(index).cloned().unwrap_or_default();
        if self.looping.contains(parent_id) {
            return Ok(Page {
                items,
                next_cursor: Some("page-1".to_string()),
                has_more: true,
            });
        }
        if self.cycling.contains(parent_id) {
            return Ok(Page {
                items,
                next_cursor: Some(format!("page-{}", (index + 1) % pages.len().max(1))),
                has_more: true,
            });
        }
        let has_more = index + 1 < pages.len();
        Ok(Page {
            items,
            next_cursor: has_more.then(|| format!("page-{}", index + 1)),
            has_more,
        })
    }

    async fn multi_get_objects(&self, ids: &[String]) -> Result<Vec<Option<ObjectData>>, GatewayError> {
        self.multi_get_sizes.lock().unwrap().push(ids.len());
        if ids.iter().any(|id| self.failing_ids.contains(id)) {
            return Err(GatewayError::Transport("multi-get failed".to_string()));
        }
        Ok(ids.iter().map(|id| self.objects.get(id).cloned()).collect())
    }

    async fn submit(
        &self,
        signer: &dyn TransactionSigner,
        descriptor: &BatchDescriptor,
    ) -> Result<SubmissionOutcome, GatewayError> {
        signer
            .sign(b"fake-tx-bytes")
            .await
            .map_err(|e| GatewayError::Signing(e.to_string()))?;
        self.submitted.lock().unwrap().push(descriptor.clone());
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.submit_results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(success(&format!("digest-{}", descriptor.batch_index), descriptor.order_ids.len())))
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

// ── Content builders ────────────────────────────────────────

pub fn child(id: &str) -> ChildRef {
    ChildRef {
        object_id: id.to_string(),
        name_type: "u64".to_string(),
        name_value: json!("0"),
        object_type: None,
    }
}

pub fn keyed_child(id: &str, key: &str) -> ChildRef {
    ChildRef {
        object_id: id.to_string(),
        name_type: "u64".to_string(),
        name_value: json!(key),
        object_type: None,
    }
}

/// Root pool object wrapping a versioned inner object.
pub fn pool_root(pool_id: &str, inner_id: &str) -> Value {
    json!({
        "dataType": "moveObject",
        "type": "0xdee9::pool::Pool<0x2::sui::SUI, 0xa::usdc::USDC>",
        "fields": {
            "id": { "id": pool_id },
            "inner": { "type": "0x2::versioned::Versioned", "fields": { "id": { "id": inner_id }, "version": "1" } }
        }
    })
}

/// Versioned payload child holding the book.
pub fn payload(bids_id: &str, asks_id: &str) -> Value {
    json!({
        "dataType": "moveObject",
        "fields": {
            "id": { "id": "0xpayload" },
            "name": "1",
            "value": { "fields": { "book": { "fields": {
                "bids": { "fields": { "id": { "id": bids_id }, "length": "0" } },
                "asks": { "fields": { "id": { "id": asks_id }, "length": "0" } }
            } } } }
        }
    })
}

/// Dynamic-field object holding one order (`FieldOrder` shape).
pub fn order_object(order_id: u128, expire_timestamp: u64) -> Value {
    json!({
        "dataType": "moveObject",
        "fields": {
            "name": order_id.to_string(),
            "value": { "fields": {
                "order_id": order_id.to_string(),
                "owner": "0xowner",
                "quantity": "100",
                "expire_timestamp": expire_timestamp.to_string()
            } }
        }
    })
}

/// Slice object (`FieldSlice` shape) holding several orders.
pub fn slice_object(orders: &[(u128, u64)]) -> Value {
    let vals: Vec<Value> = orders
        .iter()
        .map(|(id, expire)| json!({ "fields": {
            "order_id": id.to_string(),
            "balance_manager_id": "0xbm",
            "quantity": "5",
            "expire_timestamp": expire.to_string()
        } }))
        .collect();
    json!({
        "dataType": "moveObject",
        "fields": { "name": "0", "value": { "fields": { "keys": [], "vals": vals } } }
    })
}

pub fn success(digest: &str, orders: usize) -> SubmissionOutcome {
    SubmissionOutcome {
        digest: digest.to_string(),
        status: ExecutionStatus::Success,
        cost: CostBreakdown {
            computation: 1_000_000,
            storage: 500_000,
            storage_rebate: 2_970_000 * orders as u64,
        },
        balance_deltas: Vec::new(),
    }
}

/// A complete pool: root, inner, payload and both sides with one object per order.
///
/// `tag` must be hex so every derived id is a valid object id.
pub struct PoolFixture {
    pub pool_id: String,
    pub bids_id: String,
    pub asks_id: String,
}

impl PoolFixture {
    pub fn install(
        gateway: &mut FakeGateway,
        tag: &str,
        bids: &[(u128, u64)],
        asks: &[(u128, u64)],
        page_size: usize,
    ) -> Self {
        let pool_id = format!("0x{tag}01");
        let inner_id = format!("0x{tag}02");
        let payload_id = format!("0x{tag}03");
        let bids_id = format!("0x{tag}b1");
        let asks_id = format!("0x{tag}a1");

        gateway.insert_object(&pool_id, pool_root(&pool_id, &inner_id), None);
        gateway.set_pages(&inner_id, vec![vec![keyed_child(&payload_id, "1")]]);
        gateway.insert_object(&payload_id, payload(&bids_id, &asks_id), None);

        for (collection, orders, prefix) in [(&bids_id, bids, "c"), (&asks_id, asks, "d")] {
            let ids: Vec<String> = orders
                .iter()
                .map(|(order_id, expire)| {
                    let id = format!("0x{tag}{prefix}0{order_id:x}");
                    gateway.insert_object(&id, order_object(*order_id, *expire), Some(2_964_000));
                    id
                })
                .collect();
            gateway.set_children(collection, &ids, page_size);
        }

        Self {
            pool_id,
            bids_id,
            asks_id,
        }
    }
}

/// `n` orders that never expire, ids starting at `first`.
pub fn live_orders(first: u128, n: usize) -> Vec<(u128, u64)> {
    (0..n as u128).map(|i| (first + i, NEVER_EXPIRES)).collect()
}
