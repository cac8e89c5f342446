//! Sui Object Gateway - JSON-RPC implementation of `ObjectGateway`
//!
//! Maps the port's read operations onto `sui_getObject`,
//! `suix_getDynamicFields` and `sui_multiGetObjects`, and submission onto
//! `unsafe_batchTransaction` (node-side PTB construction) followed by a
//! local signature and `sui_executeTransactionBlock`.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::domain::batch::{BatchDescriptor, CallArg, MoveCall};
use crate::ports::object_gateway::{
    BalanceDelta, ChildRef, CostBreakdown, ExecutionStatus, GatewayError, ObjectData,
    ObjectGateway, Page, SubmissionOutcome,
};
use crate::ports::signer::TransactionSigner;

use super::client::SuiRpcClient;
use super::types::{
    BalanceChangeDto, DynamicFieldPage, ExecuteResponse, ObjectDto, ObjectResponse,
    TransactionBytes,
};

/// Node-side ceiling on ids per `sui_multiGetObjects` request.
pub const MULTI_GET_LIMIT: usize = 50;

/// Object gateway backed by a Sui full node.
#[derive(Debug)]
pub struct SuiObjectGateway {
    client: SuiRpcClient,
}

impl SuiObjectGateway {
    pub fn new(client: SuiRpcClient) -> Self {
        Self { client }
    }

    fn object_options() -> Value {
        json!({
            "showType": true,
            "showContent": true,
            "showStorageRebate": true,
        })
    }

    async fn fetch_group(&self, ids: &[String]) -> Result<Vec<Option<ObjectData>>, GatewayError> {
        let responses: Vec<ObjectResponse> = self
            .client
            .call("sui_multiGetObjects", json!([ids, Self::object_options()]))
            .await?;

        if responses.len() != ids.len() {
            return Err(GatewayError::Malformed(format!(
                "multi-get returned {} entries for {} ids",
                responses.len(),
                ids.len()
            )));
        }

        Ok(responses
            .into_iter()
            .map(|r| r.data.and_then(|dto| into_object_data(dto).ok()))
            .collect())
    }
}

/// Convert an object DTO, rejecting anything that is not a Move object.
fn into_object_data(dto: ObjectDto) -> Result<ObjectData, GatewayError> {
    let content = dto.content.ok_or_else(|| GatewayError::WrongKind {
        object_id: dto.object_id.clone(),
        detail: "no content".to_string(),
    })?;

    let data_type = content.get("dataType").and_then(Value::as_str).unwrap_or_default();
    if data_type != "moveObject" {
        return Err(GatewayError::WrongKind {
            object_id: dto.object_id,
            detail: format!("dataType={data_type}"),
        });
    }

    Ok(ObjectData {
        version: dto.version.parse().unwrap_or(0),
        storage_rebate: dto.storage_rebate.and_then(|s| s.parse().ok()),
        type_tag: dto.type_tag,
        object_id: dto.object_id,
        content,
    })
}

fn render_arg(arg: &CallArg) -> Value {
    match arg {
        CallArg::Object(id) => Value::String(id.clone()),
        CallArg::U128(v) => Value::String(v.to_string()),
        CallArg::U128Vec(vs) => Value::Array(vs.iter().map(|v| Value::String(v.to_string())).collect()),
    }
}

fn render_call(call: &MoveCall) -> Value {
    json!({
        "moveCallRequestParams": {
            "packageObjectId": call.package,
            "module": call.module,
            "function": call.function,
            "typeArguments": call.type_arguments,
            "arguments": call.arguments.iter().map(render_arg).collect::<Vec<_>>(),
        }
    })
}

fn parse_mist(field: &str, value: &str) -> Result<u64, GatewayError> {
    value
        .parse()
        .map_err(|_| GatewayError::Malformed(format!("{field}={value}")))
}

fn into_balance_delta(dto: BalanceChangeDto) -> Option<BalanceDelta> {
    let owner = dto
        .owner
        .get("AddressOwner")
        .or_else(|| dto.owner.get("ObjectOwner"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| dto.owner.to_string());
    Some(BalanceDelta {
        owner,
        coin_type: dto.coin_type,
        amount: dto.amount.parse().ok()?,
    })
}

fn into_outcome(resp: ExecuteResponse) -> Result<SubmissionOutcome, GatewayError> {
    let effects = resp
        .effects
        .ok_or_else(|| GatewayError::Malformed(format!("no effects for {}", resp.digest)))?;

    let status = if effects.status.status == "success" {
        ExecutionStatus::Success
    } else {
        ExecutionStatus::Failure {
            reason: effects
                .status
                .error
                .unwrap_or_else(|| effects.status.status.clone()),
        }
    };

    let gas = &effects.gas_used;
    let cost = CostBreakdown {
        computation: parse_mist("computationCost", &gas.computation_cost)?,
        storage: parse_mist("storageCost", &gas.storage_cost)?,
        storage_rebate: parse_mist("storageRebate", &gas.storage_rebate)?,
    };

    Ok(SubmissionOutcome {
        digest: resp.digest,
        status,
        cost,
        balance_deltas: resp
            .balance_changes
            .into_iter()
            .filter_map(into_balance_delta)
            .collect(),
    })
}

#[async_trait]
impl ObjectGateway for SuiObjectGateway {
    #[instrument(skip(self), level = "debug")]
    async fn get_object(&self, id: &str) -> Result<ObjectData, GatewayError> {
        let resp: ObjectResponse = self
            .client
            .call("sui_getObject", json!([id, Self::object_options()]))
            .await?;

        match (resp.data, resp.error) {
            (Some(dto), _) => into_object_data(dto),
            (None, Some(err)) if err.code == "notExists" || err.code == "deleted" => {
                Err(GatewayError::NotFound(err.object_id.unwrap_or_else(|| id.to_string())))
            }
            (None, Some(err)) => Err(GatewayError::Malformed(format!("{id}: {}", err.code))),
            (None, None) => Err(GatewayError::NotFound(id.to_string())),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn get_children(
        &self,
        parent_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<Page, GatewayError> {
        let page: DynamicFieldPage = self
            .client
            .call("suix_getDynamicFields", json!([parent_id, cursor, limit]))
            .await?;

        debug!(parent_id, items = page.data.len(), has_more = page.has_next_page, "Child page");

        Ok(Page {
            items: page
                .data
                .into_iter()
                .map(|f| ChildRef {
                    object_id: f.object_id,
                    name_type: f.name.type_tag,
                    name_value: f.name.value,
                    object_type: f.object_type,
                })
                .collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_next_page,
        })
    }

    async fn multi_get_objects(&self, ids: &[String]) -> Result<Vec<Option<ObjectData>>, GatewayError> {
        let mut out = Vec::with_capacity(ids.len());
        for group in ids.chunks(MULTI_GET_LIMIT) {
            out.extend(self.fetch_group(group).await?);
        }
        Ok(out)
    }

    #[instrument(skip_all, fields(pool_id = %descriptor.pool_id, batch = descriptor.batch_index))]
    async fn submit(
        &self,
        signer: &dyn TransactionSigner,
        descriptor: &BatchDescriptor,
    ) -> Result<SubmissionOutcome, GatewayError> {
        let calls: Vec<Value> = descriptor.calls.iter().map(render_call).collect();

        let built: TransactionBytes = self
            .client
            .call(
                "unsafe_batchTransaction",
                json!([
                    signer.address(),
                    calls,
                    Value::Null,
                    descriptor.gas_budget.to_string(),
                    Value::Null,
                ]),
            )
            .await?;

        let tx_bytes = B64
            .decode(&built.tx_bytes)
            .map_err(|e| GatewayError::Malformed(format!("txBytes: {e}")))?;

        let signature = signer
            .sign(&tx_bytes)
            .await
            .map_err(|e| GatewayError::Signing(e.to_string()))?;

        let resp: ExecuteResponse = self
            .client
            .call_once(
                "sui_executeTransactionBlock",
                json!([
                    built.tx_bytes,
                    [signature],
                    { "showEffects": true, "showBalanceChanges": true },
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        into_outcome(resp)
    }

    async fn is_healthy(&self) -> bool {
        self.client
            .call::<Value>("sui_getLatestCheckpointSequenceNumber", json!([]))
            .await
            .is_ok()
    }
}
