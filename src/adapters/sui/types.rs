//! Sui JSON-RPC request/response type definitions.
//!
//! Only the fields the sweeper reads are modelled; everything else is
//! ignored by serde. Numeric amounts arrive as decimal strings.

use serde::Deserialize;
use serde_json::Value;

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcEnvelope {
  pub result: Option<Value>,
  pub error: Option<RpcErrorBody>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct RpcErrorBody {
  pub code: i64,
  pub message: String,
}

/// `sui_getObject` / `sui_multiGetObjects` element.
#[derive(Debug, Deserialize)]
pub struct ObjectResponse {
  pub data: Option<ObjectDto>,
  pub error: Option<ObjectResponseError>,
}

/// Per-object error (e.g. `notExists`, `deleted`).
#[derive(Debug, Deserialize)]
pub struct ObjectResponseError {
  pub code: String,
  pub object_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDto {
  pub object_id: String,
  pub version: String,
  #[serde(rename = "type")]
  pub type_tag: Option<String>,
  pub content: Option<Value>,
  pub storage_rebate: Option<String>,
}

/// `suix_getDynamicFields` page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldPage {
  pub data: Vec<DynamicFieldInfo>,
  pub next_cursor: Option<String>,
  pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFieldInfo {
  pub name: DynamicFieldName,
  pub object_id: String,
  pub object_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DynamicFieldName {
  #[serde(rename = "type")]
  pub type_tag: String,
  pub value: Value,
}

/// `unsafe_batchTransaction` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBytes {
  pub tx_bytes: String,
}

/// `sui_executeTransactionBlock` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
  pub digest: String,
  pub effects: Option<EffectsDto>,
  #[serde(default)]
  pub balance_changes: Vec<BalanceChangeDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectsDto {
  pub status: StatusDto,
  pub gas_used: GasUsedDto,
}

#[derive(Debug, Deserialize)]
pub struct StatusDto {
  pub status: String,
  pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasUsedDto {
  pub computation_cost: String,
  pub storage_cost: String,
  pub storage_rebate: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChangeDto {
  pub owner: Value,
  pub coin_type: String,
  pub amount: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_dynamic_field_page_parses() {
    let page: DynamicFieldPage = serde_json::from_value(json!({
      "data": [{
        "name": { "type": "u64", "value": "1" },
        "bcsName": "ignored",
        "objectId": "0xabc",
        "objectType": "0x2::dynamic_field::Field<u64, 0xdee9::pool::PoolInner>",
        "version": 7,
        "digest": "x"
      }],
      "nextCursor": "0xabc",
      "hasNextPage": false
    }))
    .unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name.type_tag, "u64");
    assert!(!page.has_next_page);
  }

  #[test]
  fn test_execute_response_parses_gas_strings() {
    let resp: ExecuteResponse = serde_json::from_value(json!({
      "digest": "D1",
      "effects": {
        "status": { "status": "success" },
        "gasUsed": {
          "computationCost": "1000000",
          "storageCost": "2000000",
          "storageRebate": "9000000",
          "nonRefundableStorageFee": "0"
        }
      }
    }))
    .unwrap();
    let effects = resp.effects.unwrap();
    assert_eq!(effects.status.status, "success");
    assert_eq!(effects.gas_used.storage_rebate, "9000000");
    assert!(resp.balance_changes.is_empty());
  }
}
