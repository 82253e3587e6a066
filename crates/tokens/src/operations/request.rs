//! Client request envelope and flow dispatch.
//!
//! A client starts a flow by naming it and passing its JSON body:
//!
//! ```json
//! {
//!   "clientRequestId": "issue-1",
//!   "flowClassName": "com.r3.token.fungible.workflows.IssueFungibleTokenFlow",
//!   "requestBody": {
//!     "issuer": "CN=Alice, OU=Test Dept, O=R3, L=London, C=GB",
//!     "owner": "CN=Bob, OU=Test Dept, O=R3, L=London, C=GB",
//!     "quantity": 100
//!   }
//! }
//! ```
//!
//! The flow name may be the fully qualified class name, its last segment, or
//! the short form (`issue`, `transfer`, `redeem`, `balance`).

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{IssueTokenRequest, RedeemTokenRequest, TokenBalanceRequest, TransferTokenRequest};
use crate::ledger::{Finalizer, MemberLookup, NotaryLookup, UnspentQuery};
use crate::{TokenError, TokenService};

// ---------------------------------------------------------------------------
// FlowKind
// ---------------------------------------------------------------------------

/// The flows a client can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Issue,
    Transfer,
    Redeem,
    Balance,
}

impl FlowKind {
    /// Last segment of the flow's class name.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Issue => "IssueFungibleTokenFlow",
            Self::Transfer => "TransferFungibleTokenFlow",
            Self::Redeem => "RedeemFungibleTokenFlow",
            Self::Balance => "GetTokenBalanceFlow",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for FlowKind {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.rsplit('.').next().unwrap_or(s);
        [Self::Issue, Self::Transfer, Self::Redeem, Self::Balance]
            .into_iter()
            .find(|k| {
                k.class_name() == short
                    || format!("{k:?}").eq_ignore_ascii_case(short)
            })
            .ok_or_else(|| TokenError::InvalidRequest(format!("unknown flow: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// A flow start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequest {
    pub client_request_id: String,
    pub flow_class_name: String,
    pub request_body: serde_json::Value,
}

/// Terminal state of a started flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    Completed,
    Failed,
}

/// Outcome of a [`ClientRequest`].
///
/// `flow_result` holds the status line of a flow that ran to completion,
/// including one whose finalisation failed. `flow_error` holds the error of
/// a flow that aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub client_request_id: String,
    pub flow_status: FlowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_error: Option<String>,
}

fn body<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, TokenError> {
    T::deserialize(value).map_err(|e| TokenError::InvalidRequest(e.to_string()))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl<M, Q, F> TokenService<M, Q, F>
where
    M: MemberLookup + NotaryLookup,
    Q: UnspentQuery,
    F: Finalizer,
{
    /// Runs the flow named in `request` and reports its status line.
    pub async fn call(&self, request: &ClientRequest) -> ClientResponse {
        let result = self.dispatch(request).await;
        let (flow_status, flow_result, flow_error) = match result {
            Ok(status) => (FlowStatus::Completed, Some(status), None),
            Err(e) => {
                warn!(
                    client_request_id = %request.client_request_id,
                    flow = %request.flow_class_name,
                    error = %e,
                    "flow failed"
                );
                (FlowStatus::Failed, None, Some(e.to_string()))
            }
        };
        ClientResponse {
            client_request_id: request.client_request_id.clone(),
            flow_status,
            flow_result,
            flow_error,
        }
    }

    async fn dispatch(&self, request: &ClientRequest) -> Result<String, TokenError> {
        let body_value = &request.request_body;
        match request.flow_class_name.parse::<FlowKind>()? {
            FlowKind::Issue => {
                self.issue_status(&body::<IssueTokenRequest>(body_value)?)
                    .await
            }
            FlowKind::Transfer => {
                self.transfer_status(&body::<TransferTokenRequest>(body_value)?)
                    .await
            }
            FlowKind::Redeem => {
                self.redeem_status(&body::<RedeemTokenRequest>(body_value)?)
                    .await
            }
            FlowKind::Balance => {
                self.balance_status(&body::<TokenBalanceRequest>(body_value)?)
                    .await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn flow_names_resolve() {
        assert_eq!(
            "com.r3.token.fungible.workflows.IssueFungibleTokenFlow"
                .parse::<FlowKind>()
                .unwrap(),
            FlowKind::Issue
        );
        assert_eq!(
            "GetTokenBalanceFlow".parse::<FlowKind>().unwrap(),
            FlowKind::Balance
        );
        assert_eq!("redeem".parse::<FlowKind>().unwrap(), FlowKind::Redeem);
        assert!(matches!(
            "MintFlow".parse::<FlowKind>(),
            Err(TokenError::InvalidRequest(_))
        ));
    }

    #[test]
    fn request_bodies_use_camel_case() {
        let value = json!({
            "issuer": "CN=Alice, O=R3, L=London, C=GB",
            "owner": "CN=Bob, O=R3, L=London, C=GB",
            "newOwner": "CN=Charlie, O=R3, L=London, C=GB",
            "quantity": "12.50"
        });
        let request: TransferTokenRequest = body(&value).unwrap();
        assert_eq!(request.new_owner, "CN=Charlie, O=R3, L=London, C=GB");
        assert_eq!(request.quantity, dec!(12.50));
    }

    #[test]
    fn numeric_quantities_are_exact() {
        let value = json!({
            "issuer": "CN=Alice, O=R3, L=London, C=GB",
            "owner": "CN=Bob, O=R3, L=London, C=GB",
            "quantity": 100
        });
        let request: IssueTokenRequest = body(&value).unwrap();
        assert_eq!(request.quantity, dec!(100));
    }

    #[test]
    fn malformed_body_is_invalid_request() {
        let value = json!({ "issuer": "CN=Alice, O=R3, L=London, C=GB" });
        assert!(matches!(
            body::<TokenBalanceRequest>(&value),
            Err(TokenError::InvalidRequest(_))
        ));
    }

    #[test]
    fn response_omits_empty_fields() {
        let response = ClientResponse {
            client_request_id: "get-1".into(),
            flow_status: FlowStatus::Completed,
            flow_result: Some("Token balance of Bob is 0.00".into()),
            flow_error: None,
        };
        let text = serde_json::to_string(&response).unwrap();
        assert_eq!(
            text,
            r#"{"clientRequestId":"get-1","flowStatus":"COMPLETED","flowResult":"Token balance of Bob is 0.00"}"#
        );
    }
}
