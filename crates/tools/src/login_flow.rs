//! AI-assisted login flow generation.

use asgardeo::{ApplicationPatch, Error, LoginFlowRequest, ManagementApi};
use mcp::{InputSchema, Tool};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::args::Arguments;
use crate::error::Result;
use crate::poller::{Clock, Operation, OperationStatus, Poller};

/// Generation of one login flow, driven by the [`Poller`].
pub struct LoginFlowOperation<'a, C> {
    client: &'a C,
    request: LoginFlowRequest,
}

impl<'a, C: ManagementApi> LoginFlowOperation<'a, C> {
    pub fn new(client: &'a C, user_query: impl Into<String>) -> Self {
        Self {
            client,
            request: LoginFlowRequest {
                user_query: user_query.into(),
            },
        }
    }
}

impl<C: ManagementApi> Operation for LoginFlowOperation<'_, C> {
    type Output = Value;
    type Error = Error;

    async fn submit(&self) -> std::result::Result<Option<String>, Error> {
        let generation = self.client.generate_login_flow(&self.request).await?;
        Ok(generation.operation_id)
    }

    async fn status(
        &self,
        operation_id: &str,
    ) -> std::result::Result<Option<OperationStatus>, Error> {
        let status = self.client.login_flow_status(operation_id).await?;
        Ok(status.status)
    }

    async fn result(&self, operation_id: &str) -> std::result::Result<Value, Error> {
        self.client.login_flow_result(operation_id).await
    }
}

/// Turn a generation result into an `authenticationSequence` patch value.
///
/// The steps may sit under `data` or at the top level of the result.
pub fn authentication_sequence(result: &Value) -> std::result::Result<Value, Error> {
    let flow = result.get("data").unwrap_or(result);
    let steps = flow
        .get("steps")
        .filter(|s| s.as_array().is_some_and(|a| !a.is_empty()))
        .ok_or_else(|| Error::InvalidResponse("generated login flow has no steps".into()))?;

    let mut sequence = Map::new();
    sequence.insert("type".into(), json!("USER_DEFINED"));
    sequence.insert("steps".into(), steps.clone());
    for key in ["script", "subjectStepId", "attributeStepId"] {
        if let Some(value) = flow.get(key) {
            sequence.insert(key.into(), value.clone());
        }
    }
    Ok(Value::Object(sequence))
}

pub(crate) fn tools(product: &str) -> Vec<Tool> {
    vec![Tool::new(
        "update_login_flow",
        format!(
            "Generate a login flow for an application in {product} from a natural language \
             description and apply it."
        ),
        InputSchema::new()
            .string("app_id", "ID of the application to update")
            .string(
                "user_prompt",
                "Description of the login flow. Eg: \"Username and password as first factor \
                 and Email OTP as second factor\"",
            )
            .required("app_id")
            .required("user_prompt"),
    )]
}

pub(crate) async fn update_login_flow<C: ManagementApi, K: Clock>(
    client: &C,
    poller: &Poller<K>,
    args: &Arguments,
) -> Result<String> {
    let app_id: String = args.required("app_id")?;
    let user_prompt: String = args.required("user_prompt")?;

    let generation = LoginFlowOperation::new(client, user_prompt);
    let done = poller.run(&generation, None).await?;
    let sequence = authentication_sequence(&done.result)?;

    let patch = ApplicationPatch {
        authentication_sequence: Some(sequence),
        ..ApplicationPatch::default()
    };
    client.update_application(&app_id, &patch).await?;
    info!(%app_id, operation_id = %done.operation_id, "login flow applied");

    Ok(format!("Login flow updated successfully for application {app_id}."))
}
