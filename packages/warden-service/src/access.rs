use serde::{Deserialize, Serialize};

use crate::{Result, WardenService};

pub const DEFAULT_ACTION: &str = "read";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessCheckRequest {
	pub principal: String,
	pub resource: String,
	pub action: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccessCheckResponse {
	pub principal: String,
	pub resource: String,
	pub action: String,
	pub allowed: bool,
}

impl WardenService {
	pub fn can_access(&self, req: AccessCheckRequest) -> Result<AccessCheckResponse> {
		let principal = crate::require_principal(&req.principal)?.to_string();
		let action = req.action.unwrap_or_else(|| DEFAULT_ACTION.to_string());
		let allowed = self.policy.can_access(&principal, &req.resource, &action);

		Ok(AccessCheckResponse { principal, resource: req.resource, action, allowed })
	}
}
