use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A2A agent card advertised by the backend agent registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<AgentCapability>,
    pub version: String,
    pub protocol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCapability {
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
}

/// Self-service template descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    pub description: String,
    pub category: String,
    pub parameters: Vec<TemplateParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Progress of one provisioning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionStatus {
    pub request_id: String,
    pub status: ProvisionState,
    pub steps: Vec<ProvisionStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionStep {
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
