pub mod client;
pub mod config;
pub mod types;

pub use client::PortalClient;
pub use config::PortalConfig;
pub use types::{
    AgentCapability, AgentCard, ProvisionState, ProvisionStatus, ProvisionStep,
    TemplateInfo, TemplateParameter,
};
