//! Helpers for tests that need a real database or a stand-in payment gateway.
mod mock_gateway;
pub mod prepare_env;

pub use mock_gateway::MockGateway;
