//! Execution of auto endpoints, stored flows and chain-data operations.
//!
//! Every public entry point returns a result value; failures are folded
//! into `success: false` with an [`ErrorKind`], never raised.

pub mod engine;
pub mod error;
mod http;
pub mod params;
pub mod result;
mod runner;
pub mod web3;

pub use engine::Executor;
pub use error::{ErrorKind, ExecutionError};
pub use params::{params_by_step_from_json, params_from_json, Params, ParamsByStep};
pub use result::{ExecutionResult, FlowExecutionResult, FlowStepResult};
pub use web3::{Web3EndpointInfo, Web3Executor, Web3Provider, Web3Status, DEMO_ADDRESS};
