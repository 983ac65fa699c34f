//! Validation and normalization of paymaster JSON-RPC calls.
//!
//! Raw params go in, typed and canonical values come out. A user operation
//! carries no version tag, so [`resolver`] reconstructs it from field
//! presence and the result is carried as an explicit variant from then on.

pub mod authorization;
pub mod context;
pub mod envelope;
pub mod error;
pub mod logger;
pub mod params;
pub mod primitives;
pub mod resolver;
pub mod schema;
pub mod user_operation;

pub use authorization::{PartialAuthorization, SignedAuthorization};
pub use context::{SponsorshipContext, SponsorshipPolicy};
pub use envelope::{JsonRpcRequest, JsonRpcResponse};
pub use error::{Issue, PaymasterError, ValidationError};
pub use params::{
    PaymasterRequest, PaymasterServiceParams, SponsorUserOperationParams, TokenQuotesParams,
};
pub use primitives::HexData;
pub use user_operation::{EntryPointVersion, Factory};
