use async_trait::async_trait;
use mock_paymaster_core::{
    PaymasterError, PaymasterServiceParams, SponsorUserOperationParams, TokenQuotesParams,
};

use crate::types::{PaymasterDataResult, SponsorResult, StubDataResult, TokenQuotesResult};

/// Business logic behind the paymaster methods.
///
/// Params reach the handler already validated and normalized, so an
/// implementation only decides on sponsorship. Failures must use the
/// [`PaymasterError`] taxonomy so callers see a stable error code.
#[async_trait]
pub trait PaymasterHandler: Send + Sync {
    /// `pm_sponsorUserOperation`
    async fn sponsor_user_operation(
        &self,
        params: SponsorUserOperationParams,
    ) -> Result<SponsorResult, PaymasterError>;

    /// `pm_getPaymasterStubData`
    async fn get_paymaster_stub_data(
        &self,
        params: PaymasterServiceParams,
    ) -> Result<StubDataResult, PaymasterError>;

    /// `pm_getPaymasterData`
    async fn get_paymaster_data(
        &self,
        params: PaymasterServiceParams,
    ) -> Result<PaymasterDataResult, PaymasterError>;

    /// `pimlico_getTokenQuotes`
    async fn get_token_quotes(
        &self,
        params: TokenQuotesParams,
    ) -> Result<TokenQuotesResult, PaymasterError>;
}
