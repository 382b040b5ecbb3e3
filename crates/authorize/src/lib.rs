//! The payment authorization state machine: the top-level `authorize`
//! entry point dispatches a request to the single-resource, cart, or
//! refund path by `resource_id` prefix, each of which runs proof parsing,
//! signature pre-claim, on-chain verification, amount matching, ledger
//! sealing, and best-effort coupon consumption.

mod cart;
mod collaborators;
mod config;
mod error;
mod ledger;
mod onchain;
mod outcome;
mod refund;
mod request;
mod single;

pub use self::{
    cart::{CartAuthorizationRequest, authorize_cart, create_cart},
    collaborators::{CouponRepository, Observability, ProductRepository, SubscriptionChecker, notify_observer},
    config::AuthorizeConfig,
    error::{Error, Result},
    onchain::{OnChainAuthorizationParams, VerifiedSettlement, authorize_on_chain, build_requirement},
    outcome::{AuthorizationOutcome, Settlement},
    refund::{RefundAuthorizationRequest, RefundCreationRequest, authorize_refund, create_refund_request, deny_refund_request, refund_quote_id, regenerate_refund_quote},
    request::{AuthorizeRequest, DispatchPath},
    single::{SingleAuthorizationRequest, authorize_single},
};

use paywall_chain_solana::{ChainClient, ConfirmationSubscriber};
use paywall_store::Store;
use paywall_wallet_pool::WalletPool;
use tokio_util::sync::CancellationToken;

/// Every collaborator the top-level [`authorize`] entry point needs,
/// gathered into one struct for the same reason
/// [`OnChainAuthorizationParams`] is — the alternative is a long positional
/// argument list repeated at every dispatch call site.
pub struct Collaborators<'a> {
    pub products: &'a dyn ProductRepository,
    pub coupons: &'a dyn CouponRepository,
    pub subscriptions: Option<&'a dyn SubscriptionChecker>,
    pub store: &'a dyn Store,
    pub client: &'a dyn ChainClient,
    pub subscriber: Option<&'a dyn ConfirmationSubscriber>,
    pub wallet_pool: Option<&'a WalletPool>,
    pub observability: &'a dyn Observability,
}

/// The top-level `Authorize(resource_id, fiat_session?, proof?,
/// coupon_code?)` entry point. Dispatch is entirely by `resource_id`
/// prefix — see [`AuthorizeRequest::dispatch_path`] — to one of three
/// independent paths, each of which resolves to exactly one
/// [`AuthorizationOutcome`] variant.
#[tracing::instrument(skip_all, fields(resource_id = %request.resource_id))]
pub async fn authorize(request: &AuthorizeRequest, collaborators: &Collaborators<'_>, config: &AuthorizeConfig, cancel: &CancellationToken) -> Result<AuthorizationOutcome> {
    match request.dispatch_path() {
        DispatchPath::Cart => {
            cart::authorize_cart(
                &CartAuthorizationRequest {
                    cart_id: &request.resource_id,
                    proof: request.proof.as_deref(),
                    now: request.now,
                },
                collaborators.store,
                collaborators.client,
                collaborators.subscriber,
                collaborators.wallet_pool,
                collaborators.coupons,
                collaborators.observability,
                config,
                cancel,
            )
            .await
        }
        DispatchPath::Refund => {
            refund::authorize_refund(
                &RefundAuthorizationRequest {
                    refund_id: &request.resource_id,
                    proof: request.proof.as_deref(),
                    now: request.now,
                },
                collaborators.store,
                collaborators.client,
                collaborators.subscriber,
                collaborators.observability,
                config,
                cancel,
            )
            .await
        }
        DispatchPath::Single => {
            single::authorize_single(
                &SingleAuthorizationRequest {
                    resource_id: &request.resource_id,
                    wallet: request.wallet.as_deref(),
                    coupon_code: request.coupon_code.as_deref(),
                    proof: request.proof.as_deref(),
                    fiat_session_present: request.fiat_session.is_some(),
                    now: request.now,
                },
                collaborators.products,
                collaborators.coupons,
                collaborators.subscriptions,
                collaborators.store,
                collaborators.client,
                collaborators.subscriber,
                collaborators.wallet_pool,
                collaborators.observability,
                config,
                cancel,
            )
            .await
        }
    }
}
