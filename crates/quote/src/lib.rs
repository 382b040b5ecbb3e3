mod builder;
mod cart;
mod config;
mod envelope;
mod error;
mod refund;
mod resource;

pub use self::{
    builder::{build_cart_quote, build_refund_envelope, build_single_quote},
    cart::{CartItem, CartQuote},
    config::QuoteConfig,
    envelope::{Extra, FiatQuote, OnChainQuote},
    error::{Error, Result},
    refund::RefundQuote,
    resource::{FiatPrice, OnChainPrice, ResourceDefinition},
};
