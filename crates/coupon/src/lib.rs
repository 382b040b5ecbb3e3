mod error;
mod selector;
mod stacking;
mod types;

pub use self::{
    error::{Error, Result},
    selector::select_coupons_for_payment,
    stacking::stack_coupons_on_money,
    types::{
        ApplyAtScope, Applicability, Coupon, DiscountKind, PaymentMethod, PaymentMethodFilter, SelectScope,
    },
};
