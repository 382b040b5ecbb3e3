#![cfg_attr(not(test), no_std)]

mod add_sub;
mod div;
mod mul;
mod mul_div;

pub use self::{add_sub::*, div::*, mul::*, mul_div::*};
