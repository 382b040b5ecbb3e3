pub mod assets;
pub mod builders;
pub mod fakes;
pub mod proof;
