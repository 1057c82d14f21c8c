pub mod money;
pub mod pii;

pub use money::format_peso;
pub use pii::{mask_email, Masked};
