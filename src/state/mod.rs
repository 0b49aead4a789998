pub mod buffer_account;
pub mod delegation_record;
pub mod user_account;

pub use buffer_account::*;
pub use delegation_record::*;
pub use user_account::*;
