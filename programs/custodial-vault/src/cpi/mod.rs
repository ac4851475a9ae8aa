//! Cross-program invocation helpers

pub mod spl_token;
pub mod system_program;

pub use self::spl_token::SplTokenCustody;
