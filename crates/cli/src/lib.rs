// tproof - tamper-proof warehouse table client
// The binary in main.rs is a thin shell over these modules.

pub mod exit_codes;
pub mod logging;
pub mod pipeline;
