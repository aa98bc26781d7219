pub mod connectivity;
pub mod fingerprint;
pub mod location;
