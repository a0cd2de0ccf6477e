pub mod signature;

pub use signature::{verify_webhook_signature, SignatureVerifier, SIGNATURE_HEADER};
