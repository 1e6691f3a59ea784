//! The offline-signed transaction submission pipeline

mod call;
mod deploy;
mod submitter;

pub use call::{encode_call, PendingCall};
pub use deploy::{Deployer, Deployment};
pub use submitter::{load_signing_key, parse_signing_key, Submission, Submitter};
