pub mod error;
pub mod page;
pub mod resolver;
pub mod result;
pub mod verifier;

pub use error::ScanError;
pub use page::{Anchor, HomepageMeta, PageSignals};
pub use resolver::Resolver;
pub use result::{ExternalLinkRecord, FailureReason, LinkFailure, ResolvedTarget};
pub use verifier::LinkVerifier;
