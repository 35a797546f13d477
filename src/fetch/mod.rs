//! Remote access: the fetch/credential seams and the retry loop around them.

mod client;
mod retry;

pub use client::{
    HttpStudyFetcher, RawResponse, StaticTokenProvider, StudyFetcher, TokenProvider,
    TransportError,
};
pub use retry::{AttemptError, RetryExecutor, RetryPolicy, MAX_ATTEMPTS};
