//! Blockchain indexer abstraction used to pin emulation context.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod tonapi;

pub use mock::MockIndexer;
pub use tonapi::TonApiIndexer;

/// Read-only chain lookups needed before a (token, size) group can run.
#[async_trait]
pub trait ChainIndexer: Send + Sync + fmt::Debug {
    /// Latest masterchain block sequence number.
    async fn latest_block_seqno(&self) -> Result<u64, IndexerError>;

    /// Jetton wallet of `owner` for the jetton `master`, raw form.
    async fn jetton_wallet_address(&self, owner: &str, master: &str)
        -> Result<String, IndexerError>;

    /// Raw `workchain:hex` form of any address representation.
    async fn raw_address(&self, address: &str) -> Result<String, IndexerError>;
}

#[derive(Debug, Clone, Error)]
pub enum IndexerError {
    #[error("indexer request failed: {0}")]
    Http(#[from] crate::http::HttpError),
    #[error("indexer returned no {0}")]
    Missing(&'static str),
}
