//! Mock indexer for testing without network calls.

use super::{ChainIndexer, IndexerError};
use crate::http::HttpError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MockIndexer {
    block_seqno: u64,
    jetton_wallets: HashMap<String, String>,
    fail: bool,
    block_lookups: AtomicUsize,
}

impl MockIndexer {
    pub fn new(block_seqno: u64) -> Self {
        Self {
            block_seqno,
            ..Default::default()
        }
    }

    /// Jetton wallet returned for `master`, whatever the owner.
    pub fn with_jetton_wallet(mut self, master: impl Into<String>, wallet: impl Into<String>) -> Self {
        self.jetton_wallets.insert(master.into(), wallet.into());
        self
    }

    /// Make block and jetton wallet lookups fail with a transport error.
    /// Address parsing keeps working.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn block_lookups(&self) -> usize {
        self.block_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), IndexerError> {
        if self.fail {
            return Err(IndexerError::Http(HttpError::Status {
                status: 503,
                message: "indexer unavailable".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainIndexer for MockIndexer {
    async fn latest_block_seqno(&self) -> Result<u64, IndexerError> {
        self.block_lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.block_seqno)
    }

    async fn jetton_wallet_address(
        &self,
        _owner: &str,
        master: &str,
    ) -> Result<String, IndexerError> {
        self.check()?;
        Ok(self
            .jetton_wallets
            .get(master)
            .cloned()
            .unwrap_or_else(|| format!("0:wallet-of-{}", master)))
    }

    async fn raw_address(&self, address: &str) -> Result<String, IndexerError> {
        if address.contains(':') {
            Ok(address.to_string())
        } else {
            Ok(format!("0:{}", address.to_ascii_lowercase()))
        }
    }
}
