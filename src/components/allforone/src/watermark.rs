//!
//! The last height at which a payout was accepted, per (chain, account).
//!
//! The next window starts right after it, so a window is never paid twice
//! and a window whose payout failed is reconsidered by the next trigger.
//! Before the first payout it holds the start of the first window.
//!

use {
    ruc::*,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        fs,
        path::{Path, PathBuf},
    },
};

const WATERMARK_FILE: &str = "watermarks.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub chain: u32,
    pub account: u64,
    pub last_distributed_height: u64,
}

/// Watermarks kept in memory, and mirrored to disk when opened on a dir.
#[derive(Debug, Default)]
pub struct WatermarkStore {
    path: Option<PathBuf>,
    entries: BTreeMap<(u32, u64), u64>,
}

impl WatermarkStore {
    /// A store that forgets everything on exit.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load, or create, the store under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).c(d!(format!("cannot create {}", dir.display())))?;
        let path = dir.join(WATERMARK_FILE);

        let mut entries = BTreeMap::new();
        if path.exists() {
            let content = fs::read(&path).c(d!())?;
            let saved = serde_json::from_slice::<Vec<Watermark>>(&content)
                .c(d!(format!("corrupted watermark file: {}", path.display())))?;
            for w in saved {
                entries.insert((w.chain, w.account), w.last_distributed_height);
            }
        }

        Ok(WatermarkStore {
            path: Some(path),
            entries,
        })
    }

    #[allow(missing_docs)]
    pub fn get(&self, chain: u32, account: u64) -> Option<u64> {
        self.entries.get(&(chain, account)).copied()
    }

    /// Fix where the first window of (chain, account) starts, unless a
    /// watermark already exists.
    ///
    /// Until the first payout goes through, every trigger keeps starting
    /// from this height. The in-memory value is kept if writing it fails.
    pub fn seed(&mut self, chain: u32, account: u64, height: u64) -> Result<()> {
        if self.entries.contains_key(&(chain, account)) {
            return Ok(());
        }
        self.entries.insert((chain, account), height);
        self.persist().c(d!())
    }

    /// Record a payout accepted at `height`.
    ///
    /// The in-memory value moves forward even if writing it to disk fails.
    pub fn advance(&mut self, chain: u32, account: u64, height: u64) -> Result<()> {
        let h = self.entries.entry((chain, account)).or_insert(height);
        if *h < height {
            *h = height;
        }
        self.persist().c(d!())
    }

    fn persist(&self) -> Result<()> {
        let path = match self.path.as_ref() {
            Some(p) => p,
            None => return Ok(()),
        };
        let list = self
            .entries
            .iter()
            .map(|(&(chain, account), &h)| Watermark {
                chain,
                account,
                last_distributed_height: h,
            })
            .collect::<Vec<_>>();
        let content = serde_json::to_vec_pretty(&list).c(d!())?;

        // replace atomically, a crash never leaves a truncated file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).c(d!())?;
        fs::rename(&tmp, path).c(d!())
    }
}
