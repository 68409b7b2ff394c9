//!
//! Turns the node's block height into a stream of "new block" events.
//!

use {
    crate::ledger::Ledger,
    ruc::*,
    std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    },
    tracing::warn,
};

/// Polls the ledger height and reports every height it moved through.
pub struct BlockPoller<L: Ledger + ?Sized> {
    ledger: Arc<L>,
    interval: Duration,
    last: Option<u64>,
}

impl<L: Ledger + ?Sized> BlockPoller<L> {
    #[allow(missing_docs)]
    pub fn new(ledger: Arc<L>, interval: Duration) -> Self {
        BlockPoller {
            ledger,
            interval,
            last: None,
        }
    }

    /// Call `f` once for every height after the last one seen, up to the
    /// current one, in increasing order.
    ///
    /// The first poll only reports the current height.
    pub fn poll<F: FnMut(u64)>(&mut self, mut f: F) -> Result<usize> {
        let current = self.ledger.current_height().c(d!())?;
        let from = match self.last {
            Some(last) if last >= current => return Ok(0),
            Some(last) => last + 1,
            None => current,
        };
        (from..=current).for_each(&mut f);
        self.last = Some(current);
        Ok((current - from + 1) as usize)
    }

    /// Poll until `exiting` is set.
    ///
    /// A failed poll is logged and retried on the next tick.
    pub fn run<F: FnMut(u64)>(&mut self, exiting: &AtomicBool, mut f: F) {
        while !exiting.load(Ordering::Acquire) {
            if let Err(e) = self.poll(&mut f) {
                warn!("cannot read the block height: {e}");
            }
            thread::sleep(self.interval);
        }
    }
}
