//! Row partitioning and scoped worker fan-out.
//!
//! Work over a batch is split into contiguous, non-overlapping row ranges.
//! Every range is handed to its own scoped thread, which returns a private
//! result. Results come back in range order once all threads have joined,
//! so callers can reduce them deterministically.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::OnceLock;
use std::thread;

use log::{ trace, warn };


/// Number of workers to fan out to.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
  /// One worker per available hardware thread.
  #[default]
  Available,
  /// A fixed number of workers.
  Fixed(NonZeroUsize),
}

impl Parallelism {
  /// Run everything on the calling thread.

  pub fn single() -> Self {
    Self::Fixed(NonZeroUsize::MIN)
  }

  /// Use `workers` threads. Zero is treated as one.

  pub fn fixed(workers: usize) -> Self {
    Self::Fixed(NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN))
  }

  /// Number of workers. The available parallelism is queried
  /// once per process and reused afterwards.

  pub fn degree(&self) -> usize {
    match self {
      Self::Fixed(n) => n.get(),
      Self::Available => available(),
    }
  }
}

fn available() -> usize {
  static AVAILABLE: OnceLock<usize> = OnceLock::new();
  *AVAILABLE.get_or_init(|| {
    thread::available_parallelism()
      .map(NonZeroUsize::get)
      .unwrap_or_else(|err| {
        warn!("Could not query available parallelism, using one worker: {err}");
        1
      })
  })
}


/// Splits `0..len` into at most `workers` contiguous ranges
/// whose lengths differ by no more than one.

pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
  let workers = workers.clamp(1, len.max(1));
  if len == 0 { return vec![] }
  let base = len / workers;
  let remainder = len % workers;
  let mut start = 0;
  (0..workers).map(|w| {
    let end = start + base + if w < remainder { 1 } else { 0 };
    let range = start..end;
    start = end;
    range
  }).collect()
}


/// Runs `job` once per row range and returns the results in range order.
///
/// Returns only after every worker has finished. A single range
/// is processed on the calling thread.

pub fn fan_out<P, F>(parallelism: Parallelism, len: usize, job: F) -> Vec<P>
where
  P: Send,
  F: Fn(Range<usize>) -> P + Sync,
{
  let ranges = partition(len, parallelism.degree());
  trace!("Fanning out {len} rows to {} workers", ranges.len());
  if ranges.len() <= 1 {
    return ranges.into_iter().map(job).collect()
  }
  let job = &job;
  thread::scope(|s| {
    let handles: Vec<_> = ranges.into_iter()
      .map(|range| s.spawn(move || job(range) ))
      .collect();
    handles.into_iter()
      .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic) ))
      .collect()
  })
}
