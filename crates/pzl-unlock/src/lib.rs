//! pzl-unlock: interactive walk over an encrypted puzzle chain
//!
//! ```text
//! Presenting(link) ──terminal──────────────▶ Done          (exit 0)
//!        │
//!        ├──right answer──▶ Presenting(next)
//!        │
//!        └──wrong answer──▶ Failed(answer)                  (exit 1)
//! ```

pub mod engine;

pub use engine::{run_puzzle, Outcome, UnlockState, Unlocker};
