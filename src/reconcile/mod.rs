//! Client-side bookkeeping for a game: a local copy kept current by
//! realtime events, plus optimistic edits that roll back on rejection.

mod local;
mod optimistic;
mod reconciler;
mod session;

pub use local::{ApplyOutcome, LocalGame, LocalGuessing};
pub use optimistic::{LocalPatch, MutationId, PatchKey, PendingMutations};
pub use reconciler::{Admission, Reconciler};
pub use session::{Action, ClientSession, Received};
