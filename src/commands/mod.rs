//! Typed command surface.
//!
//! Every method here only shapes arguments into a [`Cmd`](crate::cmd::Cmd) and picks the
//! reply type; pooling, timing, logging and release all happen in
//! [`Client::execute_with`](crate::Client::execute_with). Nothing is retried.

mod counters;
mod hashes;
mod hyperloglog;
mod keys;
mod lists;
mod pubsub;
mod sets;
mod sorted_sets;
mod strings;
