//! Client side of the complaint intake: form state, submission building and
//! the call to the relay.

pub mod client;
pub mod compose;
pub mod composer;
pub mod errors;
pub mod form;

#[cfg(test)]
mod testutils;
