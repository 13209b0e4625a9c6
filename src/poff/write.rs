//! The rewrite path (§4.2): an optimizer pass builds its output into a
//! fresh [`ContainerBuilder`], and only once that pass has fully succeeded
//! is it swapped in as the new container. This keeps a failed pass from
//! leaving the caller with a half-rewritten program.

use alloc::vec::Vec;

#[cfg(feature = "logging")]
use log::debug;

use crate::poff::container::ContainerBuilder;

/// Owns the container currently being rewritten and the in-progress
/// replacement. Each optimizer pass calls [`RewriteSession::begin`], writes
/// its output into the returned builder, then calls
/// [`RewriteSession::commit`] to swap it in, or drops the session to
/// discard the attempt and keep the previous bytes.
pub struct RewriteSession {
    current: Vec<u8>,
}

impl RewriteSession {
    pub fn new(initial: Vec<u8>) -> RewriteSession {
        RewriteSession { current: initial }
    }

    /// The bytes of the container as of the last successful commit.
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// Start a fresh builder for the next pass to write into.
    pub fn begin(&self, builder: ContainerBuilder) -> PendingRewrite {
        PendingRewrite { builder }
    }

    /// Replace the current container with the pending one.
    pub fn commit(&mut self, pending: PendingRewrite) {
        self.current = pending.builder.to_vec();
        #[cfg(feature = "logging")]
        debug!(
            "RewriteSession: committed a rewrite, container is now {} byte(s)",
            self.current.len()
        );
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.current
    }
}

/// A not-yet-committed rewrite of a [`RewriteSession`]'s container.
pub struct PendingRewrite {
    builder: ContainerBuilder,
}

impl PendingRewrite {
    pub fn builder_mut(&mut self) -> &mut ContainerBuilder {
        &mut self.builder
    }
}
