//! Helpers shared by unit tests that bind local sockets.

pub(crate) mod socket_guard;
