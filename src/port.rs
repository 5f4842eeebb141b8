//! Ephemeral local port allocation.

use std::net::TcpListener;

use crate::error::Result;

/// Bind an ephemeral socket to port 0, read back the OS-assigned port and
/// release it.
///
/// The port is free at the instant of the call only: no reservation is
/// held, so another process may grab it before the caller binds. That race
/// is the usual ephemeral-port trade-off and is accepted here.
pub fn free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}
