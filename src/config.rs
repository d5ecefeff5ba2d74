//! Configuration utilities (ports, env vars)

use std::path::PathBuf;
use std::{
    env,
    net::{Ipv4Addr, SocketAddr},
};

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Path of the append-only room log, when enabled via `ROOM_LOG`.
///
/// Unset means no persistence; appends are best-effort either way.
pub fn room_log_path() -> Option<PathBuf> {
    env::var("ROOM_LOG").ok().map(PathBuf::from)
}
