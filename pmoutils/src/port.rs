use std::io::{self, ErrorKind};
use std::net::TcpListener;
use tracing::{info, warn};

/// Ouvre un listener TCP sur `host:port`, ou sur le premier port libre qui suit.
///
/// Si le port est déjà occupé (`AddrInUse`), on essaie `port + 1`, `port + 2`, …
/// jusqu'à `attempts` tentatives au total. Toute autre erreur est remontée
/// immédiatement.
///
/// Le listener retourné est en mode non bloquant, prêt pour
/// `tokio::net::TcpListener::from_std`.
pub fn bind_first_available(host: &str, port: u16, attempts: u16) -> io::Result<TcpListener> {
    let attempts = attempts.max(1);
    let mut candidate = port;

    for attempt in 0..attempts {
        match TcpListener::bind((host, candidate)) {
            Ok(listener) => {
                listener.set_nonblocking(true)?;
                if attempt > 0 {
                    info!(requested = port, bound = candidate, "Fallback port selected");
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                warn!("Port {} in use, trying {}", candidate, candidate.wrapping_add(1));
                candidate = match candidate.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        ErrorKind::AddrInUse,
        format!("no free port in {}..{}", port, candidate),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binds_requested_port_when_free() {
        // Port 0 : le système choisit, ce qui garantit un port libre
        let listener = bind_first_available("127.0.0.1", 0, 1).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_skips_port_already_in_use() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let listener = bind_first_available("127.0.0.1", taken_port, 20).unwrap();
        let bound = listener.local_addr().unwrap().port();

        assert_ne!(bound, taken_port);
        assert!(bound > taken_port);
    }

    #[test]
    fn test_gives_up_after_attempts() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let taken_port = taken.local_addr().unwrap().port();

        let err = bind_first_available("127.0.0.1", taken_port, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AddrInUse);
    }
}
