//! Utilitaires réseau partagés par les crates PMOParty.
//!
//! - [`guess_local_ip`] : devine l'adresse IP locale utilisée pour les connexions sortantes
//! - [`bind_first_available`] : ouvre un listener TCP en sondant les ports suivants
//!   si le port demandé est déjà occupé
//!
//! # Exemple
//!
//! ```no_run
//! use pmoutils::{bind_first_available, guess_local_ip};
//!
//! let listener = bind_first_available("0.0.0.0", 3000, 20)?;
//! println!("http://{}:{}", guess_local_ip(), listener.local_addr()?.port());
//! # Ok::<(), std::io::Error>(())
//! ```

mod ip;
mod port;

pub use ip::guess_local_ip;
pub use port::bind_first_available;
