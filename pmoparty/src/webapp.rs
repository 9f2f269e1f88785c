//! Pages invité et admin embarquées dans le binaire

use rust_embed::RustEmbed;

/// Contenu de `static/` (`index.html` pour les invités, `admin.html`)
///
/// Servi à la racine par [`PartyServerExt::init_party`](crate::PartyServerExt::init_party).
#[derive(RustEmbed, Clone)]
#[folder = "static"]
pub struct PartyWebapp;
