//! Distance de compatibilité entre deux pistes (tempo + tonalité)
//!
//! Plus la distance est faible, plus l'enchaînement est naturel pour un DJ.

use pmospotify::AudioFeatures;

/// Pénalité quand l'un des deux tempos est inconnu
const MISSING_TEMPO_PENALTY: f64 = 50.0;

/// Pénalité quand l'une des deux tonalités est inconnue
const MISSING_KEY_PENALTY: f64 = 5.0;

/// Poids de l'écart de tempo (en BPM)
const TEMPO_WEIGHT: f64 = 0.5;

/// Écart de tempo en BPM, en acceptant le demi et le double tempo
pub fn tempo_gap(target: f64, candidate: f64) -> f64 {
    [candidate, candidate * 2.0, candidate / 2.0]
        .into_iter()
        .map(|t| (target - t).abs())
        .fold(f64::INFINITY, f64::min)
}

/// Découpe une tonalité textuelle (`"C#"`, `"Ebm"`, `"am"`) en
/// (classe de hauteur, mineur)
pub fn parse_key(label: &str) -> Option<(u8, bool)> {
    let label = label.trim();
    let (root, minor) = match label.strip_suffix(['m', 'M']) {
        Some(root) if !root.is_empty() => (root, true),
        _ => (label, false),
    };

    let pitch = match root.to_ascii_uppercase().as_str() {
        "C" => 0,
        "C#" | "DB" => 1,
        "D" => 2,
        "D#" | "EB" => 3,
        "E" => 4,
        "F" => 5,
        "F#" | "GB" => 6,
        "G" => 7,
        "G#" | "AB" => 8,
        "A" => 9,
        "A#" | "BB" => 10,
        "B" => 11,
        _ => return None,
    };

    Some((pitch, minor))
}

/// Distance entre deux tonalités textuelles
///
/// - 0 : même tonalité, même mode
/// - 1 : même tonique, mode opposé
/// - 2 : voisines (1, 5, 7 ou 11 demi-tons)
/// - 3 : l'une des deux est illisible
/// - 4 : autre
pub fn key_distance(a: &str, b: &str) -> u8 {
    let (Some((pa, ma)), Some((pb, mb))) = (parse_key(a), parse_key(b)) else {
        return 3;
    };

    if pa == pb {
        return if ma == mb { 0 } else { 1 };
    }

    let interval = (12 + pa - pb) % 12;
    match interval.min(12 - interval) {
        1 | 5 => 2,
        _ => 4,
    }
}

/// Distance de compatibilité entre la piste en cours et un candidat
pub fn compatibility_distance(target: &AudioFeatures, candidate: &AudioFeatures) -> f64 {
    let tempo = match (target.tempo, candidate.tempo) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => tempo_gap(a, b) * TEMPO_WEIGHT,
        _ => MISSING_TEMPO_PENALTY,
    };

    let key = match (target.key_label(), candidate.key_label()) {
        (Some(a), Some(b)) => f64::from(key_distance(a, b)),
        _ => MISSING_KEY_PENALTY,
    };

    tempo + key
}

/// Explication lisible de la distance, affichée aux invités
pub fn reason_text(target: &AudioFeatures, candidate: &AudioFeatures) -> String {
    let mut parts = Vec::new();

    if let (Some(a), Some(b)) = (target.tempo, candidate.tempo) {
        if a.is_finite() && b.is_finite() {
            parts.push(format!(
                "tempo ~{} (Δ≈{})",
                a.round(),
                tempo_gap(a, b).round()
            ));
        }
    }

    if let (Some(a), Some(b)) = (target.key_label(), candidate.key_label()) {
        parts.push(format!("clé {} ↔ {}", a, b));
    }

    if parts.is_empty() {
        "Similaire".to_string()
    } else {
        parts.join(" • ")
    }
}
