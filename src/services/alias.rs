// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deterministic display pseudonyms for spotters.
//!
//! Distinct user IDs may map to the same alias. Aliases are for display
//! only and never used as keys.

const ADJECTIVES: [&str; 29] = [
    "Audaz",
    "Valiente",
    "Calmo",
    "Astuto",
    "Curioso",
    "Veloz",
    "Elegante",
    "Leal",
    "Amistoso",
    "Gentil",
    "Grandioso",
    "Honorable",
    "Intrépido",
    "Jovial",
    "Agudo",
    "Misterioso",
    "Noble",
    "Observador",
    "Pacífico",
    "Rápido",
    "Silencioso",
    "Firme",
    "Confiable",
    "Vigilante",
    "Sabio",
    "Juguetón",
    "Resplandeciente",
    "Triunfante",
    "Urbano",
];

const NOUNS: [&str; 29] = [
    "Halcón",
    "Paloma",
    "Gorrión",
    "Águila",
    "Zorzal",
    "Cardenal",
    "Vencejo",
    "Colibrí",
    "Mirlo",
    "Búho",
    "Cernícalo",
    "Gavilán",
    "Patrullero",
    "Vigía",
    "Explorador",
    "Guardián",
    "Mensajero",
    "Navegante",
    "Pionero",
    "Rastreador",
    "Vagabundo",
    "Centinela",
    "Viajero",
    "Observador",
    "Cazador",
    "Correcaminos",
    "Defensor",
    "Maestro",
    "Líder",
];

/// 32-bit string hash over UTF-16 code units (`h * 31 + c`, wrapping).
fn simple_hash(input: &str) -> u32 {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    hash.unsigned_abs()
}

/// Generate the alias shown for a user, e.g. `"Audaz Halcón"`.
pub fn generate_alias(user_id: &str) -> String {
    let hash = simple_hash(user_id);
    let adjective = ADJECTIVES[hash as usize % ADJECTIVES.len()];
    // Shifted hash picks the noun so the two words vary independently
    let noun = NOUNS[(hash >> 8) as usize % NOUNS.len()];
    format!("{} {}", adjective, noun)
}
