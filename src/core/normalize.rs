//! Label normalization for fuzzy header and sheet-name matching

use unicode_normalization::UnicodeNormalization;

/// Canonical form of a label: accents stripped, trimmed, lowercased.
///
/// "Código Producto", "CODIGO PRODUCTO" and " codigo producto " all become
/// `codigo producto`. Any code point left outside ASCII after compatibility
/// decomposition is dropped.
pub fn normalize(label: &str) -> String {
    label
        .nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_lowercase()
}
