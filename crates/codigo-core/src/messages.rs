//! User-facing strings, in Spanish like the service itself.

use crate::compare::InvalidPair;

/// Shown in place of an answer when an exchange fails.
pub const ASK_APOLOGY: &str = "Lo siento, hubo un error al procesar tu mensaje. \
Por favor, verifica tu conexión e inténtalo de nuevo.";

pub const COMPARE_MISSING_IDS: &str = "Por favor, introduce ambos números de artículo";

pub const COMPARE_SAME_IDS: &str = "Por favor, introduce dos artículos diferentes";

/// Prompt shown in the compare form for a rejected pair.
pub fn invalid_pair(reason: InvalidPair) -> &'static str {
    match reason {
        InvalidPair::MissingId => COMPARE_MISSING_IDS,
        InvalidPair::SameId => COMPARE_SAME_IDS,
    }
}

/// Startup notice while the chat endpoint is still the localhost default.
pub fn default_endpoint_warning(endpoint: &str) -> String {
    format!(
        "⚠️ No hay servidor configurado, se usará {}. \
Edita config.json o define CODIGO_CHAT_URL para cambiarlo.",
        endpoint
    )
}

/// Transcript line recorded when a comparison is submitted.
pub fn compare_request_line(first_id: &str, second_id: &str) -> String {
    format!("⚖️ Comparar artículo {} vs artículo {}", first_id.trim(), second_id.trim())
}

pub fn compare_failure_line(message: &str) -> String {
    format!("❌ Error: {}", message)
}

/// Notice for an activated article reference. No lookup is performed yet.
pub fn article_notice(number: &str) -> String {
    format!(
        "Artículo {} del Código Penal\n\n(La navegación automática se implementará en una futura versión)",
        number
    )
}
