//! Canned bilingual replies for conversation mechanics.
//!
//! Only conversational answers go through the model; the mechanics of the
//! session (identification prompts, idle prompts, goodbyes) are fixed text.

use parkline_conversation::Language;
use parkline_directory::TenantIdentity;

/// Asks an unidentified sender who they are.
#[must_use]
pub fn identify_prompt(language: Language) -> &'static str {
    match language {
        Language::English => {
            "Hi! I couldn't find you in our tenant list. Please reply with \
             your full name or your lot number."
        }
        Language::Spanish => {
            "¡Hola! No lo encontré en nuestra lista de inquilinos. Por favor \
             responda con su nombre completo o su número de lote."
        }
    }
}

/// Asks for more detail when several tenants matched, naming them.
#[must_use]
pub fn ambiguous_prompt(language: Language, candidates: &[TenantIdentity]) -> String {
    let names: Vec<String> = candidates
        .iter()
        .map(|c| format!("{} (lot {})", c.full_name(), c.unit))
        .collect();
    let listed = names.join(", ");
    match language {
        Language::English => format!(
            "I found more than one match: {listed}. Could you reply with \
             your full name and lot number?"
        ),
        Language::Spanish => format!(
            "Encontré más de una coincidencia: {listed}. ¿Podría responder \
             con su nombre completo y número de lote?"
        ),
    }
}

/// Greets a freshly identified tenant.
#[must_use]
pub fn greeting(language: Language, first_name: &str, unit: &str, park: &str) -> String {
    let place = if park.is_empty() {
        String::new()
    } else {
        format!(" at {park}")
    };
    match language {
        Language::English => format!(
            "Hi {first_name}! I found you on lot {unit}{place}. How can I help?"
        ),
        Language::Spanish => format!(
            "¡Hola {first_name}! Lo encontré en el lote {unit}{place}. ¿En qué puedo ayudarle?"
        ),
    }
}

/// Nudges an idle conversation before closing it.
#[must_use]
pub fn still_there_prompt(language: Language) -> &'static str {
    match language {
        Language::English => "Are you still there? I'll close this conversation shortly if not.",
        Language::Spanish => "¿Sigue ahí? Cerraré esta conversación en breve si no responde.",
    }
}

/// Tells the tenant the conversation was closed for inactivity.
#[must_use]
pub fn closed_notice(language: Language) -> &'static str {
    match language {
        Language::English => {
            "I've closed this conversation due to inactivity. Text again any \
             time and we'll start fresh."
        }
        Language::Spanish => {
            "Cerré esta conversación por inactividad. Escriba de nuevo cuando \
             quiera y empezamos de cero."
        }
    }
}

/// Says goodbye when the tenant wraps up.
#[must_use]
pub fn goodbye(language: Language) -> &'static str {
    match language {
        Language::English => "You're welcome! Text us any time. Goodbye!",
        Language::Spanish => "¡Con gusto! Escríbanos cuando quiera. ¡Hasta luego!",
    }
}

/// Spoken prompt for inbound voice calls; the concierge is text-only.
#[must_use]
pub fn voice_prompt() -> &'static str {
    "Thank you for calling. This number is our text line. Please hang up and \
     send us a text message, and we'll get right back to you."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_names_tenant_and_lot() {
        let text = greeting(Language::English, "Clara", "02", "Oakwood Estates");
        assert!(text.contains("Clara"));
        assert!(text.contains("lot 02"));
        assert!(text.contains("Oakwood Estates"));
    }

    #[test]
    fn ambiguous_prompt_lists_candidates() {
        let candidates = vec![
            TenantIdentity::new("t-1", "Clara", "Lopez", "02"),
            TenantIdentity::new("t-3", "Clara", "Ramos", "07"),
        ];
        let text = ambiguous_prompt(Language::English, &candidates);
        assert!(text.contains("Clara Lopez (lot 02)"));
        assert!(text.contains("Clara Ramos (lot 07)"));
    }

    #[test]
    fn greeting_omits_blank_park() {
        let text = greeting(Language::Spanish, "Clara", "02", "");
        assert!(!text.contains(" at "));
        assert!(text.contains("lote 02"));
    }
}
