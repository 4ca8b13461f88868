//! Templated replies used when the model backend is down.
//!
//! Financial answers come straight from directory data, so tenants still
//! get their balance during an outage. Everything else gets an apology
//! pointing at the park office.

use crate::error::GenerationError;
use crate::generator::{GenerationRequest, ResponseGenerator};
use async_trait::async_trait;
use parkline_conversation::{Intent, Language};

/// A [`ResponseGenerator`] that never calls out and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    /// Composes the templated reply for a request.
    #[must_use]
    pub fn reply(&self, request: &GenerationRequest) -> String {
        let tenant = &request.tenant;
        match (request.intent, request.language) {
            (Intent::Financial, Language::English) => format!(
                "Your current balance is {} and rent is due on the {}.",
                tenant.balance, tenant.due_date
            ),
            (Intent::Financial, Language::Spanish) => format!(
                "Su saldo actual es {} y la renta vence el {}.",
                tenant.balance, tenant.due_date
            ),
            (Intent::Maintenance, Language::English) => {
                "Thanks, your maintenance request has been logged and the park \
                 manager has been notified."
                    .to_string()
            }
            (Intent::Maintenance, Language::Spanish) => {
                "Gracias, su solicitud de mantenimiento fue registrada y el \
                 administrador del parque fue notificado."
                    .to_string()
            }
            (_, Language::English) => {
                "Sorry, I can't answer that right now. Please try again in a \
                 few minutes or call the park office."
                    .to_string()
            }
            (_, Language::Spanish) => {
                "Lo siento, no puedo responder en este momento. Intente de \
                 nuevo en unos minutos o llame a la oficina del parque."
                    .to_string()
            }
        }
    }
}

#[async_trait]
impl ResponseGenerator for FallbackGenerator {
    async fn generate_reply(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(self.reply(request))
    }
}
