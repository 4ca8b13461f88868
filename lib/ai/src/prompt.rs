//! Prompt assembly for the chat-completions backend.

use crate::generator::GenerationRequest;
use parkline_conversation::Language;

/// Builds the system prompt that scopes the model to one tenant.
///
/// All park and account facts the model may state are inlined here; the
/// model is told to answer from them and nothing else.
#[must_use]
pub fn system_prompt(request: &GenerationRequest) -> String {
    let tenant = &request.tenant;
    let park = &tenant.park;

    let mut prompt = String::new();
    prompt.push_str(
        "You are the SMS concierge for a mobile home park. \
         Answer only for the tenant described below, using only the facts \
         given. Keep replies short enough for a text message. If asked \
         something outside these facts, say you don't have that information \
         and suggest calling the park office.\n\n",
    );

    prompt.push_str(&format!(
        "Tenant: {} (unit {})\n",
        tenant.identity.full_name(),
        tenant.identity.unit
    ));
    prompt.push_str(&format!("Current balance: {}\n", tenant.balance));
    prompt.push_str(&format!("Rent due: {}\n", tenant.due_date));
    if !tenant.postal_address.is_empty() {
        prompt.push_str(&format!("Unit address: {}\n", tenant.postal_address));
    }
    if let Some(moved_in) = tenant.moved_in {
        prompt.push_str(&format!("Moved in: {moved_in}\n"));
    }
    if !park.name.is_empty() {
        prompt.push_str(&format!("Park: {}, {}\n", park.name, park.city));
    }
    if !park.address.is_empty() {
        prompt.push_str(&format!("Park office: {}\n", park.address));
    }
    if !park.payment_method.is_empty() {
        prompt.push_str(&format!("How to pay: {}\n", park.payment_method));
    }
    if !park.payee.is_empty() {
        prompt.push_str(&format!("Payments payable to: {}\n", park.payee));
    }

    if let Some(ledger) = &request.ledger {
        prompt.push_str("\nRecent transactions (newest last):\n");
        for entry in ledger {
            prompt.push_str(&format!(
                "  {} {} {}\n",
                entry.date, entry.description, entry.amount
            ));
        }
    }

    match request.language {
        Language::English => prompt.push_str("\nReply in English."),
        Language::Spanish => prompt.push_str("\nReply in Spanish."),
    }

    prompt
}
