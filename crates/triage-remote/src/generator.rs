//! Direct OpenAI incident generation
//!
//! Used when no generation endpoint is configured but an OpenAI key is.
//! Prompts are keyed by the expected resolution path; the model is asked for
//! a bare JSON object, and the reply is parsed tolerating markdown fences.
//! Severity always stays pinned to the base incident.

use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use triage_core::error::RemoteError;
use triage_core::types::{Incident, ResolutionPath};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const GENERATION_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are an SAP incident generator. Generate realistic SAP \
    system incidents for demo purposes. Always respond with valid JSON only.";

fn scenario_prompt(path: ResolutionPath) -> &'static str {
    match path {
        ResolutionPath::AutoResolve => {
            "Generate a ROUTINE SAP incident that can be auto-resolved.\n\
             This should be a common, well-documented issue like:\n\
             - Authorization/login errors (DYNP errors)\n\
             - User profile synchronization issues\n\
             - Password reset requests\n\
             - Role assignment problems\n\
             - Buffer/cache issues\n\
             The incident should have HIGH confidence for auto-resolution (80-95%)."
        }
        ResolutionPath::Assisted => {
            "Generate a MODERATE complexity SAP incident that needs analyst assistance.\n\
             This should be a performance or configuration issue like:\n\
             - Transaction timeouts after transport/upgrade\n\
             - Database performance degradation\n\
             - Report/query slowness\n\
             - Integration sync issues\n\
             - Batch job failures\n\
             The incident should have MEDIUM confidence (50-75%)."
        }
        ResolutionPath::Escalate => {
            "Generate a CRITICAL SAP incident requiring immediate expert escalation.\n\
             This should be a severe system issue like:\n\
             - Memory dumps (TSV_TNEW_PAGE_ALLOC_FAILED, etc.)\n\
             - System crashes affecting many users\n\
             - Data corruption concerns\n\
             - Security breaches\n\
             - Complete module failures\n\
             The incident should have LOW confidence (20-45%) requiring expert review."
        }
    }
}

fn user_prompt(path: ResolutionPath, base: &Incident) -> String {
    format!(
        "{scenario}\n\n\
         Based on the scenario type \"{path}\", generate a unique SAP incident.\n\
         Use the component type: {component}\n\n\
         Return a JSON object with EXACTLY these fields:\n\
         {{\n\
           \"id\": \"INC\" followed by 6 random digits,\n\
           \"title\": \"Brief incident title (max 60 chars)\",\n\
           \"description\": \"Detailed description of the issue\",\n\
           \"error_code\": \"Realistic SAP error code\",\n\
           \"component\": \"SAP module/component name\",\n\
           \"user_email\": \"realistic.user@company.com\",\n\
           \"user_impact\": \"Description of who/how many are affected\"\n\
         }}\n\n\
         Make the incident realistic and unique. Use real SAP terminology and error codes.\n\
         Return ONLY the JSON object, no additional text.",
        scenario = scenario_prompt(path),
        path = path,
        component = base.component,
    )
}

/// Call OpenAI chat completions and parse the generated incident
pub(crate) async fn generate_via_openai(
    http: &reqwest::Client,
    api_key: &str,
    path: ResolutionPath,
    base: &Incident,
) -> Result<Incident, RemoteError> {
    debug!(%path, "generating incident via OpenAI");
    let body = json!({
        "model": GENERATION_MODEL,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": user_prompt(path, base) },
        ],
        "temperature": 0.8,
        "max_tokens": 500,
    });

    let response = http
        .post(CHAT_COMPLETIONS_URL)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| RemoteError::Network(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Http {
            status: status.as_u16(),
        });
    }

    #[derive(Deserialize)]
    struct ChatReply {
        choices: Vec<Choice>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: ChatMessage,
    }
    #[derive(Deserialize)]
    struct ChatMessage {
        content: Option<String>,
    }

    let reply: ChatReply = response
        .json()
        .await
        .map_err(|err| RemoteError::Malformed(err.to_string()))?;
    let content = reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RemoteError::Malformed("no content in completion".to_string()))?;

    parse_generated(&content, base)
}

/// Parse a model reply into an incident, merging gaps from the base
///
/// Tolerates markdown code fences around the JSON object.
pub(crate) fn parse_generated(content: &str, base: &Incident) -> Result<Incident, RemoteError> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct GeneratedFields {
        id: Option<String>,
        title: Option<String>,
        description: Option<String>,
        error_code: Option<String>,
        component: Option<String>,
        user_email: Option<String>,
        user_impact: Option<String>,
    }

    let cleaned = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let fields: GeneratedFields = serde_json::from_str(cleaned)
        .map_err(|err| RemoteError::Malformed(err.to_string()))?;

    let fallback_id = || format!("INC{:06}", rand::rng().random_range(100_000..1_000_000));
    Ok(Incident {
        id: fields.id.unwrap_or_else(fallback_id),
        title: fields.title.unwrap_or_else(|| base.title.clone()),
        description: fields
            .description
            .unwrap_or_else(|| base.description.clone()),
        error_code: fields.error_code.unwrap_or_else(|| base.error_code.clone()),
        component: fields.component.unwrap_or_else(|| base.component.clone()),
        severity: base.severity,
        user_email: fields.user_email.or_else(|| base.user_email.clone()),
        user_impact: fields.user_impact.or_else(|| base.user_impact.clone()),
        timestamp: base.timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::scenario;
    use triage_core::types::Severity;

    fn base() -> Incident {
        scenario::find("escalate").unwrap().incident.clone()
    }

    #[test]
    fn prompts_reflect_the_resolution_path() {
        assert!(scenario_prompt(ResolutionPath::AutoResolve).contains("auto-resolved"));
        assert!(scenario_prompt(ResolutionPath::Assisted).contains("analyst assistance"));
        assert!(scenario_prompt(ResolutionPath::Escalate).contains("escalation"));

        let prompt = user_prompt(ResolutionPath::Escalate, &base());
        assert!(prompt.contains("\"escalate\""));
        assert!(prompt.contains("SAP Basis"));
    }

    #[test]
    fn parse_accepts_fenced_json() {
        let content = "```json\n{\"id\": \"INC123456\", \"title\": \"Dump storm\"}\n```";
        let incident = parse_generated(content, &base()).unwrap();
        assert_eq!(incident.id, "INC123456");
        assert_eq!(incident.title, "Dump storm");
        // Unspecified fields come from the base incident.
        assert_eq!(incident.error_code, base().error_code);
    }

    #[test]
    fn parse_pins_severity_to_the_base_incident() {
        let content = r#"{"id": "INC000001", "severity": "Low"}"#;
        let incident = parse_generated(content, &base()).unwrap();
        assert_eq!(incident.severity, Severity::Critical);
    }

    #[test]
    fn parse_rejects_non_json_content() {
        let err = parse_generated("sorry, I cannot do that", &base()).unwrap_err();
        assert!(matches!(err, RemoteError::Malformed(_)));
    }

    #[test]
    fn missing_id_gets_a_generated_one() {
        let incident = parse_generated("{}", &base()).unwrap();
        assert!(incident.id.starts_with("INC"));
        assert_eq!(incident.id.len(), 9);
    }
}
