//! Vector-index seeder
//!
//! One-shot batch loader, outside the runtime critical path: embeds a fixed
//! corpus of historical incidents and upserts the vectors into the
//! configured index under the default namespace. A fixed inter-item delay
//! keeps the embedding calls under rate limits.

use crate::config::RemoteConfig;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Fixed delay between embedding calls
pub const SEED_ITEM_DELAY: Duration = Duration::from_millis(200);

/// Seeding failure classification
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// A required credential is not configured
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    /// An endpoint answered with a non-success status
    #[error("seed endpoint returned status {status}: {body}")]
    Http { status: u16, body: String },

    /// Transport-level failure
    #[error("seed request failed: {0}")]
    Network(String),

    /// A reply body we could not interpret
    #[error("seed reply malformed: {0}")]
    Malformed(String),
}

/// One historical incident in the seed corpus
#[derive(Debug, Clone, Copy)]
pub struct HistoricalIncident {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub error_code: &'static str,
    pub component: &'static str,
    pub severity: &'static str,
    pub resolution: &'static str,
    pub root_cause: &'static str,
    pub resolution_time: &'static str,
    pub category: &'static str,
}

const CORPUS: [HistoricalIncident; 6] = [
    HistoricalIncident {
        id: "INC000123",
        title: "Authorization Error DYNP 138 - Profile Sync",
        description: "User unable to access SAP GUI due to authorization popup DYNP 138. \
                      Profile not synchronized after role change. User was able to login \
                      yesterday.",
        error_code: "DYNP 138",
        component: "SAP Authorization",
        severity: "Medium",
        resolution: "1. Open transaction SU01\n2. Enter username in User field\n3. Navigate \
                     to Roles tab\n4. Click User Compare button\n5. Execute profile \
                     regeneration\n6. Run SU25 to verify\n7. Test user login",
        root_cause: "User profile not synchronized after authorization role assignment change",
        resolution_time: "30 minutes",
        category: "Access/Authorization",
    },
    HistoricalIncident {
        id: "INC000089",
        title: "User Profile Not Synchronized After Role Change",
        description: "After assigning new roles in PFCG, user cannot access new \
                      transactions. Authorization check failing with message 'No \
                      authorization to execute transaction'.",
        error_code: "AUTH_SYNC",
        component: "SAP Authorization",
        severity: "Medium",
        resolution: "1. Run transaction SU01 for user\n2. Execute User Compare function\n3. \
                     Run PFUD to adjust user master profiles\n4. Verify with SU53 for \
                     authorization trace",
        root_cause: "Profile generation not triggered after PFCG role modification",
        resolution_time: "45 minutes",
        category: "Access/Authorization",
    },
    HistoricalIncident {
        id: "INC000156",
        title: "DYNP Authorization Popup on Login",
        description: "Multiple users getting authorization popup with DYNP error code when \
                      logging into SAP GUI. Started after password change campaign.",
        error_code: "DYNP 138",
        component: "SAP Authorization",
        severity: "Medium",
        resolution: "1. Clear user buffer with transaction SU10\n2. Regenerate profiles in \
                     SU01 for affected users\n3. Check profile parameters in RZ10\n4. \
                     Restart login if needed",
        root_cause: "User buffer corruption after mass password reset",
        resolution_time: "20 minutes",
        category: "Access/Authorization",
    },
    HistoricalIncident {
        id: "INC000201",
        title: "VA01 Performance Degradation After Transport",
        description: "Sales order creation in transaction VA01 taking over 60 seconds. \
                      Issue started after transport K900123 was applied yesterday. Database \
                      statistics may be stale.",
        error_code: "TIMEOUT",
        component: "SAP SD",
        severity: "High",
        resolution: "1. Check DB02 for table statistics age\n2. Run DB20 to update \
                     statistics on VBAK, VBAP, VBEP tables\n3. Review transport K900123 \
                     contents for index changes\n4. Run ST05 SQL trace to identify slow \
                     queries\n5. Consider index rebuild if needed",
        root_cause: "Database statistics outdated after transport modified table structures",
        resolution_time: "2 hours",
        category: "Performance",
    },
    HistoricalIncident {
        id: "INC000178",
        title: "Sales Order Timeout in Peak Hours",
        description: "Transaction VA01 and VA02 experiencing timeouts during peak hours \
                      9-11 AM. Multiple users in Sales department affected. Response time \
                      exceeds acceptable limits.",
        error_code: "TIMEOUT",
        component: "SAP SD",
        severity: "High",
        resolution: "1. Increase dialog work processes temporarily in RZ10\n2. Check for \
                     table locks in SM12\n3. Analyze database performance in ST04\n4. Review \
                     batch job scheduling to avoid peak hours\n5. Consider index \
                     optimization on frequently accessed tables",
        root_cause: "Insufficient work processes during peak load combined with suboptimal \
                     database queries",
        resolution_time: "3 hours",
        category: "Performance",
    },
    HistoricalIncident {
        id: "INC000045",
        title: "Extended Memory Exhaustion - ABAP Dumps",
        description: "TSV_TNEW_PAGE_ALLOC_FAILED dumps occurring frequently in production. \
                      Extended memory parameters appear insufficient. Batch jobs consuming \
                      excess memory.",
        error_code: "TSV_TNEW_PAGE_ALLOC_FAILED",
        component: "SAP Basis",
        severity: "Critical",
        resolution: "1. Check ST02 for current memory utilization\n2. Increase \
                     em/initial_size_MB parameter in RZ10\n3. Review and reschedule \
                     memory-intensive batch jobs\n4. Consider application server restart \
                     during maintenance window\n5. Monitor with SM50 for process memory usage",
        root_cause: "Extended memory pool exhausted due to concurrent batch processing",
        resolution_time: "4 hours",
        category: "System Error",
    },
];

/// The fixed historical corpus
#[inline]
#[must_use]
pub fn historical_incidents() -> &'static [HistoricalIncident] {
    &CORPUS
}

/// Text embedded for one corpus record
#[must_use]
pub fn embedding_text(incident: &HistoricalIncident) -> String {
    format!(
        "{} {} {} {}",
        incident.title, incident.description, incident.error_code, incident.component
    )
}

/// Embed and upsert the full corpus, returning the upserted count
pub async fn run_seed(http: &reqwest::Client, config: &RemoteConfig) -> Result<usize, SeedError> {
    let openai_key = config
        .openai_api_key
        .as_deref()
        .ok_or(SeedError::MissingCredential("OPENAI_API_KEY"))?;
    let index_key = config
        .pinecone_api_key
        .as_deref()
        .ok_or(SeedError::MissingCredential("PINECONE_API_KEY"))?;
    let index_host = config
        .pinecone_index_host
        .as_deref()
        .ok_or(SeedError::MissingCredential("PINECONE_INDEX_HOST"))?;

    let mut vectors = Vec::with_capacity(CORPUS.len());
    for incident in historical_incidents() {
        info!(id = incident.id, title = incident.title, "embedding historical incident");
        let values = embed(http, openai_key, &embedding_text(incident)).await?;
        debug!(id = incident.id, dimensions = values.len(), "embedding generated");
        vectors.push(json!({
            "id": incident.id,
            "values": values,
            "metadata": {
                "title": incident.title,
                "description": incident.description,
                "error_code": incident.error_code,
                "component": incident.component,
                "severity": incident.severity,
                "resolution": incident.resolution,
                "root_cause": incident.root_cause,
                "resolution_time": incident.resolution_time,
                "category": incident.category,
            },
        }));
        sleep(SEED_ITEM_DELAY).await;
    }

    let count = upsert(http, index_key, index_host, &vectors).await?;
    info!(count, "vector seeding complete");
    Ok(count)
}

async fn embed(
    http: &reqwest::Client,
    api_key: &str,
    text: &str,
) -> Result<Vec<f32>, SeedError> {
    let response = http
        .post(EMBEDDINGS_URL)
        .bearer_auth(api_key)
        .json(&json!({ "model": EMBEDDING_MODEL, "input": text }))
        .send()
        .await
        .map_err(|err| SeedError::Network(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SeedError::Http {
            status: status.as_u16(),
            body,
        });
    }

    #[derive(Deserialize)]
    struct EmbeddingReply {
        data: Vec<EmbeddingItem>,
    }
    #[derive(Deserialize)]
    struct EmbeddingItem {
        embedding: Vec<f32>,
    }

    let reply: EmbeddingReply = response
        .json()
        .await
        .map_err(|err| SeedError::Malformed(err.to_string()))?;
    reply
        .data
        .into_iter()
        .next()
        .map(|item| item.embedding)
        .ok_or_else(|| SeedError::Malformed("embedding reply carried no data".to_string()))
}

async fn upsert(
    http: &reqwest::Client,
    api_key: &str,
    host: &str,
    vectors: &[serde_json::Value],
) -> Result<usize, SeedError> {
    // The host may be configured with or without a scheme.
    let host = host.trim_start_matches("https://").trim_start_matches("http://");
    let url = format!("https://{host}/vectors/upsert");

    let response = http
        .post(&url)
        .header("Api-Key", api_key)
        .json(&json!({ "vectors": vectors, "namespace": "" }))
        .send()
        .await
        .map_err(|err| SeedError::Network(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SeedError::Http {
            status: status.as_u16(),
            body,
        });
    }

    #[derive(Deserialize)]
    struct UpsertReply {
        #[serde(rename = "upsertedCount", default)]
        upserted_count: usize,
    }

    let reply: UpsertReply = response
        .json()
        .await
        .map_err(|err| SeedError::Malformed(err.to_string()))?;
    Ok(reply.upserted_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_covers_all_three_categories() {
        let incidents = historical_incidents();
        assert_eq!(incidents.len(), 6);
        let categories: Vec<&str> = incidents.iter().map(|i| i.category).collect();
        assert!(categories.contains(&"Access/Authorization"));
        assert!(categories.contains(&"Performance"));
        assert!(categories.contains(&"System Error"));
    }

    #[test]
    fn corpus_ids_are_unique() {
        let incidents = historical_incidents();
        for (index, incident) in incidents.iter().enumerate() {
            assert!(
                incidents[index + 1..].iter().all(|other| other.id != incident.id),
                "duplicate id {}",
                incident.id
            );
        }
    }

    #[test]
    fn embedding_text_concatenates_search_fields() {
        let incident = &historical_incidents()[0];
        let text = embedding_text(incident);
        assert!(text.contains(incident.title));
        assert!(text.contains("DYNP 138"));
        assert!(text.contains("SAP Authorization"));
    }

    #[tokio::test]
    async fn seeding_without_credentials_reports_the_missing_one() {
        let http = reqwest::Client::new();
        let err = run_seed(&http, &RemoteConfig::new()).await.unwrap_err();
        assert!(matches!(err, SeedError::MissingCredential("OPENAI_API_KEY")));

        let config = RemoteConfig::new().with_openai_api_key("sk-test");
        let err = run_seed(&http, &config).await.unwrap_err();
        assert!(matches!(err, SeedError::MissingCredential("PINECONE_API_KEY")));
    }
}
