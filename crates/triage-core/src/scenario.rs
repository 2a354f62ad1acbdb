//! Scenario registry
//!
//! The three canned demo cases, loaded once at process start. Read-only
//! input to the engine: selecting a scenario never mutates it.

use crate::types::{Incident, ResolutionPath, Scenario, ScenarioColor, Severity};
use once_cell::sync::Lazy;

static SCENARIOS: Lazy<Vec<Scenario>> = Lazy::new(|| {
    vec![
        Scenario {
            id: "auto-resolve".to_string(),
            name: "Routine Authorization Failure".to_string(),
            description: "Known profile-sync issue with a documented fix".to_string(),
            icon: "ShieldCheck".to_string(),
            color: ScenarioColor::Green,
            incident: Incident {
                id: "INC001042".to_string(),
                title: "Authorization Error DYNP 138 After Role Change".to_string(),
                description: "User receives authorization popup DYNP 138 when opening \
                              SAP GUI. Access worked yesterday; roles were adjusted \
                              overnight and the profile was not regenerated."
                    .to_string(),
                error_code: "DYNP 138".to_string(),
                component: "SAP Authorization".to_string(),
                severity: Severity::Medium,
                user_email: Some("j.mueller@company.com".to_string()),
                user_impact: Some("Single user locked out of SAP GUI".to_string()),
                timestamp: None,
            },
            expected_confidence: 90,
            expected_path: ResolutionPath::AutoResolve,
            resolution: vec![
                "Open transaction SU01 and load the affected user".to_string(),
                "Run User Compare to regenerate the profile".to_string(),
                "Verify role assignment with SU25".to_string(),
                "Confirm the user can log in again".to_string(),
            ],
            diagnostic_hints: Vec::new(),
            sla_minutes: 5,
            time_saved: "25 min".to_string(),
            cost_saved: "$1,150".to_string(),
        },
        Scenario {
            id: "assisted".to_string(),
            name: "Sales Order Performance Degradation".to_string(),
            description: "VA01 slowdown after a transport; needs analyst verification"
                .to_string(),
            icon: "Gauge".to_string(),
            color: ScenarioColor::Yellow,
            incident: Incident {
                id: "INC002317".to_string(),
                title: "VA01 Sales Order Creation Exceeding 60 Seconds".to_string(),
                description: "Sales order creation in VA01 takes over a minute since \
                              transport K900123 was applied. Database statistics on \
                              the order tables appear stale."
                    .to_string(),
                error_code: "TIMEOUT".to_string(),
                component: "SAP SD".to_string(),
                severity: Severity::High,
                user_email: Some("sales.ops@company.com".to_string()),
                user_impact: Some("Entire sales department, ~40 users".to_string()),
                timestamp: None,
            },
            expected_confidence: 65,
            expected_path: ResolutionPath::Assisted,
            resolution: Vec::new(),
            diagnostic_hints: vec![
                "Check DB02 for stale table statistics on VBAK/VBAP".to_string(),
                "Review transport K900123 for index changes".to_string(),
                "Run an ST05 SQL trace on VA01".to_string(),
            ],
            sla_minutes: 30,
            time_saved: "1.5 hours".to_string(),
            cost_saved: "$3,400".to_string(),
        },
        Scenario {
            id: "escalate".to_string(),
            name: "Extended Memory Exhaustion".to_string(),
            description: "Critical memory dumps in production; expert escalation"
                .to_string(),
            icon: "Flame".to_string(),
            color: ScenarioColor::Red,
            incident: Incident {
                id: "INC003589".to_string(),
                title: "TSV_TNEW_PAGE_ALLOC_FAILED Dumps in Production".to_string(),
                description: "Frequent TSV_TNEW_PAGE_ALLOC_FAILED short dumps across \
                              application servers. Extended memory is exhausted while \
                              batch processing overlaps the online window."
                    .to_string(),
                error_code: "TSV_TNEW_PAGE_ALLOC_FAILED".to_string(),
                component: "SAP Basis".to_string(),
                severity: Severity::Critical,
                user_email: Some("basis.oncall@company.com".to_string()),
                user_impact: Some("All users on two application servers".to_string()),
                timestamp: None,
            },
            expected_confidence: 35,
            expected_path: ResolutionPath::Escalate,
            resolution: Vec::new(),
            diagnostic_hints: vec![
                "Check ST02 for extended memory utilization".to_string(),
                "Review SM50 for memory-heavy work processes".to_string(),
                "Inspect batch scheduling overlap in SM37".to_string(),
            ],
            sla_minutes: 15,
            time_saved: "45 min".to_string(),
            cost_saved: "$8,200".to_string(),
        },
    ]
});

/// All registered scenarios, in display order
#[inline]
#[must_use]
pub fn scenarios() -> &'static [Scenario] {
    &SCENARIOS
}

/// Look up a scenario by registry id
#[must_use]
pub fn find(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|scenario| scenario.id == id)
}
