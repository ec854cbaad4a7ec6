//! Sample proposal records for testing and demonstration.
//!
//! Each template exercises a different mix of blocks.

use crate::fields::ProposalFields;

fn field(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// No fields at all: header, client and footer with placeholder text.
pub fn minimal_template() -> ProposalFields {
    ProposalFields::default()
}

/// Every field filled with short, realistic content.
pub fn full_template() -> ProposalFields {
    ProposalFields {
        client_name: field("Jordan Avery"),
        client_company: field("Northwind Logistics"),
        project_title: field("Fleet Tracking Platform"),
        problem_statement: field(
            "Dispatchers rely on phone calls and spreadsheets to locate trucks, \
             which delays rerouting and hides idle time.",
        ),
        proposed_solution: field(
            "A live map backed by GPS telemetry with automatic alerts for \
             late arrivals and unplanned stops.",
        ),
        scope_of_work: field("Discovery workshop\nTelemetry ingestion\nDispatcher dashboard"),
        timeline: field("Weeks 1-2: discovery\nWeeks 3-8: build\nWeek 9: rollout"),
        pricing: field("$48,500"),
        terms: field("50% due at signing, 50% on delivery. Net 15."),
        contact_info: field("Sam Rivera\nBrightline Studio\nsam@brightline.io"),
    }
}

/// Long scope, timeline and terms text that cannot fit on one page.
pub fn multi_page_template() -> ProposalFields {
    let scope = (1..=12)
        .map(|i| format!("Deliverable {i}: design, build and document component {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let timeline = (1..=10)
        .map(|i| format!("Sprint {i}: iterate on milestone {i} with stakeholder review"))
        .collect::<Vec<_>>()
        .join("\n");
    let terms = "Payment is due within thirty days of each invoice. ".repeat(40);

    ProposalFields {
        client_name: field("Priya Natarajan"),
        client_company: field("Helios Energy"),
        project_title: field("Grid Analytics Program"),
        problem_statement: field(&"Load forecasts are produced by hand every week. ".repeat(10)),
        proposed_solution: field(&"Automated forecasting with a review step. ".repeat(10)),
        scope_of_work: Some(scope),
        timeline: Some(timeline),
        pricing: field("$310,000"),
        terms: Some(terms),
        contact_info: field("Sam Rivera\nBrightline Studio"),
    }
}

/// Markup-bearing values that must come out escaped.
pub fn hostile_template() -> ProposalFields {
    ProposalFields {
        client_name: field("<script>alert(1)</script>"),
        client_company: field("Tom & Jerry's \"Cheese\" Co."),
        project_title: field("<b>Bold</b> plans"),
        scope_of_work: field("<img src=x onerror=alert(2)>"),
        pricing: field("$1 < $2"),
        ..ProposalFields::default()
    }
}

/// All templates with a short name, for batch runs.
pub fn all_templates() -> Vec<(&'static str, ProposalFields)> {
    vec![
        ("minimal", minimal_template()),
        ("full", full_template()),
        ("multi_page", multi_page_template()),
        ("hostile", hostile_template()),
    ]
}
