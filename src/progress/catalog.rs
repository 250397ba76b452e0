#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub agent: &'static str,
}

pub const STEP_CATALOG: [StepDefinition; 6] = [
    StepDefinition {
        id: "triage",
        name: "Case Triage",
        agent: "case_triage",
    },
    StepDefinition {
        id: "doctor_matching",
        name: "Doctor Matching",
        agent: "doctor_matcher",
    },
    StepDefinition {
        id: "appointment_coordination",
        name: "Appointment Coordination",
        agent: "appointment_coordinator",
    },
    StepDefinition {
        id: "doctor_simulation",
        name: "Doctor Response Simulation",
        agent: "doctor_simulator",
    },
    StepDefinition {
        id: "calendar_integration",
        name: "Calendar Integration",
        agent: "calendar_manager",
    },
    StepDefinition {
        id: "health_recommendations",
        name: "Health Recommendations",
        agent: "health_advisor",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    pub id: &'static str,
    pub alias: &'static str,
    pub display_name: &'static str,
    pub role: &'static str,
}

pub const AGENT_PROFILES: [AgentProfile; 7] = [
    AgentProfile {
        id: "case_triage",
        alias: "CaseTriageAgent",
        display_name: "Case Triage Agent",
        role: "Classifies case severity from imaging findings and symptoms",
    },
    AgentProfile {
        id: "doctor_matcher",
        alias: "DoctorMatchingAgent",
        display_name: "Doctor Matching Agent",
        role: "Finds and ranks specialists for the case",
    },
    AgentProfile {
        id: "appointment_coordinator",
        alias: "AppointmentCoordinatorAgent",
        display_name: "Appointment Coordinator",
        role: "Sends appointment requests to selected doctors",
    },
    AgentProfile {
        id: "doctor_simulator",
        alias: "DoctorResponseSimulatorAgent",
        display_name: "Doctor Response Simulator",
        role: "Collects doctor accept/decline responses",
    },
    AgentProfile {
        id: "calendar_manager",
        alias: "CalendarIntegrationAgent",
        display_name: "Calendar Integration Agent",
        role: "Books the confirmed appointment",
    },
    AgentProfile {
        id: "health_advisor",
        alias: "HealthAdvisorAgent",
        display_name: "Health Advisor",
        role: "Provides self-care recommendations for low-risk cases",
    },
    AgentProfile {
        id: "case_escalator",
        alias: "CaseEscalatorAgent",
        display_name: "Case Escalator",
        role: "Escalates cases no doctor accepted",
    },
];

pub fn step_catalog() -> &'static [StepDefinition] {
    &STEP_CATALOG
}

pub fn agent_profile(agent_id: &str) -> Option<&'static AgentProfile> {
    AGENT_PROFILES
        .iter()
        .find(|profile| profile.id == agent_id || profile.alias == agent_id)
}

pub fn agent_display_name(agent_id: &str) -> &str {
    agent_profile(agent_id)
        .map(|profile| profile.display_name)
        .unwrap_or(agent_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn catalog_has_six_unique_steps_in_pipeline_order() {
        let ids: Vec<&str> = step_catalog().iter().map(|step| step.id).collect();
        assert_eq!(
            ids,
            vec![
                "triage",
                "doctor_matching",
                "appointment_coordination",
                "doctor_simulation",
                "calendar_integration",
                "health_recommendations",
            ]
        );
        let unique: BTreeSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn every_step_owner_has_an_agent_profile() {
        for step in step_catalog() {
            assert!(agent_profile(step.agent).is_some(), "{}", step.agent);
        }
    }

    #[test]
    fn agent_lookup_accepts_class_style_aliases() {
        assert_eq!(agent_display_name("CaseTriageAgent"), "Case Triage Agent");
        assert_eq!(agent_display_name("case_triage"), "Case Triage Agent");
        assert_eq!(agent_display_name("radiologist"), "radiologist");
    }
}
