//! Built-in rule tables for the MRT advisory domain
//!
//! Rules are grouped by concern:
//! - Transfer and interchange rules
//! - Integration work rules (station closures, service adjustments)
//! - Network mode rules (today's EWL airport branch vs. the future TEL/CRL topology)
//! - Service status rules
//!
//! The tables are plain data. Any other table satisfying the [`Rule`](crate::rule::Rule)
//! contract can be loaded through [`KnowledgeBase::from_table`] instead.

use crate::error::Result;
use crate::knowledge_base::{KnowledgeBase, RuleTable};
use crate::rule::{NetworkMode, RuleRecord, ServiceStatus};

/// Pre-defined rule tables for validating transit service advisories.
pub struct BuiltinRules;

fn record(
    id: &str,
    description: &str,
    antecedent: &[&str],
    consequent: &str,
    mode: Option<NetworkMode>,
) -> RuleRecord {
    RuleRecord {
        id: id.to_string(),
        description: description.to_string(),
        antecedent: antecedent.iter().map(|s| s.to_string()).collect(),
        consequent: consequent.to_string(),
        mode,
    }
}

impl BuiltinRules {
    /// The full operational table: the core rules plus the TEL extension
    /// conversion and integration-work rules, 27 in total.
    pub fn transit() -> Result<KnowledgeBase> {
        KnowledgeBase::from_table(Self::transit_table())
    }

    /// The twelve core rules covering transfers, the Expo closure, mode
    /// topology and service status.
    pub fn minimal() -> Result<KnowledgeBase> {
        KnowledgeBase::from_table(Self::minimal_table())
    }

    /// Serializable form of [`transit`](Self::transit).
    pub fn transit_table() -> RuleTable {
        let mut rules = Self::core_rules();
        rules.extend(Self::conversion_rules());
        rules.extend(Self::integration_rules());
        rules.extend(Self::routing_rules());
        RuleTable {
            rules,
            polarity_pairs: Vec::new(),
        }
    }

    /// Serializable form of [`minimal`](Self::minimal).
    pub fn minimal_table() -> RuleTable {
        RuleTable {
            rules: Self::core_rules(),
            polarity_pairs: Vec::new(),
        }
    }

    fn core_rules() -> Vec<RuleRecord> {
        use NetworkMode::{Future, Today};

        let tel_disrupted = ServiceStatus::Disrupted.proposition("TEL");
        let tel_reduced = ServiceStatus::Reduced.proposition("TEL");

        vec![
            // Transfers
            record(
                "R1",
                "If Tanah Merah station is open AND TEL line is active, then TEL-EWL transfer is available",
                &["Station_Open_TanahMerah", "Line_Active_TEL"],
                "Transfer_Available_TEL_EWL",
                None,
            ),
            record(
                "R9",
                "If both TEL and CRL are active at T5 station, then TEL-CRL transfer must be available",
                &["Line_Active_TEL", "Line_Active_CRL", "Station_Open_T5"],
                "Transfer_Available_TEL_CRL",
                None,
            ),
            // Integration work
            record(
                "R2",
                "If Expo station is undergoing integration work, then Expo station is NOT open",
                &["Integration_Work_Expo"],
                "Station_Closed_Expo",
                None,
            ),
            record(
                "R10",
                "If integration work is ongoing AND network is in Today Mode, then service adjustments are required",
                &["Integration_Work_Active", "Network_Mode_Today"],
                "Service_Adjustments_Required",
                Some(Today),
            ),
            // Future topology
            record(
                "R3",
                "In Future Mode, the old EWL airport branch (Tanah Merah-Expo-Changi Airport) is NOT active",
                &["Network_Mode_Future"],
                "Line_Inactive_EWL_Airport",
                Some(Future),
            ),
            record(
                "R4",
                "In Future Mode, if the network is operational, then TEL extension to T5 is active",
                &["Network_Mode_Future", "Network_Operational"],
                "Line_Active_TEL_T5",
                Some(Future),
            ),
            record(
                "R7",
                "If CRL extension to T5 is active, then the network must be in Future Mode",
                &["Line_Active_CRL_T5"],
                "Network_Mode_Future",
                Some(Future),
            ),
            record(
                "R11",
                "In Future Mode, if routing to Changi Airport, then TEL line must be used (not old EWL)",
                &["Network_Mode_Future", "Destination_Changi_Airport"],
                "Route_Uses_TEL",
                Some(Future),
            ),
            record(
                "R12",
                "If T5 station is being used in a route, then network must be in Future Mode",
                &["Route_Uses_T5"],
                "Network_Mode_Future",
                Some(Future),
            ),
            // Service status
            record(
                "R5",
                "If a line has disrupted service status, then it does NOT have normal service",
                &[tel_disrupted.as_str()],
                "Service_Status_Not_Normal_TEL",
                None,
            ),
            record(
                "R8",
                "If service is reduced AND it's peak hour, then crowding risk is high",
                &[tel_reduced.as_str(), "Time_Peak"],
                "Crowding_Risk_High",
                None,
            ),
            // Station closures
            record(
                "R6",
                "If Expo station is closed, then no transfers are available at Expo",
                &["Station_Closed_Expo"],
                "Transfer_Unavailable_Expo",
                None,
            ),
        ]
    }

    /// TEL extension: Tanah Merah, Expo and Changi Airport become TEL stations.
    fn conversion_rules() -> Vec<RuleRecord> {
        use NetworkMode::Future;

        vec![
            record(
                "R13",
                "When TELe conversion is complete, Tanah Merah, Expo and Changi Airport operate as TEL stations",
                &["TELe_Conversion_Complete"],
                "Stations_TanahMerah_Expo_Changi_TEL",
                Some(Future),
            ),
            record(
                "R15",
                "In Future Mode with TELe conversion complete, Changi Airport is reachable via TEL only",
                &["Network_Mode_Future", "TELe_Conversion_Complete"],
                "Changi_Airport_Accessible_Via_TEL_Only",
                Some(Future),
            ),
            record(
                "R16",
                "If TELe conversion is complete AND TEL is active, there is a direct city-airport TEL connection",
                &["TELe_Conversion_Complete", "Line_Active_TEL"],
                "Direct_TEL_City_Airport_Connection",
                Some(Future),
            ),
            record(
                "R18",
                "A journey from Sungei Bedok to T5 after TELe conversion uses the TEL extension",
                &["Origin_Sungei_Bedok", "Destination_T5", "TELe_Conversion_Complete"],
                "Route_Uses_TEL_Extension",
                Some(Future),
            ),
            record(
                "R26",
                "If the TEL extension to T5 is active, then T5 station is open",
                &["Line_Active_TEL_T5"],
                "Station_Open_T5",
                Some(Future),
            ),
        ]
    }

    /// Systems integration works carried out while today's network keeps running.
    fn integration_rules() -> Vec<RuleRecord> {
        use NetworkMode::Today;

        vec![
            record(
                "R14",
                "If systems integration is active in Today Mode, then service adjustments are required",
                &["Systems_Integration_Active", "Network_Mode_Today"],
                "Service_Adjustments_Required",
                Some(Today),
            ),
            record(
                "R17",
                "If station signalling conversion is active, then service adjustments are required",
                &["Station_Signalling_Conversion_Active"],
                "Service_Adjustments_Required",
                Some(Today),
            ),
            record(
                "R19",
                "If platform screen doors are being modified, then station capacity is reduced",
                &["Platform_Doors_Modification_Active"],
                "Station_Reduced_Capacity",
                Some(Today),
            ),
            record(
                "R20",
                "If power supply conversion is active, then alternative routing is required",
                &["Power_Supply_Conversion_Active"],
                "Alternative_Routing_Required",
                Some(Today),
            ),
            record(
                "R25",
                "If Tanah Merah is undergoing integration work, then Tanah Merah station is NOT open",
                &["Integration_Work_TanahMerah"],
                "Station_Closed_TanahMerah",
                Some(Today),
            ),
        ]
    }

    fn routing_rules() -> Vec<RuleRecord> {
        use NetworkMode::Today;

        let ewl_disrupted = ServiceStatus::Disrupted.proposition("EWL");

        vec![
            record(
                "R21",
                "In Today Mode, a route to Changi Airport uses the EWL airport branch",
                &["Network_Mode_Today", "Destination_Changi_Airport"],
                "Route_Uses_EWL_Airport",
                Some(Today),
            ),
            record(
                "R22",
                "If the EWL airport branch is active AND Expo is open, then transfer is available at Expo",
                &["Line_Active_EWL_Airport", "Station_Open_Expo"],
                "Transfer_Available_Expo",
                Some(Today),
            ),
            record(
                "R23",
                "If EWL service is disrupted, then alternative routing is required",
                &[ewl_disrupted.as_str()],
                "Alternative_Routing_Required",
                None,
            ),
            record(
                "R24",
                "If Tanah Merah station is closed, then no transfers are available at Tanah Merah",
                &["Station_Closed_TanahMerah"],
                "Transfer_Unavailable_TanahMerah",
                None,
            ),
            record(
                "R27",
                "If crowding risk is high during peak hour, then crowd control measures are required",
                &["Crowding_Risk_High", "Time_Peak"],
                "Crowd_Control_Measures_Required",
                None,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transit_table_loads() {
        let kb = BuiltinRules::transit().unwrap();
        assert_eq!(kb.len(), 27);

        let mut ids: Vec<u32> = kb
            .rules()
            .iter()
            .map(|r| r.id().trim_start_matches('R').parse().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=27).collect::<Vec<_>>());
    }

    #[test]
    fn test_minimal_table_is_core_prefix() {
        let minimal = BuiltinRules::minimal().unwrap();
        let transit = BuiltinRules::transit().unwrap();

        assert_eq!(minimal.len(), 12);
        assert_eq!(minimal.rules(), &transit.rules()[..12]);

        let summary = minimal.summary();
        assert_eq!(summary.today, 7);
        assert_eq!(summary.future, 11);
        assert_eq!(summary.mode_independent, 6);
    }

    #[test]
    fn test_service_status_rules_use_status_propositions() {
        let kb = BuiltinRules::transit().unwrap();
        assert_eq!(
            kb.rule_by_id("R5").unwrap().antecedent(),
            ["Service_Status_Disrupted_TEL".to_string()]
        );
        assert_eq!(
            kb.rule_by_id("R8").unwrap().antecedent()[0],
            ServiceStatus::Reduced.proposition("TEL")
        );
        assert_eq!(
            kb.rule_by_id("R23").unwrap().antecedent(),
            [ServiceStatus::Disrupted.proposition("EWL")]
        );
    }

    #[test]
    fn test_expo_closure_rule() {
        let kb = BuiltinRules::transit().unwrap();
        let r2 = kb.rule_by_id("R2").unwrap();
        assert_eq!(r2.antecedent(), ["Integration_Work_Expo".to_string()]);
        assert_eq!(r2.consequent(), "Station_Closed_Expo");
        assert_eq!(kb.opposite_of("Station_Closed_Expo"), Some("Station_Open_Expo"));
        assert_eq!(
            kb.opposite_of("Line_Inactive_EWL_Airport"),
            Some("Line_Active_EWL_Airport")
        );
    }
}
