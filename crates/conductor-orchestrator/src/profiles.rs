use crate::scored::ScoredAgent;

/// Built-in roster for the scored orchestrator, in registration order.
pub fn default_scored_profiles() -> Vec<ScoredAgent> {
    vec![
        coordination_profile(),
        analytics_profile(),
        automation_profile(),
        client_relations_profile(),
        revenue_profile(),
    ]
}

fn coordination_profile() -> ScoredAgent {
    ScoredAgent::new(
        "COORDINATION_COMMANDER",
        "Inter-agent coordination and task orchestration",
        &[
            "task_distribution",
            "agent_coordination",
            "workflow_optimization",
            "resource_allocation",
            "conflict_resolution",
        ],
        &[
            "task_orchestration",
            "agent_coordination",
            "workflow_optimization",
        ],
    )
}

fn analytics_profile() -> ScoredAgent {
    ScoredAgent::new(
        "ANALYTICS_INTELLIGENCE",
        "Analytics and business intelligence",
        &[
            "predictive_modeling",
            "revenue_forecasting",
            "market_analysis",
            "performance_optimization",
            "competitive_intelligence",
        ],
        &[
            "predictive_analytics",
            "business_intelligence",
            "market_analysis",
        ],
    )
}

fn automation_profile() -> ScoredAgent {
    ScoredAgent::new(
        "AUTOMATION_ARCHITECT",
        "Automation design and deployment",
        &[
            "process_automation",
            "workflow_design",
            "system_integration",
            "efficiency_optimization",
            "scalability_planning",
        ],
        &[
            "process_automation",
            "workflow_optimization",
            "system_integration",
        ],
    )
}

fn client_relations_profile() -> ScoredAgent {
    ScoredAgent::new(
        "CLIENT_RELATIONSHIP_MASTER",
        "Client relationship and satisfaction",
        &[
            "client_engagement",
            "relationship_optimization",
            "satisfaction_prediction",
            "retention_management",
            "upsell_coordination",
        ],
        &[
            "client_relationships",
            "customer_success",
            "retention_optimization",
        ],
    )
}

fn revenue_profile() -> ScoredAgent {
    ScoredAgent::new(
        "REVENUE_ORCHESTRATOR",
        "Revenue pipeline coordination",
        &[
            "multi_channel_coordination",
            "dynamic_pricing",
            "conversion_optimization",
            "pipeline_management",
            "predictive_analytics",
        ],
        &["enterprise_sales", "saas_scaling", "revenue_optimization"],
    )
}
