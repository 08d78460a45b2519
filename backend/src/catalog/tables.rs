//! Shipped catalog data

use super::{
    AcceleratorSpec, ContractSpec, CoolingTier, GpuModel, MarketingTier, NetworkTier,
};

pub(super) fn accelerators() -> Vec<AcceleratorSpec> {
    vec![
        AcceleratorSpec {
            model: GpuModel::L4,
            name: "NVIDIA L4".to_string(),
            vram_gb: 24,
            power_watts: 72.0,
            performance: 1.0,
            cost: 3_000.0,
            unlock_revenue: 0.0,
            cooling: CoolingTier::Air,
        },
        AcceleratorSpec {
            model: GpuModel::A100,
            name: "NVIDIA A100".to_string(),
            vram_gb: 80,
            power_watts: 300.0,
            performance: 4.0,
            cost: 18_000.0,
            unlock_revenue: 30_000.0,
            cooling: CoolingTier::Liquid,
        },
        AcceleratorSpec {
            model: GpuModel::H100,
            name: "NVIDIA H100 SXM".to_string(),
            vram_gb: 80,
            power_watts: 700.0,
            performance: 10.0,
            cost: 40_000.0,
            unlock_revenue: 150_000.0,
            cooling: CoolingTier::Liquid,
        },
        AcceleratorSpec {
            model: GpuModel::GB200,
            name: "NVIDIA GB200".to_string(),
            vram_gb: 192,
            power_watts: 1200.0,
            performance: 30.0,
            cost: 120_000.0,
            unlock_revenue: 500_000.0,
            cooling: CoolingTier::AdvancedLiquid,
        },
    ]
}

pub(super) fn contracts() -> Vec<ContractSpec> {
    vec![
        ContractSpec {
            id: "openai_spot".to_string(),
            customer: "NeuralCore Research".to_string(),
            title: "Spot Capacity Reserve".to_string(),
            min_gpus: 20,
            min_h100s: 10,
            network: None,
            cooling: None,
            min_revenue: 50_000.0,
            reserves_gpus: 20,
            monthly_income: 8_000.0,
            negotiation_cost_total: 15_000.0,
            duration_months: 3,
            priority: 1,
        },
        ContractSpec {
            id: "meta_llama".to_string(),
            customer: "PersonalAI Labs".to_string(),
            title: "LLM Training Cluster".to_string(),
            min_gpus: 50,
            min_h100s: 40,
            network: Some(NetworkTier::Infiniband),
            cooling: None,
            min_revenue: 200_000.0,
            reserves_gpus: 50,
            monthly_income: 35_000.0,
            negotiation_cost_total: 40_000.0,
            duration_months: 6,
            priority: 2,
        },
        ContractSpec {
            id: "microsoft_azure".to_string(),
            customer: "CloudAI Systems".to_string(),
            title: "Overflow Capacity Reserve".to_string(),
            min_gpus: 100,
            min_h100s: 80,
            network: Some(NetworkTier::Infiniband),
            cooling: Some(CoolingTier::Liquid),
            min_revenue: 500_000.0,
            reserves_gpus: 100,
            monthly_income: 95_000.0,
            negotiation_cost_total: 100_000.0,
            duration_months: 12,
            priority: 3,
        },
        ContractSpec {
            id: "anthropic_claude".to_string(),
            customer: "SafetyFirst AI".to_string(),
            title: "LLM Training Reserve".to_string(),
            min_gpus: 150,
            min_h100s: 120,
            network: Some(NetworkTier::NvlinkFabric),
            cooling: Some(CoolingTier::Liquid),
            min_revenue: 1_000_000.0,
            reserves_gpus: 150,
            monthly_income: 180_000.0,
            negotiation_cost_total: 200_000.0,
            duration_months: 18,
            priority: 4,
        },
    ]
}

pub(super) fn marketing_tiers() -> Vec<MarketingTier> {
    // (name, cost, unlock revenue, spawn ×, value ×, SLA extension seconds)
    let rows: [(&str, f64, f64, f64, f64, f64); 16] = [
        ("No Marketing", 0.0, 0.0, 1.0, 1.0, 0.0),
        ("Twitter Account", 2_000.0, 5_000.0, 1.15, 1.0, 0.0),
        ("HackerNews Post", 5_000.0, 15_000.0, 1.3, 1.1, 0.0),
        ("Technical Blog", 8_000.0, 30_000.0, 1.45, 1.15, 0.0),
        ("Discord Community", 12_000.0, 50_000.0, 1.6, 1.2, 0.0),
        ("NeurIPS Booth", 20_000.0, 80_000.0, 1.75, 1.3, 0.0),
        ("Hugging Face Integration", 30_000.0, 120_000.0, 2.0, 1.4, 0.0),
        ("First Sales Hire", 40_000.0, 180_000.0, 2.2, 1.5, 0.0),
        ("Case Studies", 50_000.0, 250_000.0, 2.4, 1.65, 0.0),
        ("Enterprise Outreach", 75_000.0, 350_000.0, 2.7, 1.85, 0.0),
        ("Sales Team (5 AEs)", 100_000.0, 500_000.0, 3.0, 2.1, 0.0),
        ("Customer Success Team", 120_000.0, 700_000.0, 3.2, 2.3, 10.0),
        ("Gartner Magic Quadrant", 150_000.0, 1_000_000.0, 3.5, 2.6, 0.0),
        ("Platform Partnerships", 200_000.0, 1_400_000.0, 3.9, 2.9, 0.0),
        ("Brand Recognition", 250_000.0, 2_000_000.0, 4.3, 3.3, 0.0),
        ("Market Leader", 350_000.0, 3_000_000.0, 5.0, 4.0, 20.0),
    ];

    rows.iter()
        .enumerate()
        .map(
            |(level, &(name, cost, unlock_revenue, spawn, value, sla_extension))| MarketingTier {
                level: level as u32,
                name: name.to_string(),
                cost,
                unlock_revenue,
                spawn_multiplier: spawn,
                value_multiplier: value,
                sla_extension,
            },
        )
        .collect()
}
