use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);
    };
}

id_newtype!(RequestId);
id_newtype!(PlanId);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingPlan {
    pub id: PlanId,
    pub name: &'static str,
    pub monthly_price: f64,
    pub features: &'static [&'static str],
    pub popular: bool,
}

impl PricingPlan {
    pub fn price_label(&self) -> String {
        format!("${:.2}/month", self.monthly_price)
    }
}

/// Fixed pricing table shown by the plan carousel. Display only.
pub const PLANS: [PricingPlan; 3] = [
    PricingPlan {
        id: PlanId(1),
        name: "Basic",
        monthly_price: 9.99,
        features: &[
            "5 image transformations",
            "Standard quality",
            "Email support",
            "Results within 24 hours",
        ],
        popular: false,
    },
    PricingPlan {
        id: PlanId(2),
        name: "Standard",
        monthly_price: 19.99,
        features: &[
            "25 image transformations",
            "High quality",
            "Priority email support",
            "Results within 12 hours",
            "Download in multiple formats",
        ],
        popular: true,
    },
    PricingPlan {
        id: PlanId(3),
        name: "Premium",
        monthly_price: 39.99,
        features: &[
            "Unlimited transformations",
            "Ultra high quality",
            "24/7 priority support",
            "Instant results",
            "Custom style adjustments",
            "Batch processing",
        ],
        popular: false,
    },
];

/// Index of the plan highlighted when the carousel first renders.
pub const DEFAULT_PLAN_INDEX: usize = 1;

pub fn popular_plan() -> Option<&'static PricingPlan> {
    PLANS.iter().find(|plan| plan.popular)
}
