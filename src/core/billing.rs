//! Billing calculator - Price, savings and discount for a plan and billing cycle.
//!
//! Everything here is pure arithmetic over a plan record. Monetary values are
//! plain `f64` dollars; a plan with a zero monthly price yields zero for every
//! derived figure instead of `NaN` or infinity.

use crate::{
    entities::subscription_plan,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};

/// How often a subscription is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    /// Charged every month at `price_monthly`
    Monthly,
    /// Charged every year at `price_yearly` (or 12 × monthly)
    Yearly,
}

impl BillingCycle {
    /// Storage form of the cycle
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses the storage form, case-insensitively.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(Error::InvalidValue {
                field: "billing cycle",
                value: value.to_string(),
            }),
        }
    }

    /// Length of one billing period in months
    #[must_use]
    pub const fn period_months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Yearly => 12,
        }
    }
}

/// All pricing figures for one plan, as shown on a plan picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanPricing {
    /// Price charged on the monthly cycle
    pub monthly_price: f64,
    /// Price charged on the yearly cycle
    pub yearly_price: f64,
    /// Amount saved per year by paying yearly
    pub yearly_savings: f64,
    /// Yearly discount as a whole percentage
    pub discount_percent: u32,
}

fn annual_list_price(price_monthly: f64) -> f64 {
    price_monthly * 12.0
}

fn effective_yearly_price(plan: &subscription_plan::Model) -> f64 {
    plan.price_yearly
        .unwrap_or_else(|| annual_list_price(plan.price_monthly))
}

/// Returns the amount charged for one period of `cycle`.
///
/// The yearly cycle falls back to `price_monthly × 12` when the plan has no
/// yearly price.
#[must_use]
pub fn calculate_subscription_price(plan: &subscription_plan::Model, cycle: BillingCycle) -> f64 {
    match cycle {
        BillingCycle::Monthly => plan.price_monthly,
        BillingCycle::Yearly => effective_yearly_price(plan),
    }
}

/// Returns how much a customer saves per year on the yearly cycle, never negative.
#[must_use]
pub fn yearly_savings(plan: &subscription_plan::Model) -> f64 {
    (annual_list_price(plan.price_monthly) - effective_yearly_price(plan)).max(0.0)
}

/// Returns the yearly discount as a whole percentage.
///
/// `(monthly×12 − yearly) / (monthly×12) × 100`, rounded to the nearest integer.
/// Zero when the yearly price is not cheaper or the monthly price is zero.
#[must_use]
pub fn discount_percentage(plan: &subscription_plan::Model) -> u32 {
    let annual = annual_list_price(plan.price_monthly);
    let yearly = effective_yearly_price(plan);

    if annual <= 0.0 || !annual.is_finite() || yearly >= annual {
        return 0;
    }

    let percent = ((annual - yearly) / annual * 100.0).round();

    // Cast safety: yearly < annual and annual > 0, so percent is in (0, 100] unless
    // the yearly price is negative, which clamps to 100.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = percent.clamp(0.0, 100.0) as u32;
    whole
}

/// Computes every pricing figure for `plan` at once.
#[must_use]
pub fn plan_pricing(plan: &subscription_plan::Model) -> PlanPricing {
    PlanPricing {
        monthly_price: calculate_subscription_price(plan, BillingCycle::Monthly),
        yearly_price: calculate_subscription_price(plan, BillingCycle::Yearly),
        yearly_savings: yearly_savings(plan),
        discount_percent: discount_percentage(plan),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::plan_model;

    #[test]
    fn test_yearly_price_and_discount_from_explicit_yearly() {
        let plan = plan_model(100.0, Some(1000.0));

        assert_eq!(calculate_subscription_price(&plan, BillingCycle::Yearly), 1000.0);
        assert_eq!(calculate_subscription_price(&plan, BillingCycle::Monthly), 100.0);
        assert_eq!(yearly_savings(&plan), 200.0);
        // 16.67 rounds to 17
        assert_eq!(discount_percentage(&plan), 17);
    }

    #[test]
    fn test_yearly_price_falls_back_to_twelve_months() {
        let plan = plan_model(49.0, None);

        assert_eq!(calculate_subscription_price(&plan, BillingCycle::Yearly), 588.0);
        assert_eq!(yearly_savings(&plan), 0.0);
        assert_eq!(discount_percentage(&plan), 0);
    }

    #[test]
    fn test_no_discount_when_yearly_is_not_cheaper() {
        let equal = plan_model(10.0, Some(120.0));
        let pricier = plan_model(10.0, Some(150.0));

        assert_eq!(discount_percentage(&equal), 0);
        assert_eq!(discount_percentage(&pricier), 0);
        assert_eq!(yearly_savings(&pricier), 0.0);
    }

    #[test]
    fn test_zero_monthly_price_never_divides_by_zero() {
        let free = plan_model(0.0, None);
        let odd = plan_model(0.0, Some(50.0));

        assert_eq!(calculate_subscription_price(&free, BillingCycle::Yearly), 0.0);
        assert_eq!(discount_percentage(&free), 0);
        assert_eq!(discount_percentage(&odd), 0);
        assert_eq!(yearly_savings(&odd), 0.0);
    }

    #[test]
    fn test_plan_pricing_combines_all_figures() {
        let pricing = plan_pricing(&plan_model(100.0, Some(1000.0)));

        assert_eq!(
            pricing,
            PlanPricing {
                monthly_price: 100.0,
                yearly_price: 1000.0,
                yearly_savings: 200.0,
                discount_percent: 17,
            }
        );
    }

    #[test]
    fn test_billing_cycle_parse() {
        assert_eq!(BillingCycle::parse("monthly").unwrap(), BillingCycle::Monthly);
        assert_eq!(BillingCycle::parse(" Yearly ").unwrap(), BillingCycle::Yearly);
        assert!(matches!(
            BillingCycle::parse("weekly"),
            Err(Error::InvalidValue { field: "billing cycle", .. })
        ));
        assert_eq!(BillingCycle::Yearly.as_str(), "yearly");
        assert_eq!(BillingCycle::Yearly.period_months(), 12);
    }
}
