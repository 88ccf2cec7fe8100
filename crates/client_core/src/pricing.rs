//! Pricing carousel state. Purely presentational.

use shared::domain::{PricingPlan, DEFAULT_PLAN_INDEX, PLANS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanCarousel {
    active: usize,
}

impl Default for PlanCarousel {
    fn default() -> Self {
        Self {
            active: DEFAULT_PLAN_INDEX,
        }
    }
}

impl PlanCarousel {
    pub fn with_active(index: usize) -> Self {
        let mut carousel = Self::default();
        carousel.click(index);
        carousel
    }

    pub fn plans(&self) -> &'static [PricingPlan] {
        &PLANS
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn active_plan(&self) -> &'static PricingPlan {
        &PLANS[self.active]
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == index
    }

    pub fn click(&mut self, index: usize) {
        self.active = index.min(PLANS.len() - 1);
    }

    /// Snaps to the card nearest the scroll position when a drag ends.
    /// The first card is centred at offset zero, hence the `+ 1`.
    pub fn release_drag(&mut self, scroll_offset: f32, card_width: f32) {
        if card_width.is_nan() || card_width <= 0.0 || !scroll_offset.is_finite() {
            return;
        }
        let snapped = (scroll_offset / card_width).round() as i64 + 1;
        self.active = snapped.clamp(0, PLANS.len() as i64 - 1) as usize;
    }

    pub fn next(&mut self) {
        self.click(self.active.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.click(self.active.saturating_sub(1));
    }
}
