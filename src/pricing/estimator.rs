//! Token counts → cost figures, ranked cheapest first.

use super::catalog::{ModelPricing, PriceCatalog};
use super::error::PricingError;
use std::cmp::Ordering;
use std::sync::Arc;

/// Cost of one model for a given token volume. Figures are unrounded USD.
#[derive(Debug, Clone)]
pub struct CostEstimate {
    pub model: Arc<ModelPricing>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    /// Whether long-context prices were applied.
    pub long_context: bool,
}

impl CostEstimate {
    pub fn total_cost(&self) -> f64 {
        self.input_cost + self.output_cost
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn fits_context_window(&self) -> bool {
        self.total_tokens() <= self.model.context_window
    }
}

pub struct CostEstimator<'a> {
    catalog: &'a PriceCatalog,
}

impl<'a> CostEstimator<'a> {
    pub fn new(catalog: &'a PriceCatalog) -> Self {
        Self { catalog }
    }

    /// Price one model. Long-context prices are used only when requested and
    /// the model declares a long-context input price; the paired output price
    /// falls back to the standard one.
    pub fn estimate(
        &self,
        model_key: &str,
        input_tokens: u64,
        output_tokens: u64,
        use_long_pricing: bool,
    ) -> Result<CostEstimate, PricingError> {
        let model = self
            .catalog
            .lookup(model_key)
            .ok_or_else(|| PricingError::ModelNotFound(model_key.to_string()))?;

        let (input_price, output_price, long_context) =
            match (use_long_pricing, model.long_context_input_price) {
                (true, Some(long_input)) => (
                    long_input,
                    model.long_context_output_price.unwrap_or(model.output_price_per_1k),
                    true,
                ),
                _ => (model.input_price_per_1k, model.output_price_per_1k, false),
            };

        Ok(CostEstimate {
            model: Arc::clone(model),
            input_tokens,
            output_tokens,
            input_cost: cost_for(input_tokens, input_price),
            output_cost: cost_for(output_tokens, output_price),
            long_context,
        })
    }

    /// Price every key at standard rates, skip unknown keys, sort ascending by
    /// total cost. The sort is stable: equal totals keep their input order.
    pub fn compare_models<S: AsRef<str>>(
        &self,
        model_keys: &[S],
        input_tokens: u64,
        output_tokens: u64,
    ) -> Vec<CostEstimate> {
        self.compare_models_with(model_keys, input_tokens, output_tokens, false)
    }

    pub fn compare_models_with<S: AsRef<str>>(
        &self,
        model_keys: &[S],
        input_tokens: u64,
        output_tokens: u64,
        use_long_pricing: bool,
    ) -> Vec<CostEstimate> {
        let mut estimates: Vec<CostEstimate> = model_keys
            .iter()
            .filter_map(|key| {
                match self.estimate(key.as_ref(), input_tokens, output_tokens, use_long_pricing) {
                    Ok(estimate) => Some(estimate),
                    Err(e) => {
                        tracing::debug!("Skipping model in comparison: {}", e);
                        None
                    }
                }
            })
            .collect();

        estimates.sort_by(|a, b| {
            a.total_cost().partial_cmp(&b.total_cost()).unwrap_or(Ordering::Equal)
        });
        estimates
    }
}

/// The lowest-cost entry of an ascending comparison.
pub fn cheapest(estimates: &[CostEstimate]) -> Option<&CostEstimate> {
    estimates.first()
}

fn cost_for(tokens: u64, price_per_1k: f64) -> f64 {
    (tokens as f64 / 1000.0) * price_per_1k
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
providers:
  openai:
    models:
      gpt-4: { input_price: 0.03, output_price: 0.06, context_window: 8192 }
      gpt-4o-mini: { input_price: 0.00015, output_price: 0.0006, context_window: 128000 }
      gpt-4o-mini-clone: { input_price: 0.00015, output_price: 0.0006, context_window: 128000 }
  anthropic:
    models:
      claude-3-haiku: { input_price: 0.00025, output_price: 0.00125, context_window: 200000 }
  google:
    models:
      gemini-1.5-pro:
        input_price: 0.00125
        output_price: 0.005
        context_window: 2000000
        input_price_long: 0.0025
      gemini-1.5-flash:
        input_price: 0.000075
        output_price: 0.0003
        context_window: 1000000
        input_price_long: 0.00015
        output_price_long: 0.0006
"#;

    fn catalog() -> PriceCatalog {
        PriceCatalog::from_yaml_str(SAMPLE).expect("catalog")
    }

    #[test]
    fn gpt4_input_only() {
        let catalog = catalog();
        let estimate = CostEstimator::new(&catalog).estimate("gpt-4", 1000, 0, false).unwrap();
        assert_eq!(estimate.input_cost, 0.03);
        assert_eq!(estimate.output_cost, 0.0);
        assert_eq!(estimate.total_cost(), 0.03);
    }

    #[test]
    fn gpt4_with_output() {
        let catalog = catalog();
        let estimate = CostEstimator::new(&catalog).estimate("gpt-4", 1000, 500, false).unwrap();
        assert_eq!(estimate.output_cost, 0.03);
        assert_eq!(estimate.total_cost(), 0.06);
    }

    #[test]
    fn unknown_model_is_not_found() {
        let catalog = catalog();
        let err = CostEstimator::new(&catalog).estimate("nonexistent", 1, 1, false).unwrap_err();
        assert!(matches!(err, PricingError::ModelNotFound(ref k) if k == "nonexistent"));
    }

    #[test]
    fn long_pricing_only_when_requested_and_defined() {
        let catalog = catalog();
        let estimator = CostEstimator::new(&catalog);

        let normal = estimator.estimate("gemini-1.5-pro", 1000, 1000, false).unwrap();
        let long = estimator.estimate("gemini-1.5-pro", 1000, 1000, true).unwrap();
        assert!(long.input_cost > normal.input_cost);
        // No long output price declared: standard output price applies.
        assert_eq!(long.output_cost, normal.output_cost);
        assert!(long.long_context);

        let flash = estimator.estimate("gemini-1.5-flash", 1000, 1000, true).unwrap();
        assert!((flash.output_cost - 0.0006).abs() < 1e-12);

        let gpt4 = estimator.estimate("gpt-4", 1000, 0, true).unwrap();
        assert!(!gpt4.long_context);
        assert_eq!(gpt4.input_cost, 0.03);
    }

    #[test]
    fn comparison_is_sorted_for_every_permutation() {
        let catalog = catalog();
        let estimator = CostEstimator::new(&catalog);
        let keys = ["gpt-4", "gpt-4o-mini", "claude-3-haiku", "gemini-1.5-pro"];
        let permutations = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];

        let mut orders = Vec::new();
        for perm in permutations {
            let ordered: Vec<&str> = perm.iter().map(|&i| keys[i]).collect();
            let results = estimator.compare_models(&ordered, 1000, 500);
            assert_eq!(results.len(), 4);
            for pair in results.windows(2) {
                assert!(pair[0].total_cost() <= pair[1].total_cost());
            }
            orders.push(results.iter().map(|e| e.model.model_id.clone()).collect::<Vec<_>>());
        }
        assert!(orders.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(orders[0][0], "gpt-4o-mini");
    }

    #[test]
    fn ties_keep_input_order() {
        let catalog = catalog();
        let estimator = CostEstimator::new(&catalog);
        let a = estimator.compare_models(&["gpt-4o-mini-clone", "gpt-4o-mini"], 1000, 0);
        assert_eq!(a[0].model.model_id, "gpt-4o-mini-clone");
        let b = estimator.compare_models(&["gpt-4o-mini", "gpt-4o-mini-clone"], 1000, 0);
        assert_eq!(b[0].model.model_id, "gpt-4o-mini");
    }

    #[test]
    fn empty_and_unknown_comparisons_are_empty() {
        let catalog = catalog();
        let estimator = CostEstimator::new(&catalog);
        let empty: [&str; 0] = [];
        assert!(estimator.compare_models(&empty, 1000, 0).is_empty());
        assert!(estimator.compare_models(&["nonexistent"], 1000, 0).is_empty());
        assert!(cheapest(&[]).is_none());
    }

    #[test]
    fn unknown_keys_are_skipped_not_fatal() {
        let catalog = catalog();
        let results = CostEstimator::new(&catalog).compare_models(
            &["gpt-4".to_string(), "typo-model".to_string()],
            10,
            0,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(cheapest(&results).map(|e| e.model.model_id.as_str()), Some("gpt-4"));
    }

    #[test]
    fn context_window_check() {
        let catalog = catalog();
        let estimator = CostEstimator::new(&catalog);
        assert!(estimator.estimate("gpt-4", 8000, 192, false).unwrap().fits_context_window());
        assert!(!estimator.estimate("gpt-4", 8000, 193, false).unwrap().fits_context_window());
    }
}
