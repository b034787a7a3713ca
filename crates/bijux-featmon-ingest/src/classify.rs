// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{SourceType, UNCATEGORIZED_AREA};
use bijux_featmon_policies::AreaRule;

/// Ordered product-area rules; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct AreaClassifier {
    rules: Vec<AreaRule>,
}

impl AreaClassifier {
    #[must_use]
    pub fn new(rules: Vec<AreaRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn classify(&self, title: &str, labels: &[String], source: SourceType) -> String {
        self.rules
            .iter()
            .find(|rule| rule.matches(title, labels, source))
            .map_or_else(|| UNCATEGORIZED_AREA.to_string(), |rule| rule.area.clone())
    }
}
