//! Mapping feature properties to output layer names.

use anyhow::{Result, bail};
use kachel_geometry::{GeoProperties, GeoValue, KEY_LAYER};

/// Decides which named layer a feature belongs to.
///
/// Returning `Ok(None)` drops the feature from tiled output.
pub trait LayerClassifier: Send + Sync {
	fn layer_name(&self, properties: &GeoProperties) -> Result<Option<String>>;
}

/// The standard classifier: an explicit `@layer` property wins, otherwise
/// the configured default layer applies (or the feature is dropped when no
/// default is set).
pub struct PropertyClassifier {
	default_layer: Option<String>,
}

impl PropertyClassifier {
	pub fn new(default_layer: Option<&str>) -> PropertyClassifier {
		PropertyClassifier {
			default_layer: default_layer.map(str::to_string),
		}
	}

	/// Classifier with the conventional `"default"` fallback layer.
	pub fn with_default() -> PropertyClassifier {
		PropertyClassifier::new(Some("default"))
	}
}

impl LayerClassifier for PropertyClassifier {
	fn layer_name(&self, properties: &GeoProperties) -> Result<Option<String>> {
		match properties.get(KEY_LAYER) {
			// a non-string @layer is a caller contract violation, never coerced
			Some(GeoValue::String(name)) => Ok(Some(name.clone())),
			Some(other) => bail!("property {KEY_LAYER} must be a string, got {other:?}"),
			None => Ok(self.default_layer.clone()),
		}
	}
}
