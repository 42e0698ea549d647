//! Storefront widget settings.

use serde::{Deserialize, Serialize};

/// Where the share button is rendered on the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetPlacement {
    AddToCart,
    Checkout,
    CartPage,
    ProductPage,
}

impl WidgetPlacement {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToCart => "add_to_cart",
            Self::Checkout => "checkout",
            Self::CartPage => "cart_page",
            Self::ProductPage => "product_page",
        }
    }
}

impl std::fmt::Display for WidgetPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WidgetPlacement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_to_cart" => Ok(Self::AddToCart),
            "checkout" => Ok(Self::Checkout),
            "cart_page" => Ok(Self::CartPage),
            "product_page" => Ok(Self::ProductPage),
            _ => Err(format!("invalid widget placement: {s}")),
        }
    }
}

/// Share button appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    #[default]
    TextLogoCustom,
    LogoCustom,
    LogoOriginal,
}

impl ButtonStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextLogoCustom => "text_logo_custom",
            Self::LogoCustom => "logo_custom",
            Self::LogoOriginal => "logo_original",
        }
    }
}

impl std::str::FromStr for ButtonStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text_logo_custom" => Ok(Self::TextLogoCustom),
            "logo_custom" => Ok(Self::LogoCustom),
            "logo_original" => Ok(Self::LogoOriginal),
            _ => Err(format!("invalid button style: {s}")),
        }
    }
}

/// Widget color scheme, as CSS color strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetColors {
    pub button: String,
    pub background: String,
    pub button_text: String,
    pub text: String,
}

impl Default for WidgetColors {
    fn default() -> Self {
        Self {
            button: "#00c2b9".to_owned(),
            background: "#FBFBFB".to_owned(),
            button_text: "#fff".to_owned(),
            text: "#212121".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_roundtrips_through_str() {
        for p in [
            WidgetPlacement::AddToCart,
            WidgetPlacement::Checkout,
            WidgetPlacement::CartPage,
            WidgetPlacement::ProductPage,
        ] {
            assert_eq!(p.as_str().parse::<WidgetPlacement>().unwrap(), p);
        }
        assert!("sidebar".parse::<WidgetPlacement>().is_err());
    }

    #[test]
    fn test_colors_fill_missing_fields_with_defaults() {
        let colors: WidgetColors = serde_json::from_str(r##"{"button":"#000"}"##).unwrap();
        assert_eq!(colors.button, "#000");
        assert_eq!(colors.button_text, "#fff");
        assert_eq!(colors.text, "#212121");
    }
}
