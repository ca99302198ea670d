#[cfg(test)]
mod tests {
    use crate::config::RenderConfig;
    use crate::enums::*;
    use crate::features::{FeatureSet, MapLabel};
    use crate::types::{GeoBounds, GeoPoint, Point, Rgb};

    /// Verify all enums round-trip through serde_json.
    #[test]
    fn test_outline_kind_serde() {
        let variants = vec![
            OutlineKind::Rectangle,
            OutlineKind::Square,
            OutlineKind::Circle,
            OutlineKind::Hexagon,
            OutlineKind::DinLandscape,
            OutlineKind::DinPortrait,
        ];
        for v in variants {
            let json = serde_json::to_string(&v).unwrap();
            let back: OutlineKind = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_outline_kind_short_aliases() {
        let cases = [
            ("\"rect\"", OutlineKind::Rectangle),
            ("\"sq\"", OutlineKind::Square),
            ("\"hex\"", OutlineKind::Hexagon),
            ("\"din_l\"", OutlineKind::DinLandscape),
            ("\"din_p\"", OutlineKind::DinPortrait),
        ];
        for (json, expected) in cases {
            let kind: OutlineKind = serde_json::from_str(json).unwrap();
            assert_eq!(kind, expected, "{json} should parse as {expected:?}");
        }
    }

    #[test]
    fn test_layer_kind_serde() {
        for v in LayerKind::DEFAULT_ORDER {
            let json = serde_json::to_string(&v).unwrap();
            let back: LayerKind = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
        assert_eq!(serde_json::to_string(&LayerKind::Water).unwrap(), "\"water\"");
    }

    #[test]
    fn test_scheme_and_blend_serde() {
        for v in [
            ColorScheme::Color,
            ColorScheme::Mono,
            ColorScheme::Terra,
            ColorScheme::Glacier,
        ] {
            let json = serde_json::to_string(&v).unwrap();
            let back: ColorScheme = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
        for v in [BlendMode::Normal, BlendMode::Multiply, BlendMode::Color] {
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, format!("\"{}\"", v.css_name()));
            let back: BlendMode = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_rgb_serializes_as_hex() {
        let json = serde_json::to_string(&Rgb::new(0x7D, 0xB5, 0xD3)).unwrap();
        assert_eq!(json, "\"#7DB5D3\"");
        let back: Rgb = serde_json::from_str("\"#7db5d3\"").unwrap();
        assert_eq!(back, Rgb::new(0x7D, 0xB5, 0xD3));
        assert!(serde_json::from_str::<Rgb>("\"teal\"").is_err());
    }

    #[test]
    fn test_render_config_roundtrip() {
        let mut cfg = RenderConfig::default();
        cfg.apply_preset(ThemePreset::Grayscale);
        cfg.outline.kind = OutlineKind::Hexagon;
        cfg.layer_order.reverse();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r##"{ "contour": { "density": 12 }, "theme": { "background": "#000000" } }"##;
        let cfg: RenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.contour.density, 12);
        assert_eq!(cfg.contour.smoothing, 4, "Missing fields keep their defaults");
        assert_eq!(cfg.theme.background, Rgb::BLACK);
        assert_eq!(cfg.layer_order, LayerKind::DEFAULT_ORDER.to_vec());
        assert_eq!(cfg.outline.width_mm, 200.0);
    }

    #[test]
    fn test_feature_set_serde() {
        let mut set = FeatureSet::default();
        assert!(set.is_empty());
        set.road_lines.push(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
        set.labels.push(MapLabel {
            name: "Bern".to_string(),
            kind: PlaceKind::City,
            geo: GeoPoint::new(46.95, 7.45),
            position: Point::new(10.0, 20.0),
        });
        let json = serde_json::to_string(&set).unwrap();
        let back: FeatureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
        assert_eq!(back.counts().roads, 1);
        assert_eq!(back.counts().labels, 1);
    }

    #[test]
    fn test_place_kind_ranks() {
        assert_eq!(PlaceKind::from_tag("City"), PlaceKind::City);
        assert_eq!(PlaceKind::from_tag("neighborhood"), PlaceKind::Neighbourhood);
        assert_eq!(PlaceKind::from_tag("locality"), PlaceKind::Other);
        assert!(PlaceKind::City.rank() < PlaceKind::Village.rank());
        assert_eq!(PlaceKind::Peak.rank(), PlaceKind::Town.rank());
        assert_eq!(PlaceKind::Other.rank(), 99);
    }

    #[test]
    fn test_bounds_serde() {
        let b = GeoBounds::new(46.5, 7.9, 46.6, 8.1);
        let json = serde_json::to_string(&b).unwrap();
        let back: GeoBounds = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
