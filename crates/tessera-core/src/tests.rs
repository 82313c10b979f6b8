#[cfg(test)]
mod tests {
    use crate::{Cell, CellAttrs, Options, OptionsError, Point, Rgb, Selection};

    // ──────────────────────────────────────────
    // Geometry
    // ──────────────────────────────────────────

    #[test]
    fn test_point_orders_by_row_then_column() {
        assert!(Point::new(9, 0) < Point::new(0, 1));
        assert!(Point::new(1, 3) < Point::new(2, 3));
        assert_eq!(Point::new(3, 3).max(Point::new(2, 2)), Point::new(3, 3));
        assert_eq!(Point::new(5, 1).min(Point::new(0, 2)), Point::new(5, 1));
    }

    #[test]
    fn test_point_linear_index() {
        assert_eq!(Point::new(3, 3).linear(10), 33);
        assert_eq!(Point::new(0, 0).linear(10), 0);
    }

    #[test]
    fn test_selection_empty_when_corners_meet() {
        assert!(Selection::default().is_empty());
        assert!(Selection::new(Point::new(4, 2), Point::new(4, 2), true).is_empty());
        assert!(!Selection::new(Point::new(0, 0), Point::new(1, 0), false).is_empty());
    }

    // ──────────────────────────────────────────
    // Cells
    // ──────────────────────────────────────────

    #[test]
    fn test_cell_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<Cell>(), 16);
    }

    #[test]
    fn test_cell_packs_colors() {
        let cell = Cell::new('A', CellAttrs::UNDERLINE, Rgb::new(0x12, 0x34, 0x56), Rgb::BLACK);
        assert_eq!(cell.codepoint, 0x41);
        assert_eq!(cell.fg, 0x0012_3456);
        assert_eq!(cell.bg, 0);
        assert_eq!(cell.attrs(), CellAttrs::UNDERLINE);
    }

    #[test]
    fn test_cell_font_layer() {
        let layer = |attrs| Cell::new('x', attrs, Rgb::WHITE, Rgb::BLACK).font_layer();
        assert_eq!(layer(CellAttrs::empty()), 0);
        assert_eq!(layer(CellAttrs::BOLD), 1);
        assert_eq!(layer(CellAttrs::ITALIC | CellAttrs::INVERSE), 2);
        assert_eq!(layer(CellAttrs::BOLD | CellAttrs::ITALIC), 3);
    }

    // ──────────────────────────────────────────
    // Options
    // ──────────────────────────────────────────

    #[test]
    fn test_options_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{ "font_size": 20, "show_wraps": true }"#).unwrap();

        let options = Options::load_from(&path).unwrap();
        assert_eq!(options.font_size, 20);
        assert!(options.show_wraps);
        assert_eq!(options.border, 2);
        assert_eq!(options.font, "monospace");
    }

    #[test]
    fn test_options_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("options.json");
        let options = Options {
            border: 7,
            bg: Rgb::new(1, 2, 3),
            dw_font: Some("Noto Sans CJK".to_string()),
            ..Options::default()
        };

        options.save_to(&path).unwrap();
        assert_eq!(Options::load_from(&path).unwrap(), options);
    }

    #[test]
    fn test_options_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{ not json").unwrap();

        match Options::load_from(&path) {
            Err(OptionsError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_options_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Options::load_from(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(OptionsError::Io { .. })));
    }
}
