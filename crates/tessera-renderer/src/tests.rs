#[cfg(test)]
mod tests {
    use tessera_core::{Cell, CellAttrs, Cursor, CursorStyle, Point, Rgb, Selection};

    use crate::{CellStore, ComputeParams, DrawParams, GridState, RenderError, Viewport};

    fn grid() -> GridState {
        let mut state = GridState::new(8, 16, 2, false);
        state.resize(800, 600);
        state
    }

    // ──────────────────────────────────────────
    // Resize
    // ──────────────────────────────────────────

    #[test]
    fn test_resize_fits_grid_inside_border() {
        let state = grid();
        assert_eq!((state.cols(), state.rows()), (99, 37));
        assert_eq!(state.cell_count(), 99 * 37);
        assert_eq!(state.image_size(), (792, 592));
    }

    #[test]
    fn test_resize_same_size_is_unchanged() {
        let mut state = GridState::new(8, 16, 2, false);
        assert!(state.resize(800, 600));
        assert!(!state.resize(800, 600));
        assert!(state.resize(801, 600));
        assert!(!state.resize(801, 600));
    }

    #[test]
    fn test_resize_keeps_at_least_one_cell() {
        let mut state = GridState::new(8, 16, 2, false);
        state.resize(3, 3);
        assert_eq!((state.cols(), state.rows()), (1, 1));

        state.resize(0, 0);
        assert_eq!((state.cols(), state.rows()), (1, 1));
    }

    #[test]
    fn test_viewport_sits_at_border() {
        let state = grid();
        assert_eq!(
            state.viewport(),
            Some(Viewport {
                x: 2,
                y: 2,
                width: 792,
                height: 592
            })
        );
        assert_eq!(state.draw_params().view_pixels, [792.0, 592.0]);
    }

    #[test]
    fn test_viewport_clipped_to_tiny_framebuffer() {
        let mut state = GridState::new(8, 16, 2, false);
        assert_eq!(state.viewport(), None);

        state.resize(6, 10);
        // One cell of 8x16 does not fit; only what lies inside the framebuffer is drawn.
        assert_eq!(
            state.viewport(),
            Some(Viewport {
                x: 2,
                y: 2,
                width: 4,
                height: 8
            })
        );

        state.resize(2, 2);
        assert_eq!(state.viewport(), None);
        assert_eq!(state.draw_params().view_pixels, [0.0, 0.0]);
    }

    // ──────────────────────────────────────────
    // Cursor, selection, delta frame
    // ──────────────────────────────────────────

    #[test]
    fn test_cursor_remembers_previous_position() {
        let mut state = grid();
        let cursor = |x, y| Cursor {
            pos: Point::new(x, y),
            style: CursorStyle::Beam,
            color: Rgb::new(1, 2, 3),
        };

        state.set_cursor(cursor(4, 5));
        assert_eq!(state.prev_cursor(), Point::new(0, 0));
        state.set_cursor(cursor(6, 7));
        assert_eq!(state.prev_cursor(), Point::new(4, 5));

        let params = state.compute_params(&[[0.0; 2]; 8], false);
        assert_eq!(params.cursor_pos, [6, 7, 4, 5]);
        assert_eq!(params.cursor_color_style, [1, 2, 3, CursorStyle::Beam as i32]);
    }

    #[test]
    fn test_independent_renderers_keep_separate_history() {
        let mut a = grid();
        let mut b = grid();
        a.set_cursor(Cursor {
            pos: Point::new(9, 9),
            ..Cursor::default()
        });
        a.set_cursor(Cursor::default());
        b.set_cursor(Cursor::default());

        assert_eq!(a.prev_cursor(), Point::new(9, 9));
        assert_eq!(b.prev_cursor(), Point::new(0, 0));
    }

    #[test]
    fn test_selection_damage_spans_old_and_new() {
        let mut state = GridState::new(8, 16, 0, false);
        state.resize(80, 160);
        assert_eq!(state.cols(), 10);

        state.set_selection(Selection::new(Point::new(0, 0), Point::new(2, 2), false));
        let damage = state.set_selection(Selection::new(Point::new(1, 1), Point::new(3, 3), false));
        assert_eq!(damage, 0..34);
        assert_eq!(state.damage(), 0..34);
    }

    #[test]
    fn test_selection_damage_orders_points_by_row() {
        let mut state = GridState::new(8, 16, 0, false);
        state.resize(80, 160);

        state.set_selection(Selection::new(Point::new(8, 1), Point::new(2, 3), false));
        let damage = state.set_selection(Selection::new(Point::new(1, 2), Point::new(9, 2), true));
        // Earliest top-left is (8,1); last bottom-right is (2,3).
        assert_eq!(damage, 18..33);

        let params = state.compute_params(&[[0.0; 2]; 8], false);
        assert_eq!(params.select_rect, [1, 2, 9, 2]);
        assert_eq!(params.select_state, [18, 33, 1, 0]);
    }

    #[test]
    fn test_delta_frame_flag() {
        let mut state = grid();
        state.set_delta_frame(true);
        assert!(state.delta_frame());
        assert_eq!(state.compute_params(&[[0.0; 2]; 8], false).select_state[3], 1);

        state.set_delta_frame(false);
        assert_eq!(state.compute_params(&[[0.0; 2]; 8], false).select_state[3], 0);
    }

    // ──────────────────────────────────────────
    // Uniforms
    // ──────────────────────────────────────────

    #[test]
    fn test_uniform_sizes_match_shader_blocks() {
        assert_eq!(std::mem::size_of::<ComputeParams>(), 160);
        assert_eq!(std::mem::size_of::<DrawParams>(), 16);
    }

    #[test]
    fn test_compute_params_layout() {
        let mut state = GridState::new(8, 16, 2, true);
        state.resize(800, 600);

        let mut metrics = [[0.0f32; 2]; 8];
        for (i, pair) in metrics.iter_mut().enumerate() {
            *pair = [i as f32, 10.0 + i as f32];
        }
        let params = state.compute_params(&metrics, true);

        assert_eq!(params.glyph_size_chars, [8, 16, 99, 37]);
        assert_eq!(params.flags, [1, 1, 0, 0]);
        assert_eq!(params.ul_metrics[0], [0.0, 10.0, 1.0, 11.0]);
        assert_eq!(params.ul_metrics[3], [6.0, 16.0, 7.0, 17.0]);
    }

    // ──────────────────────────────────────────
    // Cell buffer mapping
    // ──────────────────────────────────────────

    #[test]
    fn test_mapping_before_resize_fails() {
        let store = CellStore::new();
        let err = store.map().unwrap_err();
        assert!(matches!(err, RenderError::NotSized { .. }));
        assert!(err.is_invariant_violation());
        assert!(store.ensure_unmapped("draw").is_ok());
    }

    #[test]
    fn test_mapping_is_exclusive() {
        let store = CellStore::new();
        store.reset(4, 2).unwrap();

        let mapping = store.map().unwrap();
        assert_eq!((mapping.cols(), mapping.rows()), (4, 2));
        assert_eq!(mapping.len(), 8);

        let err = store.map().unwrap_err();
        assert!(matches!(
            err,
            RenderError::MappingOpen {
                operation: "get_mapping"
            }
        ));
        assert!(err.is_invariant_violation());

        mapping.finish();
        assert!(store.map().is_ok());
    }

    #[test]
    fn test_draw_and_resize_refused_while_mapped() {
        let store = CellStore::new();
        store.reset(4, 2).unwrap();
        let mapping = store.map().unwrap();

        assert!(matches!(
            store.ensure_unmapped("draw"),
            Err(RenderError::MappingOpen { operation: "draw" })
        ));
        assert!(matches!(
            store.reset(8, 8),
            Err(RenderError::MappingOpen { operation: "resize" })
        ));

        drop(mapping);
        assert!(store.ensure_unmapped("draw").is_ok());
        assert!(store.reset(8, 8).is_ok());
    }

    #[test]
    fn test_mapping_released_on_early_return() {
        fn fill_until_error(store: &CellStore) -> Result<(), RenderError> {
            let mut mapping = store.map()?;
            mapping[0] = Cell::new('x', CellAttrs::empty(), Rgb::WHITE, Rgb::BLACK);
            Err(RenderError::Shader {
                stage: "test",
                log: String::new(),
            })
        }

        let store = CellStore::new();
        store.reset(2, 1).unwrap();
        assert!(fill_until_error(&store).is_err());
        assert!(!store.is_mapped());
    }

    #[test]
    fn test_mapping_writes_reach_next_flush() {
        let store = CellStore::new();
        store.reset(3, 2).unwrap();
        // The fresh grid is dirty once.
        assert!(store.flush(|cells| assert_eq!(cells.len(), 6)));
        assert!(!store.flush(|_| panic!("clean grid uploaded")));

        let mut mapping = store.map().unwrap();
        let cell = Cell::new('A', CellAttrs::BOLD, Rgb::WHITE, Rgb::BLACK);
        mapping.row_mut(1)[2] = cell;
        // Still mapped: nothing to upload yet.
        assert!(!store.flush(|_| panic!("uploaded while mapped")));
        mapping.finish();

        let mut uploaded = Vec::new();
        assert!(store.flush(|cells| uploaded = cells.to_vec()));
        assert_eq!(uploaded[5], cell);
        assert_eq!(uploaded[0], Cell::default());
    }

    #[test]
    fn test_resize_discards_cells() {
        let store = CellStore::new();
        store.reset(2, 2).unwrap();
        let mut mapping = store.map().unwrap();
        mapping.fill(Cell::new('z', CellAttrs::empty(), Rgb::WHITE, Rgb::BLACK));
        mapping.finish();

        store.reset(3, 1).unwrap();
        let mapping = store.map().unwrap();
        assert_eq!(mapping.len(), 3);
        assert!(mapping.iter().all(|c| *c == Cell::default()));
    }
}
