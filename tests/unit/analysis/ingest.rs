//! Tests for example validation and adjacency extraction

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use tileweave::EngineError;
    use tileweave::analysis::ingest::{TrainingMap, ingest, validate_examples};
    use tileweave::spatial::geometry::{BorderFlags, BorderSide, ConnectivityKind, Direction};
    use tileweave::spatial::tiles::TileHandle;

    /// Build a one-layer example from rows listed top row first
    fn example(rows: &[&str], commonality: f64) -> TrainingMap {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        let mut layer = Array2::from_elem((height, width), None);
        for (ri, row) in rows.iter().enumerate() {
            for (ci, ch) in row.chars().enumerate() {
                if ch != '.' {
                    layer[[height - 1 - ri, ci]] = Some(TileHandle(ch as u32));
                }
            }
        }
        TrainingMap::new(vec![layer], commonality)
    }

    // Tests the fail-fast validation paths
    // Verified by deferring validation until the first epoch
    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            validate_examples(&[]),
            Err(EngineError::ZeroMaps)
        ));

        let no_layers = TrainingMap::new(vec![], 1.0);
        assert!(matches!(
            validate_examples(&[no_layers]),
            Err(EngineError::NullMaps)
        ));

        let one = TrainingMap::new(vec![Array2::from_elem((2, 2), None)], 1.0);
        let two = TrainingMap::new(
            vec![
                Array2::from_elem((2, 2), None),
                Array2::from_elem((2, 2), None),
            ],
            1.0,
        );
        assert!(matches!(
            validate_examples(&[one.clone(), two]),
            Err(EngineError::MismatchedLayers {
                expected: 1,
                found: 2
            })
        ));

        let negative = TrainingMap::new(vec![Array2::from_elem((2, 2), None)], -1.0);
        assert!(matches!(
            validate_examples(&[one.clone(), negative]),
            Err(EngineError::InvalidCommonality { .. })
        ));

        let zero = TrainingMap::new(vec![Array2::from_elem((2, 2), None)], 0.0);
        assert!(matches!(
            validate_examples(&[zero]),
            Err(EngineError::InvalidCommonality { .. })
        ));
    }

    // Tests distinct tuples get distinct indices and repeats share one
    // Verified by assigning per-cell instead of per-tuple
    #[test]
    fn test_uniqueness_assignment() {
        let map = example(&["GW", "GG"], 1.0);
        let result = ingest(
            &[map],
            ConnectivityKind::Four,
            BorderFlags::default(),
            false,
            None,
        )
        .unwrap();

        assert_eq!(result.tiles.len(), 2);
        assert_eq!(result.layer_count, 1);
        assert!(result.empty_index.is_none());
        // Three G cells share one index
        let grid = &result.index_grids[0];
        assert_eq!(grid[[0, 0]], grid[[1, 0]]);
        assert_ne!(grid[[1, 0]], grid[[1, 1]]);
    }

    // Tests every observed pair lands in the table with no false negatives
    // Verified by scanning only even cells
    #[test]
    fn test_adjacency_recording() {
        let map = example(&["GW", "GG"], 1.0);
        let result = ingest(
            &[map],
            ConnectivityKind::Four,
            BorderFlags::default(),
            false,
            None,
        )
        .unwrap();

        let grid = &result.index_grids[0];
        let g = grid[[1, 0]].unwrap();
        let w = grid[[1, 1]].unwrap();

        let table = &result.connectivity;
        assert!(table.get(Direction::Right, g, w));
        assert!(table.get(Direction::Left, w, g));
        assert!(table.get(Direction::Top, g, g));
        assert!(table.get(Direction::Bottom, w, g));
        // W sits above the bottom-right G, but never below any G
        assert!(table.get(Direction::Top, g, w));
        assert!(!table.get(Direction::Bottom, g, w));
    }

    // Tests holes are skipped entirely without the empty sentinel
    // Verified by recording holes as a false adjacency
    #[test]
    fn test_holes_skipped_without_empty_tile() {
        let map = example(&["G.", "GG"], 1.0);
        let result = ingest(
            &[map],
            ConnectivityKind::Four,
            BorderFlags::default(),
            false,
            None,
        )
        .unwrap();

        assert_eq!(result.tiles.len(), 1);
        assert!(result.index_grids[0][[1, 1]].is_none());
    }

    // Tests the empty sentinel covers holes and out-of-bounds neighbors
    // Verified by reserving the sentinel without ever observing it
    #[test]
    fn test_empty_as_tile() {
        let map = example(&["G.", "GG"], 1.0);
        let result = ingest(
            &[map],
            ConnectivityKind::Four,
            BorderFlags::default(),
            true,
            None,
        )
        .unwrap();

        let empty = result.empty_index.unwrap();
        let g = result.index_grids[0][[0, 0]].unwrap();
        assert_eq!(result.index_grids[0][[1, 1]], Some(empty));

        let table = &result.connectivity;
        // The hole sits to the right of the top-left G
        assert!(table.get(Direction::Right, g, empty));
        // Cells on the map edge see the sentinel beyond the edge
        assert!(table.get(Direction::Left, g, empty));
        assert!(table.get(Direction::Bottom, g, empty));
    }

    // Tests only enabled border sides are recorded
    // Verified by recording all four sides unconditionally
    #[test]
    fn test_border_recording_respects_flags() {
        let map = example(&["GG", "SS"], 1.0);
        let borders = BorderFlags {
            bottom: true,
            ..BorderFlags::default()
        };
        let result = ingest(&[map], ConnectivityKind::Four, borders, false, None).unwrap();

        let grid = &result.index_grids[0];
        let s = grid[[0, 0]].unwrap();
        let g = grid[[1, 0]].unwrap();

        assert!(result.connectivity.get_border(BorderSide::Bottom, s));
        assert!(!result.connectivity.get_border(BorderSide::Bottom, g));
        assert!(!result.connectivity.get_border(BorderSide::Top, g));
    }

    // Tests hex adjacency uses the odd-row convention during ingest
    // Verified by applying even-row offsets everywhere
    #[test]
    fn test_hex_ingest_parity() {
        // Bottom row B B, top (odd) row A A
        let map = example(&["AA", "BB"], 1.0);
        let result = ingest(
            &[map],
            ConnectivityKind::Hex,
            BorderFlags::default(),
            false,
            None,
        )
        .unwrap();

        let grid = &result.index_grids[0];
        let b = grid[[0, 0]].unwrap();
        let a = grid[[1, 0]].unwrap();
        let table = &result.connectivity;

        // A at (0, 1) reaches bottom-right to (1, 0) = B
        assert!(table.get(Direction::BottomRight, a, b));
        // A never sits in a bottom-right relation to another A
        assert!(!table.get(Direction::BottomRight, a, a));
        assert!(table.get(Direction::Right, a, a));
        assert!(table.get(Direction::Right, b, b));
    }
}
