//! Tests for build orchestration, signals, and progress

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use tileweave::EngineError;
    use tileweave::algorithm::trainer::{
        BuildConfig, BuildMode, BuildState, Builder, spawn_build,
    };
    use tileweave::analysis::ingest::TrainingMap;
    use tileweave::spatial::tiles::TileHandle;

    /// Build a one-layer example from rows listed top row first
    fn example(rows: &[&str]) -> TrainingMap {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        let mut layer = Array2::from_elem((height, width), None);
        for (ri, row) in rows.iter().enumerate() {
            for (ci, ch) in row.chars().enumerate() {
                layer[[height - 1 - ri, ci]] = Some(TileHandle(ch as u32));
            }
        }
        TrainingMap::new(vec![layer], 1.0)
    }

    fn quick_config(epochs: u64) -> BuildConfig {
        BuildConfig {
            epochs,
            ..BuildConfig::default()
        }
    }

    // Tests parameter validation rejects degenerate settings up front
    // Verified by deferring the checks into the epoch loop
    #[test]
    fn test_config_validation() {
        let maps = vec![example(&["GG", "GG"])];

        let zero_radius = BuildConfig {
            radius: 0,
            ..quick_config(5)
        };
        assert!(matches!(
            Builder::new(maps.clone(), zero_radius),
            Err(EngineError::InvalidParameter { .. })
        ));

        let zero_epochs = quick_config(0);
        assert!(matches!(
            Builder::new(maps.clone(), zero_epochs),
            Err(EngineError::InvalidParameter { .. })
        ));

        let continue_without_existing = BuildConfig {
            mode: BuildMode::Continue,
            ..quick_config(5)
        };
        assert!(matches!(
            Builder::new(maps.clone(), continue_without_existing),
            Err(EngineError::InvalidParameter { .. })
        ));

        let bad_lr = BuildConfig {
            lr_start: 0.0,
            ..quick_config(5)
        };
        assert!(matches!(
            Builder::new(maps, bad_lr),
            Err(EngineError::InvalidParameter { .. })
        ));
    }

    // Tests a small build runs to completion and reports success
    // Verified by leaving the state at InProgress after the last epoch
    #[test]
    fn test_build_success() {
        let builder = Builder::new(vec![example(&["GW", "GW"])], quick_config(8)).unwrap();
        let progress_handle = builder.progress_handle();

        let generator = builder.run().unwrap();
        assert_eq!(generator.unique_count(), 2);
        assert_eq!(generator.layer_count(), 1);
        assert_eq!(generator.epochs_trained(), 8);

        let progress = progress_handle.lock().unwrap();
        assert_eq!(progress.state, BuildState::Success);
        assert_eq!(progress.epoch, 8);
        assert_eq!(progress.total_epochs, 8);
        assert!(progress.start_time.is_some());
        assert!(progress.end_time.is_some());
        assert!(progress.loss_last.is_finite());
    }

    // Tests a pre-set abort signal cancels before the first epoch
    // Verified by checking the signal after the epoch instead of before
    #[test]
    fn test_cancellation() {
        let builder = Builder::new(vec![example(&["GG", "GG"])], quick_config(1000)).unwrap();
        let progress_handle = builder.progress_handle();
        builder.signals().cancel();

        assert!(matches!(builder.run(), Err(EngineError::Cancelled)));
        assert_eq!(progress_handle.lock().unwrap().state, BuildState::Cancelled);
    }

    // Tests save-and-quit finishes the current epoch and stops cleanly
    // Verified by discarding the epoch in progress on the signal
    #[test]
    fn test_save_and_quit_stops_after_one_epoch() {
        let builder = Builder::new(vec![example(&["GG", "GG"])], quick_config(1000)).unwrap();
        builder.signals().save_and_quit();

        let generator = builder.run().unwrap();
        assert_eq!(generator.epochs_trained(), 1);
    }

    // Tests continuing an existing generator keeps the cumulative epoch
    // counter and the learned tile table
    // Verified by resetting the counter on the second run
    #[test]
    fn test_continue_is_cumulative() {
        let first = Builder::new(vec![example(&["GW", "GW"])], quick_config(5))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(first.epochs_trained(), 5);

        let config = BuildConfig {
            mode: BuildMode::Continue,
            ..quick_config(3)
        };
        let second = Builder::with_existing(first, vec![example(&["GW", "GW"])], config)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(second.epochs_trained(), 8);
        assert_eq!(second.unique_count(), 2);
    }

    // Tests continuing with new tiles grows the tables without losing the
    // old indices
    // Verified by rebuilding the tile table from the new maps alone
    #[test]
    fn test_continue_grows_unique_set() {
        let first = Builder::new(vec![example(&["GW", "GW"])], quick_config(4))
            .unwrap()
            .run()
            .unwrap();
        let old_tiles = first.tiles().to_vec();

        let config = BuildConfig {
            mode: BuildMode::Continue,
            ..quick_config(4)
        };
        let second = Builder::with_existing(first, vec![example(&["GS", "WS"])], config)
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(second.unique_count(), 3);
        assert_eq!(&second.tiles()[..2], &old_tiles[..]);
    }

    // Tests the existing generator's layer count is validated for rebuilds
    // Verified by validating against the example count instead
    #[test]
    fn test_overwrite_layer_validation() {
        let trained = Builder::new(vec![example(&["G"])], quick_config(2))
            .unwrap()
            .run()
            .unwrap();

        let two_layer = TrainingMap::new(
            vec![
                Array2::from_elem((2, 2), Some(TileHandle(1))),
                Array2::from_elem((2, 2), Some(TileHandle(2))),
            ],
            1.0,
        );
        let config = BuildConfig {
            mode: BuildMode::Overwrite,
            ..quick_config(2)
        };
        assert!(matches!(
            Builder::with_existing(trained, vec![two_layer], config),
            Err(EngineError::MismatchedLayers { .. })
        ));
    }

    // Tests the background handle surfaces progress and joins with the
    // trained generator
    // Verified by joining before the worker finishes
    #[test]
    fn test_spawn_build_roundtrip() {
        let builder = Builder::new(vec![example(&["GW", "WG"])], quick_config(10)).unwrap();
        let handle = spawn_build(builder);
        let generator = handle.join().unwrap();
        assert_eq!(generator.epochs_trained(), 10);
    }
}
