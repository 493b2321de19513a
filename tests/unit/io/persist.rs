//! Tests for generator persistence

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ndarray::Array2;
    use tileweave::algorithm::generator::Generator;
    use tileweave::algorithm::trainer::{BuildConfig, Builder};
    use tileweave::analysis::ingest::TrainingMap;
    use tileweave::io::image::Palette;
    use tileweave::io::persist::{
        TrainedBundle, generator_from_bytes, generator_to_bytes, load_bundle, save_bundle,
    };
    use tileweave::spatial::tiles::TileHandle;

    fn trained() -> Generator {
        let mut layer = Array2::from_elem((3, 3), None);
        for y in 0..3 {
            for x in 0..3 {
                layer[[y, x]] = Some(TileHandle(((x + y) % 2) as u32));
            }
        }
        let map = TrainingMap::new(vec![layer], 1.0);
        let config = BuildConfig {
            epochs: 6,
            ..BuildConfig::default()
        };
        Builder::new(vec![map], config).unwrap().run().unwrap()
    }

    // Tests byte encoding preserves every learned field
    // Verified by truncating the tensor during encoding
    #[test]
    fn test_bytes_roundtrip() {
        let generator = trained();
        let bytes = generator_to_bytes(&generator).unwrap();
        let restored = generator_from_bytes(&bytes).unwrap();

        assert_eq!(restored.layer_count(), generator.layer_count());
        assert_eq!(restored.unique_count(), generator.unique_count());
        assert_eq!(restored.epochs_trained(), generator.epochs_trained());
        assert_eq!(restored.radius(), generator.radius());
        assert_eq!(restored.tiles(), generator.tiles());
        // The encoding itself must be deterministic
        assert_eq!(bytes, generator_to_bytes(&restored).unwrap());
    }

    // Tests corrupted bytes decode to an error, not a panic
    // Verified by slicing the buffer before decoding
    #[test]
    fn test_corrupt_bytes_error() {
        let generator = trained();
        let mut bytes = generator_to_bytes(&generator).unwrap();
        bytes.truncate(bytes.len() / 3);
        assert!(generator_from_bytes(&bytes).is_err());
    }

    // Tests the bundle file round trip keeps generator and palette together
    // Verified by writing the generator without the palette
    #[test]
    fn test_bundle_file_roundtrip() {
        let mut palette = Palette::new();
        palette.intern([0, 0, 0, 255]);
        palette.intern([255, 255, 255, 255]);

        let bundle = TrainedBundle {
            generator: trained(),
            palette: palette.clone(),
        };

        let path: PathBuf =
            std::env::temp_dir().join(format!("tileweave_{}_bundle.bin", std::process::id()));
        save_bundle(&bundle, &path).unwrap();
        let restored = load_bundle(&path).unwrap();

        assert_eq!(restored.palette, palette);
        assert_eq!(
            restored.generator.unique_count(),
            bundle.generator.unique_count()
        );

        let _ = std::fs::remove_file(path);
    }
}
