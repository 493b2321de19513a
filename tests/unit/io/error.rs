//! Tests for error display and helpers

#[cfg(test)]
mod tests {
    use tileweave::EngineError;
    use tileweave::io::error::invalid_parameter;

    // Tests the messages carry their context fields
    // Verified by collapsing all variants into one generic string
    #[test]
    fn test_display_carries_context() {
        let mismatch = EngineError::MismatchedLayers {
            expected: 2,
            found: 3,
        };
        let text = mismatch.to_string();
        assert!(text.contains('2') && text.contains('3'));

        let fault = EngineError::NumericFault { epoch: 41 };
        assert!(fault.to_string().contains("41"));

        let layer = EngineError::LayerCountMismatch {
            expected: 1,
            found: 4,
        };
        assert!(layer.to_string().contains('4'));
    }

    // Tests the helper fills every field of the parameter error
    // Verified by dropping the reason from the constructor
    #[test]
    fn test_invalid_parameter_helper() {
        let error = invalid_parameter("radius", &0, &"must be at least 1");
        match error {
            EngineError::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                assert_eq!(parameter, "radius");
                assert_eq!(value, "0");
                assert!(reason.contains("at least 1"));
            }
            _ => unreachable!("expected InvalidParameter"),
        }
    }

    // Tests io errors convert into the filesystem variant
    // Verified by mapping them onto the serialization variant
    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: EngineError = io.into();
        assert!(matches!(error, EngineError::FileSystem { .. }));
    }
}
