use crate::error::{Result, SleepError};

/// Decimation plan: an integer sample stride and the frequency it yields.
///
/// Downsampling here is plain sample dropping at a fixed stride, without any
/// anti-alias filtering; the readers apply the stride while converting raw
/// samples so only the retained subset is ever materialized.
///
/// # Examples
///
/// ```rust
/// use sleepio::Decimation;
///
/// let plan = Decimation::plan(500.0, Some(100.0))?;
/// assert_eq!(plan.stride, 5);
/// assert_eq!(plan.output_frequency, 100.0);
///
/// // No target means no decimation.
/// let identity = Decimation::plan(500.0, None)?;
/// assert_eq!(identity.stride, 1);
/// assert_eq!(identity.output_frequency, 500.0);
/// # Ok::<(), sleepio::SleepError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimation {
    /// Keep every `stride`-th sample.
    pub stride: usize,
    /// Actual frequency of the decimated output, `sf / stride`.
    pub output_frequency: f64,
}

impl Decimation {
    /// Validates a requested target frequency against the source frequency
    /// and computes the stride.
    ///
    /// The target must be positive and must not exceed the source frequency;
    /// violations fail with [`SleepError::InvalidDownsampleRequest`] before
    /// any data is touched. Because the stride is an integer, the achieved
    /// output frequency may differ slightly from the request.
    pub fn plan(source_frequency: f64, target: Option<f64>) -> Result<Self> {
        let target = match target {
            None => {
                return Ok(Decimation {
                    stride: 1,
                    output_frequency: source_frequency,
                })
            }
            Some(t) => t,
        };

        if target <= 0.0 || target > source_frequency {
            return Err(SleepError::InvalidDownsampleRequest {
                target,
                source_frequency,
            });
        }

        let stride = (source_frequency / target).round().max(1.0) as usize;
        Ok(Decimation {
            stride,
            output_frequency: source_frequency / stride as f64,
        })
    }

    /// Output sample count for an input of `n` samples: `ceil(n / stride)`.
    pub fn output_len(&self, n: usize) -> usize {
        n.div_ceil(self.stride)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_from_round_ratio() {
        let plan = Decimation::plan(500.0, Some(100.0)).unwrap();
        assert_eq!(plan.stride, 5);
        assert_eq!(plan.output_frequency, 100.0);
    }

    #[test]
    fn no_target_is_identity() {
        let plan = Decimation::plan(512.0, None).unwrap();
        assert_eq!(plan.stride, 1);
        assert_eq!(plan.output_frequency, 512.0);
    }

    #[test]
    fn target_above_source_is_rejected() {
        let err = Decimation::plan(500.0, Some(600.0)).unwrap_err();
        assert!(matches!(
            err,
            SleepError::InvalidDownsampleRequest { target, source_frequency }
                if target == 600.0 && source_frequency == 500.0
        ));
    }

    #[test]
    fn non_positive_target_is_rejected() {
        assert!(Decimation::plan(500.0, Some(0.0)).is_err());
        assert!(Decimation::plan(500.0, Some(-10.0)).is_err());
    }

    #[test]
    fn non_integer_ratio_adjusts_output_frequency() {
        // 512 / 100 rounds to stride 5, so the actual output is 102.4 Hz.
        let plan = Decimation::plan(512.0, Some(100.0)).unwrap();
        assert_eq!(plan.stride, 5);
        assert!((plan.output_frequency - 102.4).abs() < 1e-9);
    }

    #[test]
    fn output_len_is_ceiling() {
        let plan = Decimation::plan(500.0, Some(100.0)).unwrap();
        assert_eq!(plan.output_len(1000), 200);
        assert_eq!(plan.output_len(1001), 201);
        assert_eq!(plan.output_len(0), 0);
    }
}
