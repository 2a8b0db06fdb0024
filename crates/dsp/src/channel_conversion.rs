use crate::ChannelFormat;

/// A converter between the two channel layouts the renderer understands.
///
/// The rules are as follows:
///
/// - Mono to stereo broadcasts the mono channel equally to both stereo channels.
/// - Stereo to mono squashes the stereo channels together.
/// - A format converted to itself is copied.
/// - Any raw format to and/or from anything is an error.  Nothing in a binaural renderer can say what a 6-channel file
///   should sound like at one ear.
#[derive(Clone, Debug)]
pub struct ChannelConverter {
    input_format: ChannelFormat,
    output_format: ChannelFormat,
}

/// Reasons it isn't possible to convert from one format to another.
#[derive(Debug, thiserror::Error)]
pub enum ChannelConversionError {
    #[error("Cannot convert from {0}: only mono and stereo inputs are supported")]
    UnsupportedInput(ChannelFormat),

    #[error("Cannot convert to {0}: only mono and stereo outputs are supported")]
    UnsupportedOutput(ChannelFormat),
}

impl ChannelConverter {
    /// get a converter to convert from the input to output formats, if possible.
    pub fn new(
        input_format: ChannelFormat,
        output_format: ChannelFormat,
    ) -> Result<ChannelConverter, ChannelConversionError> {
        if input_format.is_raw() {
            return Err(ChannelConversionError::UnsupportedInput(input_format));
        }

        if output_format.is_raw() {
            return Err(ChannelConversionError::UnsupportedOutput(output_format));
        }

        Ok(ChannelConverter {
            input_format,
            output_format,
        })
    }

    pub fn output_format(&self) -> &ChannelFormat {
        &self.output_format
    }

    /// Convert interleaved input, appending the interleaved result to `output`.
    ///
    /// Trailing samples which do not make up a whole input frame are ignored.
    pub fn convert_into(&self, input_data: &[f32], output: &mut Vec<f32>) {
        use ChannelFormat as CF;

        let in_chans = self.input_format.get_channel_count().get();
        let frames = input_data.len() / in_chans;
        output.reserve(frames * self.output_format.get_channel_count().get());

        match (&self.input_format, &self.output_format) {
            (CF::Mono, CF::Stereo) => {
                for s in &input_data[..frames] {
                    output.extend_from_slice(&[*s, *s]);
                }
            }
            (CF::Stereo, CF::Mono) => {
                for frame in input_data.chunks_exact(2) {
                    output.push((frame[0] + frame[1]) * 0.5f32);
                }
            }
            (CF::Mono, CF::Mono) | (CF::Stereo, CF::Stereo) => {
                output.extend_from_slice(&input_data[..frames * in_chans]);
            }
            _ => unreachable!("The constructor rejects raw formats"),
        }
    }

    /// Convenience wrapper over [ChannelConverter::convert_into] which allocates the output.
    pub fn convert(&self, input_data: &[f32]) -> Vec<f32> {
        let mut output = vec![];
        self.convert_into(input_data, &mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::num::NonZeroUsize;

    #[test]
    fn test_mono_to_stereo() {
        let input: [f32; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

        let converter = ChannelConverter::new(ChannelFormat::Mono, ChannelFormat::Stereo).unwrap();
        assert_eq!(
            converter.convert(&input[..]),
            vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0, 5.0, 5.0]
        );
    }

    #[test]
    fn test_stereo_to_mono() {
        let input: [f32; 6] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

        let converter = ChannelConverter::new(ChannelFormat::Stereo, ChannelFormat::Mono).unwrap();
        assert_eq!(converter.convert(&input[..]), vec![1.5, 3.5, 5.5]);
    }

    #[test]
    fn test_partial_frame_dropped() {
        let input: [f32; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

        let converter =
            ChannelConverter::new(ChannelFormat::Stereo, ChannelFormat::Stereo).unwrap();
        assert_eq!(converter.convert(&input[..]), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_raw_rejected() {
        let six = ChannelFormat::Raw {
            channels: NonZeroUsize::new(6).unwrap(),
        };

        assert!(matches!(
            ChannelConverter::new(six.clone(), ChannelFormat::Stereo),
            Err(ChannelConversionError::UnsupportedInput(_))
        ));
        assert!(matches!(
            ChannelConverter::new(ChannelFormat::Mono, six),
            Err(ChannelConversionError::UnsupportedOutput(_))
        ));
    }
}
