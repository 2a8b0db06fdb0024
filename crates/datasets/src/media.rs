//! Whole-file decoding through Symphonia.
use std::num::NonZeroU32;
use std::path::Path;

use symphonia::core::{
    audio::{AudioBuffer, Signal},
    codecs::CodecParameters,
    errors::Error as SError,
    io::MediaSourceStream,
    probe::Hint,
};

use binaural_sweep_dsp::{ChannelConverter, ChannelFormat};

use crate::error::{DatasetError, FormatError, FormatProblem, LoadError};
use crate::resampling::ConditionalResampler;

/// A fully decoded file: interleaved f32 samples plus what is needed to interpret them.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub sample_rate: NonZeroU32,
    pub channel_format: ChannelFormat,
    /// Interleaved samples, always a whole number of frames.
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channel_format.get_channel_count().get()
    }
}

fn codec_params_to_channel_format(params: &CodecParameters) -> Option<ChannelFormat> {
    // If Symphonia knows the layout, use it.  Anything other than mono and stereo still gets a format, so that the
    // error later can say what it was.
    if let Some(f) = params.channel_layout {
        use symphonia::core::audio::Layout as L;

        let count = match f {
            L::Mono => 1,
            L::Stereo => 2,
            L::TwoPointOne => 3,
            L::FivePointOne => 6,
        };
        ChannelFormat::from_channel_count(count)
    } else if let Some(mask) = params.channels {
        // We can otherwise try to guess from the length of the channel mask.
        ChannelFormat::from_channel_count(mask.count())
    } else {
        None
    }
}

/// Check if this error is an end-of-stream.
///
/// Symphonia signals the end of a file as an `UnexpectedEof` I/O error rather than with a dedicated variant.
fn err_is_eof(err: &SError) -> bool {
    matches!(err, SError::IoError(i) if i.kind() == std::io::ErrorKind::UnexpectedEof)
}

/// Decode all of the first audio track of the file at `path`.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::new(path, e))?;
    let source_stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source_stream,
            &Default::default(),
            &Default::default(),
        )
        .map_err(|e| LoadError::new(path, e))?;
    let mut format = probed.format;

    // We always decode the first decodable track.
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| FormatError::new(path, FormatProblem::NoAudioTrack))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let channel_format = codec_params_to_channel_format(&params)
        .ok_or_else(|| FormatError::new(path, FormatProblem::UnknownChannelLayout))?;
    let chan_count = channel_format.get_channel_count().get();

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &Default::default())
        .map_err(|e| LoadError::new(path, e))?;

    let mut samples = Vec::with_capacity(params.n_frames.unwrap_or(0) as usize * chan_count);
    // Some containers only know the rate once the first packet is decoded.
    let mut sample_rate = params.sample_rate;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(e) if err_is_eof(&e) => break,
            Err(e) => return Err(LoadError::new(path, e).into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| LoadError::new(path, e))?;
        let mut buffer: AudioBuffer<f32> = decoded.make_equivalent();
        decoded.convert(&mut buffer);

        if sample_rate.is_none() {
            sample_rate = Some(buffer.spec().rate);
        }

        if buffer.spec().channels.count() != chan_count {
            return Err(FormatError::new(path, FormatProblem::UnknownChannelLayout).into());
        }

        for frame in 0..buffer.frames() {
            for ch in 0..chan_count {
                samples.push(buffer.chan(ch)[frame]);
            }
        }
    }

    let sample_rate = sample_rate
        .and_then(NonZeroU32::new)
        .ok_or_else(|| FormatError::new(path, FormatProblem::MissingSampleRate))?;

    log::debug!(
        "Decoded {}: {} frames of {} at {} Hz",
        path.display(),
        samples.len() / chan_count,
        channel_format,
        sample_rate
    );

    Ok(DecodedAudio {
        sample_rate,
        channel_format,
        samples,
    })
}

/// Decode `path` and convert it to `channel_format` at `sample_rate`.
///
/// Both the dataset and source loaders come through here.
pub fn load_canonical(
    path: &Path,
    channel_format: ChannelFormat,
    sample_rate: NonZeroU32,
) -> Result<Vec<f32>, DatasetError> {
    let decoded = decode_file(path)?;

    let converter = ChannelConverter::new(decoded.channel_format.clone(), channel_format)
        .map_err(|e| FormatError::new(path, e))?;
    let converted = converter.convert(&decoded.samples);

    let mut resampler = ConditionalResampler::new(
        decoded.sample_rate.get(),
        sample_rate.get(),
        converter.output_format().get_channel_count().get(),
    )
    .map_err(|e| FormatError::new(path, e))?;

    if resampler.is_resampling() {
        log::info!(
            "Resampling {} from {} Hz to {} Hz",
            path.display(),
            decoded.sample_rate,
            sample_rate
        );
    }

    Ok(resampler
        .process_all(&converted)
        .map_err(|e| FormatError::new(path, e))?)
}
