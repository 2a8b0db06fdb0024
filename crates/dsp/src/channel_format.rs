use std::num::NonZeroUsize;

/// The channel layout of some interleaved audio data.
#[derive(Clone, Debug, Eq, PartialEq, derive_more::IsVariant)]
pub enum ChannelFormat {
    /// Single-channel audio, which is what the renderer consumes.
    Mono,

    /// Two channels `[l r]`, which is what the renderer produces and what HRIR measurements are stored as.
    Stereo,

    /// Anything else.  Carried around so that errors can say what was found.
    Raw { channels: NonZeroUsize },
}

impl ChannelFormat {
    /// Work out the format from a bare channel count, as found in a media file header.
    ///
    /// Returns `None` for 0 channels.
    pub fn from_channel_count(channels: usize) -> Option<ChannelFormat> {
        match channels {
            0 => None,
            1 => Some(ChannelFormat::Mono),
            2 => Some(ChannelFormat::Stereo),
            x => Some(ChannelFormat::Raw {
                channels: NonZeroUsize::new(x)?,
            }),
        }
    }

    pub fn get_channel_count(&self) -> NonZeroUsize {
        match self {
            ChannelFormat::Mono => NonZeroUsize::MIN,
            ChannelFormat::Stereo => NonZeroUsize::MIN.saturating_add(1),
            ChannelFormat::Raw { channels } => *channels,
        }
    }
}

impl std::fmt::Display for ChannelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelFormat::Mono => write!(f, "mono"),
            ChannelFormat::Stereo => write!(f, "stereo"),
            ChannelFormat::Raw { channels } => write!(f, "{} channels", channels),
        }
    }
}
