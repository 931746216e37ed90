mod lz4_codec;
mod passthrough;
mod zlib_codec;
mod zstd_codec;

pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zlib_codec::ZlibCodec;
pub use zstd_codec::ZstdCodec;

use pbz_core::Codec;

/// Codec names accepted by [`codec_by_name`], in CLI display order.
pub const CODEC_NAMES: &[&str] = &["zlib", "zstd", "lz4", "passthrough"];

/// Resolve a codec from its CLI name.
///
/// `level` is passed to codecs that have one (zlib, zstd) and ignored by the
/// others; `None` selects the codec's default level.
pub fn codec_by_name(name: &str, level: Option<i32>) -> anyhow::Result<Box<dyn Codec>> {
    match name {
        "zlib" | "deflate" => {
            let codec = match level {
                Some(level) => ZlibCodec::new(u32::try_from(level).map_err(|_| {
                    anyhow::anyhow!("zlib level must be between 0 and 9, got {}", level)
                })?)?,
                None => ZlibCodec::default(),
            };
            Ok(Box::new(codec))
        }
        "zstd" | "z" => {
            let codec = match level {
                Some(level) => ZstdCodec::new(level)?,
                None => ZstdCodec::default(),
            };
            Ok(Box::new(codec))
        }
        "lz4" | "l" => Ok(Box::new(Lz4Codec)),
        "passthrough" | "pass" | "none" => Ok(Box::new(PassThroughCodec)),
        other => anyhow::bail!(
            "unknown codec '{}'. Valid options: {}",
            other,
            CODEC_NAMES.join(", ")
        ),
    }
}
