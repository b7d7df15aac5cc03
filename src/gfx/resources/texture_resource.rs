//! Texture registry
//!
//! Decodes images into GL textures and shares them by identifier. Every
//! [`TextureRegistry::load`] takes a reference; the GL texture is deleted when
//! the last reference is released.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::gl_utils::{
    Gpu, PixelFormat, TextureFilter, TextureHandle, TextureParameter, TextureWrap,
};

/// Texture kind as written in scene files. Both kinds upload to the 2D target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    #[default]
    D2,
    D3,
}

impl TextureKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "2d" => Ok(Self::D2),
            "3d" => Ok(Self::D3),
            other => Err(Error::MalformedDescriptor(format!(
                "unknown texture type {other:?}"
            ))),
        }
    }
}

/// Decoded pixels, one byte per channel, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl RawImage {
    fn format(&self) -> Result<PixelFormat> {
        match self.channels {
            1 => Ok(PixelFormat::Red),
            3 => Ok(PixelFormat::Rgb),
            4 => Ok(PixelFormat::Rgba),
            n => Err(Error::UnsupportedChannelCount(n)),
        }
    }
}

/// Where a texture's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    File(PathBuf),
    /// Pixels already in memory, registered under `id`.
    Raw { id: String, image: RawImage },
}

impl TextureSource {
    pub fn raw(id: impl Into<String>, image: RawImage) -> Self {
        Self::Raw {
            id: id.into(),
            image,
        }
    }

    /// Registry key: the file path, or the id given with raw pixels.
    pub fn identifier(&self) -> Cow<'_, str> {
        match self {
            Self::File(path) => path.to_string_lossy(),
            Self::Raw { id, .. } => Cow::Borrowed(id),
        }
    }

    fn decode(&self) -> Result<Cow<'_, RawImage>> {
        match self {
            Self::File(path) => {
                let image = image::open(path)
                    .map_err(|e| Error::DecodeError(format!("{}: {e}", path.display())))?
                    .flipv();
                let channels = image.color().channel_count();
                let pixels = match channels {
                    1 => image.to_luma8().into_raw(),
                    3 => image.to_rgb8().into_raw(),
                    4 => image.to_rgba8().into_raw(),
                    n => return Err(Error::UnsupportedChannelCount(n)),
                };
                Ok(Cow::Owned(RawImage {
                    width: image.width(),
                    height: image.height(),
                    channels,
                    pixels,
                }))
            }
            Self::Raw { image: raw, .. } => {
                let expected = raw.width as usize * raw.height as usize * raw.channels as usize;
                if raw.pixels.len() != expected {
                    return Err(Error::DecodeError(format!(
                        "expected {expected} bytes of pixel data, got {}",
                        raw.pixels.len()
                    )));
                }
                Ok(Cow::Borrowed(raw))
            }
        }
    }
}

/// One reference to a registered GL texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    id: String,
    handle: TextureHandle,
    kind: TextureKind,
}

impl Texture {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// Binds to the currently active texture unit.
    pub fn bind(&self, gpu: &dyn Gpu) {
        gpu.bind_texture(Some(self.handle));
    }
}

#[derive(Debug)]
struct RegistryEntry {
    handle: TextureHandle,
    kind: TextureKind,
    refs: usize,
}

#[derive(Debug, Default)]
pub struct TextureRegistry {
    entries: HashMap<String, RegistryEntry>,
    uploads: usize,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the texture registered as `id`, decoding and
    /// uploading `source` only if no such texture exists yet.
    ///
    /// # Arguments
    /// * `gpu` - GL seam the upload goes through
    /// * `id` - Registry key; usually [`TextureSource::identifier`]
    /// * `source` - Image file or raw pixels, only read on a miss
    /// * `kind` - Texture kind recorded for a new entry
    ///
    /// # Returns
    /// A [`Texture`] holding one reference. Its kind is the one the entry was
    /// first registered with.
    pub fn load(
        &mut self,
        gpu: &dyn Gpu,
        id: &str,
        source: &TextureSource,
        kind: TextureKind,
    ) -> Result<Texture> {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.refs += 1;
            log::debug!("texture {id:?} reused ({} references)", entry.refs);
            return Ok(Texture {
                id: id.to_string(),
                handle: entry.handle,
                kind: entry.kind,
            });
        }

        let image = source.decode()?;
        let format = image.format()?;

        let handle = gpu.create_texture().map_err(Error::GpuResource)?;
        gpu.bind_texture(Some(handle));
        gpu.texture_parameter(TextureParameter::WrapS(TextureWrap::Repeat));
        gpu.texture_parameter(TextureParameter::WrapT(TextureWrap::Repeat));
        gpu.texture_parameter(TextureParameter::MinFilter(
            TextureFilter::LinearMipmapLinear,
        ));
        gpu.texture_parameter(TextureParameter::MagFilter(TextureFilter::Linear));
        gpu.texture_image_2d(image.width, image.height, format, &image.pixels);
        gpu.generate_mipmap();
        self.uploads += 1;

        log::info!(
            "uploaded texture {id:?} ({}x{}, {} channels)",
            image.width,
            image.height,
            image.channels
        );

        self.entries
            .insert(id.to_string(), RegistryEntry { handle, kind, refs: 1 });
        Ok(Texture {
            id: id.to_string(),
            handle,
            kind,
        })
    }

    /// Drops one reference; the last one deletes the GL texture.
    pub fn release(&mut self, gpu: &dyn Gpu, texture: &Texture) {
        let Some(entry) = self.entries.get_mut(&texture.id) else {
            log::warn!("released texture {:?} that is not registered", texture.id);
            return;
        };
        entry.refs -= 1;
        if entry.refs == 0 {
            gpu.delete_texture(entry.handle);
            self.entries.remove(&texture.id);
            log::debug!("deleted texture {:?}", texture.id);
        }
    }

    /// Live references to `id`, 0 when it is not registered.
    pub fn ref_count(&self, id: &str) -> usize {
        self.entries.get(id).map_or(0, |entry| entry.refs)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of decode + upload passes performed.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }
}
