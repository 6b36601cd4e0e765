//! Whole-file assembly: magic identifier, header section, optional external
//! references and the scene sections.

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use crate::codec::{
    read_section, write_section, CompressionScheme, M3gReader, M3gWriter, ObjectIndex,
};
use crate::objects::{
    decode_object, encode_object, Header, Image2D, ObjectType, PixelImage, SceneObject,
};
use crate::table::{EncodeContext, ObjectTable};
use crate::util::{Error, Result};

/// The 12 fixed bytes every file starts with.
pub const FILE_IDENTIFIER: [u8; 12] = [
    0xAB, 0x4A, 0x53, 0x52, 0x31, 0x38, 0x34, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// Framing per object inside a section: tag byte plus body length.
const OBJECT_OVERHEAD: usize = 5;
/// Section framing overhead, matching the section codec.
const SECTION_OVERHEAD: usize = 13;

/// Supplies substitute content for external references during load.
pub trait ReferenceResolver {
    /// Pixel data for `uri`, or `None` to leave the reference unresolved.
    fn resolve(&self, uri: &str) -> Option<PixelImage>;
}

/// Resolver that leaves every external reference unresolved.
pub struct NoopResolver;

impl ReferenceResolver for NoopResolver {
    fn resolve(&self, _uri: &str) -> Option<PixelImage> {
        None
    }
}

/// Knobs for serialization.
#[derive(Clone, Copy, Debug)]
pub struct SaveOptions {
    /// Scheme for the external-reference and scene sections. The header
    /// section is always stored uncompressed so its sizes can be fixed up.
    pub compression: CompressionScheme,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            compression: CompressionScheme::Deflate,
        }
    }
}

/// A complete file: the object table with the header at index 1, external
/// references contiguous after it and scene objects in dependency order.
#[derive(Debug, Default)]
pub struct SceneFile {
    pub table: ObjectTable,
}

impl SceneFile {
    /// An empty file holding only a default header.
    pub fn new() -> Self {
        let mut table = ObjectTable::new();
        table.append(SceneObject::Header(Header::default()));
        Self { table }
    }

    /// The header object at index 1.
    pub fn header(&self) -> Result<&Header> {
        match self.table.get(ObjectIndex(1)) {
            Some(SceneObject::Header(h)) => Ok(h),
            _ => Err(Error::invalid("table index 1 does not hold the header")),
        }
    }

    pub fn header_mut(&mut self) -> Result<&mut Header> {
        match self.table.get_mut(ObjectIndex(1)) {
            Some(SceneObject::Header(h)) => Ok(h),
            _ => Err(Error::invalid("table index 1 does not hold the header")),
        }
    }

    /// Append a scene object, returning its reference index.
    pub fn add(&mut self, obj: SceneObject) -> ObjectIndex {
        self.table.append(obj)
    }

    /// Unreferenced scene objects, the entry points into the graph.
    pub fn roots(&self) -> Vec<ObjectIndex> {
        self.table.roots()
    }

    /// Load a file from disk, leaving external references unresolved.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        debug!(path = %path.as_ref().display(), len = bytes.len(), "loading file");
        Self::read(&bytes)
    }

    /// Parse a file image, leaving external references unresolved.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        Self::read_with_resolver(bytes, &NoopResolver)
    }

    /// Parse a file image, resolving external references through `resolver`.
    /// A URI the resolver declines stays unresolved, which only fails later
    /// if some reference tries to resolve through it.
    pub fn read_with_resolver(bytes: &[u8], resolver: &dyn ReferenceResolver) -> Result<Self> {
        let mut r = M3gReader::new(bytes);
        if r.bytes(FILE_IDENTIFIER.len())? != &FILE_IDENTIFIER[..] {
            return Err(Error::MalformedHeader);
        }

        let mut table = ObjectTable::new();
        let header = read_header_section(&mut r, &mut table)?;

        if header.has_external_references {
            let payload = read_section(&mut r)?;
            read_external_section(&payload, &mut table, resolver)?;
        }

        let mut scene_sections = 0usize;
        while !r.at_end() {
            let payload = read_section(&mut r)?;
            read_scene_section(&payload, &mut table)?;
            scene_sections += 1;
        }
        if scene_sections == 0 {
            return Err(Error::invalid("file ends without a scene section"));
        }

        table.check_dependency_order()?;
        debug!(objects = table.len() - 1, "file read");
        Ok(Self { table })
    }

    /// Serialize and write to disk with default options.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.write(SaveOptions::default())?;
        fs::write(path.as_ref(), &bytes)?;
        debug!(path = %path.as_ref().display(), len = bytes.len(), "file saved");
        Ok(())
    }

    /// Serialize the whole file.
    pub fn write(&self, options: SaveOptions) -> Result<Vec<u8>> {
        let (mut header, external_count) = self.validate_layout()?;
        self.table.check_dependency_order()?;

        let mut tail = Vec::new();
        if external_count > 0 {
            let payload = self.encode_range(2, 2 + external_count)?;
            tail.extend(write_section(&payload, options.compression)?);
        }
        // Always one scene section, empty when the table holds nothing
        // beyond the header and external references.
        let scene_first = 2 + external_count;
        let payload = self.encode_range(scene_first, self.table.len())?;
        tail.extend(write_section(&payload, options.compression)?);

        // The header section is uncompressed and its body has a fixed size,
        // so the final file size is known before the header is encoded.
        header.has_external_references = external_count > 0;
        let header_body_len = OBJECT_OVERHEAD + 11 + header.authoring_field.len() + 1;
        let total = FILE_IDENTIFIER.len() + header_body_len + SECTION_OVERHEAD + tail.len();
        header.total_file_size = total as u32;
        header.approximate_content_size = total as u32;

        let mut header_payload = M3gWriter::new();
        header_payload.write_u8(ObjectType::Header.tag());
        let mut body = M3gWriter::new();
        header.encode(&mut body)?;
        let body = body.into_inner();
        header_payload.write_u32(body.len() as u32);
        header_payload.put(&body);

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&FILE_IDENTIFIER);
        out.extend(write_section(&header_payload.into_inner(), CompressionScheme::None)?);
        out.extend(tail);
        debug!(len = out.len(), objects = self.table.len() - 1, "file written");
        Ok(out)
    }

    /// Check the fixed table layout: header at 1, external references
    /// contiguous after it, nothing of either kind elsewhere. Returns the
    /// header (by value, for size fixup) and the external-reference count.
    fn validate_layout(&self) -> Result<(Header, u32)> {
        let header = self.header()?.clone();
        let mut external_count = 0u32;
        let mut externals_done = false;
        for (index, obj) in self.table.iter() {
            match obj {
                SceneObject::Header(_) if index.0 != 1 => {
                    return Err(Error::invalid("header object outside table index 1"));
                }
                SceneObject::Header(_) => {}
                SceneObject::ExternalReference(_) => {
                    if externals_done {
                        return Err(Error::invalid(
                            "external references must directly follow the header",
                        ));
                    }
                    external_count += 1;
                }
                _ if index.0 >= 2 => externals_done = true,
                _ => {}
            }
        }
        Ok((header, external_count))
    }

    /// Encode table slots `first..last` as one section payload.
    fn encode_range(&self, first: u32, last: u32) -> Result<Vec<u8>> {
        let mut w = M3gWriter::new();
        for index in first..last {
            let index = ObjectIndex(index);
            let obj = self
                .table
                .get(index)
                .ok_or_else(|| Error::invalid(format!("table slot {index} missing")))?;
            let ctx = EncodeContext {
                table: &self.table,
                current: index,
            };
            let body = encode_object(obj, &ctx)?;
            trace!(%index, kind = obj.type_name(), len = body.len(), "object encoded");
            w.write_u8(obj.object_type().tag());
            w.write_u32(body.len() as u32);
            w.put(&body);
        }
        Ok(w.into_inner())
    }
}

/// Read the header section: exactly one object, tagged as a header.
fn read_header_section(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Header> {
    let payload = read_section(r)?;
    let mut pr = M3gReader::new(&payload);
    let (tag, body) = next_object(&mut pr)?;
    if tag != ObjectType::Header.tag() {
        return Err(Error::MalformedHeader);
    }
    if !pr.at_end() {
        return Err(Error::invalid("header section holds more than one object"));
    }
    let obj = decode_object(tag, body, table)?;
    let SceneObject::Header(header) = &obj else {
        return Err(Error::MalformedHeader);
    };
    let header = header.clone();
    table.append(obj);
    Ok(header)
}

fn read_external_section(
    payload: &[u8],
    table: &mut ObjectTable,
    resolver: &dyn ReferenceResolver,
) -> Result<()> {
    let mut pr = M3gReader::new(payload);
    while !pr.at_end() {
        let (tag, body) = next_object(&mut pr)?;
        if tag != ObjectType::ExternalReference.tag() {
            return Err(Error::invalid(
                "external-references section holds a non-reference object",
            ));
        }
        let SceneObject::ExternalReference(mut ext) = decode_object(tag, body, table)? else {
            return Err(Error::invalid("external reference decoded to wrong kind"));
        };
        match resolver.resolve(&ext.uri) {
            Some(pixels) => {
                trace!(uri = %ext.uri, "external reference resolved");
                let image = Image2D::from_pixels(pixels)?;
                ext.resolved = Some(Box::new(SceneObject::Image2D(image)));
            }
            None => trace!(uri = %ext.uri, "external reference left unresolved"),
        }
        table.append(SceneObject::ExternalReference(ext));
    }
    Ok(())
}

fn read_scene_section(payload: &[u8], table: &mut ObjectTable) -> Result<()> {
    let mut pr = M3gReader::new(payload);
    while !pr.at_end() {
        let (tag, body) = next_object(&mut pr)?;
        if tag == ObjectType::Header.tag() || tag == ObjectType::ExternalReference.tag() {
            return Err(Error::invalid(format!(
                "scene section holds a {} object",
                ObjectType::from_u8(tag).map(ObjectType::name).unwrap_or("?")
            )));
        }
        let obj = decode_object(tag, body, table)?;
        trace!(kind = obj.type_name(), "object decoded");
        table.append(obj);
    }
    Ok(())
}

/// One tag + length + body envelope from a section payload.
fn next_object<'a>(pr: &mut M3gReader<'a>) -> Result<(u8, &'a [u8])> {
    let tag = pr.read_u8()?;
    let len = pr.read_array_count(1)?;
    Ok((tag, pr.bytes(len)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ExternalReference, Group, ImageFormat, Material, Texture2D};

    #[test]
    fn test_empty_file_roundtrip() {
        let file = SceneFile::new();
        let bytes = file.write(SaveOptions::default()).unwrap();
        assert_eq!(&bytes[..12], &FILE_IDENTIFIER);
        let back = SceneFile::read(&bytes).unwrap();
        assert_eq!(back.table.len(), 2);
        assert_eq!(
            back.header().unwrap().total_file_size,
            bytes.len() as u32
        );
    }

    #[test]
    fn test_scene_section_required() {
        let file = SceneFile::new();
        let bytes = file
            .write(SaveOptions {
                compression: CompressionScheme::None,
            })
            .unwrap();
        assert!(SceneFile::read(&bytes).is_ok());
        // Drop the trailing (empty) scene section; the file must be rejected.
        let cut = bytes.len() - SECTION_OVERHEAD;
        assert!(SceneFile::read(&bytes[..cut]).is_err());
    }

    #[test]
    fn test_bad_magic() {
        let file = SceneFile::new();
        let mut bytes = file.write(SaveOptions::default()).unwrap();
        bytes[0] = 0xAC;
        assert!(matches!(
            SceneFile::read(&bytes),
            Err(Error::MalformedHeader)
        ));
    }

    #[test]
    fn test_truncation() {
        let mut file = SceneFile::new();
        file.add(SceneObject::Material(Material::default()));
        let bytes = file.write(SaveOptions::default()).unwrap();
        for cut in [4, 14, bytes.len() - 1] {
            assert!(SceneFile::read(&bytes[..cut]).is_err());
        }
    }

    #[test]
    fn test_header_must_be_first() {
        let mut file = SceneFile::default();
        file.table.append(SceneObject::Material(Material::default()));
        assert!(file.write(SaveOptions::default()).is_err());
    }

    #[test]
    fn test_external_reference_flag_recomputed() {
        let mut file = SceneFile::new();
        file.add(SceneObject::ExternalReference(ExternalReference::new(
            "other.m3g",
        )));
        file.add(SceneObject::Group(Group::default()));
        let bytes = file.write(SaveOptions::default()).unwrap();
        let back = SceneFile::read(&bytes).unwrap();
        assert!(back.header().unwrap().has_external_references);
    }

    #[test]
    fn test_misplaced_external_reference_rejected() {
        let mut file = SceneFile::new();
        file.add(SceneObject::Group(Group::default()));
        file.add(SceneObject::ExternalReference(ExternalReference::new(
            "late.m3g",
        )));
        assert!(file.write(SaveOptions::default()).is_err());
    }

    struct OnePixel;

    impl ReferenceResolver for OnePixel {
        fn resolve(&self, uri: &str) -> Option<PixelImage> {
            (uri == "stone.png").then(|| PixelImage {
                width: 1,
                height: 1,
                format: ImageFormat::Rgba,
                pixels: vec![1, 2, 3, 4],
            })
        }
    }

    #[test]
    fn test_resolver_substitutes_image() {
        let mut file = SceneFile::new();
        let ext = file.add(SceneObject::ExternalReference(ExternalReference::new(
            "stone.png",
        )));
        file.add(SceneObject::Texture2D(Texture2D::new(ext)));
        let bytes = file.write(SaveOptions::default()).unwrap();

        // Without a resolver the texture's image reference cannot resolve.
        assert!(matches!(
            SceneFile::read(&bytes),
            Err(Error::UnresolvedExternalReference(uri)) if uri == "stone.png"
        ));

        let back = SceneFile::read_with_resolver(&bytes, &OnePixel).unwrap();
        let Some(SceneObject::Texture2D(tex)) = back.table.get(ObjectIndex(3)) else {
            panic!("texture missing");
        };
        assert_eq!(tex.image, ext);
    }

    #[test]
    fn test_uncompressed_sections() {
        let mut file = SceneFile::new();
        file.add(SceneObject::Material(Material::default()));
        let bytes = file
            .write(SaveOptions {
                compression: CompressionScheme::None,
            })
            .unwrap();
        let back = SceneFile::read(&bytes).unwrap();
        assert_eq!(back.table.len(), 3);
    }
}
