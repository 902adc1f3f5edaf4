//! Object body sections
//!
//! Each function appends at most one chunk to the object body. Optional
//! sections whose guard fails append nothing.

use std::collections::BTreeSet;

use tracing::{debug, warn};
use xrobject_core::{Armature, MaterialId, NodeId, ObjectProps, Result, ResultExt, Scene};
use xrobject_formats::chunks::OBJECT_VERSION;
use xrobject_formats::{ChunkedWriter, ObjectChunk, PackedWriter};

use crate::encoders::MotionEncoder;
use crate::options::ObjectExportOptions;
use crate::texture::texture_name;

use super::transform::root_transform;

/// Surface trailer written after every material
const SURFACE_FVF: u32 = 0x112;
const SURFACE_TC_COUNT: u32 = 1;

/// Format version, always present
pub fn write_version(body: &mut ChunkedWriter) {
    let mut writer = PackedWriter::new();
    writer.put_u16(OBJECT_VERSION);
    body.put(ObjectChunk::Version.id(), writer);
}

/// Object flags, 0 without object properties
pub fn write_flags(body: &mut ChunkedWriter, xray: Option<&ObjectProps>) {
    let flags = xray.map_or(0, |x| x.flags);
    let mut writer = PackedWriter::new();
    writer.put_u32(flags);
    body.put(ObjectChunk::Flags.id(), writer);
    debug!(flags, "Wrote flags");
}

/// Encoded meshes as sub-chunks `0, 1, 2, ...`, always present
pub fn write_meshes(body: &mut ChunkedWriter, mesh_writers: &[ChunkedWriter]) {
    let mut writer = ChunkedWriter::new();
    writer.put_indexed(mesh_writers);
    body.put(ObjectChunk::Meshes.id(), writer);
    debug!(count = mesh_writers.len(), "Wrote meshes");
}

/// Surface table of the used materials, always present
pub fn write_surfaces<'a>(
    body: &mut ChunkedWriter,
    scene: &Scene,
    materials: impl ExactSizeIterator<Item = &'a MaterialId>,
    options: &ObjectExportOptions,
) -> Result<()> {
    let mut writer = PackedWriter::new();
    writer.put_u32(materials.len() as u32);

    for &id in materials {
        let material = scene.material(id).context("surfaces")?;
        writer.put_str(&material.name);

        match &material.xray {
            Some(props) => writer
                .put_str(&props.eshader)
                .put_str(&props.cshader)
                .put_str(&props.gamemtl),
            None => writer.put_str("").put_str("").put_str(""),
        };

        match &material.active_texture {
            Some(slot) => writer
                .put_str(&texture_name(&slot.texture, options))
                .put_str(&slot.uv_layer),
            None => writer.put_str("").put_str(""),
        };

        writer
            .put_u32(material.xray.as_ref().map_or(0, |props| props.flags))
            .put_u32(SURFACE_FVF)
            .put_u32(SURFACE_TC_COUNT);
    }

    body.put(ObjectChunk::Surfaces2.id(), writer);
    Ok(())
}

/// Encoded bones as sub-chunks, only when there are any
pub fn write_bones(body: &mut ChunkedWriter, bone_writers: &[ChunkedWriter]) {
    if bone_writers.is_empty() {
        return;
    }
    let mut writer = ChunkedWriter::new();
    writer.put_indexed(bone_writers);
    body.put(ObjectChunk::Bones1.id(), writer);
    debug!(count = bone_writers.len(), "Wrote bones");
}

/// Split on every universal line boundary; a trailing break adds no line
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let is_break = matches!(
            ch,
            '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
        );
        if !is_break {
            continue;
        }
        lines.push(&text[start..idx]);
        start = idx + ch.len_utf8();
        if ch == '\r' {
            if let Some(&(next, '\n')) = chars.peek() {
                chars.next();
                start = next + 1;
            }
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// User data with CRLF line endings, only when non-empty
pub fn write_user_data(body: &mut ChunkedWriter, xray: Option<&ObjectProps>) {
    let Some(userdata) = xray.map(|x| x.userdata.as_str()).filter(|s| !s.is_empty()) else {
        return;
    };
    let mut writer = PackedWriter::new();
    writer.put_str(&split_lines(userdata).join("\r\n"));
    body.put(ObjectChunk::UserData.id(), writer);
}

/// LOD reference, only when set
pub fn write_lod_ref(body: &mut ChunkedWriter, xray: Option<&ObjectProps>) {
    let Some(lodref) = xray.map(|x| x.lodref.as_str()).filter(|s| !s.is_empty()) else {
        return;
    };
    let mut writer = PackedWriter::new();
    writer.put_str(lodref);
    body.put(ObjectChunk::LodRef.id(), writer);
}

/// Embedded motions of the skeleton
///
/// Needs a skeleton and `export_motions`; skipped when the encoder produced
/// nothing. Every named action must exist in the scene.
pub fn write_motions(
    body: &mut ChunkedWriter,
    scene: &Scene,
    xray: Option<&ObjectProps>,
    skeleton: Option<NodeId>,
    encoder: &dyn MotionEncoder,
    options: &ObjectExportOptions,
) -> Result<()> {
    let Some(skeleton) = skeleton else {
        return Ok(());
    };
    if !options.export_motions {
        return Ok(());
    }

    let names: BTreeSet<&str> = xray
        .map(|x| x.motions.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let registry = scene.action_registry();
    let actions = names
        .iter()
        .map(|name| registry.get(name))
        .collect::<Result<Vec<_>>>()
        .context("motions")?;

    let mut writer = PackedWriter::new();
    encoder.encode(&mut writer, &actions, scene, skeleton)?;
    if writer.is_empty() {
        return Ok(());
    }
    body.put(ObjectChunk::Motions.id(), writer);
    debug!(count = actions.len(), "Wrote motions");
    Ok(())
}

/// Bone groups that hold exportable bones, as `(group, bone names)`
pub fn partitions(armature: &Armature) -> Vec<(&str, Vec<&str>)> {
    armature
        .bone_groups
        .iter()
        .enumerate()
        .map(|(idx, group)| {
            let bones = armature
                .exportable_bones()
                .filter(|bone| bone.group == Some(idx))
                .map(|bone| bone.name.as_str())
                .collect::<Vec<_>>();
            (group.name.as_str(), bones)
        })
        .filter(|(_, bones)| !bones.is_empty())
        .collect()
}

/// Bone partitions of the skeleton, only when a group holds exportable bones
pub fn write_partitions(body: &mut ChunkedWriter, scene: &Scene, skeleton: Option<NodeId>) -> Result<()> {
    let Some(skeleton) = skeleton else {
        return Ok(());
    };
    let Some(armature) = scene.node(skeleton)?.armature.as_ref() else {
        return Ok(());
    };

    let groups = partitions(armature);
    if groups.is_empty() {
        return Ok(());
    }

    let mut writer = PackedWriter::new();
    writer.put_u32(groups.len() as u32);
    for (name, bones) in &groups {
        writer.put_str(name).put_u32(bones.len() as u32);
        for bone in bones {
            writer.put_str(bone);
        }
    }
    body.put(ObjectChunk::Partitions1.id(), writer);
    debug!(groups = groups.len(), "Wrote partitions");
    Ok(())
}

/// Motion references
///
/// The reference list wins over the legacy string. In SoC mode the list is
/// written as one comma-joined string under the legacy id.
pub fn write_motion_refs(
    body: &mut ChunkedWriter,
    xray: Option<&ObjectProps>,
    options: &ObjectExportOptions,
    warnings: &mut Vec<String>,
) {
    let Some(xray) = xray else {
        return;
    };

    if !xray.motionrefs.is_empty() {
        if !xray.motionrefs_legacy.is_empty() {
            warn!(data = %xray.motionrefs_legacy, "MotionRefs: skipped legacy data");
            warnings.push(format!("MotionRefs: skipped legacy data ({})", xray.motionrefs_legacy));
        }

        let mut writer = PackedWriter::new();
        if options.soc_sgroups {
            writer.put_str(&xray.motionrefs.join(","));
            body.put(ObjectChunk::MotionRefs.id(), writer);
        } else {
            writer.put_u32(xray.motionrefs.len() as u32);
            for name in &xray.motionrefs {
                writer.put_str(name);
            }
            body.put(ObjectChunk::SMotions3.id(), writer);
        }
    } else if !xray.motionrefs_legacy.is_empty() {
        let mut writer = PackedWriter::new();
        writer.put_str(&xray.motionrefs_legacy);
        body.put(ObjectChunk::MotionRefs.id(), writer);
    }
}

/// Root placement, only when the world matrix is not identity
pub fn write_transform(body: &mut ChunkedWriter, matrix_world: &[[f32; 4]; 4]) {
    let Some((translation, euler)) = root_transform(matrix_world) else {
        return;
    };
    let mut writer = PackedWriter::new();
    writer
        .put_f32s(translation.to_array())
        .put_f32s(euler.to_array());
    body.put(ObjectChunk::Transform.id(), writer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrobject_core::{Bone, BoneGroup};
    use xrobject_formats::ChunkReader;

    fn ids(body: &ChunkedWriter) -> Vec<ObjectChunk> {
        ChunkReader::new(body.data())
            .map(|c| c.unwrap().kind())
            .collect()
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\r\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n"), vec!["a"]);
        assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
        assert_eq!(split_lines("x\u{2028}y"), vec!["x", "y"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_user_data_crlf() {
        let props = ObjectProps {
            userdata: "[ini]\nkey = 1\r\nother = 2\n".into(),
            ..Default::default()
        };
        let mut body = ChunkedWriter::new();
        write_user_data(&mut body, Some(&props));

        let chunk = ChunkReader::new(body.data()).next().unwrap().unwrap();
        assert_eq!(chunk.data, b"[ini]\r\nkey = 1\r\nother = 2\0");
    }

    #[test]
    fn test_optional_strings_skipped() {
        let mut body = ChunkedWriter::new();
        write_user_data(&mut body, None);
        write_lod_ref(&mut body, Some(&ObjectProps::default()));
        write_motion_refs(&mut body, None, &ObjectExportOptions::default(), &mut Vec::new());
        assert!(body.is_empty());
    }

    #[test]
    fn test_flags_default_zero() {
        let mut body = ChunkedWriter::new();
        write_flags(&mut body, None);
        assert_eq!(&body.data()[8..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_bones_only_when_present() {
        let mut body = ChunkedWriter::new();
        write_bones(&mut body, &[]);
        assert!(body.is_empty());

        write_bones(&mut body, &[ChunkedWriter::new()]);
        assert_eq!(ids(&body), vec![ObjectChunk::Bones1]);
    }

    #[test]
    fn test_partitions_exclude_empty_groups() {
        let mut armature = Armature::default();
        armature.bone_groups = vec![
            BoneGroup { name: "empty".into() },
            BoneGroup { name: "legs".into() },
            BoneGroup { name: "hidden".into() },
        ];
        let mut thigh = Bone::new("thigh");
        thigh.group = Some(1);
        let mut ik = Bone::new("ik");
        ik.group = Some(2);
        ik.exportable = false;
        armature.bones = vec![thigh, ik];

        assert_eq!(partitions(&armature), vec![("legs", vec!["thigh"])]);
    }

    #[test]
    fn test_motion_refs_modes() {
        let props = ObjectProps {
            motionrefs: vec!["a".into(), "b".into()],
            motionrefs_legacy: "old".into(),
            ..Default::default()
        };

        let mut warnings = Vec::new();
        let mut body = ChunkedWriter::new();
        write_motion_refs(&mut body, Some(&props), &ObjectExportOptions::default(), &mut warnings);
        let chunk = ChunkReader::new(body.data()).next().unwrap().unwrap();
        assert_eq!(chunk.kind(), ObjectChunk::SMotions3);
        assert_eq!(chunk.data, &[2, 0, 0, 0, b'a', 0, b'b', 0]);
        assert_eq!(warnings.len(), 1);

        let soc = ObjectExportOptions {
            soc_sgroups: true,
            ..Default::default()
        };
        let mut body = ChunkedWriter::new();
        write_motion_refs(&mut body, Some(&props), &soc, &mut Vec::new());
        let chunk = ChunkReader::new(body.data()).next().unwrap().unwrap();
        assert_eq!(chunk.kind(), ObjectChunk::MotionRefs);
        assert_eq!(chunk.data, b"a,b\0");
    }

    #[test]
    fn test_legacy_motion_refs_only() {
        let props = ObjectProps {
            motionrefs_legacy: "old".into(),
            ..Default::default()
        };
        let mut warnings = Vec::new();
        let mut body = ChunkedWriter::new();
        write_motion_refs(&mut body, Some(&props), &ObjectExportOptions::default(), &mut warnings);

        let chunk = ChunkReader::new(body.data()).next().unwrap().unwrap();
        assert_eq!(chunk.kind(), ObjectChunk::MotionRefs);
        assert_eq!(chunk.data, b"old\0");
        assert!(warnings.is_empty());
    }
}
