//! Texture name derivation

use xrobject_core::Texture;

use crate::options::ObjectExportOptions;

/// Split a path into normalized components
/// - Accepts both `\` and `/` separators
/// - Removes redundant separators and `.`
/// - Resolves `..`
fn path_components(path: &str) -> Vec<&str> {
    let mut components = Vec::new();

    for component in path.trim().split(['/', '\\']) {
        match component {
            "" | "." => continue,
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    components
}

/// Game texture name for an image path
///
/// The extension is dropped, the textures folder prefix is removed and the
/// rest is joined with `\`, e.g. `/game/textures/wood/oak.dds` under
/// `/game/textures` becomes `wood\oak`. Paths outside the folder keep all
/// their components.
pub fn gen_texture_name(image_path: &str, textures_folder: &str) -> String {
    let mut components = path_components(image_path);
    let folder = path_components(textures_folder);

    if !folder.is_empty() && components.len() > folder.len() && components.starts_with(&folder) {
        components.drain(..folder.len());
    }

    if let Some(last) = components.last_mut() {
        let file_name: &str = *last;
        if let Some(dot) = file_name.rfind('.').filter(|&i| i > 0) {
            *last = &file_name[..dot];
        }
    }

    components.join("\\")
}

/// Name written for a material's active texture
pub fn texture_name(texture: &Texture, options: &ObjectExportOptions) -> String {
    match (&texture.image_path, options.texname_from_path) {
        (Some(path), true) => gen_texture_name(path, &options.textures_folder),
        _ => texture.name.clone(),
    }
}
