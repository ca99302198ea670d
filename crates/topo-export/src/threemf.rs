//! 3MF package writer.
//!
//! A 3MF file is a zip archive holding the model XML plus the OPC content
//! types and relationship parts that point at it.

use std::io::{Cursor, Write};

use log::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::mesh::TerrainMesh;

pub const MODEL_PATH: &str = "3D/3dmodel.model";

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>"#,
    r#"</Types>"#
);

const RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rel1" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel" Target="/3D/3dmodel.model"/>"#,
    r#"</Relationships>"#
);

/// Model part: one millimeter-unit object named "Terrain" and one build item.
pub fn model_xml(mesh: &TerrainMesh) -> String {
    let mut xml = String::with_capacity(64 * (mesh.vertices.len() + mesh.triangles.len()) + 512);
    xml.push_str(concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<model unit="millimeter" xml:lang="en" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">"#,
        r#"<resources><object id="1" name="Terrain" type="model"><mesh><vertices>"#
    ));
    for v in &mesh.vertices {
        xml.push_str(&format!(
            r#"<vertex x="{:.3}" y="{:.3}" z="{:.3}" />"#,
            v.x, v.y, v.z
        ));
    }
    xml.push_str("</vertices><triangles>");
    for [a, b, c] in &mesh.triangles {
        xml.push_str(&format!(r#"<triangle v1="{a}" v2="{b}" v3="{c}" />"#));
    }
    xml.push_str(r#"</triangles></mesh></object></resources><build><item objectid="1" /></build></model>"#);
    xml
}

/// Zip the model and its package parts into a 3MF byte buffer.
pub fn write_3mf(mesh: &TerrainMesh) -> Result<Vec<u8>, ExportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(RELATIONSHIPS.as_bytes())?;
    zip.start_file(MODEL_PATH, options)?;
    zip.write_all(model_xml(mesh).as_bytes())?;

    let bytes = zip.finish()?.into_inner();
    info!("3MF package: {} bytes, {} triangles", bytes.len(), mesh.triangle_count());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use std::io::Read;

    fn make_triangle() -> TerrainMesh {
        TerrainMesh {
            vertices: vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(10.0, 0.0, 1.5),
                DVec3::new(0.0, 10.0, 2.25),
            ],
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn test_model_xml() {
        let xml = model_xml(&make_triangle());
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><model unit="millimeter""#));
        assert!(xml.contains(r#"<vertex x="10.000" y="0.000" z="1.500" />"#));
        assert!(xml.contains(r#"<triangle v1="0" v2="1" v3="2" />"#));
        assert!(xml.ends_with(r#"<build><item objectid="1" /></build></model>"#));
    }

    #[test]
    fn test_package_entries() {
        let bytes = write_3mf(&make_triangle()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["3D/3dmodel.model", "[Content_Types].xml", "_rels/.rels"]);

        let mut model = String::new();
        archive
            .by_name(MODEL_PATH)
            .unwrap()
            .read_to_string(&mut model)
            .unwrap();
        assert_eq!(model, model_xml(&make_triangle()));
    }
}
