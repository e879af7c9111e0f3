//! Cell formats of an `.xlsx` package.
//!
//! calamine reports typed values but not the number format behind them, so the `cellXfs`
//! table of `xl/styles.xml` and the `s` attribute of every cell are read from the package
//! directly. Only what the document model keeps is extracted: the number format, a solid
//! fill and text wrapping.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use roxmltree::{Document, Node};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

use super::CellStyle;
use super::address::parse_address;

#[derive(Debug, Error)]
pub(crate) enum PackageError {
    #[error("zip error: {0}")]
    Zip(#[from] ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("missing part {0}")]
    MissingPart(&'static str),
}

/// `cellXfs` records and the record each styled cell points at.
#[derive(Debug, Default)]
pub(crate) struct PackageStyles {
    /// One entry per `cellXfs/xf`, by xf index.
    pub xfs: Vec<CellStyle>,
    /// Sheet name to `(row, column)` to xf index. Cells on xf 0 are left out.
    pub cells: HashMap<String, HashMap<(u32, u32), usize>>,
}

impl PackageStyles {
    pub fn read(bytes: &[u8]) -> Result<Self, PackageError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;

        let xfs = match read_part(&mut zip, "xl/styles.xml")? {
            Some(xml) => parse_cell_xfs(&Document::parse(&xml)?),
            None => Vec::new(),
        };

        let workbook = read_part(&mut zip, "xl/workbook.xml")?
            .ok_or(PackageError::MissingPart("xl/workbook.xml"))?;
        let rels = read_part(&mut zip, "xl/_rels/workbook.xml.rels")?
            .ok_or(PackageError::MissingPart("xl/_rels/workbook.xml.rels"))?;
        let targets = relationship_targets(&Document::parse(&rels)?);

        let mut cells = HashMap::new();
        for (name, rel_id) in sheet_relationships(&Document::parse(&workbook)?) {
            let Some(path) = targets.get(&rel_id) else {
                continue;
            };
            let Some(xml) = read_part(&mut zip, path)? else {
                continue;
            };
            cells.insert(name, styled_cells(&Document::parse(&xml)?));
        }
        Ok(Self { xfs, cells })
    }

    /// Xf index of a cell, when it has one other than the default.
    pub fn xf_of(&self, sheet: &str, row: u32, column: u32) -> Option<usize> {
        self.cells.get(sheet)?.get(&(row, column)).copied()
    }
}

fn read_part<R: Read + std::io::Seek>(
    zip: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, PackageError> {
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn children<'a, 'i: 'a>(
    node: Node<'a, 'i>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn parse_cell_xfs(doc: &Document<'_>) -> Vec<CellStyle> {
    let root = doc.root_element();

    let custom: HashMap<u32, String> = child(root, "numFmts")
        .map(|fmts| {
            children(fmts, "numFmt")
                .filter_map(|f| {
                    let id = f.attribute("numFmtId")?.parse().ok()?;
                    Some((id, f.attribute("formatCode")?.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    let fills: Vec<Option<u32>> = child(root, "fills")
        .map(|fills| children(fills, "fill").map(solid_fill).collect())
        .unwrap_or_default();

    let Some(cell_xfs) = child(root, "cellXfs") else {
        return Vec::new();
    };
    children(cell_xfs, "xf")
        .map(|xf| {
            let num_fmt_id = xf
                .attribute("numFmtId")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let fill = xf
                .attribute("fillId")
                .and_then(|v| v.parse::<usize>().ok())
                .and_then(|i| fills.get(i).copied().flatten());
            let wrap_text = child(xf, "alignment")
                .and_then(|a| a.attribute("wrapText"))
                .is_some_and(|v| v == "1" || v == "true");
            CellStyle {
                num_fmt_id,
                format_code: custom.get(&num_fmt_id).cloned(),
                fill,
                wrap_text,
            }
        })
        .collect()
}

/// `0xRRGGBB` of a solid pattern fill with an explicit ARGB foreground.
fn solid_fill(fill: Node<'_, '_>) -> Option<u32> {
    let pattern = child(fill, "patternFill")?;
    if pattern.attribute("patternType") != Some("solid") {
        return None;
    }
    let argb = child(pattern, "fgColor")?.attribute("rgb")?;
    let rgb = argb.get(argb.len().checked_sub(6)?..)?;
    u32::from_str_radix(rgb, 16).ok()
}

/// Relationship id to package path.
fn relationship_targets(doc: &Document<'_>) -> HashMap<String, String> {
    children(doc.root_element(), "Relationship")
        .filter_map(|rel| {
            let id = rel.attribute("Id")?;
            let target = rel.attribute("Target")?;
            let path = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{target}"),
            };
            Some((id.to_string(), path))
        })
        .collect()
}

/// Sheet names with their relationship ids, in workbook order.
fn sheet_relationships(doc: &Document<'_>) -> Vec<(String, String)> {
    let Some(sheets) = child(doc.root_element(), "sheets") else {
        return Vec::new();
    };
    children(sheets, "sheet")
        .filter_map(|sheet| {
            let name = sheet.attribute("name")?;
            let rel_id = sheet
                .attributes()
                .find(|a| a.name() == "id" && a.namespace().is_some())?
                .value();
            Some((name.to_string(), rel_id.to_string()))
        })
        .collect()
}

fn styled_cells(doc: &Document<'_>) -> HashMap<(u32, u32), usize> {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "c")
        .filter_map(|c| {
            let xf: usize = c.attribute("s")?.parse().ok()?;
            if xf == 0 {
                return None;
            }
            let position = parse_address(c.attribute("r")?).ok()?;
            Some((position, xf))
        })
        .collect()
}
