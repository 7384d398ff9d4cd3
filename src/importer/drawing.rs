// ==========================================
// 表格列映射导入 - xlsx 包部件解析
// ==========================================
// 职责: 定位活动工作表，并提取其 drawing 中锚定到单元格的图片
// 路径: workbook.xml → workbook.xml.rels → sheetN.xml.rels
//       → drawingN.xml (+ rels) → xl/media/*
// 限制: 只支持 twoCellAnchor / oneCellAnchor 的左上角锚点
//       mc:AlternateContent 只取 Choice 分支
//       absoluteAnchor（无单元格锚点）忽略
// ==========================================

use crate::domain::sheet::EmbeddedImage;
use crate::importer::error::{ImportError, ImportResult};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const DRAWING_REL_SUFFIX: &str = "/drawing";

// ==========================================
// ActiveSheet - 活动工作表信息
// ==========================================
#[derive(Debug, Clone)]
pub struct ActiveSheet {
    pub name: String,
    pub part_path: Option<String>, // 例如 xl/worksheets/sheet1.xml
    pub images: Vec<EmbeddedImage>,
}

/// 读取 xlsx 包中的活动工作表及其锚定图片
pub fn read_active_sheet(bytes: &[u8]) -> ImportResult<ActiveSheet> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook_xml = read_part(&mut archive, WORKBOOK_PART)?
        .ok_or_else(|| ImportError::FileFormat(format!("缺少 {}", WORKBOOK_PART)))?;
    let workbook_text = xml_text(&workbook_xml)?;
    let workbook = Document::parse(workbook_text)?;

    // 工作表顺序 + activeTab
    let sheets: Vec<(String, Option<String>)> = workbook
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "sheet")
        .map(|n| {
            (
                n.attribute("name").unwrap_or_default().to_string(),
                rel_attr(&n, "id"),
            )
        })
        .collect();

    if sheets.is_empty() {
        return Err(ImportError::FileFormat("Excel 文件无工作表".to_string()));
    }

    let active_tab = workbook
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "workbookView")
        .and_then(|n| n.attribute("activeTab"))
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|idx| *idx < sheets.len())
        .unwrap_or(0);

    let (name, rel_id) = sheets[active_tab].clone();

    // 解析工作表部件路径
    let workbook_rels = read_relationships(&mut archive, WORKBOOK_PART)?;
    let part_path = rel_id
        .as_deref()
        .and_then(|id| workbook_rels.get(id))
        .map(|rel| resolve_part_path(part_dir(WORKBOOK_PART), &rel.target));

    let images = match &part_path {
        Some(path) => read_sheet_images(&mut archive, path)?,
        None => {
            warn!(sheet = %name, "未找到工作表部件，忽略嵌入图片");
            Vec::new()
        }
    };

    debug!(sheet = %name, active_tab = active_tab, images = images.len(), "活动工作表已定位");

    Ok(ActiveSheet {
        name,
        part_path,
        images,
    })
}

/// 提取工作表所有 drawing 中的锚定图片
fn read_sheet_images<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_path: &str,
) -> ImportResult<Vec<EmbeddedImage>> {
    let sheet_rels = read_relationships(archive, sheet_path)?;

    let mut drawing_paths: Vec<String> = sheet_rels
        .values()
        .filter(|rel| rel.rel_type.ends_with(DRAWING_REL_SUFFIX) && !rel.external)
        .map(|rel| resolve_part_path(part_dir(sheet_path), &rel.target))
        .collect();
    drawing_paths.sort();

    let mut images = Vec::new();
    for drawing_path in drawing_paths {
        images.extend(read_drawing_images(archive, &drawing_path)?);
    }
    Ok(images)
}

/// 解析单个 drawing 部件
fn read_drawing_images<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    drawing_path: &str,
) -> ImportResult<Vec<EmbeddedImage>> {
    let Some(drawing_xml) = read_part(archive, drawing_path)? else {
        warn!(drawing = %drawing_path, "drawing 部件缺失");
        return Ok(Vec::new());
    };
    let drawing_rels = read_relationships(archive, drawing_path)?;

    let text = xml_text(&drawing_xml)?;
    let doc = Document::parse(text)?;

    // 先收集 (row, col, 部件路径)，再统一读取 media，避免借用冲突
    let mut anchors = Vec::new();
    // 锚点可能嵌在 mc:AlternateContent 中；Fallback 分支与 Choice 重复，跳过
    for anchor in doc
        .descendants()
        .filter(|n| is_cell_anchor(n) && !in_fallback(n))
    {
        let Some((row, col)) = anchor_from(&anchor) else {
            debug!(drawing = %drawing_path, "锚点缺少 from，忽略");
            continue;
        };

        // 组合形状 (grpSp) 内的图片取第一个 blip
        let Some(embed_id) = anchor
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "blip")
            .and_then(|blip| rel_attr(&blip, "embed"))
        else {
            // 图表/形状等非图片对象
            debug!(row = row, col = col, drawing = %drawing_path, "锚点下无图片，忽略");
            continue;
        };

        match drawing_rels.get(&embed_id) {
            Some(rel) if !rel.external => {
                anchors.push((row, col, resolve_part_path(part_dir(drawing_path), &rel.target)));
            }
            _ => warn!(embed_id = %embed_id, drawing = %drawing_path, "图片关系无法解析"),
        }
    }

    let mut images = Vec::with_capacity(anchors.len());
    for (row, col, media_path) in anchors {
        match read_part(archive, &media_path)? {
            Some(content) => images.push(EmbeddedImage::new(row, col, content, media_path)),
            None => warn!(media = %media_path, "图片部件缺失"),
        }
    }

    Ok(images)
}

fn is_cell_anchor(node: &Node) -> bool {
    node.is_element() && matches!(node.tag_name().name(), "twoCellAnchor" | "oneCellAnchor")
}

fn in_fallback(node: &Node) -> bool {
    node.ancestors()
        .any(|n| n.is_element() && n.tag_name().name() == "Fallback")
}

/// 读取锚点左上角 (xdr:from/xdr:row, xdr:from/xdr:col)
fn anchor_from(anchor: &Node) -> Option<(usize, usize)> {
    let from = anchor
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "from")?;

    let child_value = |local: &str| -> Option<usize> {
        from.children()
            .find(|n| n.is_element() && n.tag_name().name() == local)
            .and_then(|n| n.text())
            .and_then(|t| t.trim().parse().ok())
    };

    Some((child_value("row")?, child_value("col")?))
}

// ==========================================
// 关系 (rels) 解析
// ==========================================
#[derive(Debug, Clone)]
struct Relationship {
    target: String,
    rel_type: String,
    external: bool,
}

/// 读取部件对应的 _rels/xxx.rels；不存在时返回空表
fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part_path: &str,
) -> ImportResult<HashMap<String, Relationship>> {
    let Some(xml) = read_part(archive, &rels_path_for(part_path))? else {
        return Ok(HashMap::new());
    };
    let text = xml_text(&xml)?;
    let doc = Document::parse(text)?;

    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
        .filter_map(|n| {
            let id = n.attribute("Id")?;
            let target = n.attribute("Target")?;
            Some((
                id.to_string(),
                Relationship {
                    target: target.to_string(),
                    rel_type: n.attribute("Type").unwrap_or_default().to_string(),
                    external: n.attribute("TargetMode") == Some("External"),
                },
            ))
        })
        .collect())
}

/// 带命名空间的关系属性（r:id / r:embed），兼容 transitional 与 strict 命名空间
fn rel_attr(node: &Node, local: &str) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == local && a.namespace().is_some())
        .map(|a| a.value().to_string())
}

// ==========================================
// 包内路径工具
// ==========================================

/// 部件所在目录（xl/workbook.xml → xl）
fn part_dir(part_path: &str) -> &str {
    part_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// 部件的 rels 路径（xl/workbook.xml → xl/_rels/workbook.xml.rels）
fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// 按 rels Target 解析包内绝对路径（支持 ../ 与以 / 开头的绝对目标）
fn resolve_part_path(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> ImportResult<Option<Vec<u8>>> {
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            Ok(Some(buf))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn xml_text(bytes: &[u8]) -> ImportResult<&str> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ImportError::FileFormat(format!("XML 不是 UTF-8: {}", e)))?;
    Ok(text.trim_start_matches('\u{feff}'))
}
